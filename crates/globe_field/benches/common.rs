use std::time::Duration;

use criterion::{Criterion, Throughput};
use globe_field::prelude::ScalarGrid;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// A smooth synthetic field with features at several scales.
pub fn wavy_grid(width: usize, height: usize) -> ScalarGrid {
    let mut grid = ScalarGrid::new(width, height);
    for iy in 0..height {
        for ix in 0..width {
            let u = ix as f32 / width as f32;
            let v = iy as f32 / height as f32;
            let value = 0.5
                + 0.25 * (u * std::f32::consts::TAU * 3.0).sin()
                + 0.25 * (v * std::f32::consts::TAU * 2.0).cos();
            grid.set(ix, iy, value.clamp(0.0, 1.0));
        }
    }
    grid
}
