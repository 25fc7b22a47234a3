//! RGBA raster decoding into normalized scalar grids.
use tracing::debug;

use crate::error::{Error, Result};
use crate::field::grid::ScalarGrid;
use crate::field::smooth::box_blur;

/// Rec. 601 luma weights used to collapse RGB into a single channel.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Build a normalized scalar grid from tightly packed 8-bit RGBA pixels.
///
/// Each pixel becomes the luminance of its RGB channels scaled to `[0, 1]`
/// (alpha is ignored). When `smoothing_radius > 0` the grid is box-blurred
/// before normalization. The final grid spans `[0, 1]` unless the input is
/// constant, in which case it is left as-is.
pub fn scalar_from_rgba(
    pixels: &[u8],
    width: usize,
    height: usize,
    smoothing_radius: usize,
) -> Result<ScalarGrid> {
    if width == 0 || height == 0 {
        return Err(Error::EmptyInput);
    }
    let expected = width * height * 4;
    if pixels.len() != expected {
        return Err(Error::InvalidDimensions {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }

    let mut values = Vec::with_capacity(width * height);
    for px in pixels.chunks_exact(4) {
        let luma = LUMA_R * px[0] as f32 + LUMA_G * px[1] as f32 + LUMA_B * px[2] as f32;
        values.push(luma / 255.0);
    }

    let mut grid = ScalarGrid::from_values(width, height, values)?;
    box_blur(&mut grid, smoothing_radius);
    grid.normalize_in_place();
    debug!(width, height, smoothing_radius, "built scalar grid from rgba");
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba(pixels: &[[u8; 4]]) -> Vec<u8> {
        pixels.iter().flatten().copied().collect()
    }

    #[test]
    fn rejects_empty_and_mismatched_input() {
        assert!(matches!(
            scalar_from_rgba(&[], 0, 4, 0).unwrap_err(),
            Error::EmptyInput
        ));
        let err = scalar_from_rgba(&[0u8; 10], 2, 2, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { expected: 16, actual: 10, .. }));
    }

    #[test]
    fn output_is_normalized() {
        let pixels = rgba(&[
            [0, 0, 0, 255],
            [64, 64, 64, 255],
            [128, 128, 128, 255],
            [255, 255, 255, 255],
        ]);
        let grid = scalar_from_rgba(&pixels, 2, 2, 0).unwrap();
        let (min, max) = grid.min_max().unwrap();
        assert!((min - 0.0).abs() < 1e-6);
        assert!((max - 1.0).abs() < 1e-6);
        assert!(grid.values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn constant_input_stays_constant() {
        let pixels = rgba(&[[100, 100, 100, 255]; 4]);
        let grid = scalar_from_rgba(&pixels, 2, 2, 0).unwrap();
        let first = grid.values[0];
        assert!(grid.values.iter().all(|v| *v == first));
    }

    #[test]
    fn luminance_weights_order_channels() {
        // Pure green is brighter than pure red, which beats pure blue.
        let pixels = rgba(&[
            [255, 0, 0, 255],
            [0, 255, 0, 255],
            [0, 0, 255, 255],
            [0, 0, 0, 255],
        ]);
        let grid = scalar_from_rgba(&pixels, 4, 1, 0).unwrap();
        assert!(grid.values[1] > grid.values[0]);
        assert!(grid.values[0] > grid.values[2]);
    }

    #[test]
    fn smoothing_runs_before_normalization() {
        let mut pixels = rgba(&[[0, 0, 0, 255]; 16]);
        pixels[5 * 4] = 255;
        pixels[5 * 4 + 1] = 255;
        pixels[5 * 4 + 2] = 255;
        let sharp = scalar_from_rgba(&pixels, 4, 4, 0).unwrap();
        let smooth = scalar_from_rgba(&pixels, 4, 4, 1).unwrap();
        // Blur spreads the spike, normalization restores a unit max elsewhere.
        assert_eq!(sharp.get(0, 0), 0.0);
        assert!(smooth.get(0, 0) > 0.0);
        assert!((smooth.min_max().unwrap().1 - 1.0).abs() < 1e-6);
    }
}
