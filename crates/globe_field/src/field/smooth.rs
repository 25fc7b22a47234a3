//! Separable box blur for scalar grids.
//!
//! Edge handling clamps indices to the grid, so border cells reuse their
//! nearest neighbors instead of shrinking the window.
use crate::field::grid::ScalarGrid;

/// Symmetric box blur with window `2 * radius + 1`, applied in place.
///
/// `radius == 0` is a no-op.
pub fn box_blur(grid: &mut ScalarGrid, radius: usize) {
    if radius == 0 || grid.is_empty() {
        return;
    }
    let w = grid.width;
    let h = grid.height;
    let window = (2 * radius + 1) as f32;
    let mut scratch = vec![0.0f32; w * h];

    // Horizontal pass.
    for iy in 0..h {
        for ix in 0..w {
            let mut sum = 0.0;
            for k in -(radius as isize)..=(radius as isize) {
                let x = (ix as isize + k).clamp(0, w as isize - 1) as usize;
                sum += grid.values[iy * w + x];
            }
            scratch[iy * w + ix] = sum / window;
        }
    }

    // Vertical pass.
    for iy in 0..h {
        for ix in 0..w {
            let mut sum = 0.0;
            for k in -(radius as isize)..=(radius as isize) {
                let y = (iy as isize + k).clamp(0, h as isize - 1) as usize;
                sum += scratch[y * w + ix];
            }
            grid.values[iy * w + ix] = sum / window;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_zero_is_noop() {
        let mut grid = ScalarGrid::from_values(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let before = grid.clone();
        box_blur(&mut grid, 0);
        assert_eq!(grid, before);
    }

    #[test]
    fn constant_grid_stays_constant() {
        let mut grid = ScalarGrid::from_values(5, 4, vec![0.25; 20]).unwrap();
        box_blur(&mut grid, 2);
        assert!(grid.values.iter().all(|v| (*v - 0.25).abs() < 1e-6));
    }

    #[test]
    fn spike_spreads_symmetrically() {
        let mut grid = ScalarGrid::new(7, 7);
        grid.set(3, 3, 1.0);
        box_blur(&mut grid, 1);
        assert!(grid.get(3, 3) > 0.0);
        assert!((grid.get(2, 3) - grid.get(4, 3)).abs() < 1e-6);
        assert!((grid.get(3, 2) - grid.get(3, 4)).abs() < 1e-6);
        // Window of 3 cannot reach two cells out.
        assert_eq!(grid.get(0, 0), 0.0);
    }
}
