//! Equirectangular scalar and vector grids.
//!
//! Both grids are row-major, row 0 at latitude +90° (north) and column 0 at
//! longitude -180°, covering the full globe. Cell `(ix, iy)` spans
//! `dlon = 360/width` degrees of longitude and `dlat = 180/height` degrees of
//! latitude.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::{clamp_lat, wrap_lon};

/// A full-globe scalar grid with `f32` values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScalarGrid {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f32>,
}

impl ScalarGrid {
    /// Create a zero-filled grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    /// Create a grid from existing values, checking the length.
    pub fn from_values(width: usize, height: usize, values: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyInput);
        }
        let expected = width * height;
        if values.len() != expected {
            return Err(Error::InvalidDimensions {
                width,
                height,
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Degrees of longitude covered by one column.
    pub fn dlon(&self) -> f32 {
        360.0 / self.width as f32
    }

    /// Degrees of latitude covered by one row.
    pub fn dlat(&self) -> f32 {
        180.0 / self.height as f32
    }

    #[inline]
    pub fn index(&self, ix: usize, iy: usize) -> usize {
        debug_assert!(ix < self.width && iy < self.height);
        iy * self.width + ix
    }

    #[inline]
    pub fn get(&self, ix: usize, iy: usize) -> f32 {
        self.values[self.index(ix, iy)]
    }

    #[inline]
    pub fn set(&mut self, ix: usize, iy: usize, value: f32) {
        let i = self.index(ix, iy);
        self.values[i] = value;
    }

    /// Cell indices for a `(lon, lat)` position in degrees.
    ///
    /// Longitude wraps, latitude clamps, so every finite input maps to a cell.
    pub fn cell_for_lon_lat(&self, lon: f32, lat: f32) -> (usize, usize) {
        let lon = wrap_lon(lon);
        let lat = clamp_lat(lat);
        let ix = (((lon + 180.0) / self.dlon()) as usize).min(self.width - 1);
        let iy = (((90.0 - lat) / self.dlat()) as usize).min(self.height - 1);
        (ix, iy)
    }

    /// Cell indices for normalized texture coordinates `(u, v)` in `[0, 1]²`,
    /// `v = 0` at the north edge.
    pub fn cell_for_uv(&self, u: f32, v: f32) -> (usize, usize) {
        let u = u.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let ix = ((u * self.width as f32) as usize).min(self.width - 1);
        let iy = ((v * self.height as f32) as usize).min(self.height - 1);
        (ix, iy)
    }

    /// Nearest-cell sample at a `(lon, lat)` position.
    pub fn sample(&self, lon: f32, lat: f32) -> f32 {
        let (ix, iy) = self.cell_for_lon_lat(lon, lat);
        self.get(ix, iy)
    }

    /// Nearest-cell sample at normalized `(u, v)` coordinates.
    pub fn sample_uv(&self, u: f32, v: f32) -> f32 {
        let (ix, iy) = self.cell_for_uv(u, v);
        self.get(ix, iy)
    }

    /// Minimum and maximum value over the grid, `None` when empty.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut it = self.values.iter().copied();
        let first = it.next()?;
        let mut min = first;
        let mut max = first;
        for v in it {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        Some((min, max))
    }

    /// Rescale values to `[0, 1]`. A constant grid is left unchanged.
    pub fn normalize_in_place(&mut self) {
        let Some((min, max)) = self.min_max() else {
            return;
        };
        let range = max - min;
        if range <= 0.0 {
            return;
        }
        for v in &mut self.values {
            *v = ((*v - min) / range).clamp(0.0, 1.0);
        }
    }
}

/// A full-globe vector grid storing `(vx, vy)` pairs.
///
/// `vx` points east (increasing longitude), `vy` points north (increasing
/// latitude), both in degrees per step.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VectorGrid {
    pub width: usize,
    pub height: usize,
    pub vectors: Vec<f32>,
}

impl VectorGrid {
    /// Create a zero-filled vector grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            vectors: vec![0.0; width * height * 2],
        }
    }

    /// Create a vector grid from interleaved `(vx, vy)` values, checking the length.
    pub fn from_vectors(width: usize, height: usize, vectors: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyInput);
        }
        let expected = width * height * 2;
        if vectors.len() != expected {
            return Err(Error::InvalidDimensions {
                width,
                height,
                expected,
                actual: vectors.len(),
            });
        }
        Ok(Self {
            width,
            height,
            vectors,
        })
    }

    #[inline]
    pub fn index(&self, ix: usize, iy: usize) -> usize {
        debug_assert!(ix < self.width && iy < self.height);
        (iy * self.width + ix) * 2
    }

    #[inline]
    pub fn get(&self, ix: usize, iy: usize) -> Vec2 {
        let i = self.index(ix, iy);
        Vec2::new(self.vectors[i], self.vectors[i + 1])
    }

    #[inline]
    pub fn set(&mut self, ix: usize, iy: usize, v: Vec2) {
        let i = self.index(ix, iy);
        self.vectors[i] = v.x;
        self.vectors[i + 1] = v.y;
    }

    /// Nearest-cell sample at a `(lon, lat)` position. Longitude wraps,
    /// latitude clamps.
    pub fn sample(&self, lon: f32, lat: f32) -> Vec2 {
        let lon = wrap_lon(lon);
        let lat = clamp_lat(lat);
        let dlon = 360.0 / self.width as f32;
        let dlat = 180.0 / self.height as f32;
        let ix = (((lon + 180.0) / dlon) as usize).min(self.width - 1);
        let iy = (((90.0 - lat) / dlat) as usize).min(self.height - 1);
        self.get(ix, iy)
    }

    /// Largest vector magnitude over the grid.
    pub fn max_magnitude(&self) -> f32 {
        let mut max = 0.0f32;
        for pair in self.vectors.chunks_exact(2) {
            let mag = Vec2::new(pair[0], pair[1]).length();
            if mag > max {
                max = mag;
            }
        }
        max
    }

    /// Multiply every component by `factor`.
    pub fn scale_in_place(&mut self, factor: f32) {
        for v in &mut self.vectors {
            *v *= factor;
        }
    }
}
