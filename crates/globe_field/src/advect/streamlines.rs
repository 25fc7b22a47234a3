//! Precomputed streamline polylines traced through a vector field.
//!
//! A streamline set stores `num_paths * path_len` samples of
//! `(lon, lat, vx, vy)` in one flat arena. Paths are traced once by repeated
//! Euler stepping; with regular lattice starts they cover the globe evenly
//! and never need rebuilding, random starts are re-rolled on demand.
use rand::RngCore;
use tracing::debug;

use crate::advect::rand01;
use crate::field::grid::VectorGrid;

pub const DEFAULT_NUM_PATHS: usize = 64_800;
pub const DEFAULT_PATH_LEN: usize = 6;

const STRIDE: usize = 4;

/// Where streamline paths begin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StartPositions {
    /// Evenly spaced lon/lat lattice covering the globe.
    #[default]
    RegularLattice,
    /// Uniformly random positions, re-rolled on [StreamlineSet::rebuild].
    Random,
}

/// Streamline tracing configuration.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub struct StreamlineConfig {
    pub num_paths: usize,
    pub path_len: usize,
    pub starts: StartPositions,
}

impl Default for StreamlineConfig {
    fn default() -> Self {
        Self {
            num_paths: DEFAULT_NUM_PATHS,
            path_len: DEFAULT_PATH_LEN,
            starts: StartPositions::default(),
        }
    }
}

impl StreamlineConfig {
    /// Sets the number of traced paths.
    pub fn with_num_paths(mut self, num_paths: usize) -> Self {
        self.num_paths = num_paths;
        self
    }

    /// Sets the number of samples per path.
    pub fn with_path_len(mut self, path_len: usize) -> Self {
        self.path_len = path_len;
        self
    }

    /// Sets the start position strategy.
    pub fn with_starts(mut self, starts: StartPositions) -> Self {
        self.starts = starts;
        self
    }
}

/// The regular start lattice derived from a path count.
///
/// The step count along longitude grows until the lattice holds at least
/// `num_paths` cells, then spacing leaves a half-step margin at the poles and
/// the antimeridian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeSpec {
    pub n_lon: usize,
    pub n_lat: usize,
    pub delta_lon: f32,
    pub delta_lat: f32,
}

impl LatticeSpec {
    pub fn for_paths(num_paths: usize) -> Self {
        let dincr = ((360.0 * 180.0) / num_paths as f64).sqrt();
        let mut n_lon = (360.0 / dincr) as usize;
        let n_lat = (180.0 / dincr) as usize;
        while n_lon * n_lat < num_paths {
            n_lon += 1;
        }
        Self {
            n_lon,
            n_lat,
            delta_lon: 360.0 / (n_lon + 1) as f32,
            delta_lat: 180.0 / (n_lat + 1) as f32,
        }
    }
}

/// Walks the lattice row by row, west to east, south to north.
struct LatticeWalk {
    spec: LatticeSpec,
    lon: f32,
    lat: f32,
    emitted: usize,
}

impl LatticeWalk {
    fn new(spec: LatticeSpec) -> Self {
        Self {
            spec,
            lon: -180.0 + spec.delta_lon * 0.5,
            lat: -90.0 + spec.delta_lat * 0.5,
            emitted: 0,
        }
    }
}

impl Iterator for LatticeWalk {
    type Item = (f32, f32);

    fn next(&mut self) -> Option<(f32, f32)> {
        let out = (self.lon, self.lat);
        self.emitted += 1;
        self.lon += self.spec.delta_lon;
        if self.emitted % self.spec.n_lon == 0 {
            self.lon = -180.0 + self.spec.delta_lon * 0.5;
            self.lat += self.spec.delta_lat;
            if self.lat > 90.0 {
                self.lat -= self.spec.delta_lat;
            }
        }
        if self.lon > 180.0 {
            self.lon -= self.spec.delta_lon;
        }
        Some(out)
    }
}

/// One streamline sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamSample {
    pub lon: f32,
    pub lat: f32,
    pub vx: f32,
    pub vy: f32,
}

/// A traced set of streamlines.
pub struct StreamlineSet {
    data: Vec<f32>,
    num_paths: usize,
    path_len: usize,
    starts: StartPositions,
}

impl StreamlineSet {
    /// Trace all paths through `field`.
    pub fn build(config: &StreamlineConfig, field: &VectorGrid, rng: &mut dyn RngCore) -> Self {
        let mut set = Self {
            data: vec![0.0; config.num_paths * config.path_len * STRIDE],
            num_paths: config.num_paths,
            path_len: config.path_len,
            starts: config.starts,
        };
        set.trace_all(field, rng);
        debug!(
            num_paths = set.num_paths,
            path_len = set.path_len,
            "built streamline set"
        );
        set
    }

    /// Re-trace paths after a view change.
    ///
    /// Regular lattice starts already cover the globe, so this is a no-op for
    /// them; random starts are re-rolled.
    pub fn rebuild(&mut self, field: &VectorGrid, rng: &mut dyn RngCore) {
        if self.starts == StartPositions::RegularLattice {
            return;
        }
        self.trace_all(field, rng);
    }

    fn trace_all(&mut self, field: &VectorGrid, rng: &mut dyn RngCore) {
        match self.starts {
            StartPositions::RegularLattice => {
                let spec = LatticeSpec::for_paths(self.num_paths);
                let walk = LatticeWalk::new(spec);
                for (n, (lon, lat)) in walk.take(self.num_paths).enumerate() {
                    self.trace_path(n, lon, lat, field);
                }
            }
            StartPositions::Random => {
                for n in 0..self.num_paths {
                    let lon = (rand01(rng) - 0.5) * 360.0;
                    let lat = (rand01(rng) - 0.5) * 180.0;
                    self.trace_path(n, lon, lat, field);
                }
            }
        }
    }

    fn trace_path(&mut self, n: usize, start_lon: f32, start_lat: f32, field: &VectorGrid) {
        let mut lon = start_lon.clamp(-180.0, 180.0);
        let mut lat = start_lat.clamp(-90.0, 90.0);
        let mut v = field.sample(lon, lat);
        for m in 0..self.path_len {
            let base = (n * self.path_len + m) * STRIDE;
            self.data[base] = lon;
            self.data[base + 1] = lat;
            self.data[base + 2] = v.x;
            self.data[base + 3] = v.y;

            lon += v.x;
            lat += v.y;
            v = field.sample(lon, lat);
        }
    }

    pub fn num_paths(&self) -> usize {
        self.num_paths
    }

    pub fn path_len(&self) -> usize {
        self.path_len
    }

    /// Sample `m` of path `n`.
    pub fn sample(&self, n: usize, m: usize) -> StreamSample {
        let base = (n * self.path_len + m) * STRIDE;
        StreamSample {
            lon: self.data[base],
            lat: self.data[base + 1],
            vx: self.data[base + 2],
            vy: self.data[base + 3],
        }
    }

    /// Iterate over the samples of path `n`.
    pub fn path(&self, n: usize) -> impl Iterator<Item = StreamSample> + '_ {
        (0..self.path_len).map(move |m| self.sample(n, m))
    }
}
