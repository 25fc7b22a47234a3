//! Aging particle pool advected through a vector field.
//!
//! Particles live in a flat `f32` arena of `(lon, lat, vx, vy, age)` slots so
//! a pool of tens of thousands stays cache-friendly and allocation-free after
//! construction. Stepping is first-order Euler: move by the stored velocity,
//! resample the field at the new position, age, respawn when aged out.
use rand::RngCore;
use tracing::debug;

use crate::advect::{rand01, SpawnBounds};
use crate::field::grid::VectorGrid;
use crate::geo::clamp_lat;

pub const DEFAULT_MAX_AGE: u32 = 80;
pub const DEFAULT_VELOCITY_FACTOR: f32 = 0.5;

const STRIDE: usize = 5;

/// A snapshot of one particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub lon: f32,
    pub lat: f32,
    pub vx: f32,
    pub vy: f32,
    pub age: u32,
}

/// A fixed-size pool of advected particles.
pub struct ParticlePool {
    data: Vec<f32>,
    count: usize,
    max_age: u32,
    velocity_factor: f32,
    bounds: SpawnBounds,
}

impl ParticlePool {
    /// Create a pool of `count` particles. Positions stay zeroed until
    /// [initialize](Self::initialize) seeds them from a field.
    pub fn new(count: usize) -> Self {
        Self {
            data: vec![0.0; count * STRIDE],
            count,
            max_age: DEFAULT_MAX_AGE,
            velocity_factor: DEFAULT_VELOCITY_FACTOR,
            bounds: SpawnBounds::whole_globe(),
        }
    }

    /// Sets the age at which particles respawn.
    pub fn with_max_age(mut self, max_age: u32) -> Self {
        self.max_age = max_age;
        self
    }

    /// Sets the damping factor applied to sampled velocities.
    pub fn with_velocity_factor(mut self, velocity_factor: f32) -> Self {
        self.velocity_factor = velocity_factor;
        self
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn velocity_factor(&self) -> f32 {
        self.velocity_factor
    }

    pub fn bounds(&self) -> SpawnBounds {
        self.bounds
    }

    /// Restrict future spawns to `bounds`, typically the visible view.
    pub fn set_bounds(&mut self, bounds: SpawnBounds) {
        self.bounds = bounds;
    }

    /// Seed every particle with a random position inside the spawn bounds, a
    /// damped field velocity, and a random age in `[0, max_age)`.
    pub fn initialize(&mut self, field: &VectorGrid, rng: &mut dyn RngCore) {
        for i in 0..self.count {
            self.spawn(i, field, rng);
        }
        debug!(count = self.count, "initialized particle pool");
    }

    fn spawn(&mut self, i: usize, field: &VectorGrid, rng: &mut dyn RngCore) {
        let lon = self.bounds.lon_min + rand01(rng) * self.bounds.lon_span();
        let lat = clamp_lat(self.bounds.lat_min + rand01(rng) * self.bounds.lat_span());
        let v = field.sample(lon, lat) * self.velocity_factor;
        let age = (rand01(rng) * self.max_age as f32).floor();

        let base = i * STRIDE;
        self.data[base] = lon;
        self.data[base + 1] = lat;
        self.data[base + 2] = v.x;
        self.data[base + 3] = v.y;
        self.data[base + 4] = age;
    }

    /// Advance every particle by one step.
    ///
    /// Longitude is never clamped (the field wraps it on sampling); a
    /// latitude pushed past a pole forces the particle to age out and respawn
    /// this step.
    pub fn step(&mut self, field: &VectorGrid, rng: &mut dyn RngCore) {
        for i in 0..self.count {
            let base = i * STRIDE;
            self.data[base] += self.data[base + 2];
            self.data[base + 1] += self.data[base + 3];

            let lon = self.data[base];
            let lat = self.data[base + 1];
            let v = field.sample(lon, lat) * self.velocity_factor;
            self.data[base + 2] = v.x;
            self.data[base + 3] = v.y;

            let mut age = self.data[base + 4] as u32;
            if !(-90.0..=90.0).contains(&lat) {
                age = self.max_age;
            }
            age += 1;

            if age > self.max_age {
                self.spawn(i, field, rng);
            } else {
                self.data[base + 4] = age as f32;
            }
        }
    }

    /// Snapshot of particle `i`.
    pub fn get(&self, i: usize) -> Particle {
        let base = i * STRIDE;
        Particle {
            lon: self.data[base],
            lat: self.data[base + 1],
            vx: self.data[base + 2],
            vy: self.data[base + 3],
            age: self.data[base + 4] as u32,
        }
    }

    /// Iterate over all particle snapshots.
    pub fn iter(&self) -> impl Iterator<Item = Particle> + '_ {
        (0..self.count).map(|i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn constant_field(v: Vec2) -> VectorGrid {
        let mut field = VectorGrid::new(8, 4);
        for iy in 0..4 {
            for ix in 0..8 {
                field.set(ix, iy, v);
            }
        }
        field
    }

    #[test]
    fn initialize_seeds_positions_and_ages() {
        let field = constant_field(Vec2::new(0.4, -0.2));
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool = ParticlePool::new(100);
        pool.initialize(&field, &mut rng);
        for p in pool.iter() {
            assert!((-180.0..=180.0).contains(&p.lon));
            assert!((-90.0..=90.0).contains(&p.lat));
            assert!(p.age < DEFAULT_MAX_AGE);
            assert!((p.vx - 0.2).abs() < 1e-6);
            assert!((p.vy + 0.1).abs() < 1e-6);
        }
    }

    #[test]
    fn step_moves_by_stored_velocity() {
        let field = constant_field(Vec2::new(1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(2);
        let mut pool = ParticlePool::new(1).with_max_age(1000);
        pool.initialize(&field, &mut rng);
        let before = pool.get(0);
        pool.step(&field, &mut rng);
        let after = pool.get(0);
        assert!((after.lon - (before.lon + before.vx)).abs() < 1e-4);
        assert!((after.lat - (before.lat + before.vy)).abs() < 1e-4);
        assert_eq!(after.age, before.age + 1);
    }

    #[test]
    fn particles_respawn_after_aging_out() {
        let field = constant_field(Vec2::ZERO);
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = ParticlePool::new(50).with_max_age(5);
        pool.initialize(&field, &mut rng);
        for _ in 0..6 {
            pool.step(&field, &mut rng);
        }
        // Every particle has respawned at least once, so no age exceeds max.
        for p in pool.iter() {
            assert!(p.age <= 5);
        }
    }

    #[test]
    fn pole_overflow_forces_respawn() {
        // A strong northward field pushes particles past the pole.
        let field = constant_field(Vec2::new(0.0, 50.0));
        let mut rng = StdRng::seed_from_u64(4);
        let mut pool = ParticlePool::new(20).with_max_age(80);
        pool.set_bounds(SpawnBounds::new(-180.0, 180.0, 80.0, 90.0));
        pool.initialize(&field, &mut rng);
        pool.step(&field, &mut rng);
        pool.step(&field, &mut rng);
        // Respawns keep every particle inside the spawn bounds.
        for p in pool.iter() {
            assert!((-90.0..=90.0).contains(&p.lat));
        }
    }

    #[test]
    fn spawns_respect_bounds() {
        let field = constant_field(Vec2::ZERO);
        let mut rng = StdRng::seed_from_u64(5);
        let mut pool = ParticlePool::new(200);
        pool.set_bounds(SpawnBounds::new(10.0, 20.0, -5.0, 5.0));
        pool.initialize(&field, &mut rng);
        for p in pool.iter() {
            assert!((10.0..=20.0).contains(&p.lon));
            assert!((-5.0..=5.0).contains(&p.lat));
        }
    }

    #[test]
    fn deterministic_for_the_same_seed() {
        let field = constant_field(Vec2::new(0.3, 0.1));
        let mut pool_a = ParticlePool::new(64);
        let mut pool_b = ParticlePool::new(64);
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        pool_a.initialize(&field, &mut rng_a);
        pool_b.initialize(&field, &mut rng_b);
        for _ in 0..10 {
            pool_a.step(&field, &mut rng_a);
            pool_b.step(&field, &mut rng_b);
        }
        let a: Vec<Particle> = pool_a.iter().collect();
        let b: Vec<Particle> = pool_b.iter().collect();
        assert_eq!(a, b);
    }
}
