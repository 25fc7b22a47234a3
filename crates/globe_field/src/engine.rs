//! The field engine: owns all derived state and drives the pipeline.
//!
//! A [FieldEngine] holds the current scalar/vector/elevation/relief grids,
//! contours, particles, and streamlines, plus the worker pool that builds
//! them. There is no ambient global state: everything lives in this struct
//! and every piece of derived data carries the generation of the load that
//! produced it.
//!
//! The flow mirrors the render loop it serves: `load_model` /
//! `load_elevation` hand raw rasters to the workers, `poll` applies finished
//! outcomes (dropping stale generations) and chains follow-on work, the
//! sampling and shading accessors serve frames from whatever is ready.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Vec2;
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::advect::{ParticlePool, SpawnBounds, StreamlineConfig, StreamlineSet};
use crate::contour::{Contour, DEFAULT_THRESHOLDS};
use crate::error::{Error, Result};
use crate::field::grid::{ScalarGrid, VectorGrid};
use crate::shading::{
    default_lights, shade_view, Light, ShadedSample, ShadingConfig, ViewSample,
};
use crate::worker::{
    ContourRequest, FieldOutcome, FieldTask, FieldWorkerPool, GradientRequest, RasterTarget,
    ReliefRequest, ScalarRequest,
};

/// Progress notifications delivered through [FieldEngine::on_field_ready].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldReady {
    Scalar,
    Gradient,
    Elevation,
    Relief,
    Contours,
}

type ReadyCallback = Box<dyn FnMut(FieldReady) + Send>;

/// Engine configuration.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Blur radius applied while decoding the model raster.
    pub raster_smoothing: usize,
    /// Blur radius for the relief grid backing hillshade slopes.
    pub relief_smoothing: usize,
    /// Normalize the gradient field to unit maximum magnitude.
    pub normalize_gradient: bool,
    /// Iso-levels extracted whenever the model scalar changes.
    pub thresholds: Vec<f32>,
    /// Particle pool size.
    pub particle_count: usize,
    /// Streamline tracing; `None` disables streamlines.
    pub streamlines: Option<StreamlineConfig>,
    /// Background worker threads.
    pub worker_threads: usize,
    /// Task/outcome queue capacity.
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            raster_smoothing: 1,
            relief_smoothing: 1,
            normalize_gradient: true,
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            particle_count: 10_000,
            streamlines: Some(StreamlineConfig::default()),
            worker_threads: 2,
            queue_capacity: 16,
        }
    }
}

impl EngineConfig {
    /// Sets the model raster blur radius.
    pub fn with_raster_smoothing(mut self, raster_smoothing: usize) -> Self {
        self.raster_smoothing = raster_smoothing;
        self
    }

    /// Sets the relief blur radius.
    pub fn with_relief_smoothing(mut self, relief_smoothing: usize) -> Self {
        self.relief_smoothing = relief_smoothing;
        self
    }

    /// Sets gradient normalization.
    pub fn with_normalize_gradient(mut self, normalize_gradient: bool) -> Self {
        self.normalize_gradient = normalize_gradient;
        self
    }

    /// Sets the contour iso-levels.
    pub fn with_thresholds(mut self, thresholds: Vec<f32>) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Sets the particle pool size.
    pub fn with_particle_count(mut self, particle_count: usize) -> Self {
        self.particle_count = particle_count;
        self
    }

    /// Sets the streamline configuration (`None` disables streamlines).
    pub fn with_streamlines(mut self, streamlines: Option<StreamlineConfig>) -> Self {
        self.streamlines = streamlines;
        self
    }

    /// Sets the worker thread count.
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    /// Sets the task/outcome queue capacity.
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.thresholds.is_empty() {
            return Err(Error::InvalidConfig("thresholds must not be empty".into()));
        }
        if self.worker_threads == 0 {
            return Err(Error::InvalidConfig("worker_threads must be > 0".into()));
        }
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig("queue_capacity must be > 0".into()));
        }
        Ok(())
    }
}

/// Advisory cancellation flag for long-running loops.
///
/// Cooperative: the loop checks the flag once per tick and an in-progress
/// step always completes.
#[derive(Clone, Default)]
pub struct LoopFlag(Arc<AtomicBool>);

impl LoopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn should_stop(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Owner of all field state for one globe view.
pub struct FieldEngine {
    config: EngineConfig,
    lights: Vec<Light>,
    shading: ShadingConfig,
    workers: FieldWorkerPool,

    scalar: Option<Arc<ScalarGrid>>,
    vector: Option<Arc<VectorGrid>>,
    elevation: Option<Arc<ScalarGrid>>,
    relief: Option<Arc<ScalarGrid>>,
    contours: Option<Arc<Vec<Contour>>>,
    particles: Option<ParticlePool>,
    streamlines: Option<StreamlineSet>,

    /// Follow-on tasks rejected by a full queue, resubmitted on poll.
    deferred: Vec<FieldTask>,

    model_generation: u64,
    elevation_generation: u64,

    on_ready: Option<ReadyCallback>,
}

impl FieldEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let workers = FieldWorkerPool::new(config.worker_threads, config.queue_capacity);
        Ok(Self {
            config,
            lights: default_lights(),
            shading: ShadingConfig::default(),
            workers,
            scalar: None,
            vector: None,
            elevation: None,
            relief: None,
            contours: None,
            particles: None,
            streamlines: None,
            deferred: Vec::new(),
            model_generation: 0,
            elevation_generation: 0,
            on_ready: None,
        })
    }

    /// Replace the light rig.
    pub fn set_lights(&mut self, lights: Vec<Light>) {
        self.lights = lights;
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Replace the shading configuration.
    pub fn set_shading(&mut self, shading: ShadingConfig) -> Result<()> {
        shading.validate()?;
        self.shading = shading;
        Ok(())
    }

    pub fn shading(&self) -> &ShadingConfig {
        &self.shading
    }

    /// Register a progress callback, replacing any previous one.
    pub fn on_field_ready(&mut self, callback: ReadyCallback) {
        self.on_ready = Some(callback);
    }

    fn notify(&mut self, ready: FieldReady) {
        if let Some(cb) = &mut self.on_ready {
            cb(ready);
        }
    }

    /// Submit a model raster for decoding. A later load supersedes an
    /// in-flight one: its outcomes arrive with a stale generation and are
    /// dropped by [poll](Self::poll).
    pub fn load_model(&mut self, pixels: Vec<u8>, width: usize, height: usize) -> bool {
        self.model_generation += 1;
        info!(
            generation = self.model_generation,
            width, height, "loading model raster"
        );
        self.workers.submit(FieldTask::Scalar(ScalarRequest {
            generation: self.model_generation,
            target: RasterTarget::Model,
            pixels,
            width,
            height,
            smoothing_radius: self.config.raster_smoothing,
        }))
    }

    /// Submit an elevation raster for decoding.
    pub fn load_elevation(&mut self, pixels: Vec<u8>, width: usize, height: usize) -> bool {
        self.elevation_generation += 1;
        info!(
            generation = self.elevation_generation,
            width, height, "loading elevation raster"
        );
        self.workers.submit(FieldTask::Scalar(ScalarRequest {
            generation: self.elevation_generation,
            target: RasterTarget::Elevation,
            pixels,
            width,
            height,
            smoothing_radius: 0,
        }))
    }

    /// Drop all model-derived state and invalidate in-flight model work.
    pub fn clear_model(&mut self) {
        self.model_generation += 1;
        self.scalar = None;
        self.vector = None;
        self.contours = None;
        self.particles = None;
        self.streamlines = None;
    }

    /// Drop elevation-derived state and invalidate in-flight elevation work.
    pub fn clear_elevation(&mut self) {
        self.elevation_generation += 1;
        self.elevation = None;
        self.relief = None;
    }

    /// Apply all finished worker outcomes, returning how many were applied.
    ///
    /// Outcomes from superseded loads are discarded. A finished model scalar
    /// chains the gradient and contour tasks; a finished gradient seeds the
    /// particle pool and streamlines, which is why polling needs the rng.
    /// Follow-on tasks that were deferred because the queue was full are
    /// resubmitted first, dropping those whose generation has been superseded.
    pub fn poll(&mut self, rng: &mut dyn RngCore) -> usize {
        self.flush_deferred();
        let outcomes = self.workers.drain_outcomes();
        let mut applied = 0;
        for outcome in outcomes {
            if self.apply_outcome(outcome, rng) {
                applied += 1;
            }
        }
        applied
    }

    /// Submit a follow-on task, keeping it for a later retry when the queue
    /// is full. Chained work is never silently lost.
    fn submit_follow_on(&mut self, task: FieldTask) {
        if let Some(task) = self.workers.submit_or_return(task) {
            debug!(generation = task.generation(), "deferring follow-on task");
            self.deferred.push(task);
        }
    }

    fn task_is_current(&self, task: &FieldTask) -> bool {
        match task {
            FieldTask::Scalar(req) => match req.target {
                RasterTarget::Model => req.generation == self.model_generation,
                RasterTarget::Elevation => req.generation == self.elevation_generation,
            },
            FieldTask::Gradient(req) => req.generation == self.model_generation,
            FieldTask::Contours(req) => req.generation == self.model_generation,
            FieldTask::Relief(req) => req.generation == self.elevation_generation,
        }
    }

    fn flush_deferred(&mut self) {
        if self.deferred.is_empty() {
            return;
        }
        let tasks = std::mem::take(&mut self.deferred);
        for task in tasks {
            if !self.task_is_current(&task) {
                debug!(generation = task.generation(), "dropping stale deferred task");
                continue;
            }
            if let Some(task) = self.workers.submit_or_return(task) {
                self.deferred.push(task);
            }
        }
    }

    fn apply_outcome(&mut self, outcome: FieldOutcome, rng: &mut dyn RngCore) -> bool {
        match outcome {
            FieldOutcome::Scalar {
                generation,
                target: RasterTarget::Model,
                result,
            } => {
                if generation != self.model_generation {
                    debug!(generation, "dropping stale model scalar");
                    return false;
                }
                match result {
                    Ok(grid) => {
                        let grid = Arc::new(grid);
                        self.scalar = Some(Arc::clone(&grid));
                        self.submit_follow_on(FieldTask::Gradient(GradientRequest {
                            generation,
                            scalar: Arc::clone(&grid),
                            normalize: self.config.normalize_gradient,
                        }));
                        self.submit_follow_on(FieldTask::Contours(ContourRequest {
                            generation,
                            scalar: grid,
                            thresholds: self.config.thresholds.clone(),
                        }));
                        self.notify(FieldReady::Scalar);
                        true
                    }
                    Err(e) => {
                        warn!(generation, error = %e, "model raster failed to decode");
                        false
                    }
                }
            }
            FieldOutcome::Scalar {
                generation,
                target: RasterTarget::Elevation,
                result,
            } => {
                if generation != self.elevation_generation {
                    debug!(generation, "dropping stale elevation scalar");
                    return false;
                }
                match result {
                    Ok(grid) => {
                        let grid = Arc::new(grid);
                        self.elevation = Some(Arc::clone(&grid));
                        self.submit_follow_on(FieldTask::Relief(ReliefRequest {
                            generation,
                            elevation: grid,
                            smoothing_radius: self.config.relief_smoothing,
                        }));
                        self.notify(FieldReady::Elevation);
                        true
                    }
                    Err(e) => {
                        warn!(generation, error = %e, "elevation raster failed to decode");
                        false
                    }
                }
            }
            FieldOutcome::Gradient { generation, grid } => {
                if generation != self.model_generation {
                    debug!(generation, "dropping stale gradient");
                    return false;
                }
                let grid = Arc::new(grid);
                let mut pool = ParticlePool::new(self.config.particle_count);
                pool.initialize(&grid, rng);
                self.particles = Some(pool);
                self.streamlines = self
                    .config
                    .streamlines
                    .as_ref()
                    .map(|cfg| StreamlineSet::build(cfg, &grid, rng));
                self.vector = Some(grid);
                self.notify(FieldReady::Gradient);
                true
            }
            FieldOutcome::Contours {
                generation,
                contours,
            } => {
                if generation != self.model_generation {
                    debug!(generation, "dropping stale contours");
                    return false;
                }
                self.contours = Some(Arc::new(contours));
                self.notify(FieldReady::Contours);
                true
            }
            FieldOutcome::Relief { generation, grid } => {
                if generation != self.elevation_generation {
                    debug!(generation, "dropping stale relief");
                    return false;
                }
                self.relief = Some(Arc::new(grid));
                self.notify(FieldReady::Relief);
                true
            }
        }
    }

    /// Sample the model scalar field; `None` while it is not built yet.
    pub fn sample_scalar(&self, lon: f32, lat: f32) -> Option<f32> {
        self.scalar.as_ref().map(|g| g.sample(lon, lat))
    }

    /// Sample the gradient field; `None` while it is not built yet.
    pub fn sample_vector(&self, lon: f32, lat: f32) -> Option<Vec2> {
        self.vector.as_ref().map(|g| g.sample(lon, lat))
    }

    /// Shade one frame's visible samples; empty until the elevation grid is
    /// ready. Hillshade joins in once the relief grid lands.
    pub fn shade_view(&self, samples: &[ViewSample]) -> Vec<ShadedSample> {
        let Some(elevation) = &self.elevation else {
            return Vec::new();
        };
        shade_view(
            elevation,
            self.relief.as_deref(),
            samples,
            &self.lights,
            &self.shading,
        )
    }

    /// Advance the particle pool by one full step. A no-op until the
    /// gradient field and pool exist.
    pub fn step_advection(&mut self, rng: &mut dyn RngCore) {
        let Some(vector) = &self.vector else {
            return;
        };
        if let Some(pool) = &mut self.particles {
            pool.step(vector, rng);
        }
    }

    /// Run advection steps until `max_steps` or the flag requests a stop.
    /// Returns the number of completed steps; each step runs to completion.
    pub fn run_advection(
        &mut self,
        flag: &LoopFlag,
        max_steps: usize,
        rng: &mut dyn RngCore,
    ) -> usize {
        let mut steps = 0;
        while steps < max_steps && !flag.should_stop() {
            self.step_advection(rng);
            steps += 1;
        }
        steps
    }

    /// Re-seed particles for a new visible region and re-roll random
    /// streamline starts.
    pub fn update_view(&mut self, bounds: SpawnBounds, rng: &mut dyn RngCore) {
        let Some(vector) = &self.vector else {
            return;
        };
        if let Some(pool) = &mut self.particles {
            pool.set_bounds(bounds);
            pool.initialize(vector, rng);
        }
        if let Some(streamlines) = &mut self.streamlines {
            streamlines.rebuild(vector, rng);
        }
    }

    pub fn is_scalar_ready(&self) -> bool {
        self.scalar.is_some()
    }

    pub fn is_gradient_ready(&self) -> bool {
        self.vector.is_some()
    }

    pub fn contours(&self) -> Option<&[Contour]> {
        self.contours.as_deref().map(|c| c.as_slice())
    }

    pub fn particles(&self) -> Option<&ParticlePool> {
        self.particles.as_ref()
    }

    pub fn streamlines(&self) -> Option<&StreamlineSet> {
        self.streamlines.as_ref()
    }
}
