//! Background worker pool for field construction.
//!
//! Heavy per-pixel work (raster decoding, gradient building, relief
//! smoothing, contour extraction) runs on dedicated threads. Tasks and
//! outcomes are plain enums over bounded channels; every task owns its input
//! (grids travel as `Arc` snapshots) and every outcome is a complete
//! immutable buffer, so no memory is shared mutably across threads.
//!
//! Each task carries the `generation` of the load that spawned it. The
//! caller drains outcomes on its own thread and discards any whose
//! generation is stale, which is how a new load supersedes an in-flight one
//! without aborting it.
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use crate::contour::{extract_contours, Contour};
use crate::field::gradient::gradient_from_scalar;
use crate::field::grid::{ScalarGrid, VectorGrid};
use crate::field::raster::scalar_from_rgba;
use crate::field::smooth::box_blur;

/// Which grid a raster decode feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasterTarget {
    /// The model scalar field driving gradients and contours.
    Model,
    /// The elevation field driving shading.
    Elevation,
}

#[derive(Debug)]
pub struct ScalarRequest {
    pub generation: u64,
    pub target: RasterTarget,
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub smoothing_radius: usize,
}

#[derive(Debug)]
pub struct GradientRequest {
    pub generation: u64,
    pub scalar: Arc<ScalarGrid>,
    pub normalize: bool,
}

#[derive(Debug)]
pub struct ContourRequest {
    pub generation: u64,
    pub scalar: Arc<ScalarGrid>,
    pub thresholds: Vec<f32>,
}

#[derive(Debug)]
pub struct ReliefRequest {
    pub generation: u64,
    pub elevation: Arc<ScalarGrid>,
    pub smoothing_radius: usize,
}

/// A unit of background work.
#[derive(Debug)]
pub enum FieldTask {
    Scalar(ScalarRequest),
    Gradient(GradientRequest),
    Contours(ContourRequest),
    Relief(ReliefRequest),
}

impl FieldTask {
    pub fn generation(&self) -> u64 {
        match self {
            FieldTask::Scalar(req) => req.generation,
            FieldTask::Gradient(req) => req.generation,
            FieldTask::Contours(req) => req.generation,
            FieldTask::Relief(req) => req.generation,
        }
    }
}

/// A finished unit of background work.
#[derive(Debug)]
pub enum FieldOutcome {
    Scalar {
        generation: u64,
        target: RasterTarget,
        result: crate::error::Result<ScalarGrid>,
    },
    Gradient {
        generation: u64,
        grid: VectorGrid,
    },
    Contours {
        generation: u64,
        contours: Vec<Contour>,
    },
    Relief {
        generation: u64,
        grid: ScalarGrid,
    },
}

impl FieldOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            FieldOutcome::Scalar { generation, .. }
            | FieldOutcome::Gradient { generation, .. }
            | FieldOutcome::Contours { generation, .. }
            | FieldOutcome::Relief { generation, .. } => *generation,
        }
    }
}

/// Run one task synchronously. Workers call this; tests can too.
pub fn run_task(task: FieldTask) -> FieldOutcome {
    match task {
        FieldTask::Scalar(req) => FieldOutcome::Scalar {
            generation: req.generation,
            target: req.target,
            result: scalar_from_rgba(&req.pixels, req.width, req.height, req.smoothing_radius),
        },
        FieldTask::Gradient(req) => FieldOutcome::Gradient {
            generation: req.generation,
            grid: gradient_from_scalar(&req.scalar, req.normalize),
        },
        FieldTask::Contours(req) => FieldOutcome::Contours {
            generation: req.generation,
            contours: extract_contours(&req.scalar, &req.thresholds),
        },
        FieldTask::Relief(req) => {
            let mut grid = (*req.elevation).clone();
            box_blur(&mut grid, req.smoothing_radius);
            FieldOutcome::Relief {
                generation: req.generation,
                grid,
            }
        }
    }
}

/// A pool of worker threads processing [FieldTask]s.
///
/// Dropping the pool closes the task channel; workers drain what is queued
/// and exit.
pub struct FieldWorkerPool {
    task_tx: Sender<FieldTask>,
    outcome_rx: Receiver<FieldOutcome>,
}

impl FieldWorkerPool {
    /// Spawn `threads` workers with task/outcome queues of `queue_capacity`.
    ///
    /// Zero threads leaves submitted tasks queued forever; useful for tests
    /// that inspect queue behavior.
    pub fn new(threads: usize, queue_capacity: usize) -> Self {
        let (task_tx, task_rx) = bounded::<FieldTask>(queue_capacity);
        let (outcome_tx, outcome_rx) = bounded::<FieldOutcome>(queue_capacity);

        for id in 0..threads {
            let task_rx = task_rx.clone();
            let outcome_tx = outcome_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("field-worker-{id}"))
                .spawn(move || {
                    while let Ok(task) = task_rx.recv() {
                        // Receiver gone means the pool is shutting down.
                        if outcome_tx.send(run_task(task)).is_err() {
                            break;
                        }
                    }
                    debug!(worker = id, "field worker exiting");
                });
            if let Err(e) = spawned {
                warn!(worker = id, error = %e, "failed to spawn field worker");
            }
        }

        Self {
            task_tx,
            outcome_rx,
        }
    }

    /// Submit a task without blocking. Returns `false` when the queue is
    /// full or the pool is shut down.
    pub fn submit(&self, task: FieldTask) -> bool {
        match self.task_tx.try_send(task) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("field task queue full; dropping task");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("field worker pool disconnected; dropping task");
                false
            }
        }
    }

    /// Like [submit](Self::submit), but hands a rejected task back to the
    /// caller instead of dropping it, so the caller can retry later.
    pub fn submit_or_return(&self, task: FieldTask) -> Option<FieldTask> {
        match self.task_tx.try_send(task) {
            Ok(()) => None,
            Err(TrySendError::Full(task)) => {
                warn!("field task queue full; handing task back");
                Some(task)
            }
            Err(TrySendError::Disconnected(task)) => {
                warn!("field worker pool disconnected; handing task back");
                Some(task)
            }
        }
    }

    /// Drain all currently finished outcomes without blocking.
    pub fn drain_outcomes(&self) -> Vec<FieldOutcome> {
        let mut out = Vec::new();
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            out.push(outcome);
        }
        out
    }
}
