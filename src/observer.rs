//! Hooks called by the integrator after completed steps.

use log::info;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tgcm_core::checkpoint::Checkpoint;
use tgcm_core::component::RunPhase;
use tgcm_core::errors::GcmResult;
use tgcm_core::grid::Grid;
use tgcm_core::polar::PolarPlanes;
use tgcm_core::state::ModelState;

/// Read-only view of the model after a completed step.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub grid: &'a Grid,
    pub planes: &'a PolarPlanes,
    pub state: &'a ModelState,
    /// Elapsed model time (s)
    pub time: f64,
    pub phase: RunPhase,
    /// Number of steps completed
    pub step: usize,
}

/// Receives a [`Snapshot`] every few steps.
///
/// Observers are used for checkpointing and visualization. An error from an
/// observer stops the integration.
pub trait StepObserver: Debug {
    fn observe(&mut self, snapshot: &Snapshot<'_>) -> GcmResult<()>;
}

/// Writes a [`Checkpoint`] to a fixed path, replacing the previous one.
#[derive(Debug, Clone)]
pub struct CheckpointWriter {
    path: PathBuf,
}

impl CheckpointWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StepObserver for CheckpointWriter {
    fn observe(&mut self, snapshot: &Snapshot<'_>) -> GcmResult<()> {
        Checkpoint::capture(snapshot.state, snapshot.planes, snapshot.time).save(&self.path)?;
        info!(
            "Saved checkpoint at step {} to {}",
            snapshot.step,
            self.path.display()
        );
        Ok(())
    }
}
