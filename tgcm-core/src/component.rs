use crate::errors::GcmResult;
use crate::grid::Grid;
use crate::parameters::TimeParameters;
use crate::polar::PolarPlanes;
use crate::state::ModelState;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Phase of an integration.
///
/// The model spins up with frozen winds and a long time step so the surface
/// and lowest level can approach radiative balance, then switches to the full
/// dynamics once the spin-up period has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Spinup,
    Main,
}

impl RunPhase {
    /// Phase of a run that has integrated for `elapsed` seconds.
    pub fn at(elapsed: f64, spinup_length: f64) -> Self {
        if elapsed >= spinup_length {
            RunPhase::Main
        } else {
            RunPhase::Spinup
        }
    }

    pub fn time_step(self, time: &TimeParameters) -> f64 {
        match self {
            RunPhase::Spinup => time.dt_spinup,
            RunPhase::Main => time.dt_main,
        }
    }

    /// Whether the wind fields evolve in this phase.
    pub fn velocity_enabled(self) -> bool {
        matches!(self, RunPhase::Main)
    }
}

/// Information about the step being solved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    /// Elapsed model time at the start of the step (s)
    pub time: f64,
    /// Length of the step (s)
    pub dt: f64,
    pub phase: RunPhase,
}

/// A stage of the model pipeline.
///
/// Components mutate the shared [`ModelState`] in place. They are solved in a
/// fixed order every step; a component that only applies to some phases
/// reports so through [`Component::active`].
#[typetag::serde]
pub trait Component: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the component runs during `phase`.
    fn active(&self, _phase: RunPhase) -> bool {
        true
    }

    /// Check the component can run on `grid`. Called once before the first step.
    fn validate(&self, _grid: &Grid) -> GcmResult<()> {
        Ok(())
    }

    fn solve(
        &self,
        context: &StepContext,
        grid: &Grid,
        planes: &mut PolarPlanes,
        state: &mut ModelState,
    ) -> GcmResult<()>;
}
