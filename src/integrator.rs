//! Time integration
//!
//! The [`Integrator`] owns the grid, the polar planes and the model state and
//! advances them through the [`Pipeline`] one step at a time.
//!
//! A run has two phases. During spin-up the winds stay frozen and a long
//! step is used so the surface and lowest level can approach radiative
//! balance. Once `spinup_length` seconds have elapsed the integrator switches
//! to the main phase with the full dynamics and a shorter step. The phase is
//! a pure function of the elapsed time, so a run resumed from a checkpoint
//! continues in the correct phase.
//!
//! After the pipeline has been solved, every wind component is checked for
//! non-finite values. A diverged step returns
//! [`GcmError::NumericalDivergence`] and leaves the clock where it was; the
//! state is not rolled back.

use crate::config::ModelConfig;
use crate::observer::{CheckpointWriter, Snapshot, StepObserver};
use crate::pipeline::Pipeline;
use log::{debug, error, info};
use std::fmt;
use std::time::Instant;
use tgcm_core::checkpoint::Checkpoint;
use tgcm_core::component::{RunPhase, StepContext};
use tgcm_core::errors::{GcmError, GcmResult};
use tgcm_core::grid::Grid;
use tgcm_core::parameters::{TimeParameters, EARTH_DAY};
use tgcm_core::polar::PolarPlanes;
use tgcm_core::state::ModelState;

/// Summary of a completed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Number of steps completed, including this one
    pub step: usize,
    /// Elapsed model time at the end of the step (s)
    pub time: f64,
    pub dt: f64,
    pub phase: RunPhase,
    /// Lowest and highest surface temperature (K)
    pub surface_temperature: (f64, f64),
    /// Largest wind speed magnitude in `u` and `v` (m/s)
    pub max_wind: f64,
    /// Largest pressure velocity magnitude (Pa/s)
    pub max_omega: f64,
}

impl StepReport {
    fn new(step: usize, context: &StepContext, state: &ModelState) -> Self {
        let surface = state
            .surface_temperature
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
                (lo.min(*t), hi.max(*t))
            });
        let max_abs = |values: &ndarray::Array3<f64>| {
            values.iter().fold(0.0f64, |acc, x| acc.max(x.abs()))
        };
        Self {
            step,
            time: context.time + context.dt,
            dt: context.dt,
            phase: context.phase,
            surface_temperature: surface,
            max_wind: max_abs(&state.u).max(max_abs(&state.v)),
            max_omega: max_abs(&state.w),
        }
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} day {:.3} ({:?}): T_s {:.2}..{:.2} K, |V| <= {:.3e} m/s, |w| <= {:.3e} Pa/s",
            self.step,
            self.time / EARTH_DAY,
            self.phase,
            self.surface_temperature.0,
            self.surface_temperature.1,
            self.max_wind,
            self.max_omega
        )
    }
}

#[derive(Debug)]
struct ObserverEntry {
    observer: Box<dyn StepObserver>,
    frequency: usize,
}

/// Owns the model and steps it forward in time.
#[derive(Debug)]
pub struct Integrator {
    grid: Grid,
    planes: PolarPlanes,
    state: ModelState,
    pipeline: Pipeline,
    time: TimeParameters,
    /// Elapsed model time (s)
    elapsed: f64,
    step_count: usize,
    plot_frequency: usize,
    observers: Vec<ObserverEntry>,
}

impl Integrator {
    /// Build the standard model described by `config`.
    ///
    /// Resumes from the configured checkpoint when `output.load` is set and
    /// registers a [`CheckpointWriter`] when `output.save` is set.
    pub fn from_config(config: &ModelConfig) -> GcmResult<Self> {
        config.validate()?;
        let grid = Grid::new(&config.grid, &config.planet)?;
        let planes = PolarPlanes::new(&grid, &config.grid)?;
        let state = config.initial_state(&grid)?;
        let mut integrator = Self::new(
            grid,
            planes,
            state,
            Pipeline::standard(config),
            config.time.clone(),
        )?;
        integrator.plot_frequency = config.output.plot_frequency;

        let output = &config.output;
        if output.load {
            let checkpoint = Checkpoint::load(&output.checkpoint_path)?;
            integrator.restore(checkpoint)?;
            info!(
                "Resumed from {} at day {:.3}",
                output.checkpoint_path.display(),
                integrator.elapsed / EARTH_DAY
            );
        }
        if output.save {
            integrator.add_observer(
                Box::new(CheckpointWriter::new(&output.checkpoint_path)),
                output.save_frequency,
            );
        }
        Ok(integrator)
    }

    pub fn new(
        grid: Grid,
        mut planes: PolarPlanes,
        state: ModelState,
        pipeline: Pipeline,
        time: TimeParameters,
    ) -> GcmResult<Self> {
        time.validate()?;
        state.validate(&grid)?;
        pipeline.validate(&grid)?;
        for plane in planes.iter_mut() {
            plane.sync_velocity(state.u.view(), state.v.view());
        }
        info!(
            "Model on a {}x{}x{} grid with stages {:?}",
            grid.nlat(),
            grid.nlon(),
            grid.nlevels(),
            pipeline.names()
        );
        Ok(Self {
            grid,
            planes,
            state,
            pipeline,
            time,
            elapsed: 0.0,
            step_count: 0,
            plot_frequency: 1,
            observers: vec![],
        })
    }

    /// Call `observer` after every `frequency`-th step.
    ///
    /// A frequency of zero is treated as one.
    pub fn add_observer(&mut self, observer: Box<dyn StepObserver>, frequency: usize) {
        self.observers.push(ObserverEntry {
            observer,
            frequency: frequency.max(1),
        });
    }

    /// Register a visualization hook, called every `plot_frequency` steps.
    pub fn add_visualization(&mut self, observer: Box<dyn StepObserver>) {
        self.add_observer(observer, self.plot_frequency);
    }

    pub fn phase(&self) -> RunPhase {
        RunPhase::at(self.elapsed, self.time.spinup_length)
    }

    /// Advance the model by one step of the current phase.
    pub fn step(&mut self) -> GcmResult<StepReport> {
        let phase = self.phase();
        let context = StepContext {
            time: self.elapsed,
            dt: phase.time_step(&self.time),
            phase,
        };

        for stage in self.pipeline.stages(phase) {
            let start = Instant::now();
            stage.solve(&context, &self.grid, &mut self.planes, &mut self.state)?;
            debug!("{} took {:?}", stage.name(), start.elapsed());
        }

        if let Some(field) = self.state.first_non_finite_velocity() {
            error!(
                "Non-finite {} after the step starting at day {:.3}",
                field,
                self.elapsed / EARTH_DAY
            );
            return Err(GcmError::NumericalDivergence {
                field: field.to_string(),
                time: self.elapsed,
            });
        }

        self.elapsed += context.dt;
        self.step_count += 1;
        let report = StepReport::new(self.step_count, &context, &self.state);
        info!("{report}");

        let snapshot = Snapshot {
            grid: &self.grid,
            planes: &self.planes,
            state: &self.state,
            time: self.elapsed,
            phase: self.phase(),
            step: self.step_count,
        };
        for entry in self
            .observers
            .iter_mut()
            .filter(|entry| snapshot.step % entry.frequency == 0)
        {
            entry.observer.observe(&snapshot)?;
        }
        Ok(report)
    }

    /// Take `steps` steps, stopping at the first error.
    pub fn run_steps(&mut self, steps: usize) -> GcmResult<Option<StepReport>> {
        let mut last = None;
        for _ in 0..steps {
            last = Some(self.step()?);
        }
        Ok(last)
    }

    /// Step until at least `time` seconds have elapsed.
    pub fn run_until(&mut self, time: f64) -> GcmResult<Option<StepReport>> {
        let mut last = None;
        while self.elapsed < time {
            last = Some(self.step()?);
        }
        Ok(last)
    }

    /// Step while `predicate` holds for the integrator.
    pub fn run_while<F>(&mut self, mut predicate: F) -> GcmResult<Option<StepReport>>
    where
        F: FnMut(&Integrator) -> bool,
    {
        let mut last = None;
        while predicate(self) {
            last = Some(self.step()?);
        }
        Ok(last)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::capture(&self.state, &self.planes, self.elapsed)
    }

    /// Replace the state and clock with those of `checkpoint`.
    ///
    /// The step counter is not part of a checkpoint and keeps counting the
    /// steps taken by this integrator.
    pub fn restore(&mut self, checkpoint: Checkpoint) -> GcmResult<()> {
        self.elapsed = checkpoint.restore(&self.grid, &mut self.state, &mut self.planes)?;
        Ok(())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn planes(&self) -> &PolarPlanes {
        &self.planes
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// Mutable access to the state, for setting up experiments.
    ///
    /// Plane velocities are not refreshed; call [`Integrator::sync_planes`]
    /// after changing the wind.
    pub fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }

    /// Resample the plane velocities from the spherical wind.
    pub fn sync_planes(&mut self) {
        for plane in self.planes.iter_mut() {
            plane.sync_velocity(self.state.u.view(), self.state.v.view());
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Elapsed model time (s).
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}
