//! Dynamics Component
//!
//! Advances the wind, diagnoses the vertical velocity and transports
//! potential temperature and the tracer.
//!
//! # What This Component Does
//!
//! 1. Steps the horizontal wind on the sphere and on both polar planes, then
//!    blends the plane solution into the polar caps (see [`velocity`])
//! 2. Diagnoses the pressure velocity from continuity on the sphere and the
//!    planes and blends the two (see [`vertical`])
//! 3. Transports potential temperature, storing its tendency in
//!    [`ModelState::scalar_tendency`] (see [`transport`])
//! 4. Transports the tracer
//!
//! Unless disabled, the wind, the vertical velocity, the potential temperature
//! tendency and potential temperature itself are passed through a zonal
//! filter along the way (see [`smoothing`]).
//!
//! The spherical grid is singular at the poles, so every quantity that is
//! differentiated horizontally is also solved on a Cartesian plane over each
//! polar cap. Between the low and high blend rows the two solutions are mixed
//! with a weight linear in latitude.
//!
//! The component only runs once the spin-up has finished; during spin-up the
//! winds stay frozen.

pub mod smoothing;
pub mod transport;
pub mod velocity;
pub mod vertical;

use crate::parameters::DynamicsParameters;
use log::debug;
use smoothing::Smoothing;
use serde::{Deserialize, Serialize};
use tgcm_core::component::{Component, RunPhase, StepContext};
use tgcm_core::errors::{GcmError, GcmResult};
use tgcm_core::grid::Grid;
use tgcm_core::polar::PolarPlanes;
use tgcm_core::state::ModelState;

/// Dynamical core.
///
/// # Parameters
///
/// See [`DynamicsParameters`] for configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dynamics {
    parameters: DynamicsParameters,
}

impl Dynamics {
    pub fn from_parameters(parameters: DynamicsParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &DynamicsParameters {
        &self.parameters
    }

    fn update_vertical_velocity(
        &self,
        grid: &Grid,
        planes: &mut PolarPlanes,
        state: &mut ModelState,
        smoothing: Option<&Smoothing>,
    ) {
        state.w = vertical::spherical_vertical_velocity(grid, state.u.view(), state.v.view());
        for plane in planes.iter_mut() {
            plane.w = vertical::plane_vertical_velocity(plane, grid);
            let cap = plane.reproject(plane.w.view());
            plane.blend_into(&mut state.w, cap.view());
        }
        if let Some(smoothing) = smoothing {
            smoothing.vertical_velocity(grid, &mut state.w);
        }
    }
}

impl Default for Dynamics {
    fn default() -> Self {
        Self::from_parameters(DynamicsParameters::default())
    }
}

#[typetag::serde]
impl Component for Dynamics {
    fn name(&self) -> &'static str {
        "dynamics"
    }

    fn active(&self, phase: RunPhase) -> bool {
        phase.velocity_enabled()
    }

    fn validate(&self, grid: &Grid) -> GcmResult<()> {
        let p = &self.parameters;
        for (name, value) in [
            ("friction", p.friction),
            ("vertical_flux_factor", p.vertical_flux_factor),
            ("theta_diffusivity", p.theta_diffusivity),
            ("tracer_diffusivity", p.tracer_diffusivity),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(GcmError::InvalidConfiguration(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        for (name, fraction) in p.smoothing.fractions() {
            if fraction.is_nan() || fraction <= 0.0 || fraction > 1.0 {
                return Err(GcmError::InvalidConfiguration(format!(
                    "smoothing fraction for {name} must lie in (0, 1], got {fraction}"
                )));
            }
        }
        if 2 * p.tracer_polar_mask_rows >= grid.nlat() {
            return Err(GcmError::InvalidConfiguration(format!(
                "tracer_polar_mask_rows={} masks the whole {}-row grid",
                p.tracer_polar_mask_rows,
                grid.nlat()
            )));
        }
        Ok(())
    }

    fn solve(
        &self,
        context: &StepContext,
        grid: &Grid,
        planes: &mut PolarPlanes,
        state: &mut ModelState,
    ) -> GcmResult<()> {
        let dt = context.dt;
        let smoothing = Smoothing::new(grid, &self.parameters.smoothing);
        let smoothing = smoothing.as_ref();

        velocity::advance(grid, planes, state, self.parameters.friction, dt, smoothing);
        self.update_vertical_velocity(grid, planes, state, smoothing);

        let mut theta_tendency =
            transport::potential_temperature_tendency(grid, planes, state, &self.parameters);
        if let Some(smoothing) = smoothing {
            smoothing.tendency(grid, &mut theta_tendency);
        }
        state
            .potential_temperature
            .scaled_add(-dt, &theta_tendency);
        state.scalar_tendency = theta_tendency;
        if let Some(smoothing) = smoothing {
            smoothing.potential_temperature(grid, &mut state.potential_temperature);
        }

        let tracer_tendency = transport::tracer_tendency(grid, state, &self.parameters);
        state.tracer.scaled_add(-dt, &tracer_tendency);

        debug!(
            "Dynamics at t={}: max |u|={:.3e} max |w|={:.3e}",
            context.time,
            state.u.iter().fold(0.0f64, |acc, x| acc.max(x.abs())),
            state.w.iter().fold(0.0f64, |acc, x| acc.max(x.abs()))
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;
    use tgcm_core::parameters::{GridParameters, PlanetParameters};
    use tgcm_core::thermodynamics::update_geopotential;

    fn setup() -> (Grid, PolarPlanes, ModelState) {
        let params = GridParameters {
            nlat: 24,
            nlon: 36,
            pole_lower_lat_limit: 70.0,
            pole_higher_lat_limit: 80.0,
            polar_grid_padding: 1,
            ..Default::default()
        };
        let grid = Grid::new(&params, &PlanetParameters::default()).unwrap();
        let planes = PolarPlanes::new(&grid, &params).unwrap();
        let state = ModelState::isothermal(&grid, 280.0, 288.0, 0.2).unwrap();
        (grid, planes, state)
    }

    fn main_step() -> StepContext {
        StepContext {
            time: 0.0,
            dt: 300.0,
            phase: RunPhase::Main,
        }
    }

    #[test]
    fn test_only_active_in_main_phase() {
        let dynamics = Dynamics::default();
        assert!(!dynamics.active(RunPhase::Spinup));
        assert!(dynamics.active(RunPhase::Main));
    }

    #[test]
    fn test_lid_levels_are_frozen() {
        let (grid, mut planes, mut state) = setup();
        for ((i, j, k), theta) in state.potential_temperature.indexed_iter_mut() {
            *theta += 2.0 * (j as f64 * 0.5).cos() * (i as f64 * 0.2).sin() + 0.1 * k as f64;
        }
        for ((i, j, k), tracer) in state.tracer.indexed_iter_mut() {
            *tracer = (i as f64 + j as f64 + k as f64) * 1e-3;
        }
        for ((i, j, _), u) in state.u.indexed_iter_mut() {
            *u = 10.0 * grid.cos_latitudes()[i] + (j as f64 * 0.4).sin();
        }
        update_geopotential(
            state.potential_temperature.view(),
            grid.sigma(),
            &mut state.geopotential,
        );
        for plane in planes.iter_mut() {
            plane.sync_velocity(state.u.view(), state.v.view());
        }
        let before = state.clone();

        let dynamics = Dynamics::default();
        dynamics.validate(&grid).unwrap();
        dynamics
            .solve(&main_step(), &grid, &mut planes, &mut state)
            .unwrap();

        let top = grid.top_level_index();
        assert!(state.first_non_finite_velocity().is_none());
        assert!(state.w.slice(s![.., .., top..]).iter().all(|x| *x == 0.0));
        assert!(state.w.slice(s![.., .., 0]).iter().all(|x| *x == 0.0));
        assert!(state
            .scalar_tendency
            .slice(s![.., .., top..])
            .iter()
            .all(|x| *x == 0.0));
        assert_eq!(
            state.potential_temperature.slice(s![.., .., top..]),
            before.potential_temperature.slice(s![.., .., top..])
        );
        assert_eq!(
            state.tracer.slice(s![.., .., top..]),
            before.tracer.slice(s![.., .., top..])
        );
        // Below the lid the flow does something
        assert!(state
            .scalar_tendency
            .slice(s![.., .., 1..top - 1])
            .iter()
            .any(|x| *x != 0.0));
        for plane in planes.iter() {
            assert!(plane.w.slice(s![.., .., top..]).iter().all(|x| *x == 0.0));
        }
    }

    #[test]
    fn test_atmosphere_at_rest_stays_at_rest() {
        let (grid, mut planes, mut state) = setup();
        update_geopotential(
            state.potential_temperature.view(),
            grid.sigma(),
            &mut state.geopotential,
        );
        let before = state.clone();
        let dynamics = Dynamics::from_parameters(DynamicsParameters {
            theta_diffusivity: 0.0,
            ..Default::default()
        });
        dynamics
            .solve(&main_step(), &grid, &mut planes, &mut state)
            .unwrap();
        assert!(state.u.iter().all(|x| x.abs() < 1e-12));
        assert!(state.w.iter().all(|x| x.abs() < 1e-12));
        assert_eq!(state.tracer, before.tracer);
        for (after, before) in state
            .potential_temperature
            .iter()
            .zip(before.potential_temperature.iter())
        {
            assert!((after - before).abs() < 1e-9);
        }
    }

    #[test]
    fn test_validate_rejects_negative_friction() {
        let (grid, _, _) = setup();
        let dynamics = Dynamics::from_parameters(DynamicsParameters {
            friction: -1.0,
            ..Default::default()
        });
        assert!(matches!(
            dynamics.validate(&grid),
            Err(GcmError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_full_mask() {
        let (grid, _, _) = setup();
        let dynamics = Dynamics::from_parameters(DynamicsParameters {
            tracer_polar_mask_rows: 12,
            ..Default::default()
        });
        assert!(dynamics.validate(&grid).is_err());
    }

    #[test]
    fn test_validate_rejects_smoothing_fraction() {
        let (grid, _, _) = setup();
        let mut parameters = DynamicsParameters::default();
        parameters.smoothing.w = 0.0;
        let dynamics = Dynamics::from_parameters(parameters);
        assert!(matches!(
            dynamics.validate(&grid),
            Err(GcmError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_polar_noise_does_not_grow() {
        let params = GridParameters::default();
        let grid = Grid::new(&params, &PlanetParameters::default()).unwrap();
        let mut planes = PolarPlanes::new(&grid, &params).unwrap();
        let mut state = ModelState::isothermal(&grid, 290.0, 290.0, 0.2).unwrap();
        let row = grid.nlat() - 2;
        for ((i, j, _), u) in state.u.indexed_iter_mut() {
            if i == row {
                *u = 1e-8 * (j as f64 * 1.7).sin();
            }
        }
        for plane in planes.iter_mut() {
            plane.sync_velocity(state.u.view(), state.v.view());
        }

        let dynamics = Dynamics::default();
        dynamics.validate(&grid).unwrap();
        let mut context = StepContext {
            time: 0.0,
            dt: 900.0,
            phase: RunPhase::Main,
        };
        for _ in 0..30 {
            update_geopotential(
                state.potential_temperature.view(),
                grid.sigma(),
                &mut state.geopotential,
            );
            dynamics
                .solve(&context, &grid, &mut planes, &mut state)
                .unwrap();
            context.time += context.dt;
        }
        let max_wind = state
            .u
            .iter()
            .chain(state.v.iter())
            .fold(0.0f64, |acc, x| acc.max(x.abs()));
        assert!(max_wind < 1e-4, "polar noise grew to {max_wind:e}");
    }
}
