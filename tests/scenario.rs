//! End-to-end runs of the standard model.

use approx::assert_relative_eq;
use ndarray::s;
use tgcm::config::ModelConfig;
use tgcm::integrator::Integrator;
use tgcm_core::component::RunPhase;
use tgcm_core::parameters::{GridParameters, EARTH_DAY};
use tgcm_core::thermodynamics::update_geopotential;

fn small_config() -> ModelConfig {
    let mut config = ModelConfig::default();
    config.grid = GridParameters {
        nlat: 24,
        nlon: 36,
        pole_lower_lat_limit: 70.0,
        pole_higher_lat_limit: 80.0,
        polar_grid_padding: 1,
        ..Default::default()
    };
    config.tracer.sources.clear();
    config
}

mod earth_like_run {
    use super::*;

    /// Ten days of spin-up followed by a hundred steps of full dynamics.
    #[test]
    fn test_default_scenario_stays_bounded() {
        let config = ModelConfig::default();
        let mut integrator = Integrator::from_config(&config).unwrap();
        assert_eq!(integrator.grid().shape_3d(), (46, 72, 18));

        integrator.run_until(config.time.spinup_length).unwrap();
        assert_eq!(integrator.phase(), RunPhase::Main);
        assert_eq!(integrator.step_count(), 480);

        let report = integrator.run_steps(100).unwrap().unwrap();
        assert_eq!(report.phase, RunPhase::Main);
        assert_relative_eq!(integrator.elapsed(), 10.0 * EARTH_DAY + 100.0 * 900.0);

        let state = integrator.state();
        assert!(state
            .surface_temperature
            .iter()
            .all(|t| (250.0..=320.0).contains(t)));
        assert!(state.first_non_finite_velocity().is_none());
        assert!(state.potential_temperature.iter().all(|t| t.is_finite()));
        assert!(state.tracer.iter().all(|q| q.is_finite()));
        assert!(state.tracer_mass(integrator.grid()) > 0.0);
    }

    /// Radiation warms the summer hemisphere and cools the winter pole.
    #[test]
    fn test_spinup_builds_seasonal_contrast() {
        let mut config = small_config();
        config.time.spinup_length = 2.0 * EARTH_DAY;
        let mut integrator = Integrator::from_config(&config).unwrap();
        integrator.run_until(2.0 * EARTH_DAY).unwrap();

        let state = integrator.state();
        let zonal_mean = |i: usize| state.surface_temperature.row(i).mean().unwrap();
        assert!(zonal_mean(23) > 290.0);
        assert!(zonal_mean(0) < 290.0);
        // Winds stay frozen during spin-up
        assert!(state.u.iter().all(|u| *u == 0.0));
    }
}

mod vertical_lid {
    use super::*;

    #[test]
    fn test_lid_levels_unchanged_by_main_step() {
        let mut config = small_config();
        config.time.spinup_length = 0.0;
        let mut integrator = Integrator::from_config(&config).unwrap();
        let top = integrator.grid().top_level_index();

        {
            let grid = integrator.grid().clone();
            let state = integrator.state_mut();
            for ((i, j, k), theta) in state.potential_temperature.indexed_iter_mut() {
                *theta += 3.0 * (j as f64 * 0.3).sin() * (i as f64 * 0.25).cos() + k as f64;
            }
            for ((i, j, k), tracer) in state.tracer.indexed_iter_mut() {
                *tracer = 1e-3 * (i * 7 + j * 3 + k) as f64;
            }
            for ((i, j, _), u) in state.u.indexed_iter_mut() {
                *u = 12.0 * grid.cos_latitudes()[i] + (j as f64 * 0.5).cos();
            }
            update_geopotential(
                state.potential_temperature.view(),
                grid.sigma(),
                &mut state.geopotential,
            );
        }
        integrator.sync_planes();
        let before = integrator.state().clone();

        let report = integrator.step().unwrap();
        assert_eq!(report.phase, RunPhase::Main);

        let state = integrator.state();
        assert!(state.w.slice(s![.., .., top..]).iter().all(|w| *w == 0.0));
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
        assert!(state.tracer.slice(s![.., .., ..top]) != before.tracer.slice(s![.., .., ..top]));
    }
}
