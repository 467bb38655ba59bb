//! Radiation Component
//!
//! A single-layer surface energy balance driven by the diurnal and seasonal
//! cycle of insolation, coupled to the lowest model level.
//!
//! # Physics Overview
//!
//! Top-of-atmosphere insolation at latitude $\phi$ is
//!
//! $$S(\phi, \lambda, t) = S_0 \max(0, \sin\phi\sin\delta + \cos\phi\cos\delta\cos h)$$
//!
//! where $\delta = \epsilon\cos(2\pi t / Y)$ is the solar declination for an
//! axial tilt $\epsilon$ and year length $Y$, and $h$ is the hour angle of the
//! cell relative to the sub-solar longitude. The sub-solar point starts on
//! the prime meridian and moves westward once per day.
//!
//! The surface absorbs $(1 - \alpha) S$ and emits $\varepsilon\sigma T^4$ to space:
//!
//! $$C \frac{dT}{dt} = (1 - \alpha) S - \varepsilon\sigma T^4$$
//!
//! The emission term is linearised about the current temperature, which keeps
//! the update stable for time steps much longer than the radiative timescale.
//! Finally the lowest level of potential temperature is relaxed towards the
//! surface temperature.

use crate::parameters::RadiationParameters;
use serde::{Deserialize, Serialize};
use tgcm_core::component::{Component, StepContext};
use tgcm_core::errors::{GcmError, GcmResult};
use tgcm_core::grid::Grid;
use tgcm_core::parameters::PlanetParameters;
use tgcm_core::polar::PolarPlanes;
use tgcm_core::state::ModelState;
use tgcm_core::thermodynamics::STEFAN_BOLTZMANN;

/// Surface energy balance component.
///
/// # Parameters
///
/// See [`RadiationParameters`] for configuration options. The orbit and day
/// length come from [`PlanetParameters`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Radiation {
    parameters: RadiationParameters,
    planet: PlanetParameters,
}

impl Radiation {
    pub fn from_parameters(parameters: RadiationParameters, planet: PlanetParameters) -> Self {
        Self { parameters, planet }
    }

    pub fn parameters(&self) -> &RadiationParameters {
        &self.parameters
    }

    /// Solar declination at `time` (degrees).
    pub fn declination(&self, time: f64) -> f64 {
        self.planet.axial_tilt * (2.0 * std::f64::consts::PI * time / self.planet.year).cos()
    }

    /// Longitude directly beneath the sun at `time` (degrees).
    pub fn subsolar_longitude(&self, time: f64) -> f64 {
        (-time).rem_euclid(self.planet.day) * 360.0 / self.planet.day
    }

    /// Insolation at the top of the atmosphere (W/m^2).
    pub fn insolation(&self, latitude: f64, longitude: f64, time: f64) -> f64 {
        let phi = latitude.to_radians();
        let delta = self.declination(time).to_radians();
        let hour_angle = (longitude - self.subsolar_longitude(time)).to_radians();
        let cos_zenith = phi.sin() * delta.sin() + phi.cos() * delta.cos() * hour_angle.cos();
        self.parameters.insolation * cos_zenith.max(0.0)
    }

    /// Surface temperature after a step of length `dt`.
    ///
    /// Implicit in the linearised emission term.
    pub fn step_surface_temperature(
        &self,
        temperature: f64,
        albedo: f64,
        insolation: f64,
        dt: f64,
    ) -> f64 {
        let emissivity = self.parameters.emissivity;
        let emitted = emissivity * STEFAN_BOLTZMANN * temperature.powi(4);
        let damping = 4.0 * emissivity * STEFAN_BOLTZMANN * temperature.powi(3);
        let net = (1.0 - albedo) * insolation - emitted;
        temperature + dt * net / (self.parameters.heat_capacity + dt * damping)
    }
}

#[typetag::serde]
impl Component for Radiation {
    fn name(&self) -> &'static str {
        "radiation"
    }

    fn validate(&self, _grid: &Grid) -> GcmResult<()> {
        let p = &self.parameters;
        if p.insolation < 0.0 {
            return Err(GcmError::InvalidConfiguration(
                "insolation must be non-negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&p.albedo) {
            return Err(GcmError::InvalidConfiguration(format!(
                "albedo must be in [0, 1], got {}",
                p.albedo
            )));
        }
        if p.emissivity <= 0.0 || p.emissivity > 1.0 {
            return Err(GcmError::InvalidConfiguration(format!(
                "emissivity must be in (0, 1], got {}",
                p.emissivity
            )));
        }
        if p.heat_capacity <= 0.0 || p.surface_coupling_timescale <= 0.0 {
            return Err(GcmError::InvalidConfiguration(
                "heat_capacity and surface_coupling_timescale must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn solve(
        &self,
        context: &StepContext,
        grid: &Grid,
        _planes: &mut PolarPlanes,
        state: &mut ModelState,
    ) -> GcmResult<()> {
        let relaxation = (context.dt / self.parameters.surface_coupling_timescale).min(1.0);
        let latitudes = grid.latitudes();
        let longitudes = grid.longitudes();

        for ((i, j), surface) in state.surface_temperature.indexed_iter_mut() {
            let insolation = self.insolation(latitudes[i], longitudes[j], context.time);
            *surface =
                self.step_surface_temperature(*surface, state.albedo[[i, j]], insolation, context.dt);

            let lowest = &mut state.potential_temperature[[i, j, 0]];
            *lowest += relaxation * (*surface - *lowest);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tgcm_core::component::RunPhase;
    use tgcm_core::parameters::GridParameters;

    fn radiation() -> Radiation {
        Radiation::from_parameters(RadiationParameters::default(), PlanetParameters::default())
    }

    #[test]
    fn test_subsolar_point_receives_full_insolation() {
        let component = radiation();
        // Northern summer solstice at t = 0
        assert_relative_eq!(component.declination(0.0), 23.5);
        assert_relative_eq!(component.insolation(23.5, 0.0, 0.0), 1370.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sun_moves_westward() {
        let component = radiation();
        let day = PlanetParameters::default().day;
        assert_relative_eq!(component.subsolar_longitude(0.0), 0.0);
        assert_relative_eq!(component.subsolar_longitude(0.25 * day), 270.0, epsilon = 1e-9);
        assert_relative_eq!(component.subsolar_longitude(day), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_night_side_is_dark() {
        let component = radiation();
        assert_eq!(component.insolation(0.0, 180.0, 0.0), 0.0);
        assert_eq!(component.insolation(23.5, 120.0, 0.0), 0.0);
    }

    #[test]
    fn test_polar_night_and_day_at_solstice() {
        let component = radiation();
        for lon in (0..36).map(|j| j as f64 * 10.0) {
            assert_eq!(component.insolation(-80.0, lon, 0.0), 0.0);
            assert!(component.insolation(80.0, lon, 0.0) > 0.0);
        }
    }

    #[test]
    fn test_surface_in_balance_is_unchanged() {
        let component = radiation();
        let absorbed = 0.8 * 1000.0;
        let temperature = (absorbed / (0.6 * STEFAN_BOLTZMANN)).powf(0.25);
        let next = component.step_surface_temperature(temperature, 0.2, 1000.0, 1800.0);
        assert_relative_eq!(next, temperature, max_relative = 1e-12);
    }

    #[test]
    fn test_cooling_without_sunlight_is_stable() {
        let component = radiation();
        let next = component.step_surface_temperature(290.0, 0.2, 0.0, 1800.0);
        assert!(next < 290.0);

        // A step far longer than the radiative timescale does not overshoot
        let next = component.step_surface_temperature(290.0, 0.2, 0.0, 1e12);
        assert!(next > 0.0 && next < 290.0);
    }

    #[test]
    fn test_solve_heats_day_side_and_couples_lowest_level() {
        let params = GridParameters {
            nlat: 18,
            nlon: 36,
            pole_lower_lat_limit: 70.0,
            pole_higher_lat_limit: 80.0,
            polar_grid_padding: 1,
            ..Default::default()
        };
        let grid = Grid::new(&params, &PlanetParameters::default()).unwrap();
        let mut planes = PolarPlanes::new(&grid, &params).unwrap();
        let mut state = ModelState::isothermal(&grid, 290.0, 290.0, 0.2).unwrap();
        let before = state.clone();

        let component = radiation();
        component.validate(&grid).unwrap();
        let context = StepContext {
            time: 0.0,
            dt: 1800.0,
            phase: RunPhase::Spinup,
        };
        component
            .solve(&context, &grid, &mut planes, &mut state)
            .unwrap();

        // Row 11 is centred at 25N, column 0 at 5E: close to the sub-solar point
        let day = state.surface_temperature[[11, 0]];
        // Column 18 is centred at 185E: midnight
        let night = state.surface_temperature[[11, 18]];
        assert!(day > 290.0);
        assert!(night < 290.0);

        let theta = state.potential_temperature[[11, 0, 0]];
        assert!(theta > 290.0 && theta < day);
        assert_eq!(
            state.potential_temperature.slice(ndarray::s![.., .., 1..]),
            before.potential_temperature.slice(ndarray::s![.., .., 1..])
        );
    }

    #[test]
    fn test_invalid_emissivity() {
        let grid = Grid::new(&GridParameters::default(), &PlanetParameters::default()).unwrap();
        let component = Radiation::from_parameters(
            RadiationParameters {
                emissivity: 0.0,
                ..Default::default()
            },
            PlanetParameters::default(),
        );
        assert!(matches!(
            component.validate(&grid),
            Err(GcmError::InvalidConfiguration(_))
        ));
    }
}
