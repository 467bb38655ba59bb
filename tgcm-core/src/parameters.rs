//! Grid, planet and time-stepping parameters
//!
//! These are the parameters shared by every component. Component specific
//! parameters live next to their components in `tgcm-components`.

use crate::errors::{GcmError, GcmResult};
use serde::{Deserialize, Serialize};

/// Seconds in one day on Earth.
pub const EARTH_DAY: f64 = 60.0 * 60.0 * 24.0;

/// Index of the first level above the model lid.
///
/// Scalar tendencies at this level and above are zeroed.
pub const TOP_LEVEL_INDEX: usize = 15;

/// Level directly beneath the lid whose scalar tendencies are halved.
pub const SPONGE_LEVEL_INDEX: usize = TOP_LEVEL_INDEX - 1;

/// Layout of the spherical grid and the polar projection planes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridParameters {
    /// Number of latitude rows.
    /// Default: 46
    pub nlat: usize,

    /// Number of longitude columns.
    /// Default: 72
    pub nlon: usize,

    /// Pressure at each model level (Pa), strictly decreasing from the surface.
    /// Default: 18 levels from 1000 hPa to 25 hPa
    pub pressure_levels: Vec<f64>,

    /// Absolute latitude (degrees) where blending into the polar planes starts.
    /// Default: 75.0
    pub pole_lower_lat_limit: f64,

    /// Absolute latitude (degrees) poleward of which the polar planes are used exclusively.
    /// Default: 85.0
    pub pole_higher_lat_limit: f64,

    /// Extra latitude rows included at the edge of each polar plane.
    /// Default: 2
    pub polar_grid_padding: usize,

    /// First level of the model lid. Must lie in `2..=nlevels`.
    /// Default: [`TOP_LEVEL_INDEX`]
    pub top_level_index: usize,
}

impl Default for GridParameters {
    fn default() -> Self {
        Self {
            nlat: 46,
            nlon: 72,
            pressure_levels: [
                1000.0, 950.0, 900.0, 850.0, 800.0, 700.0, 600.0, 500.0, 400.0, 350.0, 300.0,
                250.0, 200.0, 150.0, 100.0, 75.0, 50.0, 25.0,
            ]
            .iter()
            .map(|hpa| hpa * 100.0)
            .collect(),
            pole_lower_lat_limit: 75.0,
            pole_higher_lat_limit: 85.0,
            polar_grid_padding: 2,
            top_level_index: TOP_LEVEL_INDEX,
        }
    }
}

impl GridParameters {
    pub fn nlevels(&self) -> usize {
        self.pressure_levels.len()
    }

    /// Check the parameters describe a usable grid.
    pub fn validate(&self) -> GcmResult<()> {
        if self.nlat < 4 || self.nlon < 4 {
            return Err(GcmError::InvalidConfiguration(format!(
                "grid must have at least 4 rows and 4 columns, got {}x{}",
                self.nlat, self.nlon
            )));
        }
        if self.nlevels() < 3 {
            return Err(GcmError::InvalidConfiguration(format!(
                "at least 3 pressure levels are required, got {}",
                self.nlevels()
            )));
        }
        if self.pressure_levels.iter().any(|p| !(*p > 0.0)) {
            return Err(GcmError::InvalidConfiguration(
                "pressure levels must be positive".to_string(),
            ));
        }
        if self.pressure_levels.windows(2).any(|w| w[1] >= w[0]) {
            return Err(GcmError::InvalidConfiguration(
                "pressure levels must be strictly decreasing".to_string(),
            ));
        }
        if self.top_level_index < 2 || self.top_level_index > self.nlevels() {
            return Err(GcmError::InvalidConfiguration(format!(
                "top_level_index must lie in 2..={}, got {}",
                self.nlevels(),
                self.top_level_index
            )));
        }
        Ok(())
    }
}

/// Physical properties of the planet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanetParameters {
    /// Planetary radius (m).
    /// Default: 6.4e6
    pub radius: f64,

    /// Gravitational acceleration (m/s^2).
    /// Default: 9.81
    pub gravity: f64,

    /// Length of one rotation (s).
    /// Default: 86400
    pub day: f64,

    /// Length of one orbit (s).
    /// Default: 365 days
    pub year: f64,

    /// Axial tilt (degrees).
    /// Default: 23.5
    pub axial_tilt: f64,
}

impl Default for PlanetParameters {
    fn default() -> Self {
        Self {
            radius: 6.4e6,
            gravity: 9.81,
            day: EARTH_DAY,
            year: 365.0 * EARTH_DAY,
            axial_tilt: 23.5,
        }
    }
}

impl PlanetParameters {
    /// Angular rotation rate (rad/s).
    pub fn angular_speed(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.day
    }

    pub fn validate(&self) -> GcmResult<()> {
        if !(self.radius > 0.0 && self.gravity > 0.0 && self.day > 0.0 && self.year > 0.0) {
            return Err(GcmError::InvalidConfiguration(
                "planet radius, gravity, day and year must all be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Time stepping for the spin-up and main phases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeParameters {
    /// Duration of the spin-up phase (s). Velocities are frozen during spin-up.
    /// Default: 10 days
    pub spinup_length: f64,

    /// Time step during spin-up (s).
    /// Default: 1800
    pub dt_spinup: f64,

    /// Time step once the dynamics are enabled (s).
    /// Default: 900
    pub dt_main: f64,
}

impl Default for TimeParameters {
    fn default() -> Self {
        Self {
            spinup_length: 10.0 * EARTH_DAY,
            dt_spinup: 1800.0,
            dt_main: 900.0,
        }
    }
}

impl TimeParameters {
    pub fn validate(&self) -> GcmResult<()> {
        if !(self.dt_spinup > 0.0 && self.dt_main > 0.0) {
            return Err(GcmError::InvalidConfiguration(format!(
                "time steps must be positive, got dt_spinup={} dt_main={}",
                self.dt_spinup, self.dt_main
            )));
        }
        if !(self.spinup_length >= 0.0) {
            return Err(GcmError::InvalidConfiguration(format!(
                "spinup_length must not be negative, got {}",
                self.spinup_length
            )));
        }
        Ok(())
    }
}
