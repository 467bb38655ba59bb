//! Radiation Parameters
//!
//! Parameters for the single-layer surface energy balance and its coupling to
//! the lowest model level.

use serde::{Deserialize, Serialize};

/// Parameters for [`crate::components::Radiation`].
///
/// # Default Values
///
/// The defaults keep an Earth-like planet started from 290 K between roughly
/// 260 K and 310 K over the first weeks of integration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RadiationParameters {
    /// Solar constant at the top of the atmosphere (W/m^2).
    /// Default: 1370.0
    pub insolation: f64,

    /// Initial surface albedo, applied uniformly (dimensionless).
    /// Default: 0.2
    pub albedo: f64,

    /// Areal heat capacity of the surface (J/m^2 K).
    /// Default: 1.0e7
    pub heat_capacity: f64,

    /// Effective longwave emissivity to space (dimensionless).
    /// Equal to one minus the fraction of surface emission returned by the atmosphere.
    /// Default: 0.6
    pub emissivity: f64,

    /// Relaxation time of the lowest level towards the surface temperature (s).
    /// Default: 86400.0
    pub surface_coupling_timescale: f64,
}

impl Default for RadiationParameters {
    fn default() -> Self {
        Self {
            insolation: 1370.0,
            albedo: 0.2,
            heat_capacity: 1.0e7,
            emissivity: 0.6,
            surface_coupling_timescale: 86400.0,
        }
    }
}
