//! Dynamics Parameters
//!
//! Parameters for the velocity, vertical velocity and scalar transport
//! calculations of the dynamical core.

use super::SmoothingParameters;
use serde::{Deserialize, Serialize};

/// Parameters for [`crate::components::Dynamics`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DynamicsParameters {
    /// Linear (Rayleigh) friction on the horizontal wind (1/s).
    /// Default: 1e-5
    pub friction: f64,

    /// Scaling of the vertical flux term in the scalar transport (dimensionless).
    /// Default: 0.1
    pub vertical_flux_factor: f64,

    /// Diffusivity of potential temperature.
    /// Applied to the horizontal (m^2/s) and pressure (Pa^2/s) curvature alike.
    /// Default: 1e-4
    pub theta_diffusivity: f64,

    /// Diffusivity of the tracer, in the same units as `theta_diffusivity`.
    /// Default: 0.0
    pub tracer_diffusivity: f64,

    /// Rows nearest each pole in which the tracer is not transported.
    /// Default: 4
    pub tracer_polar_mask_rows: usize,

    /// Zonal filtering of the wind, vertical velocity and potential temperature.
    pub smoothing: SmoothingParameters,
}

impl Default for DynamicsParameters {
    fn default() -> Self {
        Self {
            friction: 1e-5,
            vertical_flux_factor: 0.1,
            theta_diffusivity: 1e-4,
            tracer_diffusivity: 0.0,
            tracer_polar_mask_rows: 4,
            smoothing: SmoothingParameters::default(),
        }
    }
}
