use serde::{Deserialize, Serialize};

/// Parameters for [`crate::components::SurfaceDiffusion`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiffusionParameters {
    /// Horizontal diffusivity of surface temperature (m^2/s).
    /// Default: 1e-5
    pub surface_diffusivity: f64,
}

impl Default for DiffusionParameters {
    fn default() -> Self {
        Self {
            surface_diffusivity: 1e-5,
        }
    }
}
