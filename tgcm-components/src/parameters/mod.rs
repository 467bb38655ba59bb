//! Component parameters
//!
//! Each parameter struct deserializes with `#[serde(default)]`, so a
//! configuration file only needs to name the values it changes.

mod diffusion;
mod dynamics;
mod radiation;
mod smoothing;
mod tracer;

pub use diffusion::DiffusionParameters;
pub use dynamics::DynamicsParameters;
pub use radiation::RadiationParameters;
pub use smoothing::SmoothingParameters;
pub use tracer::{TracerParameters, TracerSource};
