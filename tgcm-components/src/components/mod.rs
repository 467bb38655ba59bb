mod dynamics;
mod geopotential;
mod radiation;
mod surface_diffusion;
mod tracer_sources;

pub use dynamics::{transport, velocity, vertical, Dynamics};
pub use geopotential::Geopotential;
pub use radiation::Radiation;
pub use surface_diffusion::SurfaceDiffusion;
pub use tracer_sources::TracerSources;
