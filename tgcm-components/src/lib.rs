//! Physics components for the tgcm circulation model
//!
//! Every component implements [`tgcm_core::component::Component`] and updates
//! the shared model state in place. The standard pipeline solves them in the
//! order they are listed here.
//!
//! - [`components::TracerSources`]: resets the tracer at point sources
//! - [`components::Radiation`]: surface energy balance and coupling to the lowest level
//! - [`components::SurfaceDiffusion`]: horizontal smoothing of surface temperature
//! - [`components::Geopotential`]: hydrostatic geopotential from potential temperature
//! - [`components::Dynamics`]: winds, vertical velocity and scalar transport
//!
//! # Parameters
//!
//! Each component has an associated parameters struct in the [`parameters`]
//! module with defaults suitable for an Earth-like planet.

pub mod components;
pub mod parameters;
