//! A simplified global atmospheric circulation model
//!
//! Temperature, wind and a passive tracer are integrated on a
//! latitude-longitude grid driven by an idealised radiation scheme. The polar
//! singularity of the grid is handled by solving the dynamics a second time on
//! a Cartesian plane over each pole and blending the two solutions.
//!
//! The workspace is split into
//! - `tgcm-core`: grid, polar planes, state, checkpoints and the
//!   [`Component`](tgcm_core::component::Component) trait
//! - `tgcm-components`: the physics components
//! - this crate: configuration, the component [`pipeline`] and the time
//!   [`integrator`]
//!
//! ```no_run
//! use tgcm::config::ModelConfig;
//! use tgcm::integrator::Integrator;
//!
//! # fn main() -> tgcm_core::errors::GcmResult<()> {
//! let config = ModelConfig::from_path("tgcm.toml")?;
//! let mut model = Integrator::from_config(&config)?;
//! model.run_until(config.time.spinup_length + 10.0 * 86400.0)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod integrator;
pub mod observer;
pub mod pipeline;
