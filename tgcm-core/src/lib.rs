//! Core types for the tgcm circulation model
//!
//! - [`grid`]: the spherical latitude-longitude grid
//! - [`polar`]: Cartesian planes over each polar cap
//! - [`state`]: the prognostic fields
//! - [`checkpoint`]: resumable snapshots of the state
//! - [`component`]: the trait implemented by every pipeline stage

pub mod checkpoint;
pub mod component;
pub mod errors;
pub mod grid;
pub mod parameters;
pub mod polar;
pub mod reference_atmosphere;
pub mod state;
pub mod thermodynamics;
pub mod utils;
