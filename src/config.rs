//! Model configuration
//!
//! A [`ModelConfig`] gathers the parameters of every part of the model. It is
//! normally read from a TOML file in which each table corresponds to one
//! field, for example
//!
//! ```toml
//! [grid]
//! nlat = 46
//! nlon = 72
//!
//! [time]
//! spinup_length = 864000.0
//!
//! [tracer]
//! sources = []
//! ```
//!
//! Every table and every value is optional; missing entries take their
//! documented defaults.

use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tgcm_components::parameters::{
    DiffusionParameters, DynamicsParameters, RadiationParameters, TracerParameters,
};
use tgcm_core::errors::{GcmError, GcmResult};
use tgcm_core::grid::Grid;
use tgcm_core::parameters::{GridParameters, PlanetParameters, TimeParameters};
use tgcm_core::reference_atmosphere::ReferenceAtmosphere;
use tgcm_core::state::ModelState;

/// Initial conditions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InitialParameters {
    /// Uniform initial surface temperature (K).
    /// Default: 290.0
    pub surface_temperature: f64,

    /// Uniform initial air temperature, used without a reference atmosphere (K).
    /// Default: 290.0
    pub atmosphere_temperature: f64,

    /// Reference atmosphere table providing the initial temperature profile.
    /// Default: none (isothermal)
    pub reference_atmosphere: Option<PathBuf>,
}

impl Default for InitialParameters {
    fn default() -> Self {
        Self {
            surface_temperature: 290.0,
            atmosphere_temperature: 290.0,
            reference_atmosphere: None,
        }
    }
}

/// Checkpointing and visualization output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputParameters {
    /// Write checkpoints while integrating.
    /// Default: false
    pub save: bool,

    /// Resume from the checkpoint at `checkpoint_path`.
    /// Default: false
    pub load: bool,

    /// Default: "tgcm_checkpoint.bin"
    pub checkpoint_path: PathBuf,

    /// Steps between checkpoints.
    /// Default: 100
    pub save_frequency: usize,

    /// Steps between visualization updates.
    /// Default: 5
    pub plot_frequency: usize,
}

impl Default for OutputParameters {
    fn default() -> Self {
        Self {
            save: false,
            load: false,
            checkpoint_path: PathBuf::from("tgcm_checkpoint.bin"),
            save_frequency: 100,
            plot_frequency: 5,
        }
    }
}

/// Complete configuration of a model run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub grid: GridParameters,
    pub planet: PlanetParameters,
    pub time: TimeParameters,
    pub radiation: RadiationParameters,
    pub diffusion: DiffusionParameters,
    pub dynamics: DynamicsParameters,
    pub tracer: TracerParameters,
    pub initial: InitialParameters,
    pub output: OutputParameters,
}

impl ModelConfig {
    pub fn from_toml_str(text: &str) -> GcmResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> GcmResult<Self> {
        let path = path.as_ref();
        let config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> GcmResult<String> {
        Ok(toml::to_string(self)?)
    }

    /// Check the parameters that do not depend on a constructed grid.
    ///
    /// Component parameters are checked against the grid when the pipeline is
    /// validated.
    pub fn validate(&self) -> GcmResult<()> {
        self.grid.validate()?;
        self.planet.validate()?;
        self.time.validate()?;
        if self.output.save && self.output.save_frequency == 0 {
            return Err(GcmError::InvalidConfiguration(
                "save_frequency must be at least 1".to_string(),
            ));
        }
        if self.output.plot_frequency == 0 {
            return Err(GcmError::InvalidConfiguration(
                "plot_frequency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The state at the start of a fresh run.
    ///
    /// The air temperature comes from the reference atmosphere when one is
    /// configured and is isothermal otherwise. Albedo is uniform.
    pub fn initial_state(&self, grid: &Grid) -> GcmResult<ModelState> {
        let surface = self.initial.surface_temperature;
        let albedo = self.radiation.albedo;
        match &self.initial.reference_atmosphere {
            Some(path) => {
                let atmosphere = ReferenceAtmosphere::from_path(path)?;
                let profile = atmosphere.temperature_profile(&grid.pressure_levels().to_vec());
                info!(
                    "Initial temperature profile from {} ({:.1} K to {:.1} K)",
                    path.display(),
                    profile.first().copied().unwrap_or(f64::NAN),
                    profile.last().copied().unwrap_or(f64::NAN)
                );
                ModelState::from_temperature_profile(grid, &profile, surface, albedo)
            }
            None => {
                ModelState::isothermal(grid, self.initial.atmosphere_temperature, surface, albedo)
            }
        }
    }
}
