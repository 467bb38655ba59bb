//! The ordered set of components solved every step.

use crate::config::ModelConfig;
use serde::{Deserialize, Serialize};
use tgcm_components::components::{
    Dynamics, Geopotential, Radiation, SurfaceDiffusion, TracerSources,
};
use tgcm_core::component::{Component, RunPhase};
use tgcm_core::errors::GcmResult;
use tgcm_core::grid::Grid;

/// Components in the order they are solved.
///
/// Components are `typetag` trait objects, so a pipeline can be serialized
/// and restored along with the parameters of every stage.
#[derive(Debug, Serialize, Deserialize)]
pub struct Pipeline {
    stages: Vec<Box<dyn Component>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Component>>) -> Self {
        Self { stages }
    }

    /// The standard model: tracer sources, radiation, surface diffusion,
    /// geopotential and, once spun up, the dynamics.
    pub fn standard(config: &ModelConfig) -> Self {
        Self::new(vec![
            Box::new(TracerSources::from_parameters(config.tracer.clone())),
            Box::new(Radiation::from_parameters(
                config.radiation.clone(),
                config.planet.clone(),
            )),
            Box::new(SurfaceDiffusion::from_parameters(config.diffusion.clone())),
            Box::new(Geopotential::new()),
            Box::new(Dynamics::from_parameters(config.dynamics.clone())),
        ])
    }

    pub fn validate(&self, grid: &Grid) -> GcmResult<()> {
        self.stages.iter().try_for_each(|stage| stage.validate(grid))
    }

    /// Components that run during `phase`, in order.
    pub fn stages(&self, phase: RunPhase) -> impl Iterator<Item = &Box<dyn Component>> {
        self.stages
            .iter()
            .filter(move |stage| stage.active(phase))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let pipeline = Pipeline::standard(&ModelConfig::default());
        assert_eq!(
            pipeline.names(),
            vec![
                "tracer_sources",
                "radiation",
                "surface_diffusion",
                "geopotential",
                "dynamics"
            ]
        );
    }

    #[test]
    fn test_dynamics_only_runs_after_spinup() {
        let pipeline = Pipeline::standard(&ModelConfig::default());
        let spinup: Vec<_> = pipeline
            .stages(RunPhase::Spinup)
            .map(|stage| stage.name())
            .collect();
        assert_eq!(spinup.len(), 4);
        assert!(!spinup.contains(&"dynamics"));
        assert_eq!(pipeline.stages(RunPhase::Main).count(), 5);
    }

    #[test]
    fn test_serialization_round_trip() {
        let pipeline = Pipeline::standard(&ModelConfig::default());
        let json = serde_json::to_string(&pipeline).expect("Serialization failed");
        assert!(json.contains("Radiation"));
        let restored: Pipeline = serde_json::from_str(&json).expect("Deserialization failed");
        assert_eq!(restored.names(), pipeline.names());
        assert_eq!(
            serde_json::to_string(&restored).unwrap(),
            json
        );
    }
}
