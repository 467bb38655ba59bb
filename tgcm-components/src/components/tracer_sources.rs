use crate::parameters::TracerParameters;
use log::trace;
use serde::{Deserialize, Serialize};
use tgcm_core::component::{Component, StepContext};
use tgcm_core::errors::{GcmError, GcmResult};
use tgcm_core::grid::Grid;
use tgcm_core::polar::PolarPlanes;
use tgcm_core::state::ModelState;

/// Fixed-value tracer sources
///
/// Each source overwrites the tracer mixing ratio of a single cell at the start
/// of every step. The tracer is otherwise passive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracerSources {
    parameters: TracerParameters,
}

impl TracerSources {
    pub fn from_parameters(parameters: TracerParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &TracerParameters {
        &self.parameters
    }
}

#[typetag::serde]
impl Component for TracerSources {
    fn name(&self) -> &'static str {
        "tracer_sources"
    }

    fn validate(&self, grid: &Grid) -> GcmResult<()> {
        let (nlat, nlon, nlevels) = grid.shape_3d();
        for source in &self.parameters.sources {
            if source.lat_index >= nlat || source.lon_index >= nlon || source.level >= nlevels {
                return Err(GcmError::InvalidConfiguration(format!(
                    "tracer source at ({}, {}, {}) is outside the {}x{}x{} grid",
                    source.lat_index, source.lon_index, source.level, nlat, nlon, nlevels
                )));
            }
        }
        Ok(())
    }

    fn solve(
        &self,
        _context: &StepContext,
        _grid: &Grid,
        _planes: &mut PolarPlanes,
        state: &mut ModelState,
    ) -> GcmResult<()> {
        for source in &self.parameters.sources {
            trace!(
                "Tracer source at ({}, {}, {}) = {}",
                source.lat_index,
                source.lon_index,
                source.level,
                source.value
            );
            state.tracer[[source.lat_index, source.lon_index, source.level]] = source.value;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::TracerSource;
    use tgcm_core::component::RunPhase;
    use tgcm_core::parameters::{GridParameters, PlanetParameters};

    fn setup() -> (Grid, PolarPlanes, ModelState) {
        let params = GridParameters::default();
        let grid = Grid::new(&params, &PlanetParameters::default()).unwrap();
        let planes = PolarPlanes::new(&grid, &params).unwrap();
        let state = ModelState::isothermal(&grid, 290.0, 290.0, 0.2).unwrap();
        (grid, planes, state)
    }

    #[test]
    fn test_sources_reset_cells() {
        let (grid, mut planes, mut state) = setup();
        let component = TracerSources::from_parameters(TracerParameters::default());
        assert!(component.validate(&grid).is_ok());

        state.tracer[[40, 50, 5]] = 0.25;
        let context = StepContext {
            time: 0.0,
            dt: 900.0,
            phase: RunPhase::Main,
        };
        component
            .solve(&context, &grid, &mut planes, &mut state)
            .unwrap();

        assert_eq!(state.tracer[[40, 50, 5]], 1.0);
        assert_eq!(state.tracer[[20, 50, 5]], 1.0);
        assert_eq!(state.tracer.sum(), 2.0);
    }

    #[test]
    fn test_source_outside_grid() {
        let (grid, _, _) = setup();
        let component = TracerSources::from_parameters(TracerParameters {
            sources: vec![TracerSource::new(46, 0, 0, 1.0)],
        });
        assert!(matches!(
            component.validate(&grid),
            Err(GcmError::InvalidConfiguration(_))
        ));
    }
}
