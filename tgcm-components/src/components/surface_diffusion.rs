use crate::parameters::DiffusionParameters;
use serde::{Deserialize, Serialize};
use tgcm_core::component::{Component, StepContext};
use tgcm_core::errors::{GcmError, GcmResult};
use tgcm_core::grid::Grid;
use tgcm_core::polar::PolarPlanes;
use tgcm_core::state::ModelState;
use tgcm_core::utils::finite_difference::laplacian_2d;

/// Horizontal diffusion of surface temperature
///
/// $$ T_s \leftarrow T_s + \Delta t\,\kappa_s \nabla^2 T_s $$
///
/// The Laplacian in the outermost rows is the zonal mean of the adjacent row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceDiffusion {
    parameters: DiffusionParameters,
}

impl SurfaceDiffusion {
    pub fn from_parameters(parameters: DiffusionParameters) -> Self {
        Self { parameters }
    }
}

#[typetag::serde]
impl Component for SurfaceDiffusion {
    fn name(&self) -> &'static str {
        "surface_diffusion"
    }

    fn validate(&self, _grid: &Grid) -> GcmResult<()> {
        if self.parameters.surface_diffusivity < 0.0 {
            return Err(GcmError::InvalidConfiguration(
                "surface_diffusivity must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    fn solve(
        &self,
        context: &StepContext,
        grid: &Grid,
        _planes: &mut PolarPlanes,
        state: &mut ModelState,
    ) -> GcmResult<()> {
        let laplacian = laplacian_2d(state.surface_temperature.view(), grid);
        state.surface_temperature.scaled_add(
            context.dt * self.parameters.surface_diffusivity,
            &laplacian,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tgcm_core::component::RunPhase;
    use tgcm_core::parameters::{GridParameters, PlanetParameters};

    fn setup() -> (Grid, PolarPlanes, ModelState) {
        let params = GridParameters {
            nlat: 24,
            nlon: 36,
            pole_lower_lat_limit: 70.0,
            pole_higher_lat_limit: 80.0,
            polar_grid_padding: 1,
            ..Default::default()
        };
        let grid = Grid::new(&params, &PlanetParameters::default()).unwrap();
        let planes = PolarPlanes::new(&grid, &params).unwrap();
        let state = ModelState::isothermal(&grid, 290.0, 290.0, 0.2).unwrap();
        (grid, planes, state)
    }

    fn context() -> StepContext {
        StepContext {
            time: 0.0,
            dt: 1000.0,
            phase: RunPhase::Spinup,
        }
    }

    #[test]
    fn test_uniform_surface_is_unchanged() {
        let (grid, mut planes, mut state) = setup();
        let component = SurfaceDiffusion::from_parameters(DiffusionParameters {
            surface_diffusivity: 1e7,
        });
        component
            .solve(&context(), &grid, &mut planes, &mut state)
            .unwrap();
        assert!(state
            .surface_temperature
            .iter()
            .all(|t| (t - 290.0).abs() < 1e-9));
    }

    #[test]
    fn test_hot_spot_spreads() {
        let (grid, mut planes, mut state) = setup();
        state.surface_temperature[[12, 10]] = 300.0;
        let component = SurfaceDiffusion::from_parameters(DiffusionParameters {
            surface_diffusivity: 1e7,
        });
        component
            .solve(&context(), &grid, &mut planes, &mut state)
            .unwrap();

        let centre = state.surface_temperature[[12, 10]];
        assert!(centre < 300.0 && centre > 290.0);
        for (i, j) in [(11, 10), (13, 10), (12, 9), (12, 11)] {
            assert!(state.surface_temperature[[i, j]] > 290.0);
        }
        assert_eq!(state.surface_temperature[[5, 30]], 290.0);
    }

    #[test]
    fn test_negative_diffusivity() {
        let (grid, _, _) = setup();
        let component = SurfaceDiffusion::from_parameters(DiffusionParameters {
            surface_diffusivity: -1.0,
        });
        assert!(component.validate(&grid).is_err());
    }
}
