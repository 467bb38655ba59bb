use serde::{Deserialize, Serialize};
use tgcm_core::component::{Component, StepContext};
use tgcm_core::errors::GcmResult;
use tgcm_core::grid::Grid;
use tgcm_core::polar::PolarPlanes;
use tgcm_core::state::ModelState;
use tgcm_core::thermodynamics::update_geopotential;

/// Hydrostatic geopotential diagnosed from potential temperature.
///
/// See [`update_geopotential`]. The lowest level is the zero reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Geopotential;

impl Geopotential {
    pub fn new() -> Self {
        Self
    }
}

#[typetag::serde]
impl Component for Geopotential {
    fn name(&self) -> &'static str {
        "geopotential"
    }

    fn solve(
        &self,
        _context: &StepContext,
        grid: &Grid,
        _planes: &mut PolarPlanes,
        state: &mut ModelState,
    ) -> GcmResult<()> {
        update_geopotential(
            state.potential_temperature.view(),
            grid.sigma(),
            &mut state.geopotential,
        );
        Ok(())
    }
}
