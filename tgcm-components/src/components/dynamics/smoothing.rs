//! Zonal smoothing
//!
//! The explicit momentum and transport steps are only stable while the
//! shortest zonal wave is long compared with the distance the fastest
//! disturbance travels in one step. Near the poles the longitude spacing
//! shrinks with $\cos\phi$, so the dynamical fields are passed through a
//! [`ZonalFilter`] whose cutoff shrinks at the same rate.
//!
//! Scalars are only filtered below the lid, where they are allowed to change.

use crate::parameters::SmoothingParameters;
use ndarray::Array3;
use tgcm_core::grid::Grid;
use tgcm_core::utils::zonal_filter::ZonalFilter;

/// One zonal filter per smoothed field.
#[derive(Debug, Clone)]
pub struct Smoothing {
    u: ZonalFilter,
    v: ZonalFilter,
    w: ZonalFilter,
    tendency: ZonalFilter,
    potential_temperature: ZonalFilter,
}

impl Smoothing {
    /// The filters for `grid`, or `None` when smoothing is disabled.
    pub fn new(grid: &Grid, parameters: &SmoothingParameters) -> Option<Self> {
        if !parameters.enabled {
            return None;
        }
        Some(Self {
            u: ZonalFilter::new(grid, parameters.u),
            v: ZonalFilter::new(grid, parameters.v),
            w: ZonalFilter::new(grid, parameters.w),
            tendency: ZonalFilter::new(grid, parameters.tendency),
            potential_temperature: ZonalFilter::new(grid, parameters.potential_temperature),
        })
    }

    /// Filter the horizontal wind on every level.
    pub fn wind(&self, grid: &Grid, u: &mut Array3<f64>, v: &mut Array3<f64>) {
        self.u.apply(u, 0..grid.nlevels());
        self.v.apply(v, 0..grid.nlevels());
    }

    /// Filter the pressure velocity between the surface and the lid.
    pub fn vertical_velocity(&self, grid: &Grid, w: &mut Array3<f64>) {
        self.w.apply(w, 1..grid.lid_level());
    }

    pub fn tendency(&self, grid: &Grid, tendency: &mut Array3<f64>) {
        self.tendency.apply(tendency, 0..grid.top_level_index());
    }

    pub fn potential_temperature(&self, grid: &Grid, theta: &mut Array3<f64>) {
        self.potential_temperature
            .apply(theta, 0..grid.top_level_index());
    }
}
