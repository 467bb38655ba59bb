//! Vertical velocity
//!
//! The pressure velocity is diagnosed from the continuity equation by
//! integrating the horizontal divergence upward from the surface,
//!
//! $$ \omega_k = \omega_{k-1} - (p_k - p_{k-1})\,\nabla\cdot\mathbf{V}_k, \quad \omega_0 = 0 $$
//!
//! then removing a correction linear in pressure so that $\omega$ also
//! vanishes at the lid. Levels above the lid carry no vertical motion.

use ndarray::{Array1, Array3, ArrayView3, Axis};
use tgcm_core::grid::Grid;
use tgcm_core::polar::PolarPlane;
use tgcm_core::utils::finite_difference::{horizontal_divergence, plane_divergence};

/// Pressure velocity on the sphere (Pa/s).
pub fn spherical_vertical_velocity(
    grid: &Grid,
    u: ArrayView3<f64>,
    v: ArrayView3<f64>,
) -> Array3<f64> {
    let divergence = horizontal_divergence(u, v, grid);
    integrate_columns(&divergence, grid.pressure_levels(), grid.lid_level())
}

/// Pressure velocity on a polar plane from its current velocities (Pa/s).
pub fn plane_vertical_velocity(plane: &PolarPlane, grid: &Grid) -> Array3<f64> {
    let divergence = plane_divergence(
        plane.x_dot.view(),
        plane.y_dot.view(),
        plane.resolution(),
    );
    integrate_columns(&divergence, grid.pressure_levels(), grid.lid_level())
}

/// Integrate the continuity equation up every column of `divergence`.
///
/// The first two axes are horizontal, the last is the level.
pub fn integrate_columns(divergence: &Array3<f64>, pressure: &Array1<f64>, lid: usize) -> Array3<f64> {
    let mut omega = Array3::zeros(divergence.dim());
    if lid == 0 {
        return omega;
    }
    let span = pressure[0] - pressure[lid];
    for (mut column, div) in omega
        .lanes_mut(Axis(2))
        .into_iter()
        .zip(divergence.lanes(Axis(2)))
    {
        for k in 1..=lid {
            column[k] = column[k - 1] - (pressure[k] - pressure[k - 1]) * div[k];
        }
        let residual = column[lid];
        for k in 1..lid {
            column[k] -= residual * (pressure[0] - pressure[k]) / span;
        }
        // The correction only cancels the residual up to rounding
        column[lid] = 0.0;
    }
    omega
}
