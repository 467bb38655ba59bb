//! Scalar transport
//!
//! Potential temperature and the tracer are advected in flux form by the
//! three-dimensional wind. Tendencies are stored as the rate at which the
//! field *decreases*, so a step applies `a -= dt * tendency`.
//!
//! Both scalars share the lid treatment: the tendency is halved at the sponge
//! level and removed from the first lid level upward. The tracer additionally
//! receives a first-order upwind vertical advection term and is not
//! transported in the rows nearest each pole; potential temperature instead
//! uses the polar plane solution near the poles.

use crate::parameters::DynamicsParameters;
use ndarray::{s, Array1, Array3, ArrayView3};
use tgcm_core::grid::Grid;
use tgcm_core::polar::PolarPlanes;
use tgcm_core::state::ModelState;
use tgcm_core::utils::finite_difference::{flux_divergence, laplacian_3d, plane_flux_divergence};

/// Halve `tendency` at the sponge level and clear it at and above the lid.
pub fn apply_lid(tendency: &mut Array3<f64>, grid: &Grid) {
    let nlevels = tendency.dim().2;
    let sponge = grid.sponge_level_index();
    if sponge < nlevels {
        tendency
            .slice_mut(s![.., .., sponge])
            .mapv_inplace(|value| 0.5 * value);
    }
    let top = grid.top_level_index().min(nlevels);
    tendency.slice_mut(s![.., .., top..]).fill(0.0);
}

/// Zero the first and last `rows` rows of `tendency`.
pub fn mask_polar_rows(tendency: &mut Array3<f64>, rows: usize) {
    let nlat = tendency.dim().0;
    let rows = rows.min(nlat / 2);
    tendency.slice_mut(s![..rows, .., ..]).fill(0.0);
    tendency.slice_mut(s![nlat - rows.., .., ..]).fill(0.0);
}

/// First-order upwind vertical advection, $\omega\,\partial_p a$.
///
/// The pressure derivative is taken on the side the air arrives from. The
/// lowest and highest levels are left untouched.
pub fn upwind_vertical_advection(
    a: ArrayView3<f64>,
    w: ArrayView3<f64>,
    pressure: &Array1<f64>,
) -> Array3<f64> {
    let mut out = Array3::zeros(a.dim());
    let nlevels = a.dim().2;
    for ((i, j, k), value) in out.indexed_iter_mut() {
        if k == 0 || k + 1 >= nlevels {
            continue;
        }
        let omega = w[[i, j, k]];
        let below = (a[[i, j, k]] - a[[i, j, k - 1]]) / (pressure[k] - pressure[k - 1]);
        let above = (a[[i, j, k + 1]] - a[[i, j, k]]) / (pressure[k + 1] - pressure[k]);
        *value = 0.5 * (omega - omega.abs()) * below + 0.5 * (omega + omega.abs()) * above;
    }
    out
}

/// Tendency of potential temperature (K/s).
///
/// The polar plane transport is blended into the caps before diffusion and
/// the lid are applied.
pub fn potential_temperature_tendency(
    grid: &Grid,
    planes: &PolarPlanes,
    state: &ModelState,
    parameters: &DynamicsParameters,
) -> Array3<f64> {
    let theta = state.potential_temperature.view();
    let factor = parameters.vertical_flux_factor;
    let mut tendency = flux_divergence(
        theta,
        state.u.view(),
        state.v.view(),
        state.w.view(),
        grid,
        factor,
    );

    let pressure = grid.pressure_levels().to_vec();
    for plane in planes.iter() {
        let theta_plane = plane.project(theta);
        let plane_tendency = plane_flux_divergence(
            theta_plane.view(),
            plane.x_dot.view(),
            plane.y_dot.view(),
            plane.w.view(),
            plane.resolution(),
            &pressure,
            factor,
        );
        let cap = plane.reproject(plane_tendency.view());
        plane.blend_into(&mut tendency, cap.view());
    }

    if parameters.theta_diffusivity > 0.0 {
        tendency.scaled_add(-parameters.theta_diffusivity, &laplacian_3d(theta, grid));
    }
    apply_lid(&mut tendency, grid);
    tendency
}

/// Tendency of the tracer mixing ratio (1/s).
pub fn tracer_tendency(
    grid: &Grid,
    state: &ModelState,
    parameters: &DynamicsParameters,
) -> Array3<f64> {
    let tracer = state.tracer.view();
    let mut tendency = flux_divergence(
        tracer,
        state.u.view(),
        state.v.view(),
        state.w.view(),
        grid,
        parameters.vertical_flux_factor,
    );
    mask_polar_rows(&mut tendency, parameters.tracer_polar_mask_rows);
    tendency += &upwind_vertical_advection(tracer, state.w.view(), grid.pressure_levels());

    if parameters.tracer_diffusivity > 0.0 {
        tendency.scaled_add(-parameters.tracer_diffusivity, &laplacian_3d(tracer, grid));
    }
    apply_lid(&mut tendency, grid);
    tendency
}
