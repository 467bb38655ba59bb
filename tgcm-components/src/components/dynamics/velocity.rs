//! Horizontal momentum
//!
//! The wind obeys the inviscid primitive equations on pressure surfaces with
//! linear friction:
//!
//! $$ \frac{\partial u}{\partial t} = -u\,\partial_x u - v\,\partial_y u + f v - \partial_x\Phi - r u $$
//! $$ \frac{\partial v}{\partial t} = -u\,\partial_x v - v\,\partial_y v - f u - \partial_y\Phi - r v $$
//!
//! Vertical advection of momentum is neglected. The same equations are solved
//! for the plane velocities `(x_dot, y_dot)` on each polar plane, with the
//! geopotential sampled onto the plane.

use super::smoothing::Smoothing;
use ndarray::{Array3, ArrayView3, Zip};
use tgcm_core::grid::Grid;
use tgcm_core::polar::{PolarPlane, PolarPlanes};
use tgcm_core::state::ModelState;
use tgcm_core::utils::finite_difference::{
    gradient_x, gradient_y, plane_gradient_x, plane_gradient_y,
};

/// Rates of change of the eastward and northward wind (m/s^2).
pub fn spherical_tendency(
    grid: &Grid,
    state: &ModelState,
    friction: f64,
) -> (Array3<f64>, Array3<f64>) {
    let u = state.u.view();
    let v = state.v.view();
    let phi = state.geopotential.view();
    let coriolis = grid.coriolis();

    let mut du = grid.zeros_3d();
    let mut dv = grid.zeros_3d();
    Zip::indexed(&mut du)
        .and(&mut dv)
        .for_each(|(i, j, k), du, dv| {
            let (uu, vv) = (u[[i, j, k]], v[[i, j, k]]);
            let f = coriolis[i];
            *du = -uu * gradient_x(u, grid, i, j, k) - vv * gradient_y(u, grid, i, j, k) + f * vv
                - gradient_x(phi, grid, i, j, k)
                - friction * uu;
            *dv = -uu * gradient_x(v, grid, i, j, k) - vv * gradient_y(v, grid, i, j, k) - f * uu
                - gradient_y(phi, grid, i, j, k)
                - friction * vv;
        });
    (du, dv)
}

/// Rates of change of the plane velocities (m/s^2).
///
/// `geopotential` is the geopotential already sampled onto `plane`.
pub fn plane_tendency(
    plane: &PolarPlane,
    geopotential: ArrayView3<f64>,
    friction: f64,
) -> (Array3<f64>, Array3<f64>) {
    let x_dot = plane.x_dot.view();
    let y_dot = plane.y_dot.view();
    let spacing = plane.resolution();
    let coriolis = plane.coriolis();

    let mut dx = Array3::zeros(x_dot.dim());
    let mut dy = Array3::zeros(x_dot.dim());
    Zip::indexed(&mut dx)
        .and(&mut dy)
        .for_each(|(iy, ix, k), dx, dy| {
            let (xd, yd) = (x_dot[[iy, ix, k]], y_dot[[iy, ix, k]]);
            let f = coriolis[[iy, ix]];
            *dx = -xd * plane_gradient_x(x_dot, spacing, iy, ix, k)
                - yd * plane_gradient_y(x_dot, spacing, iy, ix, k)
                + f * yd
                - plane_gradient_x(geopotential, spacing, iy, ix, k)
                - friction * xd;
            *dy = -xd * plane_gradient_x(y_dot, spacing, iy, ix, k)
                - yd * plane_gradient_y(y_dot, spacing, iy, ix, k)
                - f * xd
                - plane_gradient_y(geopotential, spacing, iy, ix, k)
                - friction * yd;
        });
    (dx, dy)
}

/// Advance the wind on the sphere and on both planes by `dt`.
///
/// The plane solutions are blended into the polar caps of the spherical wind,
/// which is then smoothed when `smoothing` is given. The planes are resampled
/// from the result, so both representations agree at the start of the next
/// step.
pub fn advance(
    grid: &Grid,
    planes: &mut PolarPlanes,
    state: &mut ModelState,
    friction: f64,
    dt: f64,
    smoothing: Option<&Smoothing>,
) {
    let (du, dv) = spherical_tendency(grid, state, friction);

    let mut plane_updates = Vec::with_capacity(2);
    for plane in planes.iter_mut() {
        let phi = plane.project(state.geopotential.view());
        let (dx, dy) = plane_tendency(plane, phi.view(), friction);
        plane.x_dot.scaled_add(dt, &dx);
        plane.y_dot.scaled_add(dt, &dy);
        plane_updates.push(plane.reproject_velocity());
    }

    state.u.scaled_add(dt, &du);
    state.v.scaled_add(dt, &dv);
    for (plane, (u_cap, v_cap)) in planes.iter().zip(plane_updates) {
        plane.blend_into(&mut state.u, u_cap.view());
        plane.blend_into(&mut state.v, v_cap.view());
    }
    if let Some(smoothing) = smoothing {
        smoothing.wind(grid, &mut state.u, &mut state.v);
    }
    for plane in planes.iter_mut() {
        plane.sync_velocity(state.u.view(), state.v.view());
    }
}
