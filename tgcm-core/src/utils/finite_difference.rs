//! Finite-difference operators on the spherical grid and the polar planes
//!
//! Spherical fields are indexed `[lat, lon, level]` and are periodic in
//! longitude. Plane fields are indexed `[y, x, level]`. Derivatives are centred
//! in the interior and one-sided at non-periodic boundaries. Vertical
//! derivatives are taken with respect to pressure.

use crate::grid::Grid;
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut3, Axis};

/// Zonal derivative at `(i, j, k)`.
pub fn gradient_x(a: ArrayView3<f64>, grid: &Grid, i: usize, j: usize, k: usize) -> f64 {
    let nlon = a.dim().1;
    let east = (j + 1) % nlon;
    let west = (j + nlon - 1) % nlon;
    (a[[i, east, k]] - a[[i, west, k]]) / grid.dx()[i]
}

/// Meridional derivative at `(i, j, k)`.
pub fn gradient_y(a: ArrayView3<f64>, grid: &Grid, i: usize, j: usize, k: usize) -> f64 {
    let nlat = a.dim().0;
    let dy = grid.dy();
    if i == 0 {
        2.0 * (a[[1, j, k]] - a[[0, j, k]]) / dy
    } else if i == nlat - 1 {
        2.0 * (a[[i, j, k]] - a[[i - 1, j, k]]) / dy
    } else {
        (a[[i + 1, j, k]] - a[[i - 1, j, k]]) / dy
    }
}

/// Derivative with respect to pressure at `(i, j, k)`.
///
/// Works for spherical and plane fields alike since only the level axis is
/// differenced.
pub fn gradient_p(a: ArrayView3<f64>, pressure: &[f64], i: usize, j: usize, k: usize) -> f64 {
    let n = a.dim().2;
    if k == 0 {
        (a[[i, j, 1]] - a[[i, j, 0]]) / (pressure[1] - pressure[0])
    } else if k == n - 1 {
        (a[[i, j, k]] - a[[i, j, k - 1]]) / (pressure[k] - pressure[k - 1])
    } else {
        (a[[i, j, k + 1]] - a[[i, j, k - 1]]) / (pressure[k + 1] - pressure[k - 1])
    }
}

/// Derivative along the plane `x` axis (second index).
pub fn plane_gradient_x(a: ArrayView3<f64>, spacing: f64, iy: usize, ix: usize, k: usize) -> f64 {
    let n = a.dim().1;
    if ix == 0 {
        (a[[iy, 1, k]] - a[[iy, 0, k]]) / spacing
    } else if ix == n - 1 {
        (a[[iy, ix, k]] - a[[iy, ix - 1, k]]) / spacing
    } else {
        (a[[iy, ix + 1, k]] - a[[iy, ix - 1, k]]) / (2.0 * spacing)
    }
}

/// Derivative along the plane `y` axis (first index).
pub fn plane_gradient_y(a: ArrayView3<f64>, spacing: f64, iy: usize, ix: usize, k: usize) -> f64 {
    let n = a.dim().0;
    if iy == 0 {
        (a[[1, ix, k]] - a[[0, ix, k]]) / spacing
    } else if iy == n - 1 {
        (a[[iy, ix, k]] - a[[iy - 1, ix, k]]) / spacing
    } else {
        (a[[iy + 1, ix, k]] - a[[iy - 1, ix, k]]) / (2.0 * spacing)
    }
}

/// Horizontal divergence of a wind field on the sphere.
///
/// The meridional term carries the $\cos\phi$ metric,
/// $\nabla\cdot\mathbf{V} = \partial_x u + \frac{1}{\cos\phi}\partial_y (v\cos\phi)$.
pub fn horizontal_divergence(u: ArrayView3<f64>, v: ArrayView3<f64>, grid: &Grid) -> Array3<f64> {
    let v_cos = scale_rows(v, grid);
    let cos = grid.cos_latitudes();
    Array3::from_shape_fn(u.dim(), |(i, j, k)| {
        gradient_x(u, grid, i, j, k) + gradient_y(v_cos.view(), grid, i, j, k) / cos[i]
    })
}

/// Flux-form transport of a scalar `a` by the wind `(u, v, w)`.
///
/// $$ \partial_x(a u) + \frac{1}{\cos\phi}\partial_y(a v \cos\phi) + c_z\,\partial_p(a w) $$
///
/// The sum of the horizontal terms weighted by cell area telescopes to the
/// boundary-row fluxes, so the scheme conserves the area integral whenever the
/// meridional wind vanishes in the outermost rows.
pub fn flux_divergence(
    a: ArrayView3<f64>,
    u: ArrayView3<f64>,
    v: ArrayView3<f64>,
    w: ArrayView3<f64>,
    grid: &Grid,
    vertical_flux_factor: f64,
) -> Array3<f64> {
    let au = &a * &u;
    let av = scale_rows((&a * &v).view(), grid);
    let aw = &a * &w;
    let cos = grid.cos_latitudes();
    let pressure = grid.pressure_levels().to_vec();
    Array3::from_shape_fn(a.dim(), |(i, j, k)| {
        gradient_x(au.view(), grid, i, j, k)
            + gradient_y(av.view(), grid, i, j, k) / cos[i]
            + vertical_flux_factor * gradient_p(aw.view(), &pressure, i, j, k)
    })
}

/// Horizontal divergence of a plane wind field.
pub fn plane_divergence(x_dot: ArrayView3<f64>, y_dot: ArrayView3<f64>, spacing: f64) -> Array3<f64> {
    Array3::from_shape_fn(x_dot.dim(), |(iy, ix, k)| {
        plane_gradient_x(x_dot, spacing, iy, ix, k) + plane_gradient_y(y_dot, spacing, iy, ix, k)
    })
}

/// Flux-form transport of a scalar on a polar plane.
pub fn plane_flux_divergence(
    a: ArrayView3<f64>,
    x_dot: ArrayView3<f64>,
    y_dot: ArrayView3<f64>,
    w: ArrayView3<f64>,
    spacing: f64,
    pressure: &[f64],
    vertical_flux_factor: f64,
) -> Array3<f64> {
    let ax = &a * &x_dot;
    let ay = &a * &y_dot;
    let aw = &a * &w;
    Array3::from_shape_fn(a.dim(), |(iy, ix, k)| {
        plane_gradient_x(ax.view(), spacing, iy, ix, k)
            + plane_gradient_y(ay.view(), spacing, iy, ix, k)
            + vertical_flux_factor * gradient_p(aw.view(), pressure, iy, ix, k)
    })
}

/// Replace the outermost rows by the zonal mean of their neighbouring row, level by level.
pub fn fill_boundary_rows(mut field: ArrayViewMut3<f64>) {
    let (nlat, _, nlevels) = field.dim();
    for k in 0..nlevels {
        let south = field.slice(s![1, .., k]).mean().unwrap_or(0.0);
        let north = field.slice(s![nlat - 2, .., k]).mean().unwrap_or(0.0);
        field.slice_mut(s![0, .., k]).fill(south);
        field.slice_mut(s![nlat - 1, .., k]).fill(north);
    }
}

/// Horizontal Laplacian of a surface field.
///
/// The outermost rows take the zonal mean of the adjacent row.
pub fn laplacian_2d(a: ArrayView2<f64>, grid: &Grid) -> Array2<f64> {
    let column = a.insert_axis(Axis(2));
    let mut out = horizontal_laplacian(column, grid);
    fill_boundary_rows(out.view_mut());
    out.index_axis_move(Axis(2), 0)
}

/// Laplacian of an atmospheric field, including a second derivative in pressure.
///
/// The outermost rows take the zonal mean of the adjacent row.
pub fn laplacian_3d(a: ArrayView3<f64>, grid: &Grid) -> Array3<f64> {
    let mut out = horizontal_laplacian(a, grid);
    let p = grid.pressure_levels();
    let nlevels = a.dim().2;
    for k in 1..nlevels.saturating_sub(1) {
        let span = 0.5 * (p[k + 1] - p[k - 1]);
        let mut level = out.index_axis_mut(Axis(2), k);
        for ((i, j), value) in level.indexed_iter_mut() {
            let up = (a[[i, j, k + 1]] - a[[i, j, k]]) / (p[k + 1] - p[k]);
            let down = (a[[i, j, k]] - a[[i, j, k - 1]]) / (p[k] - p[k - 1]);
            *value += (up - down) / span;
        }
    }
    fill_boundary_rows(out.view_mut());
    out
}

fn horizontal_laplacian(a: ArrayView3<f64>, grid: &Grid) -> Array3<f64> {
    let (nlat, nlon, nlevels) = a.dim();
    let hy = 0.5 * grid.dy();
    let mut out = Array3::zeros((nlat, nlon, nlevels));
    for i in 1..nlat - 1 {
        let hx = 0.5 * grid.dx()[i];
        for j in 0..nlon {
            let east = (j + 1) % nlon;
            let west = (j + nlon - 1) % nlon;
            for k in 0..nlevels {
                let centre = a[[i, j, k]];
                out[[i, j, k]] = (a[[i, east, k]] - 2.0 * centre + a[[i, west, k]]) / (hx * hx)
                    + (a[[i + 1, j, k]] - 2.0 * centre + a[[i - 1, j, k]]) / (hy * hy);
            }
        }
    }
    out
}

fn scale_rows(a: ArrayView3<f64>, grid: &Grid) -> Array3<f64> {
    let mut scaled = a.to_owned();
    for (i, mut row) in scaled.axis_iter_mut(Axis(0)).enumerate() {
        row *= grid.cos_latitudes()[i];
    }
    scaled
}
