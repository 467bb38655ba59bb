//! Polar projection planes
//!
//! Near the poles the longitude spacing of the spherical grid collapses and
//! the zonal derivatives become ill-conditioned. Each hemisphere therefore
//! carries a square Cartesian plane centred on its pole onto which the polar
//! cap is projected orthographically (a point at latitude $\phi$ sits at radius
//! $r = R\cos\phi$ from the pole). Dynamics are evaluated on the plane, mapped
//! back onto the spherical rows and blended with the spherical solution.
//!
//! # Geometry
//!
//! A plane cell at $(x, y)$ has polar angle $\vartheta = \operatorname{atan2}(y, x)$
//! and is tabulated at latitude $\pm\arccos(r / R)$ and longitude
//! $-\vartheta \bmod 360$. The south cap is sampled directly at the tabulated
//! longitude. The north cap is mirrored along the longitude axis first, so
//! both planes are seen from above their pole with the local vertical as the
//! right-handed normal. The Coriolis acceleration takes the same form
//! $(f\dot y, -f\dot x)$ on both planes.
//!
//! # Blend band
//!
//! Rows are counted poleward within each hemisphere (`i` in the north,
//! `nlat - 1 - i` in the south). `pole_low_index` is the first such row beyond
//! `pole_lower_lat_limit`, `pole_high_index` the first beyond
//! `pole_higher_lat_limit`. Between the two the plane solution is blended in
//! linearly by latitude; poleward of the high index only the plane is used.

use crate::errors::{GcmError, GcmResult};
use crate::grid::Grid;
use crate::parameters::GridParameters;
use crate::utils::interpolation::{bracket, periodic_bracket, periodic_nearest};
use log::warn;
use ndarray::{s, Array1, Array2, Array3, ArrayView2, ArrayView3, Axis, Zip};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    pub fn sign(self) -> f64 {
        match self {
            Hemisphere::North => 1.0,
            Hemisphere::South => -1.0,
        }
    }

    /// Map between spherical rows and poleward row numbers.
    ///
    /// The mapping is its own inverse.
    pub fn row(self, nlat: usize, index: usize) -> usize {
        match self {
            Hemisphere::North => index,
            Hemisphere::South => nlat - 1 - index,
        }
    }
}

/// Cartesian plane over one polar cap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolarPlane {
    hemisphere: Hemisphere,
    pole_low_index: usize,
    pole_high_index: usize,
    padding: usize,
    nlat: usize,
    nlon: usize,
    /// Column spacing of the spherical grid (degrees)
    lon_spacing: f64,
    planet_radius: f64,
    resolution: f64,
    axis: Array1<f64>,
    /// Absolute latitude of each padded cap row, ordered poleward
    cap_latitudes: Vec<f64>,
    grid_latitudes: Array2<f64>,
    grid_longitudes: Array2<f64>,
    coriolis: Array2<f64>,
    /// Plane velocity along `x` (m/s), indexed `[y, x, level]`
    pub x_dot: Array3<f64>,
    /// Plane velocity along `y` (m/s)
    pub y_dot: Array3<f64>,
    /// Pressure velocity diagnosed on the plane (Pa/s)
    pub w: Array3<f64>,
}

impl PolarPlane {
    pub fn new(hemisphere: Hemisphere, grid: &Grid, params: &GridParameters) -> GcmResult<Self> {
        let lower = params.pole_lower_lat_limit;
        let higher = params.pole_higher_lat_limit;
        if !(lower > 0.0 && lower < higher && higher < 90.0) {
            return Err(GcmError::InvalidConfiguration(format!(
                "polar latitude limits must satisfy 0 < lower < higher < 90, got lower={lower} higher={higher}"
            )));
        }

        let nlat = grid.nlat();
        let latitudes = grid.latitudes();
        let signed_latitude = |p: usize| hemisphere.sign() * latitudes[hemisphere.row(nlat, p)];
        let first_beyond = |limit: f64| {
            (0..nlat)
                .find(|&p| signed_latitude(p) > limit)
                .ok_or_else(|| {
                    GcmError::InvalidConfiguration(format!(
                        "no grid row lies poleward of {limit} degrees"
                    ))
                })
        };
        let pole_low_index = first_beyond(lower)?;
        let pole_high_index = first_beyond(higher)?;
        if pole_low_index >= pole_high_index {
            return Err(GcmError::InvalidBlendBand {
                low: pole_low_index,
                high: pole_high_index,
            });
        }

        let padding = params.polar_grid_padding;
        if padding > pole_low_index {
            return Err(GcmError::InvalidConfiguration(format!(
                "polar_grid_padding={padding} reaches past the equator (pole_low_index={pole_low_index})"
            )));
        }
        let start = pole_low_index - padding;
        let cap_latitudes: Vec<f64> = (start..nlat).map(|p| signed_latitude(p)).collect();

        let radius = grid.planet_radius();
        let lon_spacing = grid.lon_spacing();
        let resolution =
            radius * cap_latitudes[padding].to_radians().cos() * lon_spacing.to_radians();
        let half_width = radius * cap_latitudes[0].to_radians().cos();
        let side = ((2.0 * half_width / resolution).ceil() as usize).max(2);
        let centre = (side - 1) as f64 / 2.0;
        let axis = Array1::from_shape_fn(side, |m| (m as f64 - centre) * resolution);

        let sign = hemisphere.sign();
        let grid_latitudes = Array2::from_shape_fn((side, side), |(iy, ix)| {
            let r = axis[ix].hypot(axis[iy]);
            sign * (r / radius).min(1.0).acos().to_degrees()
        });
        let grid_longitudes = Array2::from_shape_fn((side, side), |(iy, ix)| {
            (-axis[iy].atan2(axis[ix])).to_degrees().rem_euclid(360.0)
        });

        let nlevels = grid.nlevels();
        let mut plane = Self {
            hemisphere,
            pole_low_index,
            pole_high_index,
            padding,
            nlat,
            nlon: grid.nlon(),
            lon_spacing,
            planet_radius: radius,
            resolution,
            axis,
            cap_latitudes,
            grid_latitudes,
            grid_longitudes,
            coriolis: Array2::zeros((side, side)),
            x_dot: Array3::zeros((side, side, nlevels)),
            y_dot: Array3::zeros((side, side, nlevels)),
            w: Array3::zeros((side, side, nlevels)),
        };
        let f = grid.coriolis();
        let coriolis = Array2::from_shape_fn(grid.shape_2d(), |(i, _)| f[i]);
        plane.coriolis = plane.project_2d(coriolis.view());
        Ok(plane)
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    pub fn pole_low_index(&self) -> usize {
        self.pole_low_index
    }

    pub fn pole_high_index(&self) -> usize {
        self.pole_high_index
    }

    /// Number of cells along each side of the plane.
    pub fn side_length(&self) -> usize {
        self.axis.len()
    }

    /// Cell spacing on the plane (m).
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Cell centre coordinates, shared by both plane axes (m).
    pub fn axis(&self) -> &Array1<f64> {
        &self.axis
    }

    /// Latitude sampled by each plane cell (degrees, negative in the south).
    pub fn grid_latitudes(&self) -> &Array2<f64> {
        &self.grid_latitudes
    }

    /// Longitude sampled by each plane cell, in the mirrored frame for the north.
    pub fn grid_longitudes(&self) -> &Array2<f64> {
        &self.grid_longitudes
    }

    pub fn coriolis(&self) -> &Array2<f64> {
        &self.coriolis
    }

    /// Spherical rows covered by the cap, in increasing row order.
    pub fn cap_range(&self) -> Range<usize> {
        match self.hemisphere {
            Hemisphere::North => self.pole_low_index..self.nlat,
            Hemisphere::South => 0..self.nlat - self.pole_low_index,
        }
    }

    pub fn cap_rows(&self) -> usize {
        self.nlat - self.pole_low_index
    }

    /// Sample a spherical field at every plane cell.
    ///
    /// `field` covers the whole sphere; only the padded cap is read. Values are
    /// interpolated bilinearly in latitude and longitude. Cells beyond the
    /// outermost cap rows take the value of the nearest row.
    pub fn project(&self, field: ArrayView3<f64>) -> Array3<f64> {
        assert_eq!(
            (field.dim().0, field.dim().1),
            (self.nlat, self.nlon),
            "field does not match the spherical grid"
        );
        let cap = self.oriented(field);
        let side = self.side_length();
        let nlevels = cap.dim().2;
        let mut out = Array3::zeros((side, side, nlevels));
        for ((iy, ix), lat) in self.grid_latitudes.indexed_iter() {
            let (r0, r1, wr) = bracket(&self.cap_latitudes, lat.abs());
            let (j0, j1, wl) =
                periodic_bracket(self.grid_longitudes[[iy, ix]], self.lon_spacing, self.nlon);
            for k in 0..nlevels {
                let near = (1.0 - wl) * cap[[r0, j0, k]] + wl * cap[[r0, j1, k]];
                let far = (1.0 - wl) * cap[[r1, j0, k]] + wl * cap[[r1, j1, k]];
                out[[iy, ix, k]] = (1.0 - wr) * near + wr * far;
            }
        }
        out
    }

    pub fn project_2d(&self, field: ArrayView2<f64>) -> Array2<f64> {
        self.project(field.insert_axis(Axis(2)))
            .index_axis_move(Axis(2), 0)
    }

    /// Map a plane field back onto the spherical cap rows.
    ///
    /// Each plane cell inside the cap contributes to its nearest spherical
    /// cell and contributions are averaged. Spherical cells without any
    /// contribution are interpolated bilinearly from the plane at their own
    /// position. Cells the plane does not reach are zero-filled and reported.
    ///
    /// The result covers [`PolarPlane::cap_range`] in spherical row order.
    pub fn reproject(&self, plane_field: ArrayView3<f64>) -> Array3<f64> {
        let side = self.side_length();
        assert_eq!(
            (plane_field.dim().0, plane_field.dim().1),
            (side, side),
            "field does not match the polar plane"
        );
        let nlevels = plane_field.dim().2;
        let ncap = self.cap_rows();
        let (sum, count) = self.scatter(plane_field);

        let mut oriented = Array3::zeros((ncap, self.nlon, nlevels));
        let mut unfilled = 0;
        for c in 0..ncap {
            let radius =
                self.planet_radius * self.cap_latitudes[self.padding + c].to_radians().cos();
            for j in 0..self.nlon {
                let n = count[[c, j]];
                if n > 0 {
                    for k in 0..nlevels {
                        oriented[[c, j, k]] = sum[[c, j, k]] / n as f64;
                    }
                    continue;
                }
                let angle = -((j as f64 + 0.5) * self.lon_spacing).to_radians();
                match self.locate(radius * angle.cos(), radius * angle.sin()) {
                    Some(((y0, y1, wy), (x0, x1, wx))) => {
                        for k in 0..nlevels {
                            let low = (1.0 - wx) * plane_field[[y0, x0, k]]
                                + wx * plane_field[[y0, x1, k]];
                            let high = (1.0 - wx) * plane_field[[y1, x0, k]]
                                + wx * plane_field[[y1, x1, k]];
                            oriented[[c, j, k]] = (1.0 - wy) * low + wy * high;
                        }
                    }
                    None => unfilled += 1,
                }
            }
        }
        if unfilled > 0 {
            warn!(
                "{:?} polar plane does not reach {} of {} cap cells; zero-filled",
                self.hemisphere,
                unfilled,
                ncap * self.nlon
            );
        }
        self.to_spherical_order(oriented)
    }

    /// Sum the plane cells falling nearest to each oriented cap cell.
    ///
    /// Returns the per-cell sums and the number of contributing plane cells.
    fn scatter(&self, plane_field: ArrayView3<f64>) -> (Array3<f64>, Array2<usize>) {
        let nlevels = plane_field.dim().2;
        let ncap = self.cap_rows();
        let mut sum = Array3::<f64>::zeros((ncap, self.nlon, nlevels));
        let mut count = Array2::<usize>::zeros((ncap, self.nlon));
        let row_spacing = self.cap_latitudes[1] - self.cap_latitudes[0];
        for ((iy, ix), lat) in self.grid_latitudes.indexed_iter() {
            let offset = ((lat.abs() - self.cap_latitudes[0]) / row_spacing).round();
            if offset < self.padding as f64 {
                continue;
            }
            let c = offset as usize - self.padding;
            if c >= ncap {
                continue;
            }
            let j = periodic_nearest(self.grid_longitudes[[iy, ix]], self.lon_spacing, self.nlon);
            count[[c, j]] += 1;
            for k in 0..nlevels {
                sum[[c, j, k]] += plane_field[[iy, ix, k]];
            }
        }
        (sum, count)
    }

    /// Weight of the plane solution in spherical row `row`.
    ///
    /// Zero at and equatorward of the low index, one at and poleward of the
    /// high index and linear in latitude in between.
    pub fn blend_weight(&self, row: usize) -> f64 {
        let p = self.hemisphere.row(self.nlat, row);
        if p <= self.pole_low_index {
            return 0.0;
        }
        if p >= self.pole_high_index {
            return 1.0;
        }
        let start = self.pole_low_index - self.padding;
        let lat = |q: usize| self.cap_latitudes[q - start];
        (lat(p) - lat(self.pole_low_index))
            / (lat(self.pole_high_index) - lat(self.pole_low_index))
    }

    pub fn blend(&self, row: usize, spherical: f64, plane: f64) -> f64 {
        let weight = self.blend_weight(row);
        (1.0 - weight) * spherical + weight * plane
    }

    /// Blend a reprojected cap (see [`PolarPlane::reproject`]) into a spherical field.
    pub fn blend_into(&self, field: &mut Array3<f64>, plane_cap: ArrayView3<f64>) {
        let range = self.cap_range();
        assert_eq!(
            plane_cap.dim().0,
            range.len(),
            "reprojected field does not cover the polar cap"
        );
        for (c, row) in range.enumerate() {
            let weight = self.blend_weight(row);
            let mut target = field.index_axis_mut(Axis(0), row);
            Zip::from(&mut target)
                .and(plane_cap.index_axis(Axis(0), c))
                .for_each(|value, &plane| *value = (1.0 - weight) * *value + weight * plane);
        }
    }

    /// Convert eastward and northward wind into plane velocity components.
    pub fn project_velocity(
        &self,
        u: ArrayView3<f64>,
        v: ArrayView3<f64>,
    ) -> (Array3<f64>, Array3<f64>) {
        let u_plane = self.project(u);
        let v_plane = self.project(v);
        let (side, _, nlevels) = u_plane.dim();
        let mut x_dot = Array3::zeros(u_plane.dim());
        let mut y_dot = Array3::zeros(u_plane.dim());
        for iy in 0..side {
            for ix in 0..side {
                let (east, north) = self.basis(self.axis[iy].atan2(self.axis[ix]));
                for k in 0..nlevels {
                    let (east_speed, north_speed) = (u_plane[[iy, ix, k]], v_plane[[iy, ix, k]]);
                    x_dot[[iy, ix, k]] = east_speed * east.0 + north_speed * north.0;
                    y_dot[[iy, ix, k]] = east_speed * east.1 + north_speed * north.1;
                }
            }
        }
        (x_dot, y_dot)
    }

    /// Refresh the plane velocities from the spherical wind.
    pub fn sync_velocity(&mut self, u: ArrayView3<f64>, v: ArrayView3<f64>) {
        let (x_dot, y_dot) = self.project_velocity(u, v);
        self.x_dot = x_dot;
        self.y_dot = y_dot;
    }

    /// Eastward and northward wind on the cap rows implied by the plane velocities.
    pub fn reproject_velocity(&self) -> (Array3<f64>, Array3<f64>) {
        let x_cap = self.reproject(self.x_dot.view());
        let y_cap = self.reproject(self.y_dot.view());
        let (ncap, nlon, nlevels) = x_cap.dim();
        let mut u = Array3::zeros(x_cap.dim());
        let mut v = Array3::zeros(x_cap.dim());
        for j in 0..nlon {
            let lon = ((j as f64 + 0.5) * self.lon_spacing).to_radians();
            let (east, north) = self.basis(self.hemisphere.sign() * lon);
            for c in 0..ncap {
                for k in 0..nlevels {
                    let (xd, yd) = (x_cap[[c, j, k]], y_cap[[c, j, k]]);
                    u[[c, j, k]] = xd * east.0 + yd * east.1;
                    v[[c, j, k]] = xd * north.0 + yd * north.1;
                }
            }
        }
        (u, v)
    }

    /// Unit eastward and northward vectors at polar angle `angle`.
    fn basis(&self, angle: f64) -> ((f64, f64), (f64, f64)) {
        let s = self.hemisphere.sign();
        let (sin, cos) = angle.sin_cos();
        ((-s * sin, s * cos), (-s * cos, -s * sin))
    }

    /// Padded cap rows ordered poleward, mirrored in longitude for the north.
    fn oriented<'a>(&self, field: ArrayView3<'a, f64>) -> ArrayView3<'a, f64> {
        let start = self.pole_low_index - self.padding;
        match self.hemisphere {
            Hemisphere::North => field.slice_move(s![start.., ..;-1, ..]),
            Hemisphere::South => {
                let rows = self.nlat - start;
                field.slice_move(s![..rows;-1, .., ..])
            }
        }
    }

    fn to_spherical_order(&self, oriented: Array3<f64>) -> Array3<f64> {
        match self.hemisphere {
            Hemisphere::North => oriented.slice(s![.., ..;-1, ..]).to_owned(),
            Hemisphere::South => oriented.slice(s![..;-1, .., ..]).to_owned(),
        }
    }

    #[allow(clippy::type_complexity)]
    fn locate(&self, x: f64, y: f64) -> Option<((usize, usize, f64), (usize, usize, f64))> {
        let side = self.side_length();
        let last = (side - 1) as f64;
        let fx = (x - self.axis[0]) / self.resolution;
        let fy = (y - self.axis[0]) / self.resolution;
        if !(0.0..=last).contains(&fx) || !(0.0..=last).contains(&fy) {
            return None;
        }
        let split = |position: f64| {
            let lower = (position.floor() as usize).min(side - 2);
            (lower, lower + 1, position - lower as f64)
        };
        Some((split(fy), split(fx)))
    }
}

/// The pair of polar planes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolarPlanes {
    pub north: PolarPlane,
    pub south: PolarPlane,
}

impl PolarPlanes {
    pub fn new(grid: &Grid, params: &GridParameters) -> GcmResult<Self> {
        Ok(Self {
            north: PolarPlane::new(Hemisphere::North, grid, params)?,
            south: PolarPlane::new(Hemisphere::South, grid, params)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PolarPlane> {
        [&self.north, &self.south].into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PolarPlane> {
        [&mut self.north, &mut self.south].into_iter()
    }
}
