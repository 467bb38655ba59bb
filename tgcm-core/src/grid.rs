//! Spherical latitude-longitude grid
//!
//! Cells are centred, so no row sits exactly on a pole and the longitude of
//! column `j` mirrored through the prime meridian is the longitude of column
//! `nlon - 1 - j`. Fields are stored `[lat, lon]` or `[lat, lon, level]`.
//!
//! The horizontal spacings `dx` and `dy` span *two* cells. A centred difference
//! is therefore `(a[i + 1] - a[i - 1]) / dy` and a one-sided difference at a
//! boundary is `2 (a[1] - a[0]) / dy`.

use crate::errors::GcmResult;
use crate::parameters::{GridParameters, PlanetParameters};
use crate::thermodynamics::sigma_coordinate;
use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

/// Immutable geometry of the spherical grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grid {
    latitudes: Array1<f64>,
    longitudes: Array1<f64>,
    pressure_levels: Array1<f64>,
    sigma: Array1<f64>,
    /// Centred-difference span along each row (m)
    dx: Array1<f64>,
    /// Centred-difference span between rows (m)
    dy: f64,
    coriolis: Array1<f64>,
    cos_latitudes: Array1<f64>,
    planet_radius: f64,
    gravity: f64,
    top_level_index: usize,
}

impl Grid {
    /// Build the grid geometry, validating the parameters first.
    pub fn new(params: &GridParameters, planet: &PlanetParameters) -> GcmResult<Self> {
        params.validate()?;
        planet.validate()?;

        let nlat = params.nlat;
        let nlon = params.nlon;
        let lat_spacing = 180.0 / nlat as f64;
        let lon_spacing = 360.0 / nlon as f64;

        let latitudes = Array1::from_shape_fn(nlat, |i| -90.0 + (i as f64 + 0.5) * lat_spacing);
        let longitudes = Array1::from_shape_fn(nlon, |j| (j as f64 + 0.5) * lon_spacing);
        let cos_latitudes = latitudes.mapv(|lat: f64| lat.to_radians().cos());

        let radius = planet.radius;
        let dy = 2.0 * radius * lat_spacing.to_radians();
        let dx = cos_latitudes.mapv(|c| 2.0 * radius * c * lon_spacing.to_radians());

        let omega = planet.angular_speed();
        let coriolis = latitudes.mapv(|lat: f64| 2.0 * omega * lat.to_radians().sin());

        let pressure_levels = Array1::from_vec(params.pressure_levels.clone());
        let sigma = sigma_coordinate(&pressure_levels);

        Ok(Self {
            latitudes,
            longitudes,
            pressure_levels,
            sigma,
            dx,
            dy,
            coriolis,
            cos_latitudes,
            planet_radius: radius,
            gravity: planet.gravity,
            top_level_index: params.top_level_index,
        })
    }

    pub fn nlat(&self) -> usize {
        self.latitudes.len()
    }

    pub fn nlon(&self) -> usize {
        self.longitudes.len()
    }

    pub fn nlevels(&self) -> usize {
        self.pressure_levels.len()
    }

    /// Shape of a surface field.
    pub fn shape_2d(&self) -> (usize, usize) {
        (self.nlat(), self.nlon())
    }

    /// Shape of an atmospheric field.
    pub fn shape_3d(&self) -> (usize, usize, usize) {
        (self.nlat(), self.nlon(), self.nlevels())
    }

    pub fn zeros_2d(&self) -> Array2<f64> {
        Array2::zeros(self.shape_2d())
    }

    pub fn zeros_3d(&self) -> Array3<f64> {
        Array3::zeros(self.shape_3d())
    }

    /// Latitude of each row (degrees).
    pub fn latitudes(&self) -> &Array1<f64> {
        &self.latitudes
    }

    /// Longitude of each column (degrees).
    pub fn longitudes(&self) -> &Array1<f64> {
        &self.longitudes
    }

    pub fn cos_latitudes(&self) -> &Array1<f64> {
        &self.cos_latitudes
    }

    /// Row spacing (degrees).
    pub fn lat_spacing(&self) -> f64 {
        180.0 / self.nlat() as f64
    }

    /// Column spacing (degrees).
    pub fn lon_spacing(&self) -> f64 {
        360.0 / self.nlon() as f64
    }

    pub fn pressure_levels(&self) -> &Array1<f64> {
        &self.pressure_levels
    }

    pub fn sigma(&self) -> &Array1<f64> {
        &self.sigma
    }

    pub fn dx(&self) -> &Array1<f64> {
        &self.dx
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Coriolis parameter of each row (1/s).
    pub fn coriolis(&self) -> &Array1<f64> {
        &self.coriolis
    }

    pub fn planet_radius(&self) -> f64 {
        self.planet_radius
    }

    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    /// First level of the lid. Scalar tendencies vanish from here upward.
    pub fn top_level_index(&self) -> usize {
        self.top_level_index
    }

    /// Level whose scalar tendencies are halved.
    pub fn sponge_level_index(&self) -> usize {
        self.top_level_index - 1
    }

    /// Highest level that carries a non-zero vertical velocity boundary.
    ///
    /// The pressure velocity is pinned to zero here and at every level above.
    pub fn lid_level(&self) -> usize {
        self.top_level_index.min(self.nlevels() - 1)
    }

    /// Surface area of a cell in row `i` (m^2).
    pub fn cell_area(&self, i: usize) -> f64 {
        let r = self.planet_radius;
        r * r
            * self.cos_latitudes[i]
            * self.lat_spacing().to_radians()
            * self.lon_spacing().to_radians()
    }

    /// Pressure thickness of the layer represented by level `k` (Pa).
    ///
    /// Layer interfaces sit halfway between levels; the outermost layers end
    /// at the first and last level.
    pub fn layer_thickness(&self, k: usize) -> f64 {
        let p = &self.pressure_levels;
        let n = p.len();
        let lower = if k == 0 { p[0] } else { 0.5 * (p[k - 1] + p[k]) };
        let upper = if k + 1 == n {
            p[n - 1]
        } else {
            0.5 * (p[k] + p[k + 1])
        };
        lower - upper
    }
}
