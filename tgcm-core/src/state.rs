use crate::errors::{GcmError, GcmResult};
use crate::grid::Grid;
use crate::thermodynamics::{t_to_theta, temperature_field};
use ndarray::{Array2, Array3, Dimension, IntoDimension};
use serde::{Deserialize, Serialize};

/// Prognostic and diagnostic fields of the model.
///
/// Surface fields are indexed `[lat, lon]`, atmospheric fields
/// `[lat, lon, level]`. A state is exclusively owned by the integrator and
/// mutated in place by one component at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelState {
    /// Surface temperature (K)
    pub surface_temperature: Array2<f64>,
    /// Surface albedo (dimensionless)
    pub albedo: Array2<f64>,
    /// Potential temperature referenced to the lowest level (K)
    pub potential_temperature: Array3<f64>,
    /// Geopotential relative to the lowest level (m^2/s^2)
    pub geopotential: Array3<f64>,
    /// Eastward wind (m/s)
    pub u: Array3<f64>,
    /// Northward wind (m/s)
    pub v: Array3<f64>,
    /// Pressure velocity (Pa/s), positive downward
    pub w: Array3<f64>,
    /// Passive tracer mixing ratio
    pub tracer: Array3<f64>,
    /// Last potential temperature tendency (K/s), positive when cooling
    pub scalar_tendency: Array3<f64>,
}

impl ModelState {
    /// A state at rest with the given potential temperature and surface values.
    pub fn at_rest(
        grid: &Grid,
        potential_temperature: Array3<f64>,
        surface_temperature: f64,
        albedo: f64,
    ) -> GcmResult<Self> {
        check_shape(
            "potential_temperature",
            potential_temperature.shape(),
            grid.shape_3d(),
        )?;
        Ok(Self {
            surface_temperature: Array2::from_elem(grid.shape_2d(), surface_temperature),
            albedo: Array2::from_elem(grid.shape_2d(), albedo),
            potential_temperature,
            geopotential: grid.zeros_3d(),
            u: grid.zeros_3d(),
            v: grid.zeros_3d(),
            w: grid.zeros_3d(),
            tracer: grid.zeros_3d(),
            scalar_tendency: grid.zeros_3d(),
        })
    }

    /// An atmosphere at rest with the temperature of each level given by `profile`.
    pub fn from_temperature_profile(
        grid: &Grid,
        profile: &[f64],
        surface_temperature: f64,
        albedo: f64,
    ) -> GcmResult<Self> {
        check_shape("temperature profile", &[profile.len()], grid.nlevels())?;
        let pressure = grid.pressure_levels();
        let reference = pressure[0];
        let theta = Array3::from_shape_fn(grid.shape_3d(), |(_, _, k)| {
            t_to_theta(profile[k], pressure[k], reference)
        });
        Self::at_rest(grid, theta, surface_temperature, albedo)
    }

    /// An isothermal atmosphere at rest.
    pub fn isothermal(
        grid: &Grid,
        temperature: f64,
        surface_temperature: f64,
        albedo: f64,
    ) -> GcmResult<Self> {
        let profile = vec![temperature; grid.nlevels()];
        Self::from_temperature_profile(grid, &profile, surface_temperature, albedo)
    }

    /// Air temperature of each cell (K).
    pub fn temperature(&self, grid: &Grid) -> Array3<f64> {
        temperature_field(self.potential_temperature.view(), grid.pressure_levels())
    }

    /// Name of the first wind component holding a NaN or infinity, if any.
    pub fn first_non_finite_velocity(&self) -> Option<&'static str> {
        [("u", &self.u), ("v", &self.v), ("w", &self.w)]
            .into_iter()
            .find(|(_, field)| field.iter().any(|value| !value.is_finite()))
            .map(|(name, _)| name)
    }

    /// Total tracer mass per unit mixing ratio (kg).
    ///
    /// Each cell is weighted by its area and by the air mass of its layer, $\Delta p / g$.
    pub fn tracer_mass(&self, grid: &Grid) -> f64 {
        self.tracer
            .indexed_iter()
            .map(|((i, _, k), value)| {
                value * grid.cell_area(i) * grid.layer_thickness(k) / grid.gravity()
            })
            .sum()
    }

    /// Check every field has the shape required by `grid`.
    pub fn validate(&self, grid: &Grid) -> GcmResult<()> {
        check_shape(
            "surface_temperature",
            self.surface_temperature.shape(),
            grid.shape_2d(),
        )?;
        check_shape("albedo", self.albedo.shape(), grid.shape_2d())?;
        for (name, field) in [
            ("potential_temperature", &self.potential_temperature),
            ("geopotential", &self.geopotential),
            ("u", &self.u),
            ("v", &self.v),
            ("w", &self.w),
            ("tracer", &self.tracer),
            ("scalar_tendency", &self.scalar_tendency),
        ] {
            check_shape(name, field.shape(), grid.shape_3d())?;
        }
        Ok(())
    }
}

/// Fail with [`GcmError::ShapeMismatch`] unless `found` matches `expected`.
pub fn check_shape<S: IntoDimension>(
    field: &str,
    found: &[usize],
    expected: S,
) -> GcmResult<()> {
    let expected = expected.into_dimension();
    if found != expected.slice() {
        return Err(GcmError::ShapeMismatch {
            field: field.to_string(),
            expected: expected.slice().to_vec(),
            found: found.to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{GridParameters, PlanetParameters};
    use approx::assert_relative_eq;

    fn grid() -> Grid {
        Grid::new(&GridParameters::default(), &PlanetParameters::default()).unwrap()
    }

    #[test]
    fn test_isothermal_state() {
        let grid = grid();
        let state = ModelState::isothermal(&grid, 290.0, 290.0, 0.2).unwrap();
        assert!(state.validate(&grid).is_ok());
        assert_eq!(state.potential_temperature[[3, 4, 0]], 290.0);
        assert!(state.potential_temperature[[3, 4, 10]] > 290.0);
        let temperature = state.temperature(&grid);
        assert_relative_eq!(temperature[[3, 4, 10]], 290.0, epsilon = 1e-9);
    }

    #[test]
    fn test_profile_length_is_checked() {
        let grid = grid();
        let result = ModelState::from_temperature_profile(&grid, &[280.0, 270.0], 290.0, 0.2);
        assert!(matches!(result, Err(GcmError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_non_finite_velocity_detection() {
        let grid = grid();
        let mut state = ModelState::isothermal(&grid, 290.0, 290.0, 0.2).unwrap();
        assert_eq!(state.first_non_finite_velocity(), None);
        state.v[[5, 5, 5]] = f64::INFINITY;
        assert_eq!(state.first_non_finite_velocity(), Some("v"));
        state.u[[0, 0, 0]] = f64::NAN;
        assert_eq!(state.first_non_finite_velocity(), Some("u"));
    }

    #[test]
    fn test_validate_reports_field() {
        let grid = grid();
        let mut state = ModelState::isothermal(&grid, 290.0, 290.0, 0.2).unwrap();
        state.tracer = Array3::zeros((2, 2, 2));
        match state.validate(&grid) {
            Err(GcmError::ShapeMismatch { field, found, .. }) => {
                assert_eq!(field, "tracer");
                assert_eq!(found, vec![2, 2, 2]);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_tracer_mass_scales_with_mixing_ratio() {
        let grid = grid();
        let mut state = ModelState::isothermal(&grid, 290.0, 290.0, 0.2).unwrap();
        assert_eq!(state.tracer_mass(&grid), 0.0);
        state.tracer.fill(1.0);
        let full = state.tracer_mass(&grid);
        // Whole column mass over the whole sphere
        let p = grid.pressure_levels();
        let r = grid.planet_radius();
        let expected = 4.0 * std::f64::consts::PI * r * r * (p[0] - p[grid.nlevels() - 1])
            / grid.gravity();
        assert_relative_eq!(full, expected, max_relative = 1e-3);
    }
}
