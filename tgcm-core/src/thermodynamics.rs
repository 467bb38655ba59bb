//! Dry-air thermodynamics
//!
//! Conversions between temperature and potential temperature, the sigma
//! coordinate used for the hydrostatic geopotential, and the geopotential
//! integration itself.

use ndarray::{Array1, Array3, ArrayView3, Axis, Zip};

/// Specific gas constant of dry air (J / kg K).
pub const GAS_CONSTANT: f64 = 287.0;

/// Specific heat capacity of dry air at constant pressure (J / kg K).
pub const SPECIFIC_HEAT: f64 = 1000.0;

/// Poisson exponent, $\kappa = R / c_p$.
pub const KAPPA: f64 = GAS_CONSTANT / SPECIFIC_HEAT;

/// Stefan-Boltzmann constant (W / m^2 K^4).
pub const STEFAN_BOLTZMANN: f64 = 5.67e-8;

/// Potential temperature of air at `pressure` referenced to `reference_pressure`.
///
/// $$ \theta = T \left(\frac{p_0}{p}\right)^{\kappa} $$
pub fn t_to_theta(temperature: f64, pressure: f64, reference_pressure: f64) -> f64 {
    temperature * (reference_pressure / pressure).powf(KAPPA)
}

/// Inverse of [`t_to_theta`].
pub fn theta_to_t(theta: f64, pressure: f64, reference_pressure: f64) -> f64 {
    theta * (pressure / reference_pressure).powf(KAPPA)
}

/// Convert a potential temperature field to temperature, level by level.
///
/// The first pressure level is the reference pressure.
pub fn temperature_field(theta: ArrayView3<f64>, pressure_levels: &Array1<f64>) -> Array3<f64> {
    let reference = pressure_levels[0];
    let mut temperature = theta.to_owned();
    for (k, mut level) in temperature.axis_iter_mut(Axis(2)).enumerate() {
        let pressure = pressure_levels[k];
        level.mapv_inplace(|value| theta_to_t(value, pressure, reference));
    }
    temperature
}

/// Sigma coordinate of each level, $(p_k / p_0)^{\kappa}$, equal to 1 at the surface.
pub fn sigma_coordinate(pressure_levels: &Array1<f64>) -> Array1<f64> {
    let reference = pressure_levels[0];
    pressure_levels.mapv(|p| (p / reference).powf(KAPPA))
}

/// Integrate the hydrostatic relation upward from the surface.
///
/// $$ \Phi_k = \Phi_{k-1} - c_p\,\theta_k\,(\sigma_k - \sigma_{k-1}), \quad \Phi_0 = 0 $$
pub fn update_geopotential(
    theta: ArrayView3<f64>,
    sigma: &Array1<f64>,
    geopotential: &mut Array3<f64>,
) {
    assert_eq!(
        theta.dim(),
        geopotential.dim(),
        "geopotential and potential temperature must share a shape"
    );
    let nlevels = theta.dim().2;
    geopotential.index_axis_mut(Axis(2), 0).fill(0.0);
    for k in 1..nlevels {
        let dsigma = sigma[k] - sigma[k - 1];
        let (below, mut above) = geopotential.multi_slice_mut((
            ndarray::s![.., .., k - 1],
            ndarray::s![.., .., k],
        ));
        Zip::from(&mut above)
            .and(&below)
            .and(theta.index_axis(Axis(2), k))
            .for_each(|phi, &phi_below, &th| {
                *phi = phi_below - SPECIFIC_HEAT * th * dsigma;
            });
    }
}
