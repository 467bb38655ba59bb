//! Smoothing Parameters
//!
//! Retained fractions for the zonal filter applied by the dynamical core.
//! Each fraction is the share of the zonal wavenumbers resolvable at the
//! equator that survives filtering; toward the poles the cutoff shrinks with
//! the cosine of latitude.

use serde::{Deserialize, Serialize};

/// Zonal smoothing of the dynamical fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmoothingParameters {
    /// Whether the filter is applied at all.
    /// Default: true
    pub enabled: bool,

    /// Retained fraction for potential temperature.
    /// Default: 1.0
    pub potential_temperature: f64,

    /// Retained fraction for the eastward wind.
    /// Default: 0.9
    pub u: f64,

    /// Retained fraction for the northward wind.
    /// Default: 0.9
    pub v: f64,

    /// Retained fraction for the pressure velocity.
    /// Default: 0.3
    pub w: f64,

    /// Retained fraction for the potential temperature tendency.
    /// Default: 0.5
    pub tendency: f64,
}

impl Default for SmoothingParameters {
    fn default() -> Self {
        Self {
            enabled: true,
            potential_temperature: 1.0,
            u: 0.9,
            v: 0.9,
            w: 0.3,
            tendency: 0.5,
        }
    }
}

impl SmoothingParameters {
    /// Fractions by field name, in the order they are applied.
    pub fn fractions(&self) -> [(&'static str, f64); 5] {
        [
            ("u", self.u),
            ("v", self.v),
            ("w", self.w),
            ("tendency", self.tendency),
            ("potential_temperature", self.potential_temperature),
        ]
    }
}
