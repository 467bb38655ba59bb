//! Reference atmosphere profiles
//!
//! A reference atmosphere is a whitespace-delimited table with one row per
//! height and the columns `height temperature density pressure`. It is used to
//! initialise the vertical temperature profile of the model, so only the
//! temperature and pressure columns are kept. Blank lines and lines starting
//! with `#` are ignored.

use crate::errors::{GcmError, GcmResult};
use crate::utils::interpolation::interp;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceAtmosphere {
    temperatures: Vec<f64>,
    pressures: Vec<f64>,
}

impl ReferenceAtmosphere {
    pub fn parse(text: &str) -> GcmResult<Self> {
        let mut temperatures = vec![];
        let mut pressures = vec![];

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let values = line
                .split_whitespace()
                .map(|token| token.parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| GcmError::ReferenceAtmosphere {
                    line: index + 1,
                    reason: err.to_string(),
                })?;
            if values.len() != 4 {
                return Err(GcmError::ReferenceAtmosphere {
                    line: index + 1,
                    reason: format!("expected 4 columns, found {}", values.len()),
                });
            }
            temperatures.push(values[1]);
            pressures.push(values[3]);
        }

        if pressures.len() < 2 {
            return Err(GcmError::ReferenceAtmosphere {
                line: 0,
                reason: "at least two rows are required".to_string(),
            });
        }
        let decreasing = pressures.windows(2).all(|w| w[1] < w[0]);
        let increasing = pressures.windows(2).all(|w| w[1] > w[0]);
        if !(decreasing || increasing) {
            return Err(GcmError::ReferenceAtmosphere {
                line: 0,
                reason: "pressure must be strictly monotonic".to_string(),
            });
        }

        Ok(Self {
            temperatures,
            pressures,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> GcmResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Temperature at `pressure`, linear in pressure and clamped outside the table.
    pub fn temperature_at(&self, pressure: f64) -> f64 {
        if self.pressures[0] < self.pressures[self.pressures.len() - 1] {
            interp(pressure, &self.pressures, &self.temperatures)
        } else {
            let pressures: Vec<f64> = self.pressures.iter().rev().copied().collect();
            let temperatures: Vec<f64> = self.temperatures.iter().rev().copied().collect();
            interp(pressure, &pressures, &temperatures)
        }
    }

    /// Temperature at each of `pressure_levels`.
    pub fn temperature_profile(&self, pressure_levels: &[f64]) -> Vec<f64> {
        pressure_levels
            .iter()
            .map(|p| self.temperature_at(*p))
            .collect()
    }
}
