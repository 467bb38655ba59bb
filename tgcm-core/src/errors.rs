use thiserror::Error;

/// Error type for invalid configurations and failed integrations.
#[derive(Error, Debug)]
pub enum GcmError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Empty polar blend band. pole_low_index={low} must be less than pole_high_index={high}")]
    InvalidBlendBand { low: usize, high: usize },
    #[error("Shape mismatch for {field}. Expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        field: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("Malformed reference atmosphere at line {line}: {reason}")]
    ReferenceAtmosphere { line: usize, reason: String },
    /// A non-finite value appeared in a velocity field.
    ///
    /// `time` is the elapsed model time (s) at the start of the failing step.
    #[error("Model diverged: non-finite value in {field} during the step starting at t={time} s")]
    NumericalDivergence { field: String, time: f64 },
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Failed to write configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
    #[error("Checkpoint encoding failed: {0}")]
    Checkpoint(#[from] bincode::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience type for `Result<T, GcmError>`.
pub type GcmResult<T> = Result<T, GcmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_write_failure_converts() {
        // Only tables can be written as a TOML document
        let err: GcmError = toml::to_string(&42).unwrap_err().into();
        assert!(matches!(err, GcmError::ConfigSerialize(_)));
        assert!(err.to_string().starts_with("Failed to write configuration"));
    }
}
