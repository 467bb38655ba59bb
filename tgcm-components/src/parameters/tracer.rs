use serde::{Deserialize, Serialize};

/// A cell whose tracer mixing ratio is reset at the start of every step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TracerSource {
    pub lat_index: usize,
    pub lon_index: usize,
    pub level: usize,
    /// Mixing ratio imposed at the cell
    pub value: f64,
}

impl TracerSource {
    pub fn new(lat_index: usize, lon_index: usize, level: usize, value: f64) -> Self {
        Self {
            lat_index,
            lon_index,
            level,
            value,
        }
    }
}

/// Parameters for [`crate::components::TracerSources`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TracerParameters {
    /// Point sources.
    /// Default: unit sources at `(40, 50)` and `(20, 50)` on level 5
    pub sources: Vec<TracerSource>,
}

impl Default for TracerParameters {
    fn default() -> Self {
        Self {
            sources: vec![TracerSource::new(40, 50, 5, 1.0), TracerSource::new(20, 50, 5, 1.0)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sources_deserialize() {
        let params: TracerParameters = serde_json::from_str(r#"{"sources": []}"#).unwrap();
        assert!(params.sources.is_empty());
        assert_eq!(TracerParameters::default().sources.len(), 2);
    }
}
