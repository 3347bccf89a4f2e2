//! Configuration for size-based rung capping.
//!
//! Read-only to the controller. Every field has a default, so an empty JSON
//! object is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CapError, CapResult};

/// Size-based capping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapConfig {
    /// Master enable: cap rungs to the playback surface size
    pub cap_to_surface_size: bool,

    /// Treat every display as density 1.0
    pub ignore_display_density: bool,

    /// Upper bound applied to the display density factor
    pub max_display_density: Option<f64>,

    /// Hard ceiling on the published cap, independent of surface size
    pub max_cap_index: Option<usize>,
}

impl Default for CapConfig {
    fn default() -> Self {
        Self {
            cap_to_surface_size: true,
            ignore_display_density: false,
            max_display_density: None,
            max_cap_index: None,
        }
    }
}

impl CapConfig {
    /// Parse and validate a config from a JSON document
    pub fn from_json_str(json: &str) -> CapResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> CapResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject values the controller cannot use
    pub fn validate(&self) -> CapResult<()> {
        if let Some(max) = self.max_display_density {
            if !max.is_finite() || max <= 0.0 {
                return Err(CapError::InvalidConfig(format!(
                    "max_display_density must be a positive finite number, got {}",
                    max
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CapConfig::default();
        assert!(config.cap_to_surface_size);
        assert!(!config.ignore_display_density);
        assert_eq!(config.max_display_density, None);
        assert_eq!(config.max_cap_index, None);
    }

    #[test]
    fn empty_object_uses_defaults() {
        let config = CapConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CapConfig::default());
    }

    #[test]
    fn parses_all_fields() {
        let config = CapConfig::from_json_str(
            r#"{
                "cap_to_surface_size": false,
                "ignore_display_density": true,
                "max_display_density": 2.0,
                "max_cap_index": 3
            }"#,
        )
        .unwrap();
        assert!(!config.cap_to_surface_size);
        assert!(config.ignore_display_density);
        assert_eq!(config.max_display_density, Some(2.0));
        assert_eq!(config.max_cap_index, Some(3));
    }

    #[test]
    fn rejects_non_positive_density_clamp() {
        let err = CapConfig::from_json_str(r#"{"max_display_density": 0.0}"#).unwrap_err();
        assert!(matches!(err, CapError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = CapConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, CapError::Json(_)));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = CapConfig::from_file("/nonexistent/surface-cap/config.json").unwrap_err();
        assert!(matches!(err, CapError::Io { .. }));
    }
}
