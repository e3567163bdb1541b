//! Viewer configuration, loaded from JSON.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```json
//! { "sort": { "strategy": "exact" }, "camera": { "position": [0.0, 1.0, 5.0] } }
//! ```

use crate::core::{BuildOptions, Camera};
use crate::sort::SortConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub build: BuildOptions,
    pub sort: SortConfig,
    pub camera: Camera,
}

impl ViewerConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QuaternionLayout;
    use crate::sort::{SortDirection, SortStrategy, DEFAULT_BUCKET_COUNT};

    #[test]
    fn test_empty_object_is_default() {
        let config = ViewerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.sort.strategy, SortStrategy::Approximate);
        assert_eq!(config.sort.direction, SortDirection::BackToFront);
        assert_eq!(config.sort.bucket_count, DEFAULT_BUCKET_COUNT);
        assert!(config.build.normalize_rotations);
    }

    #[test]
    fn test_partial_override() {
        let config = ViewerConfig::from_json_str(
            r#"{
                "build": { "quaternion_layout": "xyzw" },
                "sort": { "strategy": "exact", "direction": "front_to_back" },
                "camera": { "position": [0.0, 1.0, 5.0] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.build.quaternion_layout, QuaternionLayout::Xyzw);
        assert!(config.build.normalize_rotations);
        assert_eq!(config.sort.strategy, SortStrategy::Exact);
        assert_eq!(config.sort.direction, SortDirection::FrontToBack);
        assert_eq!(config.camera.position.y, 1.0);
        assert_eq!(config.camera.width, Camera::default().width);
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut config = ViewerConfig::default();
        config.sort.bucket_count = 1024;
        let text = config.to_json_pretty().unwrap();
        assert_eq!(ViewerConfig::from_json_str(&text).unwrap(), config);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ViewerConfig::from_json_str("{ sort: }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("splat_view_missing_config_9d1f.json");
        assert!(matches!(
            ViewerConfig::from_json_file(&path),
            Err(ConfigError::Io(_))
        ));
    }
}
