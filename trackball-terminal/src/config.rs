/// Viewer configuration loaded from TOML
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Initial view of the trackball.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub direction: [f64; 3],
    pub up: [f64; 3],
    /// Eye distance; fitted to the mesh when absent.
    pub distance: Option<f64>,
}

impl ViewConfig {
    pub fn direction(&self) -> Vector3<f64> {
        Vector3::from(self.direction)
    }

    pub fn up(&self) -> Vector3<f64> {
        Vector3::from(self.up)
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            direction: trackball_core::transform::DEFAULT_DIRECTION,
            up: trackball_core::transform::DEFAULT_UP,
            distance: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub fps: u32,
    pub zoom_step: f64,
    pub log_file: Option<PathBuf>,
    /// Terminal cell height divided by width.
    pub cell_aspect: f64,
    pub rotation_center: Option<[f64; 3]>,
    pub view: ViewConfig,
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn rotation_center(&self) -> Option<Point3<f64>> {
        self.rotation_center.map(Point3::from)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            zoom_step: 0.5,
            log_file: None,
            cell_aspect: 2.0,
            rotation_center: None,
            view: ViewConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ViewerConfig::from_toml("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.view.direction(), Vector3::new(0.0, 0.0, 10.0));
        assert_eq!(config.rotation_center(), None);
    }

    #[test]
    fn test_partial_config() {
        let config = ViewerConfig::from_toml(
            r#"
            fps = 60
            log_file = "viewer.log"
            rotation_center = [1.0, 0.0, -1.0]

            [view]
            direction = [1.0, 1.0, 0.0]
            distance = 12.5
            "#,
        )
        .unwrap();
        assert_eq!(config.fps, 60);
        assert_eq!(config.zoom_step, 0.5);
        assert_eq!(config.log_file, Some(PathBuf::from("viewer.log")));
        assert_eq!(config.rotation_center(), Some(Point3::new(1.0, 0.0, -1.0)));
        assert_eq!(config.view.direction, [1.0, 1.0, 0.0]);
        assert_eq!(config.view.up, [0.0, 1.0, 0.0]);
        assert_eq!(config.view.distance, Some(12.5));
    }

    #[test]
    fn test_invalid_config() {
        let err = ViewerConfig::from_toml("fps = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let missing = ViewerConfig::load(Path::new("/nonexistent/trackball.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
