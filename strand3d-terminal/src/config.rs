//! Viewer configuration loaded from TOML

use std::path::Path;

use serde::{Deserialize, Serialize};
use strand3d_core::PolylineStyle;

/// Settings for the animated spiral shown by the viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Base thickness and join style of the polyline
    pub style: PolylineStyle,
    /// Points in the spiral before it restarts
    pub max_points: usize,
    pub spiral_radius: f32,
    /// Full revolutions over `max_points`
    pub spiral_turns: f32,
    /// Frames between two appended points
    pub frames_per_point: u32,
    /// Thickness oscillation as a fraction of the base thickness
    pub thickness_pulse: f32,
    /// Thickness oscillation speed in radians per second
    pub pulse_speed: f32,
    pub target_fps: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            style: PolylineStyle {
                thickness: 0.15,
                ..PolylineStyle::default()
            },
            max_points: 120,
            spiral_radius: 1.5,
            spiral_turns: 3.0,
            frames_per_point: 2,
            thickness_pulse: 0.5,
            pulse_speed: 2.0,
            target_fps: 30,
        }
    }
}

impl ViewerConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the viewer cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_points < 2 {
            return Err(ConfigError::Invalid(format!(
                "max_points must be at least 2, got {}",
                self.max_points
            )));
        }
        if self.frames_per_point == 0 || self.target_fps == 0 {
            return Err(ConfigError::Invalid(
                "frames_per_point and target_fps must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Values that parse but cannot drive the viewer
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand3d_core::JoinStyle;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            max_points = 40

            [style]
            join_style = "bevel"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_points, 40);
        assert_eq!(config.style.join_style, JoinStyle::Bevel);
        assert_eq!(config.style.thickness, PolylineStyle::default().thickness);
        assert_eq!(config.target_fps, ViewerConfig::default().target_fps);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ViewerConfig::from_toml_str("max_points = 1"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ViewerConfig::from_toml_str("style = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ViewerConfig::load("/nonexistent/strand3d.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
