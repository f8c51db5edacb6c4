//! Scene loading configuration
//!
//! [`SceneConfig`] controls the optional parts of a scene load. It can be built
//! in code with the `with_*` setters or read from a TOML file; every field has a
//! default so partial files are fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Options for [`SceneBuilder`](crate::gfx::scene::SceneBuilder)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Run the GPU bounding-volume pass after the tables are built
    pub compute_bounds: bool,
    /// Rebuild smooth normals for meshes that come without (or with too few)
    pub generate_missing_normals: bool,
    /// OBJ texture coordinates have their origin bottom-left, wgpu samples top-left
    pub flip_obj_texcoords: bool,
    /// RGBA8 colour of the white default texture (texture index 0)
    pub default_white: [u8; 4],
    /// RGBA8 colour of the black default texture (texture index 1)
    pub default_black: [u8; 4],
    /// RGBA8 colour of the flat normal-map default texture (texture index 2)
    pub default_normal: [u8; 4],
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            compute_bounds: true,
            generate_missing_normals: true,
            flip_obj_texcoords: true,
            default_white: [255, 255, 255, 255],
            default_black: [0, 0, 0, 255],
            default_normal: [128, 128, 255, 255],
        }
    }
}

impl SceneConfig {
    /// Parses a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Serializes the configuration back to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn with_compute_bounds(mut self, enabled: bool) -> Self {
        self.compute_bounds = enabled;
        self
    }

    pub fn with_generate_missing_normals(mut self, enabled: bool) -> Self {
        self.generate_missing_normals = enabled;
        self
    }

    pub fn with_flip_obj_texcoords(mut self, enabled: bool) -> Self {
        self.flip_obj_texcoords = enabled;
        self
    }

    pub fn with_default_colors(mut self, white: [u8; 4], black: [u8; 4], normal: [u8; 4]) -> Self {
        self.default_white = white;
        self.default_black = black;
        self.default_normal = normal;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SceneConfig::from_toml_str("compute_bounds = false\n").unwrap();
        assert!(!config.compute_bounds);
        assert!(config.generate_missing_normals);
        assert_eq!(config.default_white, [255, 255, 255, 255]);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = SceneConfig::default().with_default_colors([1, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12]);
        let text = config.to_toml_string().unwrap();
        assert_eq!(SceneConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let result = SceneConfig::from_toml_str("compute_bounds = \"yes\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
