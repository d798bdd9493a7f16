//! Configuration file support for slicemarker.
//!
//! This module handles loading and validating user settings from the configuration file
//! located at `~/.config/slicemarker/config.toml`. Settings include canvas dimensions,
//! tool defaults, slice streaming behavior, and selection rendering style.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod enums;
pub mod types;

// Re-export commonly used types at module level
pub use enums::ColorSpec;
pub use types::{CanvasConfig, RenderConfig, StreamingConfig, ToolsConfig};

use anyhow::{Context, Result};
use log::{debug, info};
use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main configuration structure containing all user settings.
///
/// This is the root configuration type that gets deserialized from the TOML file.
/// All fields have sensible defaults and will use those if not specified in the config file.
///
/// # Example TOML
/// ```toml
/// [canvas]
/// width = 800
/// height = 600
///
/// [tools]
/// default_tool = "rectangle"
/// default_tag = "region"
/// hit_radius = 10.0
///
/// [streaming]
/// batch_size = 10
/// initial_slice = 0
///
/// [render]
/// stroke_color = "yellow"
/// mask_opacity = 0.5
/// ```
#[derive(Debug, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Canvas dimensions for the annotation view
    #[serde(default)]
    pub canvas: CanvasConfig,

    /// Tool defaults (active tool, tag, hit radius, brush settings)
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Slice streaming options
    #[serde(default)]
    pub streaming: StreamingConfig,

    /// Selection rendering style
    #[serde(default)]
    pub render: RenderConfig,
}

impl Config {
    /// Validates and clamps all configuration values to acceptable ranges.
    ///
    /// This method ensures that user-provided config values won't cause undefined behavior
    /// or rendering issues. Invalid values are clamped to the nearest valid value and a
    /// warning is logged.
    ///
    /// Validated ranges:
    /// - `canvas.width` / `canvas.height`: 64 - 4096
    /// - `tools.hit_radius`: 1.0 - 100.0
    /// - `tools.brush_width`: 1.0 - 200.0
    /// - `streaming.batch_size`: 1 - 64
    /// - `render.stroke_width`: 0.5 - 20.0
    /// - `render.mask_opacity`: 0.0 - 1.0
    /// - `render.vertex_radius`: 1.0 - 20.0
    fn validate_and_clamp(&mut self) {
        // Canvas width: 64 - 4096
        if !(64..=4096).contains(&self.canvas.width) {
            log::warn!(
                "Invalid canvas width {}, clamping to 64-4096 range",
                self.canvas.width
            );
            self.canvas.width = self.canvas.width.clamp(64, 4096);
        }

        // Canvas height: 64 - 4096
        if !(64..=4096).contains(&self.canvas.height) {
            log::warn!(
                "Invalid canvas height {}, clamping to 64-4096 range",
                self.canvas.height
            );
            self.canvas.height = self.canvas.height.clamp(64, 4096);
        }

        // Hit radius: 1.0 - 100.0
        if !(1.0..=100.0).contains(&self.tools.hit_radius) {
            log::warn!(
                "Invalid hit_radius {:.1}, clamping to 1.0-100.0 range",
                self.tools.hit_radius
            );
            self.tools.hit_radius = self.tools.hit_radius.clamp(1.0, 100.0);
        }

        // Brush width: 1.0 - 200.0
        if !(1.0..=200.0).contains(&self.tools.brush_width) {
            log::warn!(
                "Invalid brush_width {:.1}, clamping to 1.0-200.0 range",
                self.tools.brush_width
            );
            self.tools.brush_width = self.tools.brush_width.clamp(1.0, 200.0);
        }

        // Batch size: 1 - 64
        if !(1..=64).contains(&self.streaming.batch_size) {
            log::warn!(
                "Invalid batch_size {}, clamping to 1-64 range",
                self.streaming.batch_size
            );
            self.streaming.batch_size = self.streaming.batch_size.clamp(1, 64);
        }

        // Stroke width: 0.5 - 20.0
        if !(0.5..=20.0).contains(&self.render.stroke_width) {
            log::warn!(
                "Invalid stroke_width {:.1}, clamping to 0.5-20.0 range",
                self.render.stroke_width
            );
            self.render.stroke_width = self.render.stroke_width.clamp(0.5, 20.0);
        }

        // Mask opacity: 0.0 - 1.0
        if !(0.0..=1.0).contains(&self.render.mask_opacity) {
            log::warn!(
                "Invalid mask_opacity {:.2}, clamping to 0.0-1.0 range",
                self.render.mask_opacity
            );
            self.render.mask_opacity = self.render.mask_opacity.clamp(0.0, 1.0);
        }

        // Vertex radius: 1.0 - 20.0
        if !(1.0..=20.0).contains(&self.render.vertex_radius) {
            log::warn!(
                "Invalid vertex_radius {:.1}, clamping to 1.0-20.0 range",
                self.render.vertex_radius
            );
            self.render.vertex_radius = self.render.vertex_radius.clamp(1.0, 20.0);
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// The config file is located at `~/.config/slicemarker/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("slicemarker");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from file, or returns defaults if not found.
    ///
    /// Attempts to read and parse the config file at `~/.config/slicemarker/config.toml`.
    /// If the file doesn't exist, returns a Config with default values. All loaded values
    /// are validated and clamped to acceptable ranges.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory path cannot be determined
    /// - The file exists but cannot be read
    /// - The file exists but contains invalid TOML syntax
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        // Validate and clamp values to acceptable ranges
        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Saves the current configuration to file.
    ///
    /// Serializes the config to TOML format and writes it to `~/.config/slicemarker/config.toml`.
    /// Creates the parent directory if it doesn't exist. This method is kept for future use
    /// (e.g., runtime config editing).
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory cannot be created
    /// - The config cannot be serialized to TOML
    /// - The file cannot be written
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        // Create directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Creates a default configuration file with documentation comments.
    ///
    /// Writes the example config from `config.example.toml` to the user's config
    /// directory and returns the path it was written to.
    ///
    /// # Errors
    /// Returns an error if:
    /// - A config file already exists at the target path
    /// - The config directory cannot be created
    /// - The file cannot be written
    pub fn create_default_file() -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            return Err(anyhow::anyhow!(
                "Config file already exists at {}",
                config_path.display()
            ));
        }

        // Create directory
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let default_config = include_str!("../../config.example.toml");
        fs::write(&config_path, default_config)?;

        info!("Created default config at {}", config_path.display());
        Ok(config_path)
    }

    /// Returns the JSON schema describing the configuration file format.
    ///
    /// Useful for editor integrations and for validating hand-written configs.
    pub fn json_schema() -> Schema {
        schema_for!(Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolKind;

    #[test]
    fn defaults_survive_validation_untouched() {
        let mut config = Config::default();
        config.validate_and_clamp();

        assert_eq!(config.canvas.width, 800);
        assert_eq!(config.canvas.height, 600);
        assert!(matches!(config.tools.default_tool, ToolKind::Rectangle));
        assert_eq!(config.streaming.batch_size, 10);
    }

    #[test]
    fn out_of_range_values_clamp() {
        let mut config = Config::default();
        config.canvas.width = 16;
        config.tools.hit_radius = 500.0;
        config.streaming.batch_size = 0;
        config.render.mask_opacity = 3.0;
        config.validate_and_clamp();

        assert_eq!(config.canvas.width, 64);
        assert_eq!(config.tools.hit_radius, 100.0);
        assert_eq!(config.streaming.batch_size, 1);
        assert_eq!(config.render.mask_opacity, 1.0);
    }

    #[test]
    fn partial_toml_fills_missing_sections() {
        let config: Config = toml::from_str(
            r#"
            [tools]
            default_tool = "brush"
            default_tag = "lesion"
            "#,
        )
        .unwrap();

        assert!(matches!(config.tools.default_tool, ToolKind::Brush));
        assert_eq!(config.tools.default_tag, "lesion");
        // Untouched sections fall back to defaults.
        assert_eq!(config.canvas.width, 800);
        assert_eq!(config.streaming.batch_size, 10);
    }

    #[test]
    fn color_spec_accepts_names_and_rgb_triples() {
        let config: Config = toml::from_str(
            r#"
            [render]
            stroke_color = "green"

            [tools]
            brush_color = [255, 128, 0]
            "#,
        )
        .unwrap();

        let stroke = config.render.stroke_color.to_color();
        assert_eq!(stroke.g, 1.0);

        let brush = config.tools.brush_color.to_color();
        assert!((brush.r - 1.0).abs() < 1e-9);
        assert!((brush.g - 128.0 / 255.0).abs() < 1e-9);
    }
}
