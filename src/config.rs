//! Optimizer configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! are overridden by whatever keys the user file sets; everything else keeps
//! its stock value.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [defaults]
//! quality = 85              # Used when a request sets no quality
//! format = "jpeg"           # Used when a request sets no format
//!
//! [thumbnail]
//! width = 400               # Thumbnail box; always fit-inside, always JPEG
//! height = 300
//! quality = 80
//!
//! [recipe]
//! width = 1200
//! height = 800
//! quality = 85
//! format = "jpeg"
//! maintain_aspect_ratio = true
//! thumbnail = true
//!
//! [avatar]
//! width = 300
//! height = 300
//! quality = 90
//! format = "jpeg"
//! maintain_aspect_ratio = false
//! thumbnail = false
//!
//! [processing]
//! max_processes = 4         # Max parallel batch workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{OutputFormat, Quality, ThumbnailConfig};
use crate::presets::{Preset, PresetKind};
use crate::types::OptimizationOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Optimizer configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Fallbacks for options a request leaves unset.
    pub defaults: DefaultsConfig,
    /// Thumbnail box and quality.
    pub thumbnail: ThumbnailSettings,
    /// Recipe image preset.
    pub recipe: PresetConfig,
    /// Avatar preset.
    pub avatar: PresetConfig,
    /// Parallel batch settings.
    pub processing: ProcessingConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultsConfig::default(),
            thumbnail: ThumbnailSettings::default(),
            recipe: PresetConfig::from(&Preset::recipe()),
            avatar: PresetConfig::from(&Preset::avatar()),
            processing: ProcessingConfig::default(),
        }
    }
}

impl OptimizerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_quality("defaults.quality", self.defaults.quality)?;
        check_quality("thumbnail.quality", self.thumbnail.quality)?;
        if self.thumbnail.width == 0 || self.thumbnail.height == 0 {
            return Err(ConfigError::Validation(
                "thumbnail.width and thumbnail.height must be non-zero".into(),
            ));
        }
        for (name, preset) in [("recipe", &self.recipe), ("avatar", &self.avatar)] {
            check_quality(&format!("{name}.quality"), preset.quality)?;
            if preset.width == Some(0) || preset.height == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "{name}.width and {name}.height must be non-zero"
                )));
            }
        }
        Ok(())
    }

    pub fn default_quality(&self) -> Quality {
        Quality::new(self.defaults.quality)
    }

    pub fn thumbnail_config(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            width: self.thumbnail.width,
            height: self.thumbnail.height,
            quality: Quality::new(self.thumbnail.quality),
        }
    }

    /// The preset as configured (stock values unless overridden).
    pub fn preset(&self, kind: PresetKind) -> Preset {
        let section = match kind {
            PresetKind::Recipe => &self.recipe,
            PresetKind::Avatar => &self.avatar,
        };
        section.to_preset(kind)
    }
}

fn check_quality(key: &str, value: u32) -> Result<(), ConfigError> {
    if !(1..=100).contains(&value) {
        return Err(ConfigError::Validation(format!("{key} must be 1-100")));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Encoding quality when a request sets none (1 = worst, 100 = best).
    pub quality: u32,
    /// Output format when a request sets none.
    pub format: OutputFormat,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
            format: OutputFormat::Jpeg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailSettings {
    pub width: u32,
    pub height: u32,
    pub quality: u32,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        let stock = ThumbnailConfig::default();
        Self {
            width: stock.width,
            height: stock.height,
            quality: stock.quality.value(),
        }
    }
}

/// One preset section. Sections are always fully populated after merging
/// over the stock defaults, so no field-level defaults are needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: u32,
    pub format: OutputFormat,
    pub maintain_aspect_ratio: bool,
    pub thumbnail: bool,
}

impl PresetConfig {
    pub fn to_preset(&self, kind: PresetKind) -> Preset {
        Preset {
            kind,
            options: OptimizationOptions {
                width: self.width,
                height: self.height,
                quality: Some(self.quality),
                format: Some(self.format),
                maintain_aspect_ratio: Some(self.maintain_aspect_ratio),
            },
            generate_thumbnail: self.thumbnail,
        }
    }
}

impl From<&Preset> for PresetConfig {
    fn from(preset: &Preset) -> Self {
        let options = &preset.options;
        Self {
            width: options.width,
            height: options.height,
            quality: options.quality.unwrap_or(Quality::default().value()),
            format: options.format.unwrap_or_default(),
            maintain_aspect_ratio: options.maintain_aspect_ratio.unwrap_or(true),
            thumbnail: preset.generate_thumbnail,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(OptimizerConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<OptimizerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: OptimizerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<OptimizerConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# recipe-images configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Fallbacks for requests that leave an option unset
# ---------------------------------------------------------------------------
[defaults]
# Encoding quality, 1 (worst) to 100 (best). PNG ignores it.
quality = 85

# Output format: "jpeg", "png" or "webp".
format = "jpeg"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnail]
# Box the thumbnail must fit inside. Thumbnails are always JPEG and are
# never enlarged.
width = 400
height = 300
quality = 80

# ---------------------------------------------------------------------------
# Recipe images: letterboxed into 1200x800 with a thumbnail
# ---------------------------------------------------------------------------
[recipe]
width = 1200
height = 800
quality = 85
format = "jpeg"
# true = fit inside the box, false = crop to cover it.
maintain_aspect_ratio = true
thumbnail = true

# ---------------------------------------------------------------------------
# Avatars: cropped to a 300x300 square, no thumbnail
# ---------------------------------------------------------------------------
[avatar]
width = 300
height = 300
quality = 90
format = "jpeg"
maintain_aspect_ratio = false
thumbnail = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for the batch command.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
