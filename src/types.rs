//! Value objects passed into and out of the optimizer.
//!
//! Nothing here is persisted. A request is built per upload, consumed once,
//! and the result is handed straight to the caller.

use crate::error::ImageOptimizationError;
use crate::imaging::{Dimensions, OutputFormat, Quality};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Caller-facing options. Every field is optional; see [`OptimizationOptions::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizationOptions {
    /// Maximum width. `None` leaves the axis unconstrained.
    pub width: Option<u32>,
    /// Maximum height. `None` leaves the axis unconstrained.
    pub height: Option<u32>,
    /// 1–100; values outside are clamped.
    pub quality: Option<u32>,
    pub format: Option<OutputFormat>,
    /// `true` (default) fits inside the box; `false` crops to cover it.
    pub maintain_aspect_ratio: Option<bool>,
}

impl OptimizationOptions {
    /// Fill defaults in one place and reject zero-sized boxes.
    pub fn resolve(
        &self,
        default_quality: Quality,
        default_format: OutputFormat,
    ) -> Result<ResolvedOptions, ImageOptimizationError> {
        if self.width == Some(0) {
            return Err(ImageOptimizationError::new("width must be a positive integer"));
        }
        if self.height == Some(0) {
            return Err(ImageOptimizationError::new("height must be a positive integer"));
        }
        Ok(ResolvedOptions {
            width: self.width,
            height: self.height,
            quality: self.quality.map(Quality::new).unwrap_or(default_quality),
            format: self.format.unwrap_or(default_format),
            maintain_aspect_ratio: self.maintain_aspect_ratio.unwrap_or(true),
        })
    }
}

/// Options with every default applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Quality,
    pub format: OutputFormat,
    pub maintain_aspect_ratio: bool,
}

/// Everything one optimization needs.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationRequest {
    pub source_path: PathBuf,
    pub destination_dir: PathBuf,
    /// Output stem without extension, unique per image slot (e.g. `42-main`).
    pub base_name: String,
    pub options: OptimizationOptions,
    pub generate_thumbnail: bool,
}

impl OptimizationRequest {
    pub fn new(
        source_path: impl Into<PathBuf>,
        destination_dir: impl Into<PathBuf>,
        base_name: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            destination_dir: destination_dir.into(),
            base_name: base_name.into(),
            options: OptimizationOptions::default(),
            generate_thumbnail: false,
        }
    }

    pub fn with_options(mut self, options: OptimizationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_thumbnail(mut self, generate: bool) -> Self {
        self.generate_thumbnail = generate;
        self
    }
}

/// What an optimization produced.
///
/// Serialized with camelCase keys for the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedImageResult {
    pub original_path: PathBuf,
    pub optimized_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<PathBuf>,
    /// Bytes.
    pub original_size: u64,
    /// Bytes, read back from the written file.
    pub optimized_size: u64,
    /// Percent saved, one decimal. Negative if the file grew.
    pub compression_ratio: f64,
    pub dimensions: Dimensions,
}
