//! High-level image operations.
//!
//! These functions turn resolved options into [`TransformParams`] and hand
//! them to a backend. Planning and execution are separate so that the plan
//! for a preset can be checked without decoding a single pixel.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::plan_resize;
use super::params::{
    EncodePlan, FitMode, OutputFormat, PngCompression, Quality, ResizePlan, TransformParams,
};
use crate::naming::output_filename;
use crate::types::ResolvedOptions;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend, if the header carries them.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<Option<Dimensions>> {
    Ok(backend.identify(path)?.dimensions)
}

/// Select the encoder for a primary output.
///
/// JPEG and PNG are written progressively; PNG ignores `quality`.
pub fn encode_plan(format: OutputFormat, quality: Quality) -> EncodePlan {
    match format {
        OutputFormat::Jpeg => EncodePlan::Jpeg {
            quality,
            progressive: true,
        },
        OutputFormat::Png => EncodePlan::Png {
            compression: PngCompression::Best,
            progressive: true,
        },
        OutputFormat::Webp => EncodePlan::Webp { quality },
    }
}

/// Plan the primary optimized file: `<dir>/<base_name>.<ext>`.
pub fn plan_optimized(
    source: &Path,
    destination_dir: &Path,
    base_name: &str,
    options: &ResolvedOptions,
) -> TransformParams {
    TransformParams {
        source: source.to_path_buf(),
        output: destination_dir.join(output_filename(base_name, options.format)),
        resize: plan_resize(options.width, options.height, options.maintain_aspect_ratio),
        encode: encode_plan(options.format, options.quality),
    }
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailConfig {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
            quality: Quality::new(80),
        }
    }
}

/// Path a thumbnail for `base_name` is written to.
///
/// Thumbnails are always JPEG, whatever the primary format.
pub fn thumbnail_path(destination_dir: &Path, base_name: &str) -> PathBuf {
    destination_dir.join(output_filename(&format!("{base_name}_thumb"), OutputFormat::Jpeg))
}

/// Plan a thumbnail from the original source (never from the optimized file).
pub fn plan_thumbnail(
    source: &Path,
    destination_dir: &Path,
    base_name: &str,
    config: &ThumbnailConfig,
) -> TransformParams {
    TransformParams {
        source: source.to_path_buf(),
        output: thumbnail_path(destination_dir, base_name),
        resize: Some(ResizePlan {
            width: Some(config.width),
            height: Some(config.height),
            fit: FitMode::Inside,
            without_enlargement: true,
        }),
        encode: EncodePlan::Jpeg {
            quality: config.quality,
            progressive: false,
        },
    }
}

/// Write the primary optimized file and return its path.
pub fn create_optimized(backend: &impl ImageBackend, params: &TransformParams) -> Result<PathBuf> {
    backend.transform(params)?;
    Ok(params.output.clone())
}

/// Write a thumbnail and return its path.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    destination_dir: &Path,
    base_name: &str,
    config: &ThumbnailConfig,
) -> Result<PathBuf> {
    let params = plan_thumbnail(source, destination_dir, base_name, config);
    backend.transform(&params)?;
    Ok(params.output)
}
