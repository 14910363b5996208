//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: `identify` (dimensions and detected format) and `transform`
//! (decode, resize, encode, write one output file).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests drive the
//! optimizer with the recording `MockBackend` in this module instead.

use super::params::TransformParams;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Backend failure.
///
/// `Io` is transparent so that a missing source reports the plain OS message.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Result of an identify operation.
///
/// Either field may be missing when the header does not carry it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInfo {
    pub dimensions: Option<Dimensions>,
    /// Lowercase format name sniffed from the file content (e.g. `"jpeg"`).
    pub format: Option<String>,
}

/// Trait for image processing backends.
///
/// `Send + Sync` so one backend can be shared behind an `Arc` by concurrent
/// optimizations and by the batch worker pool.
pub trait ImageBackend: Send + Sync {
    /// Read dimensions and format from the file header.
    fn identify(&self, path: &Path) -> Result<ImageInfo, BackendError>;

    /// Decode `params.source`, apply the resize plan, encode and write `params.output`.
    fn transform(&self, params: &TransformParams) -> Result<(), BackendError>;
}
