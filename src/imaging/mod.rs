//! Image processing: decode, resize, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader` (format sniffed from content) |
//! | **Resize** | Lanczos3, `inside` or `cover` fit, never enlarged |
//! | **Encode** | progressive JPEG, max-compression PNG, lossy WebP |
//! | **Thumbnail** | JPEG q80 inside 400×300 |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for the resize policy and pixel math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Planning functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, ImageInfo};
pub use calculations::{ResizeGeometry, calculate_resize, compression_ratio, plan_resize};
pub use operations::{ThumbnailConfig, create_optimized, create_thumbnail, get_dimensions};
pub use params::{
    EncodePlan, FitMode, OutputFormat, PngCompression, Quality, ResizePlan, TransformParams,
};
pub use rust_backend::{RustBackend, supported_input_extensions};
