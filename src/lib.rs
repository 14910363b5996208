//! # Recipe Images
//!
//! Server-side optimization for images uploaded to a recipe-sharing
//! application. An uploaded file (recipe photo or user avatar) is resized,
//! re-encoded and written next to an optional thumbnail; the caller gets
//! back paths, byte sizes, final dimensions and the compression ratio.
//!
//! # Architecture: Plan, Then Execute
//!
//! ```text
//! 1. Resolve   OptimizationOptions  →  ResolvedOptions   (defaults, validation)
//! 2. Plan      ResolvedOptions      →  TransformParams   (pure, no pixels)
//! 3. Execute   TransformParams      →  files on disk     (ImageBackend)
//! ```
//!
//! Planning is pure, so the preset policies (inside vs. cover, never enlarge,
//! format and quality) are unit tested without decoding an image. Execution
//! goes through the [`imaging::ImageBackend`] trait; tests swap in a
//! recording mock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`optimizer`] | `ImageOptimizer`: async entry points, presets, temp-file cleanup |
//! | [`imaging`] | Resize policy, pixel geometry, `image`-crate backend |
//! | [`types`] | Request, options and result value types |
//! | [`presets`] | Recipe and avatar presets |
//! | [`naming`] | Output and thumbnail filename derivation |
//! | [`validation`] | Upload MIME allow-list |
//! | [`error`] | `ImageOptimizationError` |
//! | [`logging`] | Injected `Logger` and `tracing` setup |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`batch`] | Parallel optimization of a whole directory |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Never Enlarge
//!
//! Every resize is capped at the source size. A 200×150 upload stays
//! 200×150 under the recipe preset, and an avatar smaller than 300×300 keeps
//! its size.
//!
//! ## One Error Type
//!
//! Callers handle exactly one failure, [`ImageOptimizationError`], whatever
//! step failed. The cause text is kept verbatim (an OS "No such file or
//! directory" stays readable) behind a fixed `Image optimization failed:`
//! prefix.
//!
//! ## Blocking Work Off the Runtime
//!
//! Decoding and encoding are CPU-bound. The async API runs the whole
//! pipeline on tokio's blocking pool, so a web handler can `.await` an
//! optimization without stalling other requests.
//!
//! ## Thumbnails Are JPEG
//!
//! Thumbnails are always baseline JPEG at quality 80 and named
//! `<base>_thumb.jpg`, whatever the primary format. They are made from the
//! original upload, not from the optimized output.

pub mod batch;
pub mod config;
pub mod error;
pub mod imaging;
pub mod logging;
pub mod naming;
pub mod optimizer;
pub mod output;
pub mod presets;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::ImageOptimizationError;
pub use imaging::{Dimensions, OutputFormat};
pub use logging::{LogLevel, Logger, NoopLogger, TracingLogger};
pub use naming::{get_optimized_filename, get_thumbnail_filename};
pub use optimizer::{ImageOptimizer, OptimizerSettings};
pub use presets::{Preset, PresetKind};
pub use types::{OptimizationOptions, OptimizationRequest, OptimizedImageResult};
pub use validation::is_valid_image_format;
