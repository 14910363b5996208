//! The image optimizer.
//!
//! ## Pipeline
//!
//! Every optimization is one strict linear sequence; the first failing step
//! ends it with an [`ImageOptimizationError`]:
//!
//! ```text
//! resolve options → stat source → create destination dir → identify source
//!   → plan + write optimized file → (plan + write thumbnail from source)
//!   → stat optimized file → identify optimized file → compression ratio
//! ```
//!
//! The optimized file is written before the thumbnail is attempted, so a
//! failed primary write never produces a thumbnail. Sizes are always read
//! back from the filesystem, never estimated. The source file is never
//! modified or deleted; callers remove it with [`ImageOptimizer::cleanup_temp_file`]
//! once the result has been persisted.
//!
//! ## Concurrency
//!
//! The optimizer holds no mutable state. Cloning it is cheap (two `Arc`s and
//! a small config), and each async call runs the pipeline on tokio's
//! blocking pool so decode/encode never stalls the runtime. Concurrent calls
//! into the same destination directory are fine: `create_dir_all` treats an
//! existing directory as success. There is no internal timeout or retry.

use crate::config::OptimizerConfig;
use crate::error::ImageOptimizationError;
use crate::imaging::operations::{create_optimized, create_thumbnail, plan_optimized};
use crate::imaging::{
    Dimensions, ImageBackend, OutputFormat, Quality, RustBackend, ThumbnailConfig,
    compression_ratio, get_dimensions,
};
use crate::logging::{LogLevel, Logger, TracingLogger};
use crate::presets::{Preset, PresetKind};
use crate::types::{OptimizationRequest, OptimizedImageResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings the optimizer reads on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    pub default_quality: Quality,
    pub default_format: OutputFormat,
    pub thumbnail: ThumbnailConfig,
    pub recipe: Preset,
    pub avatar: Preset,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self::from(&OptimizerConfig::default())
    }
}

impl From<&OptimizerConfig> for OptimizerSettings {
    fn from(config: &OptimizerConfig) -> Self {
        Self {
            default_quality: config.default_quality(),
            default_format: config.defaults.format,
            thumbnail: config.thumbnail_config(),
            recipe: config.preset(PresetKind::Recipe),
            avatar: config.preset(PresetKind::Avatar),
        }
    }
}

/// Resize, re-encode and thumbnail uploaded images.
pub struct ImageOptimizer<B: ImageBackend = RustBackend> {
    backend: Arc<B>,
    logger: Arc<dyn Logger>,
    settings: OptimizerSettings,
}

impl<B: ImageBackend> Clone for ImageOptimizer<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            logger: Arc::clone(&self.logger),
            settings: self.settings.clone(),
        }
    }
}

impl ImageOptimizer<RustBackend> {
    /// Production optimizer: `image`-crate backend, stock settings.
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_backend(RustBackend::new(), logger, OptimizerSettings::default())
    }

    pub fn from_config(config: &OptimizerConfig, logger: Arc<dyn Logger>) -> Self {
        Self::with_backend(RustBackend::new(), logger, OptimizerSettings::from(config))
    }
}

impl Default for ImageOptimizer<RustBackend> {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger))
    }
}

impl<B: ImageBackend + 'static> ImageOptimizer<B> {
    pub fn with_backend(backend: B, logger: Arc<dyn Logger>, settings: OptimizerSettings) -> Self {
        Self {
            backend: Arc::new(backend),
            logger,
            settings,
        }
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    pub fn preset(&self, kind: PresetKind) -> &Preset {
        match kind {
            PresetKind::Recipe => &self.settings.recipe,
            PresetKind::Avatar => &self.settings.avatar,
        }
    }

    /// Optimize one image without blocking the async runtime.
    pub async fn optimize_image(
        &self,
        request: OptimizationRequest,
    ) -> Result<OptimizedImageResult, ImageOptimizationError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.optimize_image_blocking(&request)).await?
    }

    /// Recipe preset: 1200×800 inside, JPEG 85, with a 400×300 thumbnail.
    pub async fn optimize_recipe_image(
        &self,
        source_path: impl Into<PathBuf>,
        destination_dir: impl Into<PathBuf>,
        base_name: impl Into<String>,
    ) -> Result<OptimizedImageResult, ImageOptimizationError> {
        let request = self.preset_request(PresetKind::Recipe, source_path, destination_dir, base_name);
        self.optimize_image(request).await
    }

    /// Avatar preset: 300×300 cover crop, JPEG 90, no thumbnail.
    pub async fn optimize_avatar_image(
        &self,
        source_path: impl Into<PathBuf>,
        destination_dir: impl Into<PathBuf>,
        base_name: impl Into<String>,
    ) -> Result<OptimizedImageResult, ImageOptimizationError> {
        let request = self.preset_request(PresetKind::Avatar, source_path, destination_dir, base_name);
        self.optimize_image(request).await
    }

    /// Optimize with whichever preset `kind` names.
    pub async fn optimize_with_preset(
        &self,
        kind: PresetKind,
        source_path: impl Into<PathBuf>,
        destination_dir: impl Into<PathBuf>,
        base_name: impl Into<String>,
    ) -> Result<OptimizedImageResult, ImageOptimizationError> {
        let request = self.preset_request(kind, source_path, destination_dir, base_name);
        self.optimize_image(request).await
    }

    /// Build the request a preset would issue.
    pub fn preset_request(
        &self,
        kind: PresetKind,
        source_path: impl Into<PathBuf>,
        destination_dir: impl Into<PathBuf>,
        base_name: impl Into<String>,
    ) -> OptimizationRequest {
        let preset = self.preset(kind);
        OptimizationRequest::new(source_path, destination_dir, base_name)
            .with_options(preset.options)
            .with_thumbnail(preset.generate_thumbnail)
    }

    /// Delete a temporary upload. Failures are logged as warnings and never returned.
    pub async fn cleanup_temp_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if let Err(e) = tokio::fs::remove_file(path).await {
            self.logger.log(
                LogLevel::Warn,
                "Failed to cleanup temp file",
                &[
                    ("path", path.display().to_string()),
                    ("error", e.to_string()),
                ],
            );
        }
    }

    /// The whole pipeline on the calling thread.
    ///
    /// Used by [`optimize_image`](Self::optimize_image) from the blocking pool
    /// and directly by the batch workers.
    pub fn optimize_image_blocking(
        &self,
        request: &OptimizationRequest,
    ) -> Result<OptimizedImageResult, ImageOptimizationError> {
        self.logger.log(
            LogLevel::Info,
            "Optimizing image",
            &[
                ("source", request.source_path.display().to_string()),
                ("destination", request.destination_dir.display().to_string()),
                ("base_name", request.base_name.clone()),
            ],
        );

        match self.run_pipeline(request) {
            Ok(result) => {
                self.logger.log(
                    LogLevel::Info,
                    "Image optimized",
                    &[
                        ("optimized", result.optimized_path.display().to_string()),
                        ("original_size", result.original_size.to_string()),
                        ("optimized_size", result.optimized_size.to_string()),
                        ("compression_ratio", format!("{:.1}", result.compression_ratio)),
                    ],
                );
                Ok(result)
            }
            Err(err) => {
                self.logger.log(
                    LogLevel::Error,
                    "Image optimization failed",
                    &[
                        ("source", request.source_path.display().to_string()),
                        ("cause", err.cause().to_string()),
                    ],
                );
                Err(err)
            }
        }
    }

    fn run_pipeline(
        &self,
        request: &OptimizationRequest,
    ) -> Result<OptimizedImageResult, ImageOptimizationError> {
        let backend = self.backend.as_ref();
        let options = request
            .options
            .resolve(self.settings.default_quality, self.settings.default_format)?;

        let original_size = std::fs::metadata(&request.source_path)?.len();
        std::fs::create_dir_all(&request.destination_dir)?;
        let source_dimensions = get_dimensions(backend, &request.source_path)?;

        let params = plan_optimized(
            &request.source_path,
            &request.destination_dir,
            &request.base_name,
            &options,
        );
        let optimized_path = create_optimized(backend, &params)?;

        let thumbnail_path = if request.generate_thumbnail {
            Some(create_thumbnail(
                backend,
                &request.source_path,
                &request.destination_dir,
                &request.base_name,
                &self.settings.thumbnail,
            )?)
        } else {
            None
        };

        let optimized_size = std::fs::metadata(&optimized_path)?.len();
        let dimensions = get_dimensions(backend, &optimized_path)?
            .or(source_dimensions)
            .unwrap_or_else(|| {
                self.logger.log(
                    LogLevel::Warn,
                    "No dimensions reported for optimized image",
                    &[("path", optimized_path.display().to_string())],
                );
                Dimensions::default()
            });

        Ok(OptimizedImageResult {
            original_path: request.source_path.clone(),
            optimized_path,
            thumbnail_path,
            original_size,
            optimized_size,
            compression_ratio: compression_ratio(original_size, optimized_size),
            dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp, info};
    use crate::imaging::{EncodePlan, FitMode, ImageInfo, ResizePlan};
    use crate::test_helpers::CapturingLogger;
    use crate::types::OptimizationOptions;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        source: PathBuf,
        dest: PathBuf,
    }

    /// A source file of `size` bytes (content irrelevant to the mock).
    fn fixture(size: usize) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("upload.tmp");
        std::fs::write(&source, vec![7u8; size]).unwrap();
        let dest = tmp.path().join("uploads/recipes");
        Fixture { tmp, source, dest }
    }

    fn optimizer(backend: MockBackend, logger: Arc<CapturingLogger>) -> ImageOptimizer<MockBackend> {
        ImageOptimizer::with_backend(backend, logger, OptimizerSettings::default())
    }

    fn resize_of(op: &RecordedOp) -> Option<ResizePlan> {
        match op {
            RecordedOp::Transform { resize, .. } => *resize,
            _ => panic!("expected transform, got {op:?}"),
        }
    }

    fn encode_of(op: &RecordedOp) -> EncodePlan {
        match op {
            RecordedOp::Transform { encode, .. } => *encode,
            _ => panic!("expected transform, got {op:?}"),
        }
    }

    #[tokio::test]
    async fn recipe_happy_path() {
        let fx = fixture(2048);
        let backend = MockBackend::with_identify(vec![
            info(2000, 1500, "jpeg"),
            info(1067, 800, "jpeg"),
        ])
        .output_size(1024);
        let logger = CapturingLogger::shared();
        let optimizer = optimizer(backend, logger.clone());

        let result = optimizer
            .optimize_recipe_image(&fx.source, &fx.dest, "42-main")
            .await
            .unwrap();

        assert_eq!(result.original_path, fx.source);
        assert_eq!(result.optimized_path, fx.dest.join("42-main.jpg"));
        assert_eq!(result.original_size, 2048);
        assert_eq!(result.optimized_size, 1024);
        assert_eq!(result.compression_ratio, 50.0);
        assert_eq!(result.dimensions, Dimensions::new(1067, 800));
        let thumb = result.thumbnail_path.unwrap();
        assert!(thumb.to_string_lossy().ends_with("_thumb.jpg"));
        assert!(logger.contains(LogLevel::Info, "Image optimized"));
    }

    #[tokio::test]
    async fn recipe_preset_issues_inside_box() {
        let fx = fixture(10);
        let optimizer = optimizer(MockBackend::new(), CapturingLogger::shared());

        optimizer
            .optimize_recipe_image(&fx.source, &fx.dest, "r")
            .await
            .unwrap();

        let transforms = optimizer.backend.transforms();
        assert_eq!(transforms.len(), 2);
        assert_eq!(
            resize_of(&transforms[0]),
            Some(ResizePlan {
                width: Some(1200),
                height: Some(800),
                fit: FitMode::Inside,
                without_enlargement: true,
            })
        );
        assert_eq!(
            encode_of(&transforms[0]),
            EncodePlan::Jpeg {
                quality: Quality::new(85),
                progressive: true
            }
        );
    }

    #[tokio::test]
    async fn avatar_preset_issues_cover_square_without_thumbnail() {
        let fx = fixture(10);
        let optimizer = optimizer(MockBackend::new(), CapturingLogger::shared());

        let result = optimizer
            .optimize_avatar_image(&fx.source, &fx.dest, "7-avatar")
            .await
            .unwrap();

        assert_eq!(result.thumbnail_path, None);
        assert_eq!(result.optimized_path, fx.dest.join("7-avatar.jpg"));
        let transforms = optimizer.backend.transforms();
        assert_eq!(transforms.len(), 1);
        assert_eq!(
            resize_of(&transforms[0]),
            Some(ResizePlan {
                width: Some(300),
                height: Some(300),
                fit: FitMode::Cover,
                without_enlargement: true,
            })
        );
        assert_eq!(transforms[0].quality(), Some(Quality::new(90)));
    }

    #[tokio::test]
    async fn custom_webp_without_thumbnail() {
        let fx = fixture(10);
        let optimizer = optimizer(MockBackend::new(), CapturingLogger::shared());
        let request = OptimizationRequest::new(&fx.source, &fx.dest, "custom").with_options(
            OptimizationOptions {
                width: Some(800),
                height: Some(600),
                quality: Some(75),
                format: Some(OutputFormat::Webp),
                maintain_aspect_ratio: Some(true),
            },
        );

        let result = optimizer.optimize_image(request).await.unwrap();

        assert!(result.optimized_path.to_string_lossy().ends_with("custom.webp"));
        assert_eq!(result.thumbnail_path, None);
        let transforms = optimizer.backend.transforms();
        assert_eq!(transforms.len(), 1);
        let resize = resize_of(&transforms[0]).unwrap();
        assert_eq!((resize.width, resize.height), (Some(800), Some(600)));
        assert_eq!(resize.fit, FitMode::Inside);
        assert_eq!(
            encode_of(&transforms[0]),
            EncodePlan::Webp {
                quality: Quality::new(75)
            }
        );
    }

    #[tokio::test]
    async fn png_ignores_quality() {
        let fx = fixture(10);
        let optimizer = optimizer(MockBackend::new(), CapturingLogger::shared());
        let request = OptimizationRequest::new(&fx.source, &fx.dest, "p").with_options(
            OptimizationOptions {
                quality: Some(10),
                format: Some(OutputFormat::Png),
                ..Default::default()
            },
        );

        let result = optimizer.optimize_image(request).await.unwrap();

        assert!(result.optimized_path.to_string_lossy().ends_with("p.png"));
        assert!(matches!(
            encode_of(&optimizer.backend.transforms()[0]),
            EncodePlan::Png {
                progressive: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn no_dimensions_means_no_resize() {
        let fx = fixture(10);
        let optimizer = optimizer(MockBackend::new(), CapturingLogger::shared());

        optimizer
            .optimize_image(OptimizationRequest::new(&fx.source, &fx.dest, "plain"))
            .await
            .unwrap();

        let transforms = optimizer.backend.transforms();
        assert_eq!(resize_of(&transforms[0]), None);
        assert_eq!(transforms[0].quality(), Some(Quality::new(85)));
    }

    #[tokio::test]
    async fn thumbnail_is_taken_from_the_source_as_jpeg() {
        let fx = fixture(10);
        let optimizer = optimizer(MockBackend::new(), CapturingLogger::shared());
        let request = OptimizationRequest::new(&fx.source, &fx.dest, "w")
            .with_options(OptimizationOptions {
                format: Some(OutputFormat::Webp),
                ..Default::default()
            })
            .with_thumbnail(true);

        let result = optimizer.optimize_image(request).await.unwrap();

        assert_eq!(result.thumbnail_path, Some(fx.dest.join("w_thumb.jpg")));
        let transforms = optimizer.backend.transforms();
        assert!(matches!(
            &transforms[1],
            RecordedOp::Transform { source, encode: EncodePlan::Jpeg { progressive: false, .. }, .. }
                if source == &fx.source.to_string_lossy()
        ));
    }

    #[tokio::test]
    async fn dimensions_fall_back_to_source_metadata() {
        let fx = fixture(10);
        let backend = MockBackend::with_identify(vec![info(640, 480, "png"), ImageInfo::default()]);
        let optimizer = optimizer(backend, CapturingLogger::shared());

        let result = optimizer
            .optimize_image(OptimizationRequest::new(&fx.source, &fx.dest, "f"))
            .await
            .unwrap();

        assert_eq!(result.dimensions, Dimensions::new(640, 480));
    }

    #[tokio::test]
    async fn missing_dimensions_everywhere_warn_and_default() {
        let fx = fixture(10);
        let logger = CapturingLogger::shared();
        let optimizer = optimizer(MockBackend::new(), logger.clone());

        let result = optimizer
            .optimize_image(OptimizationRequest::new(&fx.source, &fx.dest, "d"))
            .await
            .unwrap();

        assert_eq!(result.dimensions, Dimensions::default());
        assert!(logger.contains(LogLevel::Warn, "No dimensions reported"));
    }

    #[tokio::test]
    async fn missing_source_is_wrapped() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nonexistent.jpg");
        let logger = CapturingLogger::shared();
        let optimizer = optimizer(MockBackend::new(), logger.clone());

        let err = optimizer
            .optimize_recipe_image(&missing, tmp.path().join("out"), "x")
            .await
            .unwrap_err();

        let os_message = std::fs::metadata(&missing).unwrap_err().to_string();
        assert_eq!(err.to_string(), format!("Image optimization failed: {os_message}"));
        assert!(optimizer.backend.get_operations().is_empty());
        assert_eq!(logger.context_value(LogLevel::Error, "cause"), os_message);
    }

    #[tokio::test]
    async fn failed_primary_write_skips_thumbnail() {
        let fx = fixture(10);
        let optimizer = optimizer(MockBackend::new().failing_transform(0), CapturingLogger::shared());

        let err = optimizer
            .optimize_recipe_image(&fx.source, &fx.dest, "r")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Image optimization failed: mock encoder failure");
        assert_eq!(optimizer.backend.transforms().len(), 1);
        assert!(!fx.dest.join("r_thumb.jpg").exists());
    }

    #[tokio::test]
    async fn failed_thumbnail_fails_the_whole_call() {
        let fx = fixture(10);
        let optimizer = optimizer(MockBackend::new().failing_transform(1), CapturingLogger::shared());

        let err = optimizer
            .optimize_recipe_image(&fx.source, &fx.dest, "r")
            .await
            .unwrap_err();

        assert_eq!(err.cause(), "mock encoder failure");
    }

    #[tokio::test]
    async fn zero_width_is_rejected_before_any_io() {
        let fx = fixture(10);
        let optimizer = optimizer(MockBackend::new(), CapturingLogger::shared());
        let request = OptimizationRequest::new(&fx.source, &fx.dest, "z").with_options(
            OptimizationOptions {
                width: Some(0),
                ..Default::default()
            },
        );

        let err = optimizer.optimize_image(request).await.unwrap_err();

        assert_eq!(err.cause(), "width must be a positive integer");
        assert!(!fx.dest.exists());
    }

    #[tokio::test]
    async fn destination_is_created_recursively() {
        let fx = fixture(10);
        let deep = fx.tmp.path().join("a/b/c");
        let optimizer = optimizer(MockBackend::new(), CapturingLogger::shared());

        optimizer
            .optimize_image(OptimizationRequest::new(&fx.source, &deep, "n"))
            .await
            .unwrap();

        assert!(deep.join("n.jpg").exists());
    }

    #[tokio::test]
    async fn source_is_left_untouched() {
        let fx = fixture(64);
        let optimizer = optimizer(MockBackend::new(), CapturingLogger::shared());

        optimizer
            .optimize_recipe_image(&fx.source, &fx.dest, "s")
            .await
            .unwrap();

        assert_eq!(std::fs::read(&fx.source).unwrap(), vec![7u8; 64]);
    }

    #[tokio::test]
    async fn negative_ratio_is_a_valid_result() {
        let fx = fixture(1000);
        let optimizer = optimizer(MockBackend::new().output_size(1250), CapturingLogger::shared());

        let result = optimizer
            .optimize_image(OptimizationRequest::new(&fx.source, &fx.dest, "g"))
            .await
            .unwrap();

        assert_eq!(result.compression_ratio, -25.0);
    }

    #[tokio::test]
    async fn settings_from_config_override_presets() {
        let mut config = OptimizerConfig::default();
        config.avatar.quality = 60;
        config.thumbnail.width = 200;
        let fx = fixture(10);
        let optimizer = ImageOptimizer::with_backend(
            MockBackend::new(),
            CapturingLogger::shared(),
            OptimizerSettings::from(&config),
        );

        optimizer
            .optimize_avatar_image(&fx.source, &fx.dest, "a")
            .await
            .unwrap();

        assert_eq!(optimizer.backend.transforms()[0].quality(), Some(Quality::new(60)));
        assert_eq!(optimizer.settings().thumbnail.width, 200);
    }

    #[tokio::test]
    async fn cleanup_removes_file() {
        let fx = fixture(10);
        let logger = CapturingLogger::shared();
        let optimizer = optimizer(MockBackend::new(), logger.clone());

        optimizer.cleanup_temp_file(&fx.source).await;

        assert!(!fx.source.exists());
        assert!(logger.entries().is_empty());
    }

    #[tokio::test]
    async fn cleanup_failure_only_warns() {
        let tmp = TempDir::new().unwrap();
        let logger = CapturingLogger::shared();
        let optimizer = optimizer(MockBackend::new(), logger.clone());
        let missing = tmp.path().join("already-gone.tmp");

        optimizer.cleanup_temp_file(&missing).await;

        assert!(logger.contains(LogLevel::Warn, "Failed to cleanup temp file"));
        assert_eq!(
            logger.context_value(LogLevel::Warn, "path"),
            missing.display().to_string()
        );
    }

    #[tokio::test]
    async fn concurrent_calls_share_a_destination() {
        let fx = fixture(10);
        let optimizer = optimizer(MockBackend::new(), CapturingLogger::shared());

        let (a, b) = tokio::join!(
            optimizer.optimize_image(OptimizationRequest::new(&fx.source, &fx.dest, "1-main")),
            optimizer.optimize_image(OptimizationRequest::new(&fx.source, &fx.dest, "2-main")),
        );

        assert_eq!(a.unwrap().optimized_path, fx.dest.join("1-main.jpg"));
        assert_eq!(b.unwrap().optimized_path, fx.dest.join("2-main.jpg"));
    }
}
