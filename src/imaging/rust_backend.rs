//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Format sniffing | `image::ImageReader::with_guessed_format` (content, not extension) |
//! | Decode (JPEG, PNG, WebP, GIF) | `image` crate decoders |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3`, geometry from [`calculate_resize`] |
//! | Cover crop | `DynamicImage::crop_imm`, centred |
//! | Encode → JPEG | `jpeg-encoder` (progressive scans) |
//! | Encode → PNG | `image::codecs::png::PngEncoder`, `CompressionType::Best` |
//! | Encode → WebP | `webp` crate, lossy |
//!
//! Output is encoded fully in memory before anything touches the
//! destination, so an encoder failure never leaves a truncated file behind.

use super::backend::{BackendError, Dimensions, ImageBackend, ImageInfo};
use super::calculations::calculate_resize;
use super::params::{EncodePlan, PngCompression, Quality, ResizePlan, TransformParams};
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

/// Extensions whose decoders are compiled in.
const INPUT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Returns the set of image file extensions the backend can read.
pub fn supported_input_extensions() -> &'static [&'static str] {
    INPUT_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        other => format!("{other:?}").to_lowercase(),
    }
}

fn open_reader(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    open_reader(path)?.decode().map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
    })
}

/// Scale then centre-crop according to the plan.
fn apply_resize(img: DynamicImage, plan: &ResizePlan) -> DynamicImage {
    let geometry = calculate_resize((img.width(), img.height()), plan);

    let (scaled_w, scaled_h) = geometry.scaled;
    let scaled = if (scaled_w, scaled_h) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(scaled_w, scaled_h, FilterType::Lanczos3)
    };

    if geometry.needs_crop() {
        let (x, y) = geometry.crop_offset();
        let (out_w, out_h) = geometry.output;
        scaled.crop_imm(x, y, out_w, out_h)
    } else {
        scaled
    }
}

fn encode_jpeg(img: &DynamicImage, quality: Quality, progressive: bool) -> Result<Vec<u8>, BackendError> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let too_large = || {
        BackendError::ProcessingFailed(format!(
            "JPEG encode failed: {width}x{height} exceeds 65535 pixels per axis"
        ))
    };
    let width = u16::try_from(width).map_err(|_| too_large())?;
    let height = u16::try_from(height).map_err(|_| too_large())?;

    let mut buffer = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut buffer, quality.value() as u8);
    encoder.set_progressive(progressive);
    encoder
        .encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
    Ok(buffer)
}

/// The `image` PNG encoder cannot write Adam7, so `progressive` is not honoured here.
fn encode_png(img: &DynamicImage, compression: PngCompression) -> Result<Vec<u8>, BackendError> {
    let compression = match compression {
        PngCompression::Best => CompressionType::Best,
    };
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buffer, compression, PngFilterType::Adaptive);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {e}")))?;
    Ok(buffer)
}

fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgba = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    let encoded = encoder
        .encode_simple(false, quality.value() as f32)
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {e:?}")))?;
    Ok(encoded.to_vec())
}

fn encode(img: &DynamicImage, plan: &EncodePlan) -> Result<Vec<u8>, BackendError> {
    match *plan {
        EncodePlan::Jpeg {
            quality,
            progressive,
        } => encode_jpeg(img, quality, progressive),
        EncodePlan::Png { compression, .. } => encode_png(img, compression),
        EncodePlan::Webp { quality } => encode_webp(img, quality),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<ImageInfo, BackendError> {
        let reader = open_reader(path)?;
        let format = reader.format().map(format_name);
        let (width, height) = reader.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(ImageInfo {
            dimensions: Some(Dimensions::new(width, height)),
            format,
        })
    }

    fn transform(&self, params: &TransformParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let img = match &params.resize {
            Some(plan) => apply_resize(img, plan),
            None => img,
        };
        let bytes = encode(&img, &params.encode)?;
        std::fs::write(&params.output, bytes)?;
        Ok(())
    }
}
