//! Shared test utilities for the recipe-images test suite.
//!
//! Synthetic fixture images and a logger stub that records what the
//! optimizer reports.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let source = tmp.path().join("upload.jpg");
//! create_test_jpeg(&source, 2000, 1500);
//!
//! let logger = CapturingLogger::shared();
//! // ... run the optimizer with `logger.clone()` ...
//! assert!(logger.contains(LogLevel::Info, "Image optimized"));
//! ```

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::logging::{LogLevel, Logger};

// =========================================================================
// Fixture images
// =========================================================================

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create a small valid RGBA PNG file with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, 64, (y % 256) as u8, 200])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

// =========================================================================
// Logger stub
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub context: Vec<(String, String)>,
}

/// Logger that keeps every entry in memory.
#[derive(Default)]
pub struct CapturingLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl CapturingLogger {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Whether an entry at `level` has a message starting with `prefix`.
    pub fn contains(&self, level: LogLevel, prefix: &str) -> bool {
        self.entries()
            .iter()
            .any(|e| e.level == level && e.message.starts_with(prefix))
    }

    /// Context value of the first entry at `level`. Panics if absent.
    pub fn context_value(&self, level: LogLevel, key: &str) -> String {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .flat_map(|e| e.context)
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .unwrap_or_else(|| panic!("no '{key}' in {level:?} entries: {:?}", self.entries()))
    }
}

impl Logger for CapturingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &[(&str, String)]) {
        self.entries.lock().unwrap().push(LogEntry {
            level,
            message: message.to_string(),
            context: context
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
    }
}
