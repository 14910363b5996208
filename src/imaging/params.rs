//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the planning code in [`operations`](super::operations)
//! (which decides what files to produce) and the [`backend`](super::backend)
//! (which does the actual pixel work). A transform is a plain value, so the
//! plan for a preset can be asserted in a test without decoding anything.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`OutputFormat`]: `jpeg`, `png` or `webp`, with the file extension each one implies.
//! - [`FitMode`]: `inside` (letterbox, no crop) or `cover` (crop to fill).
//! - [`ResizePlan`]: Target box, fit mode and the no-enlargement flag.
//! - [`EncodePlan`]: Encoder selection and its knobs.
//! - [`TransformParams`]: Everything needed to write one output file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Encoded output format of an optimized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    /// File extension written for this format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::Webp),
            other => Err(format!(
                "unsupported output format '{other}' (expected jpeg, png or webp)"
            )),
        }
    }
}

/// How an image is fitted into its target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Scale to fit entirely within the box, preserving aspect ratio. No crop.
    Inside,
    /// Scale to fill the box, preserving aspect ratio, then centre-crop the overflow.
    Cover,
}

/// A resize step. An axis left as `None` is unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: FitMode,
    pub without_enlargement: bool,
}

/// PNG zlib effort. Only the maximum is ever requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngCompression {
    Best,
}

/// Encoder selection for one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodePlan {
    Jpeg {
        quality: Quality,
        progressive: bool,
    },
    /// PNG has no quality knob; `progressive` requests interlacing.
    Png {
        compression: PngCompression,
        progressive: bool,
    },
    Webp {
        quality: Quality,
    },
}

impl EncodePlan {
    pub fn format(&self) -> OutputFormat {
        match self {
            EncodePlan::Jpeg { .. } => OutputFormat::Jpeg,
            EncodePlan::Png { .. } => OutputFormat::Png,
            EncodePlan::Webp { .. } => OutputFormat::Webp,
        }
    }
}

/// Parameters for a single decode → resize → encode → write operation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// `None` keeps the source dimensions.
    pub resize: Option<ResizePlan>,
    pub encode: EncodePlan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_85() {
        assert_eq!(Quality::default().value(), 85);
    }

    #[test]
    fn format_extensions() {
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::Webp.extension(), "webp");
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JPEG".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!("jpg".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!("WebP".parse::<OutputFormat>(), Ok(OutputFormat::Webp));
        assert!("avif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn format_default_is_jpeg() {
        assert_eq!(OutputFormat::default(), OutputFormat::Jpeg);
    }

    #[test]
    fn encode_plan_reports_format() {
        let plan = EncodePlan::Png {
            compression: PngCompression::Best,
            progressive: true,
        };
        assert_eq!(plan.format(), OutputFormat::Png);
    }
}
