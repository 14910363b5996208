//! Named option sets for the two image slots the application has.
//!
//! | Preset | Box | Fit | Quality | Thumbnail |
//! |---|---|---|---|---|
//! | recipe | 1200×800 | inside (letterbox) | JPEG 85 | 400×300 |
//! | avatar | 300×300 | cover (crop to square) | JPEG 90 | none |
//!
//! Neither preset ever enlarges its source. The stock values can be
//! overridden in `config.toml` (see [`crate::config`]).

use crate::imaging::OutputFormat;
use crate::types::OptimizationOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    Recipe,
    Avatar,
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetKind::Recipe => f.write_str("recipe"),
            PresetKind::Avatar => f.write_str("avatar"),
        }
    }
}

impl FromStr for PresetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recipe" => Ok(PresetKind::Recipe),
            "avatar" => Ok(PresetKind::Avatar),
            other => Err(format!("unknown preset '{other}' (expected recipe or avatar)")),
        }
    }
}

/// Options plus thumbnail flag, under a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub kind: PresetKind,
    pub options: OptimizationOptions,
    pub generate_thumbnail: bool,
}

impl Preset {
    pub fn recipe() -> Self {
        Self {
            kind: PresetKind::Recipe,
            options: OptimizationOptions {
                width: Some(1200),
                height: Some(800),
                quality: Some(85),
                format: Some(OutputFormat::Jpeg),
                maintain_aspect_ratio: Some(true),
            },
            generate_thumbnail: true,
        }
    }

    pub fn avatar() -> Self {
        Self {
            kind: PresetKind::Avatar,
            options: OptimizationOptions {
                width: Some(300),
                height: Some(300),
                quality: Some(90),
                format: Some(OutputFormat::Jpeg),
                maintain_aspect_ratio: Some(false),
            },
            generate_thumbnail: false,
        }
    }

    pub fn stock(kind: PresetKind) -> Self {
        match kind {
            PresetKind::Recipe => Self::recipe(),
            PresetKind::Avatar => Self::avatar(),
        }
    }
}
