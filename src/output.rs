//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Single image
//!
//! ```text
//! uploads/42-main.jpg (1067x800)
//!     Source: /tmp/upload-8f2a
//!     Size: 2.0 MiB → 312.4 KiB (84.7% smaller)
//!     Thumbnail: uploads/42-main_thumb.jpg
//! ```
//!
//! ## Batch
//!
//! ```text
//! 001 42-main.jpg (1067x800) 84.7% smaller
//! 002 43-main.jpg (1200x675) 61.0% smaller
//! FAILED drafts/broken.png
//!     Image optimization failed: ...
//!
//! Optimized 2 of 3 images, 2.6 MiB → 0.9 MiB (65.4% smaller)
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::batch::BatchReport;
use crate::types::OptimizedImageResult;
use std::path::Path;

/// Human-readable byte count (binary units, one decimal).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// `84.7% smaller`, or `12.5% larger` when the file grew.
pub fn format_ratio(ratio: f64) -> String {
    if ratio < 0.0 {
        format!("{:.1}% larger", -ratio)
    } else {
        format!("{ratio:.1}% smaller")
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn format_result(result: &OptimizedImageResult) -> Vec<String> {
    let (width, height) = result.dimensions.as_tuple();
    let mut lines = vec![
        format!("{} ({width}x{height})", result.optimized_path.display()),
        format!("    Source: {}", result.original_path.display()),
        format!(
            "    Size: {} → {} ({})",
            format_bytes(result.original_size),
            format_bytes(result.optimized_size),
            format_ratio(result.compression_ratio)
        ),
    ];
    if let Some(thumb) = &result.thumbnail_path {
        lines.push(format!("    Thumbnail: {}", thumb.display()));
    }
    lines
}

pub fn format_batch_report(report: &BatchReport, source_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, result) in report.succeeded.iter().enumerate() {
        let (width, height) = result.dimensions.as_tuple();
        lines.push(format!(
            "{:03} {} ({width}x{height}) {}",
            i + 1,
            file_label(&result.optimized_path),
            format_ratio(result.compression_ratio)
        ));
    }
    for failure in &report.failed {
        let shown = failure
            .source_path
            .strip_prefix(source_dir)
            .unwrap_or(&failure.source_path);
        lines.push(format!("FAILED {}", shown.display()));
        lines.push(format!("    {}", failure.error));
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Optimized {} of {} images, {} → {} ({})",
        report.succeeded.len(),
        report.total(),
        format_bytes(report.original_bytes()),
        format_bytes(report.optimized_bytes()),
        format_ratio(report.overall_ratio())
    ));
    lines
}

pub fn format_mime_check(mime_type: &str, accepted: bool) -> String {
    if accepted {
        format!("{mime_type}: accepted")
    } else {
        format!("{mime_type}: rejected")
    }
}

pub fn print_result(result: &OptimizedImageResult) {
    for line in format_result(result) {
        println!("{}", line);
    }
}

pub fn print_batch_report(report: &BatchReport, source_dir: &Path) {
    for line in format_batch_report(report, source_dir) {
        println!("{}", line);
    }
}
