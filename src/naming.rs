//! Output filename conventions.
//!
//! An uploaded `my-photo.test.png` keeps everything up to its final dot as
//! the stem; the extension is replaced by the one implied by the output
//! format. Thumbnails add a `_thumb` suffix to the stem:
//!
//! - `recipe.jpg` → `recipe.jpg` / `recipe_thumb.jpg`
//! - `my-photo.test.png` (jpeg) → `my-photo.test.jpg`
//! - `banner.png` (webp) → `banner.webp` / `banner_thumb.webp`

use crate::imaging::OutputFormat;

/// Strip the final extension from a filename.
///
/// Only the last `.segment` is removed, and only when it is non-empty and
/// contains no path separator. A leading dot (`.hidden`) is part of the
/// name, not an extension.
pub fn filename_stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => {
            let extension = &filename[dot + 1..];
            if extension.is_empty() || extension.contains(['/', '\\']) {
                filename
            } else {
                &filename[..dot]
            }
        }
        _ => filename,
    }
}

/// `<stem>.<ext>` for an already extension-free stem.
pub fn output_filename(stem: &str, format: OutputFormat) -> String {
    format!("{}.{}", stem, format.extension())
}

/// Replace the extension of `original_filename` with the one for `format`.
pub fn get_optimized_filename(original_filename: &str, format: OutputFormat) -> String {
    output_filename(filename_stem(original_filename), format)
}

/// Like [`get_optimized_filename`], with `_thumb` inserted before the extension.
pub fn get_thumbnail_filename(original_filename: &str, format: OutputFormat) -> String {
    output_filename(&format!("{}_thumb", filename_stem(original_filename)), format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimized_replaces_extension() {
        assert_eq!(get_optimized_filename("photo.png", OutputFormat::Jpeg), "photo.jpg");
        assert_eq!(get_optimized_filename("photo.jpeg", OutputFormat::Jpeg), "photo.jpg");
    }

    #[test]
    fn optimized_uses_format_extension() {
        assert_eq!(get_optimized_filename("photo.jpg", OutputFormat::Png), "photo.png");
        assert_eq!(get_optimized_filename("photo.jpg", OutputFormat::Webp), "photo.webp");
    }

    #[test]
    fn optimized_keeps_inner_dots() {
        assert_eq!(
            get_optimized_filename("my-photo.test.png", OutputFormat::Jpeg),
            "my-photo.test.jpg"
        );
    }

    #[test]
    fn optimized_without_extension() {
        assert_eq!(get_optimized_filename("upload", OutputFormat::Webp), "upload.webp");
    }

    #[test]
    fn thumbnail_simple() {
        assert_eq!(get_thumbnail_filename("recipe.jpg", OutputFormat::Jpeg), "recipe_thumb.jpg");
    }

    #[test]
    fn thumbnail_keeps_inner_dots() {
        assert_eq!(
            get_thumbnail_filename("my-recipe.v2.jpg", OutputFormat::Jpeg),
            "my-recipe.v2_thumb.jpg"
        );
    }

    #[test]
    fn thumbnail_follows_format() {
        assert_eq!(get_thumbnail_filename("banner.png", OutputFormat::Webp), "banner_thumb.webp");
    }

    #[test]
    fn stem_edge_cases() {
        assert_eq!(filename_stem(".hidden"), ".hidden");
        assert_eq!(filename_stem("trailing."), "trailing.");
        assert_eq!(filename_stem("dir.v2/file"), "dir.v2/file");
        assert_eq!(filename_stem("a.b.c"), "a.b");
    }
}
