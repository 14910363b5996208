//! Upload acceptance checks, run before any decode is attempted.

/// MIME types accepted for upload. GIF is accepted and re-encoded.
pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
];

/// Case-insensitive membership test against [`ACCEPTED_MIME_TYPES`].
pub fn is_valid_image_format(mime_type: &str) -> bool {
    ACCEPTED_MIME_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(mime_type))
}
