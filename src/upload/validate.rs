//! Blob validation
//!
//! Shared precondition applied by both engines before any store call: the
//! blob must declare an `image/` MIME type, fit under the configured size
//! cap, and carry a recognized image extension.

use crate::upload::{Blob, UploadError};

/// Default size cap (10MiB)
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Accepted image extensions, matched case-insensitively
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// Validate a blob against the shared image rules.
///
/// Any violation yields a human-readable reason; the calling engine
/// short-circuits and never opens a remote resource.
pub fn validate_image(blob: &Blob, max_size_bytes: u64) -> Result<(), UploadError> {
    if !blob.content_type.starts_with("image/") {
        return Err(UploadError::Validation(
            "Please select an image file".into(),
        ));
    }

    if blob.size_bytes() > max_size_bytes {
        return Err(UploadError::Validation(format!(
            "File size must be less than {}",
            format_size(max_size_bytes)
        )));
    }

    let valid_extension = extension(&blob.name)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if !valid_extension {
        return Err(UploadError::Validation(format!(
            "Please select a valid image file ({})",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    Ok(())
}

/// The extension after the last dot, if any
pub fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// MIME type for a file name, by extension.
///
/// Unknown extensions fall back to `application/octet-stream`.
pub fn mime_for_name(name: &str) -> &'static str {
    match extension(name)
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Human-readable byte count, e.g. `2.5 MB`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 bytes".into();
    }

    let exponent = (bytes.ilog(1024) as usize).min(UNITS.len() - 1);
    if exponent == 0 {
        return format!("{bytes} bytes");
    }

    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[exponent])
}
