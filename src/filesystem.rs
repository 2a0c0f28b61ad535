//! Upload acceptance and filename derivation.
//!
//! Uploaded photos are accepted only for a small set of image content
//! types, capped by the configured size, and stored under a filename
//! derived from the blake3 hash of their bytes. Identical uploads map to
//! the same object, so re-uploads are free.

use crate::app_config;
use mime::Mime;

/// Content types accepted for photo uploads.
pub fn is_allowed_image(content_type: &Mime) -> bool {
    if content_type.type_() != mime::IMAGE {
        return false;
    }
    matches!(
        content_type.subtype().as_str(),
        "jpeg" | "png" | "gif" | "webp"
    )
}

/// Canonical file extension for an accepted image type.
pub fn extension_for(content_type: &Mime) -> &'static str {
    match content_type.subtype().as_str() {
        "jpeg" => "jpg",
        "png" => "png",
        "gif" => "gif",
        "webp" => "webp",
        _ => "bin",
    }
}

/// MIME type for a stored filename, from its extension.
pub fn mime_for_filename(filename: &str) -> Option<String> {
    let ext = filename.rsplit('.').next()?;
    let mime = match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    };
    Some(mime.to_string())
}

/// Derives the canonical stored filename for an upload: the blake3 hash
/// of the content plus the extension for its type.
pub fn hashed_filename(data: &[u8], content_type: &Mime) -> String {
    format!(
        "{}.{}",
        blake3::hash(data).to_hex(),
        extension_for(content_type)
    )
}

/// Upload size cap in bytes.
pub fn max_upload_bytes() -> usize {
    let mb = app_config::limits().max_upload_size_mb as usize;
    if mb == 0 {
        crate::constants::DEFAULT_MAX_UPLOAD_BYTES
    } else {
        mb * 1024 * 1024
    }
}

/// Public URL for a stored file, served by the asset route.
pub fn public_url(filename: &str) -> String {
    format!(
        "{}/files/{}",
        app_config::site().base_url.trim_end_matches('/'),
        filename
    )
}
