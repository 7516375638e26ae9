//! Raster format detection by magic bytes, and source image loading.
//!
//! Only png, jpeg, webp and gif are recognized. Detection never trusts a
//! caller-supplied extension or a backend-reported mime type.

use crate::error::ValidationError;
use crate::provider::SourceImage;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::ImageFormat;
use std::path::{Component, Path, PathBuf};

/// Largest source image accepted for edit requests.
pub const MAX_SOURCE_IMAGE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
}

impl RasterFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
            RasterFormat::WebP => "image/webp",
            RasterFormat::Gif => "image/gif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
            RasterFormat::WebP => "webp",
            RasterFormat::Gif => "gif",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(RasterFormat::Png),
            "image/jpeg" | "image/jpg" => Some(RasterFormat::Jpeg),
            "image/webp" => Some(RasterFormat::WebP),
            "image/gif" => Some(RasterFormat::Gif),
            _ => None,
        }
    }
}

/// Detect the raster format from leading magic bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<RasterFormat> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some(RasterFormat::Png),
        ImageFormat::Jpeg => Some(RasterFormat::Jpeg),
        ImageFormat::WebP => Some(RasterFormat::WebP),
        ImageFormat::Gif => Some(RasterFormat::Gif),
        _ => None,
    }
}

/// Load a source image from a `data:` URL or a path relative to `workspace_root`.
pub fn load_source_image(spec: &str, workspace_root: &Path) -> Result<SourceImage, ValidationError> {
    let spec = spec.trim();
    let bytes = if let Some(data_url) = spec.strip_prefix("data:") {
        decode_data_url(data_url)?
    } else {
        let path = resolve_workspace_path(spec, workspace_root)?;
        let size = std::fs::metadata(&path)
            .map_err(|e| ValidationError::InvalidSourceImage(e.to_string()))?
            .len() as usize;
        check_size(size)?;
        std::fs::read(&path).map_err(|e| ValidationError::InvalidSourceImage(e.to_string()))?
    };

    check_size(bytes.len())?;
    let format = sniff_format(&bytes).ok_or(ValidationError::UnsupportedSourceImage)?;
    Ok(SourceImage {
        bytes,
        mime_type: format.mime_type().to_string(),
    })
}

/// Resolve `spec` under `workspace_root`. Absolute paths, `..` components and
/// symlinks leading outside the workspace are rejected.
fn resolve_workspace_path(spec: &str, workspace_root: &Path) -> Result<PathBuf, ValidationError> {
    let relative = Path::new(spec);
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ValidationError::SourceImageOutsideWorkspace(spec.to_string()))
            }
        }
    }

    let joined = workspace_root.join(relative);
    if !joined.is_file() {
        return Err(ValidationError::SourceImageNotFound(joined));
    }
    let root = dunce::canonicalize(workspace_root)
        .map_err(|e| ValidationError::InvalidSourceImage(e.to_string()))?;
    let resolved = dunce::canonicalize(&joined)
        .map_err(|e| ValidationError::InvalidSourceImage(e.to_string()))?;
    if !resolved.starts_with(&root) {
        return Err(ValidationError::SourceImageOutsideWorkspace(spec.to_string()));
    }
    Ok(resolved)
}

fn check_size(actual: usize) -> Result<(), ValidationError> {
    if actual > MAX_SOURCE_IMAGE_BYTES {
        return Err(ValidationError::SourceImageTooLarge {
            max: MAX_SOURCE_IMAGE_BYTES,
            actual,
        });
    }
    Ok(())
}

// `data:` already stripped; expects `<mime>;base64,<payload>`.
fn decode_data_url(rest: &str) -> Result<Vec<u8>, ValidationError> {
    let (header, payload) = rest.split_once(',').ok_or_else(|| {
        ValidationError::InvalidSourceImage("data URL is missing ',' separator".to_string())
    })?;
    if !header.ends_with(";base64") {
        return Err(ValidationError::InvalidSourceImage(
            "only base64 data URLs are supported".to_string(),
        ));
    }
    BASE64
        .decode(payload.trim().as_bytes())
        .map_err(|e| ValidationError::InvalidSourceImage(format!("invalid base64: {}", e)))
}
