//! Raster-image loader: a single scan file becomes a one-page [`Document`].
//!
//! This is the simplest of the page sources. Multi-page PDFs go through an
//! external renderer that hands this crate already-encoded page buffers; a
//! plain raster scan (.jpg/.jpeg/.png) is loaded here directly. Either way a
//! page's content is normalized and JPEG-encoded before fragmentation sees
//! it, so the tiler never cares where a page came from.

use crate::config::NormalizeLimits;
use crate::error::FragmentError;
use crate::model::{Document, Page};
use crate::pipeline::normalize;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use tracing::info;

/// File extensions accepted as raster scans (lower-case, with dot).
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Load a raster-image file into a one-page document.
///
/// The image is decoded, shrunk into `limits` if oversized, and re-encoded
/// as JPEG — the same normalized form a PDF renderer would deliver.
///
/// # Errors
/// [`FragmentError::UnsupportedFile`] for an extension outside the
/// allow-list, [`FragmentError::Io`] when the file cannot be read,
/// [`FragmentError::Decode`] / [`FragmentError::Encode`] for bad image data.
pub fn document_from_image(
    path: &Path,
    limits: &NormalizeLimits,
) -> Result<Document, FragmentError> {
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    if !ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(FragmentError::UnsupportedFile {
            path: path.to_path_buf(),
            extension,
        });
    }

    let bytes = std::fs::read(path).map_err(|source| FragmentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let content = normalize_page_bytes(&bytes, &path.display().to_string(), limits)?;
    info!(path = %path.display(), "loaded raster scan as single-page document");
    Ok(Document::new(
        path.to_path_buf(),
        vec![Page::new(1, content)],
    ))
}

/// Normalize an encoded image buffer into page content: decode, bound the
/// dimensions, re-encode JPEG.
pub fn normalize_page_bytes(
    bytes: &[u8],
    context: &str,
    limits: &NormalizeLimits,
) -> Result<Vec<u8>, FragmentError> {
    let image = normalize::decode(bytes, context)?;
    let image = normalize::resize_if_needed(image, limits);
    encode_page(&image, context)
}

fn encode_page(image: &DynamicImage, context: &str) -> Result<Vec<u8>, FragmentError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| FragmentError::encode(context, e))?;
    Ok(buf)
}
