//! Error types for the drawtile library.
//!
//! The taxonomy follows how callers recover:
//!
//! * [`FragmentError::Decode`] / [`FragmentError::Encode`] — a single page or
//!   tile is unusable. Batch callers log and skip; the tiler itself never
//!   propagates these (an undecodable page yields an empty fragment list, a
//!   tile that fails to re-encode is dropped with a warning).
//!
//! * [`FragmentError::InvalidConfig`] — the tiling parameters are
//!   contradictory or out of range. Surfaced immediately at the call site;
//!   a bad config is a programming error, not a bad input file.
//!
//! * [`FragmentError::UnsupportedFile`] / [`FragmentError::Io`] — boundary
//!   errors from the raster-image loader and the CLI.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the drawtile library.
#[derive(Debug, Error)]
pub enum FragmentError {
    // ── Image errors ──────────────────────────────────────────────────────
    /// The byte buffer could not be parsed as an image.
    #[error("Failed to decode image ({context}): {detail}")]
    Decode { context: String, detail: String },

    /// Re-encoding an image (tile or visualization overlay) failed.
    #[error("Failed to encode image ({context}): {detail}")]
    Encode { context: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Tiling parameters are out of range or contradictory.
    #[error("Invalid tiling configuration: {0}")]
    InvalidConfig(String),

    // ── Loader errors ─────────────────────────────────────────────────────
    /// The file extension is not in the raster-image allow-list.
    #[error("Unsupported file type '{extension}' for '{path}'\nSupported: .jpg, .jpeg, .png")]
    UnsupportedFile { path: PathBuf, extension: String },

    /// Could not read an input file or write an output artifact.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FragmentError {
    /// Shorthand for a decode failure with a formatted context.
    pub(crate) fn decode(context: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        FragmentError::Decode {
            context: context.into(),
            detail: detail.to_string(),
        }
    }

    /// Shorthand for an encode failure with a formatted context.
    pub(crate) fn encode(context: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        FragmentError::Encode {
            context: context.into(),
            detail: detail.to_string(),
        }
    }
}
