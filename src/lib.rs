//! # drawtile
//!
//! Fragment large scanned engineering drawings into overlapping tiles for
//! vision-model pipelines.
//!
//! ## Why this crate?
//!
//! A full-sheet P&ID scan is far too large for a vision model to read in one
//! shot — downscaled to fit an API payload, the line work and tag text turn
//! to mush. drawtile cuts the page into a deterministic set of overlapping
//! rectangular fragments at legible resolution, drops the blank ones, and
//! keeps every fragment traceable back onto the page through its bounding
//! box, so downstream extraction can stitch per-tile answers together.
//!
//! ## Pipeline Overview
//!
//! ```text
//! page image (encoded bytes)
//!  │
//!  ├─ 1. Normalize   decode, shrink into the 2048×2048 working box
//!  ├─ 2. Tile        grid (N×M equal cells) or fixed-size sweep, with overlap
//!  ├─ 3. Filter      drop tiles below the visual-complexity threshold
//!  └─ 4. Emit        JPEG fragment + bbox per surviving tile, row-major order
//! ```
//!
//! PDF rasterization, object-store transfer, and the vision-LLM call are
//! collaborators outside this crate: pages arrive as encoded image buffers
//! and fragments leave as encoded image buffers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use drawtile::{document_from_image, NormalizeLimits, TilingConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut doc = document_from_image("sheet.png".as_ref(), &NormalizeLimits::default())?;
//!     let config = TilingConfig::builder().grid(4, 3).build()?;
//!     for page in doc.pages_mut() {
//!         let page_number = page.page_number();
//!         let fragments = page.fragment(&config)?;
//!         println!("page {}: {} fragments", page_number, fragments.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `drawtile` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! drawtile = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    NormalizeLimits, TileLayout, TilingConfig, TilingConfigBuilder, TilingOverrides,
    DEFAULT_COMPLEXITY_THRESHOLD, DEFAULT_OVERLAP_RATIO, DEFAULT_TILE_SIZE,
};
pub use error::FragmentError;
pub use loader::document_from_image;
pub use model::{BBox, Document, DocumentMetadata, Fragment, FragmentRecord, Page, PageMetadata};
pub use pipeline::tiler::{tile_image, tile_page};
