//! Pipeline stages for page fragmentation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and keeps the
//! geometry code free of encode/decode concerns.
//!
//! ## Data Flow
//!
//! ```text
//! page bytes ──▶ normalize ──▶ tiler ──▶ fragments
//!  (encoded)    (decode +    (grid or    (bbox + JPEG)
//!               bounded       fixed-size
//!               downscale)    + complexity filter)
//! ```
//!
//! 1. [`normalize`]   — decode raw page bytes; shrink oversized pages into
//!    the configured bounding box
//! 2. [`complexity`]  — score a region's "has drawn content" fraction,
//!    consulted by the tiler's keep/drop filter
//! 3. [`tiler`]       — cut the page into overlapping fragments in one of
//!    two geometry modes; the only stage with non-trivial math
//! 4. [`visualize`]   — debug overlay of fragment boxes, off the data path

pub mod complexity;
pub mod normalize;
pub mod tiler;
pub mod visualize;
