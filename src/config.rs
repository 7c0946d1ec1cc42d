//! Configuration types for page fragmentation.
//!
//! All tiling behaviour is controlled through [`TilingConfig`], a plain value
//! object passed into each call. There is deliberately no process-wide
//! settings singleton: the outermost caller loads defaults once and threads
//! them down, so two calls with the same config always tile the same way
//! regardless of what any other code did first.
//!
//! The two tiling algorithms are selected by [`TileLayout`], a sum type
//! rather than a pair of nullable size fields. A config can therefore never
//! be in the "both modes at once" state the validation would otherwise have
//! to reject.

use crate::error::FragmentError;
use serde::{Deserialize, Serialize};

/// Default overlap between adjacent tiles, as a fraction of tile size.
pub const DEFAULT_OVERLAP_RATIO: f32 = 0.1;
/// Default minimum complexity score a tile must reach to be kept.
pub const DEFAULT_COMPLEXITY_THRESHOLD: f32 = 0.03;
/// Default fixed tile edge in pixels, used when fixed-size mode is selected
/// without explicit dimensions.
pub const DEFAULT_TILE_SIZE: u32 = 1024;

/// How the page is cut into tiles.
///
/// The two variants are independent geometry algorithms, not two
/// parameterisations of one loop:
///
/// * [`TileLayout::Grid`] divides the page into exactly `columns × rows`
///   cells of equal (real-valued) base size, then expands each cell by the
///   overlap ratio. Tile count is fixed up front; tile size follows from the
///   page dimensions.
/// * [`TileLayout::FixedSize`] sweeps a fixed-size window across the page
///   with a step of `size × (1 − overlap)`. Tile size is fixed up front;
///   tile count follows from the page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileLayout {
    /// Equal-count grid: `columns × rows` tiles covering the whole page.
    Grid { columns: u32, rows: u32 },
    /// Fixed-size sweep: `width × height` pixel tiles, clipped at the edges.
    FixedSize { width: u32, height: u32 },
}

impl TileLayout {
    /// Fixed-size layout with the default 1024×1024 tile.
    pub fn fixed_default() -> Self {
        TileLayout::FixedSize {
            width: DEFAULT_TILE_SIZE,
            height: DEFAULT_TILE_SIZE,
        }
    }
}

impl Default for TileLayout {
    /// A 2×2 grid: four quadrants, the smallest split that still lets a
    /// vision model see legible line work on a full-sheet drawing.
    fn default() -> Self {
        TileLayout::Grid {
            columns: 2,
            rows: 2,
        }
    }
}

/// Parameters for one fragmentation call.
///
/// Built via [`TilingConfig::builder()`] (which validates) or assembled
/// literally and validated by the tiler at call time.
///
/// # Example
/// ```rust
/// use drawtile::{TileLayout, TilingConfig};
///
/// let config = TilingConfig::builder()
///     .layout(TileLayout::Grid { columns: 5, rows: 4 })
///     .overlap_ratio(0.1)
///     .complexity_threshold(0.03)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TilingConfig {
    /// Tiling mode and its geometry parameters.
    pub layout: TileLayout,

    /// Fraction of the tile size shared with each neighbour, in `[0, 1)`.
    /// Default: 0.1.
    ///
    /// Symbols and text that straddle a cut line are unreadable in both
    /// halves; a 10% overlap keeps every glyph whole in at least one tile.
    pub overlap_ratio: f32,

    /// Minimum complexity score ([`crate::pipeline::complexity::score`]) a
    /// tile must reach to be kept, in `[0, 1]`. Default: 0.03.
    ///
    /// Exactly `0` disables filtering entirely: every geometrically valid
    /// tile is kept, including blank ones. In fixed-size mode a zero
    /// threshold also keeps sub-half-size edge remnants, guaranteeing full
    /// coverage of the page.
    pub complexity_threshold: f32,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            layout: TileLayout::default(),
            overlap_ratio: DEFAULT_OVERLAP_RATIO,
            complexity_threshold: DEFAULT_COMPLEXITY_THRESHOLD,
        }
    }
}

impl TilingConfig {
    /// Create a new builder for `TilingConfig`.
    pub fn builder() -> TilingConfigBuilder {
        TilingConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check every field against its documented range.
    ///
    /// Called by the tiler on entry so that literal structs get the same
    /// fail-fast behaviour as builder-built ones.
    pub fn validate(&self) -> Result<(), FragmentError> {
        match self.layout {
            TileLayout::Grid { columns, rows } => {
                if columns == 0 || rows == 0 {
                    return Err(FragmentError::InvalidConfig(format!(
                        "grid layout needs at least 1×1 tiles, got {columns}×{rows}"
                    )));
                }
            }
            TileLayout::FixedSize { width, height } => {
                if width == 0 || height == 0 {
                    return Err(FragmentError::InvalidConfig(format!(
                        "fixed tile size must be positive, got {width}×{height}"
                    )));
                }
            }
        }
        if !(0.0..1.0).contains(&self.overlap_ratio) {
            return Err(FragmentError::InvalidConfig(format!(
                "overlap_ratio must be in [0, 1), got {}",
                self.overlap_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.complexity_threshold) {
            return Err(FragmentError::InvalidConfig(format!(
                "complexity_threshold must be in [0, 1], got {}",
                self.complexity_threshold
            )));
        }
        Ok(())
    }
}

/// Builder for [`TilingConfig`].
#[derive(Debug)]
pub struct TilingConfigBuilder {
    config: TilingConfig,
}

impl TilingConfigBuilder {
    pub fn layout(mut self, layout: TileLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn grid(mut self, columns: u32, rows: u32) -> Self {
        self.config.layout = TileLayout::Grid { columns, rows };
        self
    }

    pub fn fixed_size(mut self, width: u32, height: u32) -> Self {
        self.config.layout = TileLayout::FixedSize { width, height };
        self
    }

    pub fn overlap_ratio(mut self, ratio: f32) -> Self {
        self.config.overlap_ratio = ratio;
        self
    }

    pub fn complexity_threshold(mut self, threshold: f32) -> Self {
        self.config.complexity_threshold = threshold;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TilingConfig, FragmentError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Per-call overrides layered over a base [`TilingConfig`].
///
/// `None` for a field means "use the base value", never "unset". This is the
/// merge the page-level API exposes: callers tweak one knob for one call
/// without restating the rest of the configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TilingOverrides {
    pub layout: Option<TileLayout>,
    pub overlap_ratio: Option<f32>,
    pub complexity_threshold: Option<f32>,
}

impl TilingOverrides {
    /// Merge these overrides onto `base`, producing a complete config.
    pub fn resolve(&self, base: &TilingConfig) -> TilingConfig {
        TilingConfig {
            layout: self.layout.unwrap_or(base.layout),
            overlap_ratio: self.overlap_ratio.unwrap_or(base.overlap_ratio),
            complexity_threshold: self
                .complexity_threshold
                .unwrap_or(base.complexity_threshold),
        }
    }
}

/// Bounding box the normalizer shrinks oversized pages into.
///
/// 2048 px per side keeps a full-sheet 300-DPI scan inside typical
/// vision-API payload limits while leaving line work legible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeLimits {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for NormalizeLimits {
    fn default() -> Self {
        Self {
            max_width: 2048,
            max_height: 2048,
        }
    }
}
