//! The tiling engine: cut a page image into overlapping fragments.
//!
//! Two geometry algorithms live here, selected by [`TileLayout`]:
//!
//! * **Grid** — exactly `columns × rows` cells of equal real-valued base
//!   size, each expanded by the overlap ratio and clamped to the image. The
//!   last column and row are forced to the image edge so coverage is exact
//!   regardless of rounding.
//! * **Fixed-size** — a `width × height` window swept with a step of
//!   `size × (1 − overlap)` per axis, clipped at the far edges.
//!
//! Both modes then score each candidate region and drop tiles below the
//! complexity threshold, and JPEG-encode the survivors. Iteration is
//! row-major (row outer, column inner); the returned order is the fragment
//! order everything downstream sees.
//!
//! Failure doctrine: bad page bytes are a per-page condition in a batch of
//! hundreds, so they produce an empty list and a warning, never an error.
//! Only an invalid configuration errors, and it does so before any pixel
//! work starts.

use crate::config::{TileLayout, TilingConfig};
use crate::error::FragmentError;
use crate::model::{BBox, Fragment, Page};
use crate::pipeline::{complexity, normalize};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::{debug, info, warn};

/// Tile a page's content into fragments.
///
/// # Errors
/// Only [`FragmentError::InvalidConfig`]. Undecodable page content yields
/// `Ok(vec![])` with a warning.
pub fn tile_page(page: &Page, config: &TilingConfig) -> Result<Vec<Fragment>, FragmentError> {
    config.validate()?;

    let context = format!("page {}", page.page_number());
    let image = match normalize::decode(page.content(), &context) {
        Ok(image) => image,
        Err(e) => {
            warn!(page = page.page_number(), error = %e, "failed to decode page image");
            return Ok(Vec::new());
        }
    };

    let fragments = tile_image(&image, config)?;
    info!(
        page = page.page_number(),
        count = fragments.len(),
        "created fragments"
    );
    Ok(fragments)
}

/// Tile an already-decoded image.
///
/// Same contract as [`tile_page`], for callers that hold a
/// [`DynamicImage`] rather than encoded bytes.
pub fn tile_image(
    image: &DynamicImage,
    config: &TilingConfig,
) -> Result<Vec<Fragment>, FragmentError> {
    config.validate()?;

    let (width, height) = (image.width(), image.height());
    debug!(width, height, layout = ?config.layout, "tiling image");

    let fragments = match config.layout {
        TileLayout::Grid { columns, rows } => grid_tiles(
            image,
            width,
            height,
            columns,
            rows,
            config.overlap_ratio,
            config.complexity_threshold,
        ),
        TileLayout::FixedSize {
            width: tile_width,
            height: tile_height,
        } => fixed_size_tiles(
            image,
            width,
            height,
            tile_width,
            tile_height,
            config.overlap_ratio,
            config.complexity_threshold,
        ),
    };
    Ok(fragments)
}

/// Equal-count grid tiling.
///
/// Base cell size is `width/columns × height/rows`, kept real-valued so the
/// cells stay equal even when the division is not integral. Overlap expands
/// each cell by `base × overlap_ratio` on every side; x1/y1 round down and
/// x2/y2 round up so the expanded cell never loses a boundary pixel.
fn grid_tiles(
    image: &DynamicImage,
    width: u32,
    height: u32,
    columns: u32,
    rows: u32,
    overlap_ratio: f32,
    complexity_threshold: f32,
) -> Vec<Fragment> {
    let base_width = width as f64 / columns as f64;
    let base_height = height as f64 / rows as f64;
    let overlap_width = base_width * overlap_ratio as f64;
    let overlap_height = base_height * overlap_ratio as f64;

    let mut fragments = Vec::with_capacity(columns as usize * rows as usize);

    for row in 0..rows {
        for col in 0..columns {
            let x1 = (col as f64 * base_width - overlap_width).floor().max(0.0) as u32;
            let y1 = (row as f64 * base_height - overlap_height).floor().max(0.0) as u32;
            let mut x2 =
                ((((col + 1) as f64 * base_width + overlap_width).ceil()) as u32).min(width);
            let mut y2 =
                ((((row + 1) as f64 * base_height + overlap_height).ceil()) as u32).min(height);

            // Rounding must never leave a sliver at the far edges.
            if col == columns - 1 {
                x2 = width;
            }
            if row == rows - 1 {
                y2 = height;
            }

            if x2 <= x1 || y2 <= y1 {
                continue;
            }

            if let Some(fragment) =
                cut_tile(image, x1, y1, x2, y2, complexity_threshold)
            {
                debug!(row, col, x1, y1, x2, y2, "created grid tile");
                fragments.push(fragment);
            }
        }
    }

    fragments
}

/// Fixed-size sweep tiling.
///
/// Tiles at the right and bottom edges are clipped to the image bound. A
/// clipped tile smaller than half the requested size in either axis is a
/// remnant and is skipped — but only while complexity filtering is active
/// (`complexity_threshold > 0`). At threshold 0 the caller asked for full
/// coverage, and the remnants are part of it.
fn fixed_size_tiles(
    image: &DynamicImage,
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    overlap_ratio: f32,
    complexity_threshold: f32,
) -> Vec<Fragment> {
    // Overlap shrinks the step; a step of 0 would never advance the sweep.
    let step_x = ((tile_width as f64 * (1.0 - overlap_ratio as f64)) as u32).max(1);
    let step_y = ((tile_height as f64 * (1.0 - overlap_ratio as f64)) as u32).max(1);

    let mut fragments = Vec::new();

    let mut y = 0u32;
    while y < height {
        let mut x = 0u32;
        while x < width {
            let x2 = x.saturating_add(tile_width).min(width);
            let y2 = y.saturating_add(tile_height).min(height);

            let is_remnant = (x2 - x) < tile_width / 2 || (y2 - y) < tile_height / 2;
            if complexity_threshold > 0.0 && is_remnant {
                x = x.saturating_add(step_x);
                continue;
            }

            if let Some(fragment) = cut_tile(image, x, y, x2, y2, complexity_threshold) {
                debug!(x1 = x, y1 = y, x2, y2, "created fixed-size tile");
                fragments.push(fragment);
            }

            x = x.saturating_add(step_x);
        }
        y = y.saturating_add(step_y);
    }

    fragments
}

/// Extract one candidate region, apply the complexity filter, and encode.
///
/// Returns `None` when the tile is filtered out or fails to encode; an
/// encode failure is logged and costs only this tile, never the page.
fn cut_tile(
    image: &DynamicImage,
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    complexity_threshold: f32,
) -> Option<Fragment> {
    let tile = image.crop_imm(x1, y1, x2 - x1, y2 - y1);

    if complexity_threshold > 0.0 {
        let score = complexity::score(&tile);
        if score < complexity_threshold {
            debug!(x1, y1, score, "skipping low-complexity tile");
            return None;
        }
    }

    match encode_jpeg(&tile) {
        Ok(content) => Some(Fragment::new(content, BBox::new(x1, y1, x2, y2))),
        Err(e) => {
            warn!(x1, y1, error = %e, "failed to encode tile");
            None
        }
    }
}

/// JPEG-encode a tile. The encoder rejects alpha channels, so the tile is
/// flattened to RGB first.
fn encode_jpeg(tile: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let rgb = DynamicImage::ImageRgb8(tile.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn black_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([0, 0, 0])))
    }

    fn config(layout: TileLayout, overlap: f32, threshold: f32) -> TilingConfig {
        TilingConfig {
            layout,
            overlap_ratio: overlap,
            complexity_threshold: threshold,
        }
    }

    #[test]
    fn grid_produces_exact_count() {
        let img = black_image(300, 200);
        let cfg = config(TileLayout::Grid { columns: 3, rows: 2 }, 0.1, 0.0);
        let frags = tile_image(&img, &cfg).unwrap();
        assert_eq!(frags.len(), 6);
    }

    #[test]
    fn grid_order_is_row_major() {
        let img = black_image(200, 200);
        let cfg = config(TileLayout::Grid { columns: 2, rows: 2 }, 0.0, 0.0);
        let frags = tile_image(&img, &cfg).unwrap();
        let boxes: Vec<_> = frags.iter().map(|f| f.bbox()).collect();
        assert_eq!(boxes[0], BBox::new(0, 0, 100, 100));
        assert_eq!(boxes[1], BBox::new(100, 0, 200, 100));
        assert_eq!(boxes[2], BBox::new(0, 100, 100, 200));
        assert_eq!(boxes[3], BBox::new(100, 100, 200, 200));
    }

    #[test]
    fn grid_last_row_and_column_reach_edges() {
        // 7 does not divide 100; the forced edge keeps coverage exact.
        let img = black_image(100, 100);
        let cfg = config(TileLayout::Grid { columns: 7, rows: 3 }, 0.05, 0.0);
        let frags = tile_image(&img, &cfg).unwrap();
        assert_eq!(frags.len(), 21);
        assert_eq!(frags.iter().map(|f| f.bbox().x2).max(), Some(100));
        assert_eq!(frags.iter().map(|f| f.bbox().y2).max(), Some(100));
    }

    #[test]
    fn grid_overlap_expands_interior_tiles() {
        let img = black_image(400, 400);
        let plain = tile_image(
            &img,
            &config(TileLayout::Grid { columns: 2, rows: 2 }, 0.0, 0.0),
        )
        .unwrap();
        let overlapped = tile_image(
            &img,
            &config(TileLayout::Grid { columns: 2, rows: 2 }, 0.1, 0.0),
        )
        .unwrap();
        // Same tile count, each overlap-expanded tile at least as large.
        assert_eq!(plain.len(), overlapped.len());
        for (a, b) in plain.iter().zip(&overlapped) {
            assert!(b.bbox().width() >= a.bbox().width());
            assert!(b.bbox().height() >= a.bbox().height());
        }
        // Interior edge of the first tile moved outward.
        assert!(overlapped[0].bbox().x2 > plain[0].bbox().x2);
    }

    #[test]
    fn fixed_size_clips_edge_tiles() {
        let img = black_image(130, 130);
        let cfg = config(
            TileLayout::FixedSize {
                width: 100,
                height: 100,
            },
            0.0,
            0.0,
        );
        let frags = tile_image(&img, &cfg).unwrap();
        assert_eq!(frags.len(), 4);
        let last = frags.last().unwrap().bbox();
        assert_eq!(last, BBox::new(100, 100, 130, 130));
    }

    #[test]
    fn fixed_size_remnant_skip_requires_active_threshold() {
        // 120 px wide, 100 px tiles: the second column is a 20 px remnant,
        // below the 50 px half-size cut.
        let img = black_image(120, 100);
        let layout = TileLayout::FixedSize {
            width: 100,
            height: 100,
        };
        let with_filter = tile_image(&img, &config(layout, 0.0, 0.03)).unwrap();
        let full_coverage = tile_image(&img, &config(layout, 0.0, 0.0)).unwrap();
        assert_eq!(with_filter.len(), 1);
        assert_eq!(full_coverage.len(), 2);
        assert_eq!(full_coverage[1].bbox(), BBox::new(100, 0, 120, 100));
    }

    #[test]
    fn fixed_size_tile_larger_than_image_keeps_one_tile() {
        let img = black_image(50, 50);
        let cfg = config(
            TileLayout::FixedSize {
                width: 100,
                height: 100,
            },
            0.0,
            0.03,
        );
        let frags = tile_image(&img, &cfg).unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].bbox(), BBox::new(0, 0, 50, 50));
    }

    #[test]
    fn tiny_tile_with_large_overlap_still_advances() {
        // step would truncate to 0 without the clamp; the sweep must end.
        let img = black_image(8, 8);
        let cfg = config(TileLayout::FixedSize { width: 1, height: 1 }, 0.9, 0.0);
        let frags = tile_image(&img, &cfg).unwrap();
        assert_eq!(frags.len(), 64);
    }

    #[test]
    fn invalid_config_fails_fast() {
        let img = black_image(10, 10);
        let cfg = config(TileLayout::Grid { columns: 0, rows: 1 }, 0.0, 0.0);
        assert!(matches!(
            tile_image(&img, &cfg),
            Err(FragmentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn undecodable_page_yields_empty_list() {
        let page = Page::new(1, b"not an image".to_vec());
        let frags = tile_page(&page, &TilingConfig::default()).unwrap();
        assert!(frags.is_empty());
    }

    #[test]
    fn fragments_decode_to_their_bbox_size() {
        let img = black_image(150, 150);
        let cfg = config(TileLayout::FixedSize { width: 50, height: 50 }, 0.0, 0.0);
        for frag in tile_image(&img, &cfg).unwrap() {
            let decoded = image::load_from_memory(frag.content()).unwrap();
            assert_eq!(decoded.width(), frag.bbox().width());
            assert_eq!(decoded.height(), frag.bbox().height());
        }
    }

    #[test]
    fn rgba_input_encodes_without_error() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            60,
            60,
            image::Rgba([0, 0, 0, 255]),
        ));
        let cfg = config(TileLayout::Grid { columns: 2, rows: 2 }, 0.0, 0.0);
        let frags = tile_image(&img, &cfg).unwrap();
        assert_eq!(frags.len(), 4);
    }
}
