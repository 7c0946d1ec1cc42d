//! Debug overlay: fragment boxes drawn back onto the page image.
//!
//! A QA aid with no effect on the fragment data. Each bbox is outlined in a
//! colour cycled from a fixed 8-entry palette (`index % 8`), with a filled
//! label box carrying the 1-based fragment index so a reviewer can match a
//! tile on screen to an entry in the manifest. Because overlapping tiles
//! share edges, the palette cycling is what keeps adjacent outlines
//! distinguishable.
//!
//! Unlike the tiler, this path propagates errors: a caller explicitly asked
//! for this one artifact, so a decode or encode failure is theirs to see.

use crate::error::FragmentError;
use crate::model::Fragment;
use crate::pipeline::normalize;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use std::io::Cursor;
use tracing::debug;

/// Fixed outline palette, cycled by fragment index.
const PALETTE: [Rgb<u8>; 8] = [
    Rgb([220, 40, 40]),   // red
    Rgb([40, 160, 40]),   // green
    Rgb([40, 70, 220]),   // blue
    Rgb([230, 150, 0]),   // orange
    Rgb([150, 40, 200]),  // purple
    Rgb([0, 180, 180]),   // teal
    Rgb([220, 40, 180]),  // magenta
    Rgb([130, 90, 30]),   // brown
];

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Pixel scale applied to the 5×7 digit glyphs.
const GLYPH_SCALE: u32 = 2;
/// Padding inside the label box, in pixels.
const LABEL_PAD: u32 = 3;

/// Render the fragment-box overlay for a page.
///
/// `content` is the page's encoded image; `line_thickness` is the outline
/// width in pixels (values below 1 are treated as 1). Returns JPEG bytes.
pub fn render_overlay(
    content: &[u8],
    fragments: &[Fragment],
    line_thickness: u32,
) -> Result<Vec<u8>, FragmentError> {
    let image = normalize::decode(content, "visualization overlay")?;
    let mut canvas: RgbImage = image.to_rgb8();
    let thickness = line_thickness.max(1);

    for (i, fragment) in fragments.iter().enumerate() {
        let bbox = fragment.bbox();
        let color = PALETTE[i % PALETTE.len()];

        draw_box_outline(
            &mut canvas,
            bbox.x1,
            bbox.y1,
            bbox.width(),
            bbox.height(),
            thickness,
            color,
        );
        draw_index_label(&mut canvas, bbox.x1, bbox.y1, i + 1, color);
    }
    debug!(count = fragments.len(), "rendered fragment overlay");

    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| FragmentError::encode("visualization overlay", e))?;
    Ok(buf)
}

/// Hollow rectangle with line thickness, drawn as nested 1px outlines.
fn draw_box_outline(
    canvas: &mut RgbImage,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    thickness: u32,
    color: Rgb<u8>,
) {
    for inset in 0..thickness {
        if width <= 2 * inset || height <= 2 * inset {
            break;
        }
        let rect = Rect::at((x + inset) as i32, (y + inset) as i32)
            .of_size(width - 2 * inset, height - 2 * inset);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

/// Filled label box with the fragment index in white, anchored at the bbox
/// top-left corner.
fn draw_index_label(canvas: &mut RgbImage, x: u32, y: u32, index: usize, color: Rgb<u8>) {
    let text = index.to_string();
    let advance = 6 * GLYPH_SCALE; // 5px glyph + 1px spacing
    let label_width = text.len() as u32 * advance - GLYPH_SCALE + 2 * LABEL_PAD;
    let label_height = 7 * GLYPH_SCALE + 2 * LABEL_PAD;

    draw_filled_rect_mut(
        canvas,
        Rect::at(x as i32, y as i32).of_size(label_width, label_height),
        color,
    );

    let mut pen_x = x + LABEL_PAD;
    let pen_y = y + LABEL_PAD;
    for ch in text.chars() {
        if let Some(digit) = ch.to_digit(10) {
            draw_glyph(canvas, pen_x, pen_y, digit as usize, WHITE);
        }
        pen_x += advance;
    }
}

/// 5×7 raster glyphs for the decimal digits, one row per byte, bit 4 = left
/// column.
const DIGIT_GLYPHS: [[u8; 7]; 10] = [
    [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110], // 0
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110], // 1
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111], // 2
    [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110], // 3
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010], // 4
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110], // 5
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110], // 6
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000], // 7
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110], // 8
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100], // 9
];

fn draw_glyph(canvas: &mut RgbImage, x: u32, y: u32, digit: usize, color: Rgb<u8>) {
    let rows = &DIGIT_GLYPHS[digit];
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..5u32 {
            if bits & (1 << (4 - col)) == 0 {
                continue;
            }
            for dy in 0..GLYPH_SCALE {
                for dx in 0..GLYPH_SCALE {
                    let px = x + col * GLYPH_SCALE + dx;
                    let py = y + row as u32 * GLYPH_SCALE + dy;
                    if px < canvas.width() && py < canvas.height() {
                        canvas.put_pixel(px, py, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn white_page_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([255, 255, 255]),
        ));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn fragment(x1: u32, y1: u32, x2: u32, y2: u32) -> Fragment {
        Fragment::new(Vec::new(), BBox::new(x1, y1, x2, y2))
    }

    #[test]
    fn overlay_preserves_page_dimensions() {
        let page = white_page_png(200, 150);
        let frags = vec![fragment(0, 0, 100, 150), fragment(100, 0, 200, 150)];
        let overlay = render_overlay(&page, &frags, 2).unwrap();
        let decoded = image::load_from_memory(&overlay).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 150));
    }

    #[test]
    fn overlay_draws_outline_pixels() {
        let page = white_page_png(100, 100);
        let frags = vec![fragment(10, 10, 90, 90)];
        let overlay = render_overlay(&page, &frags, 1).unwrap();
        let decoded = image::load_from_memory(&overlay).unwrap().to_rgb8();
        // A pixel on the bbox edge, away from the label, is no longer white.
        let p = decoded.get_pixel(60, 10);
        assert!(
            p[0] < 250 || p[1] < 250 || p[2] < 250,
            "expected outline ink at (60, 10), got {p:?}"
        );
    }

    #[test]
    fn overlay_without_fragments_is_just_the_page() {
        let page = white_page_png(50, 50);
        let overlay = render_overlay(&page, &[], 2).unwrap();
        let decoded = image::load_from_memory(&overlay).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (50, 50));
    }

    #[test]
    fn undecodable_page_is_a_decode_error() {
        let err = render_overlay(b"not an image", &[], 2);
        assert!(matches!(err, Err(FragmentError::Decode { .. })));
    }

    #[test]
    fn zero_thickness_is_clamped() {
        let page = white_page_png(60, 60);
        let frags = vec![fragment(0, 0, 60, 60)];
        assert!(render_overlay(&page, &frags, 0).is_ok());
    }

    #[test]
    fn label_box_clips_at_image_edge() {
        // Fragment whose label would spill past the right edge.
        let page = white_page_png(40, 40);
        let frags = vec![fragment(30, 30, 40, 40)];
        assert!(render_overlay(&page, &frags, 1).is_ok());
    }
}
