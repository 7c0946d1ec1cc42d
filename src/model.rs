//! Page, fragment, and document model.
//!
//! A [`Document`] is an ordered sequence of [`Page`]s; a page owns one
//! immutable encoded-image buffer (its rendered content) and the list of
//! [`Fragment`]s the tiler derived from it. Pages and fragments are the unit
//! of exchange with downstream consumers: each fragment becomes one
//! vision-model input, traceable back onto the page through its [`BBox`].

use crate::config::{TilingConfig, TilingOverrides};
use crate::error::FragmentError;
use crate::pipeline::{tiler, visualize};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ── Bounding box ─────────────────────────────────────────────────────────

/// Axis-aligned pixel rectangle on the normalized page image.
///
/// Invariant: `x1 < x2` and `y1 < y2`, both within the page dimensions.
/// Serialises as the four-element array `[x1, y1, x2, y2]`, the form
/// downstream consumers read out of the fragment manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[u32; 4]", try_from = "[u32; 4]")]
pub struct BBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BBox {
    /// Construct a bbox from its corner coordinates.
    ///
    /// # Panics
    /// Panics when the corners are not strictly ordered. The tiler only
    /// produces ordered corners; hitting this is a bug, not bad input.
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        assert!(x1 < x2 && y1 < y2, "degenerate bbox [{x1}, {y1}, {x2}, {y2}]");
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

impl From<BBox> for [u32; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl TryFrom<[u32; 4]> for BBox {
    type Error = String;

    fn try_from(v: [u32; 4]) -> Result<Self, Self::Error> {
        let [x1, y1, x2, y2] = v;
        if x1 >= x2 || y1 >= y2 {
            return Err(format!("degenerate bbox [{x1}, {y1}, {x2}, {y2}]"));
        }
        Ok(Self { x1, y1, x2, y2 })
    }
}

// ── Fragment ─────────────────────────────────────────────────────────────

/// One tile cut from a page: encoded JPEG bytes plus its position.
///
/// Immutable once created; owns an independent copy of its bytes (no tile
/// aliases another tile's buffer, even where their bboxes overlap) and
/// carries no back-reference to the page.
#[derive(Debug, Clone)]
pub struct Fragment {
    content: Vec<u8>,
    bbox: BBox,
}

impl Fragment {
    pub fn new(content: Vec<u8>, bbox: BBox) -> Self {
        Self { content, bbox }
    }

    /// The fragment's encoded JPEG bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// Consume the fragment, returning its encoded bytes.
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// Wrap the content as a `data:image/jpeg;base64,…` URI.
    ///
    /// Vision APIs accept images as base64 data URIs embedded in the request
    /// body; this is the hand-off format for the LLM collaborator.
    pub fn to_data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.content))
    }
}

/// Manifest entry tracing one emitted fragment file back to its bbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentRecord {
    /// 1-based fragment index in tiling order.
    pub index: usize,
    /// File name of the emitted tile, relative to the manifest.
    pub file: String,
    pub bbox: BBox,
}

// ── Metadata ─────────────────────────────────────────────────────────────

/// Free-form per-page metadata. No fixed schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMetadata {
    entries: BTreeMap<String, String>,
}

/// Free-form document-level metadata. No fixed schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    entries: BTreeMap<String, String>,
}

macro_rules! metadata_accessors {
    ($ty:ty) => {
        impl $ty {
            pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
                self.entries.insert(key.into(), value.into());
            }

            pub fn get(&self, key: &str) -> Option<&str> {
                self.entries.get(key).map(String::as_str)
            }

            pub fn is_empty(&self) -> bool {
                self.entries.is_empty()
            }
        }
    };
}

metadata_accessors!(PageMetadata);
metadata_accessors!(DocumentMetadata);

// ── Page ─────────────────────────────────────────────────────────────────

/// One logical page of a document.
///
/// Owns the page's rendered content (an encoded-image byte buffer produced
/// upstream by a page source such as a PDF renderer or the raster-image
/// loader) and the fragments derived from it. The fragment list is empty
/// until [`Page::fragment`] runs; its order is the tiler's row-major
/// iteration order, which the visualization numbering relies on.
#[derive(Debug, Clone)]
pub struct Page {
    page_number: u32,
    content: Vec<u8>,
    fragments: Vec<Fragment>,
    pub metadata: PageMetadata,
}

impl Page {
    /// Create a page. `page_number` is 1-based within the document.
    pub fn new(page_number: u32, content: Vec<u8>) -> Self {
        debug_assert!(page_number >= 1, "page numbers are 1-based");
        Self {
            page_number,
            content,
            fragments: Vec::new(),
            metadata: PageMetadata::default(),
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// The page's raw encoded-image bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Fragments from the most recent [`Page::fragment`] call, in tiling
    /// order. Empty before the first call.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Tile this page, storing and returning the resulting fragments.
    ///
    /// Re-running replaces the previous fragment list, it never appends, so
    /// the stored list always reflects exactly one configuration.
    ///
    /// # Errors
    /// Only for an invalid `config`. Undecodable page content is not an
    /// error here: it yields an empty fragment list with a warning, so a
    /// batch over many pages survives one corrupt page.
    pub fn fragment(&mut self, config: &TilingConfig) -> Result<&[Fragment], FragmentError> {
        self.fragments = tiler::tile_page(self, config)?;
        Ok(&self.fragments)
    }

    /// [`Page::fragment`] with per-call overrides resolved over `base`.
    pub fn fragment_with(
        &mut self,
        base: &TilingConfig,
        overrides: TilingOverrides,
    ) -> Result<&[Fragment], FragmentError> {
        let config = overrides.resolve(base);
        self.fragment(&config)
    }

    /// Render a debug overlay of the stored fragment boxes onto this page.
    ///
    /// Each bbox is drawn in a palette colour chosen by `index % 8`, with a
    /// filled label box carrying the 1-based fragment index. Returns the
    /// encoded overlay image; the fragment data itself is untouched.
    ///
    /// # Errors
    /// [`FragmentError::Decode`] when the page content cannot be decoded,
    /// [`FragmentError::Encode`] when the final overlay encode fails.
    pub fn visualize_fragments(&self, line_thickness: u32) -> Result<Vec<u8>, FragmentError> {
        visualize::render_overlay(&self.content, &self.fragments, line_thickness)
    }
}

// ── Document ─────────────────────────────────────────────────────────────

/// An ordered sequence of pages plus document-level metadata.
///
/// The page sequence is fixed at construction; only each page's derived
/// state (fragments, metadata) changes afterwards.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    pages: Vec<Page>,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(path: PathBuf, pages: Vec<Page>) -> Self {
        Self {
            path,
            pages,
            metadata: DocumentMetadata::default(),
        }
    }

    /// Source path this document was created from.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Mutable access to the pages, for fragmenting them in place. The
    /// sequence itself (count and order) stays fixed.
    pub fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_dimensions() {
        let b = BBox::new(10, 20, 110, 70);
        assert_eq!(b.width(), 100);
        assert_eq!(b.height(), 50);
    }

    #[test]
    #[should_panic(expected = "degenerate bbox")]
    fn bbox_rejects_reversed_corners() {
        BBox::new(50, 0, 10, 10);
    }

    #[test]
    fn bbox_serializes_as_array() {
        let b = BBox::new(1, 2, 3, 4);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "[1,2,3,4]");
        let back: BBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn bbox_deserialize_rejects_degenerate() {
        let err = serde_json::from_str::<BBox>("[3,2,3,4]");
        assert!(err.is_err());
    }

    #[test]
    fn fragment_data_uri_prefix() {
        let frag = Fragment::new(vec![0xFF, 0xD8, 0xFF], BBox::new(0, 0, 1, 1));
        let uri = frag.to_data_uri();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        let b64 = &uri["data:image/jpeg;base64,".len()..];
        assert_eq!(STANDARD.decode(b64).unwrap(), vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn new_page_has_no_fragments() {
        let page = Page::new(1, vec![1, 2, 3]);
        assert!(page.fragments().is_empty());
        assert_eq!(page.page_number(), 1);
        assert!(page.metadata.is_empty());
    }

    #[test]
    fn document_holds_page_sequence() {
        let doc = Document::new(
            PathBuf::from("drawing.png"),
            vec![Page::new(1, vec![]), Page::new(2, vec![])],
        );
        assert_eq!(doc.pages().len(), 2);
        assert_eq!(doc.pages()[1].page_number(), 2);
    }

    #[test]
    fn metadata_round_trip() {
        let mut meta = DocumentMetadata::default();
        meta.insert("source", "scanner-7");
        assert_eq!(meta.get("source"), Some("scanner-7"));
        assert_eq!(meta.get("missing"), None);
    }
}
