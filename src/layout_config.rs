//! Layout model – the intermediate representation between pagination and
//! PDF rendering. This is the "frozen" structure that encodes exactly what
//! goes on each page, including the chrome stamped after pagination.

use serde::{Deserialize, Serialize};

use crate::blocks::Block;
use crate::error::ForgeError;

/// Fixed page geometry, in PDF points (1 pt = 1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// Band reserved at the top of the first page for the header chrome.
    pub header_band: f32,
    /// Band reserved at the bottom of every page for the footer chrome.
    pub footer_band: f32,
}

impl PageGeometry {
    /// A4 portrait: 210mm × 297mm = 595.28 × 841.89 points.
    pub fn a4() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: 40.0,
            header_band: 56.0,
            footer_band: 28.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// First y at which content may be placed on page `page_index`.
    pub fn band_top(&self, page_index: usize) -> f32 {
        if page_index == 0 {
            self.margin + self.header_band
        } else {
            self.margin
        }
    }

    /// Content may not extend below this y.
    pub fn band_bottom(&self) -> f32 {
        self.height - self.margin - self.footer_band
    }

    /// Height of the content band of page `page_index`.
    pub fn band_height(&self, page_index: usize) -> f32 {
        self.band_bottom() - self.band_top(page_index)
    }

    /// Reject geometries that leave no room for content.
    pub fn validate(&self) -> Result<(), ForgeError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ForgeError::Geometry(format!(
                "page size {}x{} must be positive",
                self.width, self.height
            )));
        }
        if self.margin < 0.0 || self.header_band < 0.0 || self.footer_band < 0.0 {
            return Err(ForgeError::Geometry(
                "margin and bands must not be negative".to_string(),
            ));
        }
        if self.content_width() <= 0.0 {
            return Err(ForgeError::Geometry(format!(
                "margin {} leaves no content width",
                self.margin
            )));
        }
        if self.band_height(0) <= 0.0 {
            return Err(ForgeError::Geometry(
                "margins and bands leave no content height".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLayout {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    pub geometry: PageGeometry,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub blocks: Vec<PlacedBlock>,
    /// Where the next block would have started.
    pub cursor_y: f32,
    /// Header/footer decoration; `None` until the chrome pass runs.
    #[serde(default)]
    pub chrome: Option<PageChrome>,
}

/// A block with its page-local rectangle (origin = top-left of the page).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedBlock {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub block: Block,
    /// Pre-wrapped text lines (empty for blocks without running text).
    pub lines: Vec<String>,
    pub line_height: f32,
    /// Set when the block had to be cut to fit an empty page.
    #[serde(default)]
    pub truncated: bool,
}

impl PlacedBlock {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageChrome {
    /// Only the first page carries a header.
    pub header: Option<HeaderChrome>,
    pub footer: FooterChrome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderChrome {
    pub title: String,
    /// Human-readable generation time, e.g. "Generated 2024-05-01 18:30".
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterChrome {
    pub label: String,
    /// 1-based.
    pub page_number: usize,
    pub page_count: usize,
}

impl FooterChrome {
    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.page_number, self.page_count)
    }
}

/// A decoded raster, carried as a base64 data URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    pub src: String,
    pub px_width: u32,
    pub px_height: u32,
}

impl DocumentLayout {
    /// Empty A4 layout.
    pub fn a4(title: &str) -> Self {
        Self {
            title: title.to_string(),
            geometry: PageGeometry::a4(),
            pages: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All placed blocks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &PlacedBlock> {
        self.pages.iter().flat_map(|p| p.blocks.iter())
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
