//! Pagination – assigns blocks to pages in a single linear pass.
//!
//! Handles:
//! - Fixed page bands (page-1 header band, footer band on every page)
//! - Atomic blocks (a block never straddles a page boundary)
//! - Orphan avoidance for section headers (one-block lookahead)
//! - Blocks taller than an empty page (cut to fit, with a warning)

use crate::blocks::{Block, BLOCK_SPACING_PT};
use crate::fonts::FontManager;
use crate::layout_config::{DocumentLayout, PageGeometry, PageLayout, PlacedBlock};

/// Where a block landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page_index: usize,
    pub y: f32,
}

/// Mutable pagination state: the pages created so far and the vertical
/// cursor on the last one.
#[derive(Debug, Clone)]
pub struct PaginationState {
    pub pages: Vec<PageLayout>,
    pub cursor_y: f32,
}

impl PaginationState {
    fn new(geometry: &PageGeometry) -> Self {
        Self {
            pages: vec![empty_page(0, geometry)],
            cursor_y: geometry.band_top(0),
        }
    }

    fn current_index(&self) -> usize {
        self.pages.len() - 1
    }

    fn current_is_empty(&self) -> bool {
        self.pages.last().map(|p| p.blocks.is_empty()).unwrap_or(true)
    }

    fn last_is_section_header(&self) -> bool {
        self.pages
            .last()
            .and_then(|p| p.blocks.last())
            .map(|b| b.block.is_section_header())
            .unwrap_or(false)
    }
}

fn empty_page(page_index: usize, geometry: &PageGeometry) -> PageLayout {
    PageLayout {
        page_index,
        blocks: Vec::new(),
        cursor_y: geometry.band_top(page_index),
        chrome: None,
    }
}

/// Owns the pagination state for one document build.
pub struct PageCursor<'a> {
    geometry: PageGeometry,
    fonts: &'a FontManager,
    state: PaginationState,
}

impl<'a> PageCursor<'a> {
    pub fn new(geometry: PageGeometry, fonts: &'a FontManager) -> Self {
        Self {
            state: PaginationState::new(&geometry),
            geometry,
            fonts,
        }
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Place `block`, opening a new page if it does not fit below the cursor.
    ///
    /// `next` is the block that will follow; a section header only stays on
    /// the current page if `next` fits there too. A header followed by a
    /// block taller than an empty page moves to a fresh page, and that block
    /// is then cut in place below it.
    pub fn place(&mut self, block: &Block, next: Option<&Block>) -> Placement {
        let width = self.geometry.content_width();
        let mut layout = block.layout(width, self.fonts);
        let fresh_band = self.geometry.band_height(self.state.current_index() + 1);

        let mut required = layout.height;
        if block.is_section_header() {
            if let Some(next) = next {
                // A block taller than an empty page needs at most that page.
                let next_height = next.measure(width, self.fonts).min(fresh_band);
                required += BLOCK_SPACING_PT + next_height;
            }
        }

        let band_bottom = self.geometry.band_bottom();
        let keeps_header = self.state.last_is_section_header() && layout.height > fresh_band;
        if self.state.cursor_y + required > band_bottom
            && !self.state.current_is_empty()
            && !keeps_header
        {
            self.new_page();
        }

        let available = band_bottom - self.state.cursor_y;
        let truncated = block.truncate_layout(&mut layout, available, width, self.fonts);
        if truncated {
            log::warn!(
                "{} block taller than a page; cut to {} line(s)",
                block.kind_name(),
                layout.lines.len()
            );
        } else if layout.height > available {
            log::warn!(
                "{} block ({:.1}pt) exceeds the content band ({:.1}pt)",
                block.kind_name(),
                layout.height,
                available
            );
        }

        let page_index = self.state.current_index();
        let y = self.state.cursor_y;
        log::debug!(
            "Placing {} on page {} at y={:.1} (h={:.1})",
            block.kind_name(),
            page_index + 1,
            y,
            layout.height
        );

        let placed = PlacedBlock {
            x: self.geometry.margin,
            y,
            width,
            height: layout.height,
            block: block.clone(),
            lines: layout.lines,
            line_height: layout.line_height,
            truncated,
        };

        self.state.cursor_y += placed.height + BLOCK_SPACING_PT;
        if let Some(page) = self.state.pages.last_mut() {
            page.blocks.push(placed);
            page.cursor_y = self.state.cursor_y;
        }

        Placement { page_index, y }
    }

    fn new_page(&mut self) {
        let index = self.state.pages.len();
        log::debug!("Starting page {}", index + 1);
        self.state.pages.push(empty_page(index, &self.geometry));
        self.state.cursor_y = self.geometry.band_top(index);
    }

    /// Finish the pass and hand over the footer-less pages.
    pub fn finish(self, title: &str) -> DocumentLayout {
        DocumentLayout {
            title: title.to_string(),
            geometry: self.geometry,
            pages: self.state.pages,
        }
    }
}

/// Place every block in order and return the resulting pages.
pub fn paginate(
    blocks: &[Block],
    title: &str,
    geometry: PageGeometry,
    fonts: &FontManager,
) -> DocumentLayout {
    let mut cursor = PageCursor::new(geometry, fonts);
    for (i, block) in blocks.iter().enumerate() {
        cursor.place(block, blocks.get(i + 1));
    }
    cursor.finish(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::SECTION_HEADER_HEIGHT;

    fn ingredient(text: &str) -> Block {
        Block::IngredientLine {
            text: text.to_string(),
        }
    }

    fn header(heading: &str) -> Block {
        Block::SectionHeader {
            heading: heading.to_string(),
        }
    }

    #[test]
    fn single_page() {
        let fonts = FontManager::default();
        let blocks = vec![header("Ingredients"), ingredient("salt")];
        let layout = paginate(&blocks, "t", PageGeometry::a4(), &fonts);
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.pages[0].blocks.len(), 2);
    }

    #[test]
    fn first_block_starts_below_header_band() {
        let fonts = FontManager::default();
        let geometry = PageGeometry::a4();
        let mut cursor = PageCursor::new(geometry, &fonts);
        let placement = cursor.place(&ingredient("salt"), None);
        assert_eq!(placement.page_index, 0);
        assert!((placement.y - geometry.band_top(0)).abs() < 0.01);
    }

    #[test]
    fn multiple_pages() {
        let fonts = FontManager::default();
        let blocks: Vec<Block> = (0..120)
            .map(|i| ingredient(&format!("Ingredient number {i}")))
            .collect();
        let geometry = PageGeometry::a4();
        let layout = paginate(&blocks, "t", geometry, &fonts);
        assert!(layout.page_count() > 1, "got {}", layout.page_count());

        for page in &layout.pages {
            for placed in &page.blocks {
                assert!(placed.y >= geometry.band_top(page.page_index) - 0.01);
                assert!(placed.bottom() <= geometry.band_bottom() + 0.01);
            }
        }
        let total: usize = layout.pages.iter().map(|p| p.blocks.len()).sum();
        assert_eq!(total, 120);
    }

    #[test]
    fn later_pages_start_at_top_margin() {
        let fonts = FontManager::default();
        let blocks: Vec<Block> = (0..120).map(|_| ingredient("butter")).collect();
        let geometry = PageGeometry::a4();
        let layout = paginate(&blocks, "t", geometry, &fonts);
        let second = &layout.pages[1];
        assert!((second.blocks[0].y - geometry.margin).abs() < 0.01);
    }

    /// Geometry whose first page has room for one ingredient line plus a
    /// section header, but not for the header and a following step.
    fn tight_geometry(fonts: &FontManager) -> PageGeometry {
        let mut geometry = PageGeometry {
            width: 595.28,
            height: 0.0,
            margin: 40.0,
            header_band: 0.0,
            footer_band: 28.0,
        };
        let line = ingredient("salt").measure(geometry.content_width(), fonts);
        let band = line + BLOCK_SPACING_PT + SECTION_HEADER_HEIGHT + 12.0;
        geometry.height = band + 2.0 * geometry.margin + geometry.footer_band;
        geometry
    }

    #[test]
    fn header_is_not_orphaned() {
        let fonts = FontManager::default();
        let geometry = tight_geometry(&fonts);
        let step = Block::InstructionStep {
            number: 1,
            text: "Stir the pot gently".to_string(),
        };

        let mut cursor = PageCursor::new(geometry, &fonts);
        cursor.place(&ingredient("salt"), None);
        let heading = cursor.place(&header("Instructions"), Some(&step));
        assert_eq!(heading.page_index, 1);
        assert!((heading.y - geometry.margin).abs() < 0.01);

        let placed_step = cursor.place(&step, None);
        assert_eq!(placed_step.page_index, 1);
    }

    #[test]
    fn trailing_header_only_needs_its_own_height() {
        let fonts = FontManager::default();
        let geometry = tight_geometry(&fonts);
        let mut cursor = PageCursor::new(geometry, &fonts);
        cursor.place(&ingredient("salt"), None);
        let heading = cursor.place(&header("Instructions"), None);
        assert_eq!(heading.page_index, 0);
    }

    #[test]
    fn oversized_block_is_cut_to_fit() {
        let fonts = FontManager::default();
        let geometry = PageGeometry::a4();
        let huge = ingredient(&"tomato ".repeat(3000));
        let layout = paginate(&[ingredient("salt"), huge], "t", geometry, &fonts);
        assert_eq!(layout.page_count(), 2);
        let cut = &layout.pages[1].blocks[0];
        assert!(cut.truncated);
        assert!(cut.bottom() <= geometry.band_bottom() + 0.01);
    }

    #[test]
    fn oversized_block_after_header_keeps_them_together() {
        let fonts = FontManager::default();
        let geometry = PageGeometry::a4();
        let blocks = vec![
            Block::Title {
                text: "Stew".to_string(),
            },
            header("Ingredients"),
            ingredient(&"beef carrots onion ".repeat(400)),
            header("Instructions"),
        ];
        let layout = paginate(&blocks, "Stew", geometry, &fonts);

        let kinds: Vec<Vec<&str>> = layout
            .pages
            .iter()
            .map(|p| p.blocks.iter().map(|b| b.block.kind_name()).collect())
            .collect();
        assert_eq!(
            kinds,
            vec![
                vec!["title"],
                vec!["section_header", "ingredient_line"],
                vec!["section_header"],
            ]
        );
        let cut = &layout.pages[1].blocks[1];
        assert!(cut.truncated);
        assert!(cut.lines.last().unwrap().ends_with("..."));
        assert!(cut.bottom() <= geometry.band_bottom() + 0.01);
    }

    #[test]
    fn header_leading_an_empty_page_keeps_oversized_block() {
        let fonts = FontManager::default();
        let geometry = PageGeometry::a4();
        let huge = ingredient(&"tomato ".repeat(3000));

        let mut cursor = PageCursor::new(geometry, &fonts);
        let heading = cursor.place(&header("Ingredients"), Some(&huge));
        let placed = cursor.place(&huge, None);
        assert_eq!(heading.page_index, 0);
        assert_eq!(placed.page_index, 0);

        let cut = &cursor.state().pages[0].blocks[1];
        assert!(cut.truncated);
        assert!(cut.bottom() <= geometry.band_bottom() + 0.01);
    }

    #[test]
    fn longer_step_never_needs_fewer_pages() {
        let fonts = FontManager::default();
        let geometry = PageGeometry::a4();
        let mut last = 0;
        for n in [10, 100, 300, 1000, 3000] {
            let blocks = vec![
                ingredient("salt"),
                header("Instructions"),
                Block::InstructionStep {
                    number: 1,
                    text: "stir the pot ".repeat(n),
                },
            ];
            let pages = paginate(&blocks, "t", geometry, &fonts).page_count();
            assert!(pages >= last, "{n} repeats gave {pages} pages, fewer than {last}");
            last = pages;
        }
        assert_eq!(last, 2);
    }

    #[test]
    fn no_blocks_still_one_page() {
        let fonts = FontManager::default();
        let layout = paginate(&[], "t", PageGeometry::a4(), &fonts);
        assert_eq!(layout.page_count(), 1);
        assert!(layout.pages[0].blocks.is_empty());
    }
}
