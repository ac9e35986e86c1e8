//! Block model – the atomic visual units of a recipe document.
//!
//! A block is never split across pages. Text inside a block wraps to the
//! block's width; the block's height follows from the number of lines.

use serde::{Deserialize, Serialize};

use crate::fonts::{ellipsize, wrap_text, FontManager, TextStyle};
use crate::layout_config::ImageContent;
use crate::recipe::Badge;

/// Vertical gap after every block.
pub const BLOCK_SPACING_PT: f32 = 8.0;

pub const TITLE_FONT_SIZE: f32 = 22.0;
pub const TITLE_PADDING: f32 = 6.0;

pub const SECTION_HEADER_HEIGHT: f32 = 28.0;
pub const SECTION_FONT_SIZE: f32 = 14.0;

pub const BADGE_HEIGHT: f32 = 22.0;
pub const BADGE_WIDTH: f32 = 160.0;
pub const BADGE_GAP: f32 = 10.0;
pub const BADGE_FONT_SIZE: f32 = 9.0;

/// Image box height as a fraction of its width.
pub const IMAGE_ASPECT: f32 = 0.5;

pub const BODY_FONT_SIZE: f32 = 11.0;
/// Extra space below the last line of an ingredient or step.
pub const LINE_SPACING: f32 = 4.0;
pub const INGREDIENT_INDENT: f32 = 18.0;
pub const STEP_INDENT: f32 = 30.0;
pub const STEP_MARKER_RADIUS: f32 = 9.0;

pub const INGREDIENTS_HEADING: &str = "Ingredients";
pub const INSTRUCTIONS_HEADING: &str = "Instructions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Title { text: String },
    /// Metadata pills laid out left to right.
    Badges { badges: Vec<Badge> },
    Image { image: ImageContent },
    SectionHeader { heading: String },
    IngredientLine { text: String },
    /// `number` is the 1-based position among the normalized steps.
    InstructionStep { number: usize, text: String },
}

/// Measured shape of a block at a given width.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockLayout {
    pub lines: Vec<String>,
    pub line_height: f32,
    pub height: f32,
}

impl Block {
    /// Height of the block when given `width` points of content width.
    pub fn measure(&self, width: f32, fonts: &FontManager) -> f32 {
        self.layout(width, fonts).height
    }

    /// Wrapped lines and height at `width`.
    pub fn layout(&self, width: f32, fonts: &FontManager) -> BlockLayout {
        match self {
            Block::Title { text } => {
                let line_height = fonts.line_height(TITLE_FONT_SIZE);
                let lines = wrap_text(text, width, TextStyle::Bold, TITLE_FONT_SIZE, fonts);
                BlockLayout {
                    height: lines.len() as f32 * line_height + TITLE_PADDING,
                    lines,
                    line_height,
                }
            }
            Block::Badges { .. } => BlockLayout {
                lines: Vec::new(),
                line_height: fonts.line_height(BADGE_FONT_SIZE),
                height: BADGE_HEIGHT,
            },
            Block::Image { .. } => BlockLayout {
                lines: Vec::new(),
                line_height: 0.0,
                height: width * IMAGE_ASPECT,
            },
            Block::SectionHeader { heading } => BlockLayout {
                lines: vec![heading.clone()],
                line_height: fonts.line_height(SECTION_FONT_SIZE),
                height: SECTION_HEADER_HEIGHT,
            },
            Block::IngredientLine { text } | Block::InstructionStep { text, .. } => {
                let line_height = fonts.line_height(BODY_FONT_SIZE);
                let lines = wrap_text(
                    text,
                    width - self.text_indent(),
                    TextStyle::Regular,
                    BODY_FONT_SIZE,
                    fonts,
                );
                let height = self.text_height(lines.len(), line_height);
                BlockLayout {
                    lines,
                    line_height,
                    height,
                }
            }
        }
    }

    fn text_height(&self, line_count: usize, line_height: f32) -> f32 {
        match self {
            Block::Title { .. } => line_count as f32 * line_height + TITLE_PADDING,
            Block::InstructionStep { .. } => (line_count as f32 * line_height + LINE_SPACING)
                .max(2.0 * STEP_MARKER_RADIUS + LINE_SPACING),
            _ => line_count as f32 * line_height + LINE_SPACING,
        }
    }

    /// Horizontal offset of the block's running text from its left edge.
    pub fn text_indent(&self) -> f32 {
        match self {
            Block::IngredientLine { .. } => INGREDIENT_INDENT,
            Block::InstructionStep { .. } => STEP_INDENT,
            _ => 0.0,
        }
    }

    pub fn is_section_header(&self) -> bool {
        matches!(self, Block::SectionHeader { .. })
    }

    /// Whether the block's height depends on wrapped text and can be cut.
    pub fn has_running_text(&self) -> bool {
        matches!(
            self,
            Block::Title { .. } | Block::IngredientLine { .. } | Block::InstructionStep { .. }
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Block::Title { .. } => "title",
            Block::Badges { .. } => "badges",
            Block::Image { .. } => "image",
            Block::SectionHeader { .. } => "section_header",
            Block::IngredientLine { .. } => "ingredient_line",
            Block::InstructionStep { .. } => "instruction_step",
        }
    }

    /// Face and size of the block's running text.
    fn text_font(&self) -> (TextStyle, f32) {
        match self {
            Block::Title { .. } => (TextStyle::Bold, TITLE_FONT_SIZE),
            _ => (TextStyle::Regular, BODY_FONT_SIZE),
        }
    }

    /// Cut a text block's layout so that it is at most `max_height` tall.
    /// At least one line is kept; the last kept line ends in `...` and still
    /// fits the block's text width at `width`.
    /// Returns `false` if nothing had to be cut.
    pub fn truncate_layout(
        &self,
        layout: &mut BlockLayout,
        max_height: f32,
        width: f32,
        fonts: &FontManager,
    ) -> bool {
        if layout.height <= max_height || !self.has_running_text() || layout.line_height <= 0.0 {
            return false;
        }
        let mut keep = layout.lines.len();
        while keep > 1 && self.text_height(keep, layout.line_height) > max_height {
            keep -= 1;
        }
        layout.lines.truncate(keep);
        let (style, size) = self.text_font();
        if let Some(last) = layout.lines.last_mut() {
            *last = ellipsize(last, width - self.text_indent(), style, size, fonts);
        }
        layout.height = self.text_height(keep, layout.line_height);
        true
    }
}
