//! Document assembler – turns a recipe record into a paginated layout.
//!
//! Pass 1 (content) builds the ordered block list and runs it through the
//! page cursor. Pass 2 (chrome) runs once the page count is final and fills
//! each page's header/footer slot without touching content.

use chrono::NaiveDateTime;

use crate::assets::{AssetResolver, ResolvedImage};
use crate::blocks::{Block, INGREDIENTS_HEADING, INSTRUCTIONS_HEADING};
use crate::fonts::FontManager;
use crate::layout_config::{DocumentLayout, FooterChrome, HeaderChrome, PageChrome, PageGeometry};
use crate::pagination::paginate;
use crate::recipe::RecipeRecord;

/// Footer label used when none is configured.
pub const DEFAULT_FOOTER_LABEL: &str = "Recipe Generator";

/// Inputs of an assembly that do not come from the recipe.
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    pub geometry: PageGeometry,
    pub footer_label: String,
    pub generated_at: NaiveDateTime,
}

impl AssemblyOptions {
    pub fn new(generated_at: NaiveDateTime) -> Self {
        Self {
            geometry: PageGeometry::a4(),
            footer_label: DEFAULT_FOOTER_LABEL.to_string(),
            generated_at,
        }
    }
}

/// Blocks in document order: title, badges, image, ingredients, instructions.
///
/// The instructions header is emitted even when no step survives
/// normalization.
pub fn build_blocks(record: &RecipeRecord, image: Option<&ResolvedImage>) -> Vec<Block> {
    let mut blocks = vec![Block::Title {
        text: record.display_title(),
    }];

    let badges = record.badges();
    if !badges.is_empty() {
        blocks.push(Block::Badges { badges });
    }

    if let Some(image) = image {
        blocks.push(Block::Image {
            image: image.to_content(),
        });
    }

    blocks.push(Block::SectionHeader {
        heading: INGREDIENTS_HEADING.to_string(),
    });
    blocks.extend(
        record
            .ingredient_list()
            .into_iter()
            .map(|text| Block::IngredientLine { text }),
    );

    blocks.push(Block::SectionHeader {
        heading: INSTRUCTIONS_HEADING.to_string(),
    });
    blocks.extend(
        record
            .instruction_steps()
            .into_iter()
            .enumerate()
            .map(|(i, text)| Block::InstructionStep { number: i + 1, text }),
    );

    blocks
}

/// Pass 2: give page `i` of `N` its footer, and page 1 its header.
pub fn stamp_chrome(mut layout: DocumentLayout, options: &AssemblyOptions) -> DocumentLayout {
    let page_count = layout.pages.len();
    let generated_at = format!("Generated {}", options.generated_at.format("%Y-%m-%d %H:%M"));
    let title = layout.title.clone();

    for (i, page) in layout.pages.iter_mut().enumerate() {
        page.chrome = Some(PageChrome {
            header: (i == 0).then(|| HeaderChrome {
                title: title.clone(),
                generated_at: generated_at.clone(),
            }),
            footer: FooterChrome {
                label: options.footer_label.clone(),
                page_number: i + 1,
                page_count,
            },
        });
    }
    layout
}

/// Both passes, given an already-resolved image.
pub fn assemble(
    record: &RecipeRecord,
    image: Option<&ResolvedImage>,
    options: &AssemblyOptions,
    fonts: &FontManager,
) -> DocumentLayout {
    let blocks = build_blocks(record, image);
    let title = record.display_title();
    let layout = paginate(&blocks, &title, options.geometry, fonts);
    log::info!(
        "Laid out '{}': {} block(s) on {} page(s)",
        title,
        blocks.len(),
        layout.page_count()
    );
    stamp_chrome(layout, options)
}

/// Resolve the recipe image, then assemble. The image fetch is the only
/// suspension point.
pub async fn build_document(
    record: &RecipeRecord,
    resolver: &AssetResolver,
    options: &AssemblyOptions,
    fonts: &FontManager,
) -> DocumentLayout {
    let image = resolver.resolve(record.image_ref()).await;
    assemble(record, image.as_ref(), options, fonts)
}
