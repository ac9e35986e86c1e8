//! Integration tests for the recipe-forge pipeline.
//!
//! These tests validate:
//! - Normalized records produce the expected block sequence
//! - Pagination keeps blocks whole and inside the content band
//! - Chrome carries the final page count on every page
//! - Image failures degrade to "no image" instead of failing the build
//! - PDF output exists and has valid format

use chrono::{NaiveDate, NaiveDateTime};
use sha2::{Digest, Sha256};

use recipe_forge::assets::{solid_png, AssetResolver, ResolvedImage, DEFAULT_FETCH_TIMEOUT};
use recipe_forge::blocks::Block;
use recipe_forge::layout_config::DocumentLayout;
use recipe_forge::pipeline::{compute_document_layout, generate_with_resolver, PipelineConfig};
use recipe_forge::recipe::{Ingredients, RecipeRecord, FALLBACK_INGREDIENT};
use recipe_forge::render::render_pdf;
use recipe_forge::{generate_recipe_pdf, samples, fonts::FontManager};

// =====================================================================
// Helper
// =====================================================================

fn config() -> PipelineConfig {
    PipelineConfig::offline()
}

fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(18, 30, 0))
        .unwrap()
}

fn layout_of(record: &RecipeRecord) -> DocumentLayout {
    compute_document_layout(record, None, &config(), fixed_time()).unwrap()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn count_kind(layout: &DocumentLayout, kind: &str) -> usize {
    layout.blocks().filter(|b| b.block.kind_name() == kind).count()
}

fn recipe_with_ingredients(n: usize) -> RecipeRecord {
    RecipeRecord {
        title: format!("{n} ingredients"),
        ingredients: Ingredients::List((0..n).map(|i| format!("ingredient {i}")).collect()),
        instructions: "Combine everything and cook until done".to_string(),
        ..Default::default()
    }
}

// =====================================================================
// Scenario tests
// =====================================================================

#[test]
fn tomato_soup_fits_one_page() {
    let layout = layout_of(&samples::tomato_soup());
    assert_eq!(layout.page_count(), 1);

    let badges: Vec<String> = layout
        .blocks()
        .filter_map(|b| match &b.block {
            Block::Badges { badges } => Some(badges.iter().map(|x| x.text()).collect::<Vec<_>>()),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(badges, vec!["CUISINE: Italian"]);

    assert_eq!(count_kind(&layout, "ingredient_line"), 2);
    let steps: Vec<(usize, String)> = layout
        .blocks()
        .filter_map(|b| match &b.block {
            Block::InstructionStep { number, text } => Some((*number, text.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        steps,
        vec![
            (1, "Boil water".to_string()),
            (2, "Add tomato and salt and simmer for ten minutes".to_string()),
        ]
    );

    let chrome = layout.pages[0].chrome.as_ref().unwrap();
    assert_eq!(chrome.footer.page_label(), "Page 1 of 1");
}

#[test]
fn short_fragments_leave_empty_instructions_section() {
    let layout = layout_of(&samples::fragments());
    assert_eq!(count_kind(&layout, "instruction_step"), 0);

    let headings: Vec<&str> = layout
        .blocks()
        .filter_map(|b| match &b.block {
            Block::SectionHeader { heading } => Some(heading.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(headings, vec!["Ingredients", "Instructions"]);
}

#[test]
fn sparse_record_uses_placeholders() {
    let layout = layout_of(&samples::sparse());
    assert_eq!(layout.title, "Untitled Recipe");
    assert_eq!(count_kind(&layout, "badges"), 0);
    let ingredients: Vec<&str> = layout
        .blocks()
        .filter_map(|b| match &b.block {
            Block::IngredientLine { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(ingredients, vec![FALLBACK_INGREDIENT]);
    assert_eq!(count_kind(&layout, "instruction_step"), 1);
}

#[test]
fn record_parses_from_application_json() {
    let json = r#"{
        "id": 42,
        "title": "Pancakes",
        "ingredients": ["flour", "milk", "  ", "eggs"],
        "instructions": "Whisk all of the ingredients together\n* note: rest the batter",
        "cuisine": "american",
        "dietary_restriction": "any",
        "image_url": null
    }"#;
    let record: RecipeRecord = serde_json::from_str(json).unwrap();
    let layout = layout_of(&record);
    assert_eq!(count_kind(&layout, "ingredient_line"), 3);
    assert_eq!(count_kind(&layout, "instruction_step"), 1);
    assert_eq!(count_kind(&layout, "badges"), 1);
}

// =====================================================================
// Pagination invariants
// =====================================================================

#[test]
fn banquet_spans_multiple_pages() {
    let layout = layout_of(&samples::banquet());
    assert!(layout.page_count() > 1, "got {} page(s)", layout.page_count());
    assert_eq!(count_kind(&layout, "instruction_step"), 40);
}

#[test]
fn blocks_stay_inside_content_band() {
    let layout = layout_of(&samples::banquet());
    let g = layout.geometry;
    for page in &layout.pages {
        for placed in &page.blocks {
            assert!(
                placed.y >= g.band_top(page.page_index) - 0.01,
                "block starts above band on page {}",
                page.page_index
            );
            assert!(
                placed.bottom() <= g.band_bottom() + 0.01,
                "block overlaps footer band on page {}",
                page.page_index
            );
        }
    }
}

#[test]
fn blocks_appear_in_order_and_unsplit() {
    let record = samples::banquet();
    let layout = layout_of(&record);
    let steps: Vec<usize> = layout
        .blocks()
        .filter_map(|b| match &b.block {
            Block::InstructionStep { number, .. } => Some(*number),
            _ => None,
        })
        .collect();
    assert_eq!(steps, (1..=40).collect::<Vec<_>>());
    assert!(layout.blocks().all(|b| !b.truncated));
}

#[test]
fn page_count_is_monotonic_in_content() {
    let mut last = 0;
    for n in [1, 10, 40, 80, 160] {
        let pages = layout_of(&recipe_with_ingredients(n)).page_count();
        assert!(pages >= last, "{n} ingredients gave {pages} pages, fewer than {last}");
        last = pages;
    }
    assert!(last > 1);
}

#[test]
fn page_count_is_monotonic_in_step_length() {
    let mut last = 0;
    for n in [1, 50, 200, 800, 3000] {
        let record = RecipeRecord {
            title: "Slow Simmer".to_string(),
            ingredients: vec!["stock"].into(),
            instructions: format!("1. {}", "simmer gently ".repeat(n)),
            ..Default::default()
        };
        let pages = layout_of(&record).page_count();
        assert!(pages >= last, "{n} repeats gave {pages} pages, fewer than {last}");
        last = pages;
    }
    assert!(last > 1);
}

#[test]
fn oversized_ingredient_stays_with_its_header() {
    let record = RecipeRecord {
        title: "Stew".to_string(),
        ingredients: Ingredients::Single("beef carrots onion ".repeat(400)),
        instructions: "Brown the beef, then simmer everything for two hours".to_string(),
        ..Default::default()
    };
    let layout = layout_of(&record);
    let g = layout.geometry;

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
            vec!["section_header", "instruction_step"],
        ]
    );
    let cut = &layout.pages[1].blocks[1];
    assert!(cut.truncated);
    assert!(cut.lines.last().unwrap().ends_with("..."));
    assert!(cut.y >= g.band_top(1) - 0.01);
    assert!(cut.bottom() <= g.band_bottom() + 0.01);
}

#[test]
fn section_header_never_ends_a_page() {
    let layout = layout_of(&samples::banquet());
    for page in &layout.pages {
        if let Some(last) = page.blocks.last() {
            assert!(
                !last.block.is_section_header() || page.page_index + 1 == layout.page_count(),
                "orphaned section header on page {}",
                page.page_index
            );
        }
    }
}

#[test]
fn footers_carry_final_page_count() {
    let layout = layout_of(&samples::banquet());
    let n = layout.page_count();
    for (i, page) in layout.pages.iter().enumerate() {
        let chrome = page.chrome.as_ref().unwrap();
        assert_eq!(chrome.footer.page_label(), format!("Page {} of {}", i + 1, n));
        assert_eq!(chrome.header.is_some(), i == 0);
    }
    let header = layout.pages[0].chrome.as_ref().unwrap().header.as_ref().unwrap();
    assert_eq!(header.generated_at, "Generated 2024-05-01 18:30");
}

// =====================================================================
// Image handling
// =====================================================================

#[test]
fn resolved_image_becomes_image_block() {
    let image = ResolvedImage::decode(solid_png(80, 40, [220, 80, 40]).unwrap()).unwrap();
    let layout =
        compute_document_layout(&samples::tomato_soup(), Some(&image), &config(), fixed_time())
            .unwrap();
    let kinds: Vec<&str> = layout.blocks().map(|b| b.block.kind_name()).take(3).collect();
    assert_eq!(kinds, vec!["title", "badges", "image"]);

    let bytes = render_pdf(&layout, &FontManager::default()).unwrap();
    assert_valid_pdf(&bytes);
}

#[tokio::test]
async fn unreachable_images_degrade_to_no_image() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", mockito::Matcher::Any)
        .with_status(404)
        .expect(2)
        .create_async()
        .await;

    let record = RecipeRecord {
        image_url: Some(format!("{}/soup.png", server.url())),
        ..samples::tomato_soup()
    };
    let resolver = AssetResolver::http(
        Some(format!("{}/fallback.png", server.url())),
        DEFAULT_FETCH_TIMEOUT,
    );
    let (doc, layout) = generate_with_resolver(&record, &config(), &resolver)
        .await
        .unwrap();
    assert_valid_pdf(&doc.bytes);
    assert_eq!(layout.page_count(), 1);
    let kinds: Vec<&str> = layout.blocks().map(|b| b.block.kind_name()).collect();
    assert_eq!(
        kinds,
        vec![
            "title",
            "badges",
            "section_header",
            "ingredient_line",
            "ingredient_line",
            "section_header",
            "instruction_step",
            "instruction_step",
        ]
    );
}

#[tokio::test]
async fn fetched_image_is_embedded() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/soup.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(solid_png(40, 20, [200, 50, 30]).unwrap())
        .create_async()
        .await;

    let record = RecipeRecord {
        image_url: Some(format!("{}/soup.png", server.url())),
        ..samples::tomato_soup()
    };
    let resolver = AssetResolver::http(None, DEFAULT_FETCH_TIMEOUT);
    let (doc, layout) = generate_with_resolver(&record, &config(), &resolver)
        .await
        .unwrap();
    assert_valid_pdf(&doc.bytes);
    let image = layout
        .blocks()
        .find_map(|b| match &b.block {
            Block::Image { image } => Some(image.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!((image.px_width, image.px_height), (40, 20));
}

// =====================================================================
// Layout JSON round-trip
// =====================================================================

#[test]
fn layout_json_roundtrip() {
    let layout = layout_of(&samples::banquet());
    let json = layout.to_json().unwrap();
    let parsed = DocumentLayout::from_json(&json).unwrap();
    assert_eq!(layout.page_count(), parsed.page_count());
    assert_eq!(parsed.to_json().unwrap(), json);
}

#[test]
fn render_from_layout_json() {
    let json = layout_of(&samples::tomato_soup()).to_json().unwrap();
    let parsed = DocumentLayout::from_json(&json).unwrap();
    let bytes = render_pdf(&parsed, &FontManager::default()).unwrap();
    assert_valid_pdf(&bytes);
}

// =====================================================================
// Golden-sample stability test
// =====================================================================

#[test]
fn layout_is_deterministic() {
    let digest = |layout: &DocumentLayout| {
        let json = layout.to_json().unwrap();
        format!("{:x}", Sha256::digest(json.as_bytes()))
    };
    let first = digest(&layout_of(&samples::banquet()));
    let second = digest(&layout_of(&samples::banquet()));
    assert_eq!(first, second);
}

#[tokio::test]
async fn pdf_output_is_stable_in_size() {
    let record = samples::tomato_soup();
    let (doc1, _) = generate_recipe_pdf(&record, &config()).await.unwrap();
    let (doc2, _) = generate_recipe_pdf(&record, &config()).await.unwrap();

    // printpdf embeds timestamps, so byte-exact equality isn't guaranteed.
    let diff = (doc1.bytes.len() as i64 - doc2.bytes.len() as i64).unsigned_abs();
    assert!(
        diff < 200,
        "PDF outputs differ significantly: {} vs {} bytes",
        doc1.bytes.len(),
        doc2.bytes.len()
    );
}

// =====================================================================
// All samples render without error
// =====================================================================

#[tokio::test]
async fn all_samples_render_successfully() {
    for name in samples::SAMPLE_NAMES {
        let record = samples::by_name(name).unwrap();
        let result = generate_recipe_pdf(&record, &config()).await;
        assert!(result.is_ok(), "Sample '{}' failed: {:?}", name, result.err());
        let (doc, layout) = result.unwrap();
        assert_valid_pdf(&doc.bytes);
        assert_eq!(doc.page_count, layout.page_count());
    }
}
