//! Pipeline – ties together normalization, image resolution, pagination,
//! chrome and rendering into a single function call.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::assembler::{assemble, build_document, AssemblyOptions, DEFAULT_FOOTER_LABEL};
use crate::assets::{AssetResolver, ResolvedImage, DEFAULT_FALLBACK_IMAGE_URL};
use crate::error::ForgeError;
use crate::fonts::{FontManager, TextStyle};
use crate::layout_config::{DocumentLayout, PageGeometry};
use crate::output::{write_document, RenderedDocument};
use crate::recipe::RecipeRecord;

/// Configuration for the PDF generation pipeline. Every field has a default,
/// so a config file only needs the values it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Page height in points (default: A4 = 841.89).
    pub page_height: f32,
    /// Page margin in points (default: 40).
    pub page_margin: f32,
    /// Height of the header band reserved on the first page.
    pub header_band: f32,
    /// Height of the footer band reserved on every page.
    pub footer_band: f32,
    /// Fixed text shown at the left of every footer.
    pub footer_label: String,
    /// Whether to fetch images at all.
    pub fetch_images: bool,
    /// Image used when the recipe has none or it cannot be loaded.
    pub fallback_image_url: Option<String>,
    /// Bound on each image fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// TTF/OTF whose metrics replace the synthetic regular-face metrics.
    pub metrics_font: Option<PathBuf>,
    /// TTF/OTF whose metrics replace the synthetic bold-face metrics.
    pub metrics_font_bold: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let a4 = PageGeometry::a4();
        Self {
            page_width: a4.width,
            page_height: a4.height,
            page_margin: a4.margin,
            header_band: a4.header_band,
            footer_band: a4.footer_band,
            footer_label: DEFAULT_FOOTER_LABEL.to_string(),
            fetch_images: true,
            fallback_image_url: Some(DEFAULT_FALLBACK_IMAGE_URL.to_string()),
            fetch_timeout_secs: 8,
            metrics_font: None,
            metrics_font_bold: None,
        }
    }
}

impl PipelineConfig {
    /// Config that never touches the network.
    pub fn offline() -> Self {
        Self {
            fetch_images: false,
            fallback_image_url: None,
            ..Self::default()
        }
    }

    /// Load a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ForgeError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn geometry(&self) -> PageGeometry {
        PageGeometry {
            width: self.page_width,
            height: self.page_height,
            margin: self.page_margin,
            header_band: self.header_band,
            footer_band: self.footer_band,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn validate(&self) -> Result<(), ForgeError> {
        self.geometry().validate()
    }

    /// Font metrics, with any configured metric fonts loaded.
    pub fn font_manager(&self) -> Result<FontManager, ForgeError> {
        let mut fonts = FontManager::default();
        for (style, path) in [
            (TextStyle::Regular, &self.metrics_font),
            (TextStyle::Bold, &self.metrics_font_bold),
        ] {
            if let Some(path) = path {
                fonts.load_metrics(style, std::fs::read(path)?)?;
            }
        }
        Ok(fonts)
    }

    pub fn asset_resolver(&self) -> AssetResolver {
        if self.fetch_images {
            AssetResolver::http(self.fallback_image_url.clone(), self.fetch_timeout())
        } else {
            AssetResolver::disabled()
        }
    }

    pub fn assembly_options(&self, generated_at: NaiveDateTime) -> AssemblyOptions {
        AssemblyOptions {
            geometry: self.geometry(),
            footer_label: self.footer_label.clone(),
            generated_at,
        }
    }
}

/// Full pipeline: recipe record → PDF bytes, fetching the image over HTTP.
///
/// Returns the serialised document and the layout it was rendered from.
pub async fn generate_recipe_pdf(
    record: &RecipeRecord,
    config: &PipelineConfig,
) -> Result<(RenderedDocument, DocumentLayout), ForgeError> {
    let resolver = config.asset_resolver();
    generate_with_resolver(record, config, &resolver).await
}

/// Full pipeline with a caller-supplied image resolver.
pub async fn generate_with_resolver(
    record: &RecipeRecord,
    config: &PipelineConfig,
    resolver: &AssetResolver,
) -> Result<(RenderedDocument, DocumentLayout), ForgeError> {
    config.validate()?;
    let fonts = config.font_manager()?;
    let options = config.assembly_options(Local::now().naive_local());

    let layout = build_document(record, resolver, &options, &fonts).await;
    let rendered = write_document(&layout, &fonts)?;
    Ok((rendered, layout))
}

/// Generate only the layout (no image fetch, no PDF rendering) – useful
/// for testing.
pub fn compute_document_layout(
    record: &RecipeRecord,
    image: Option<&ResolvedImage>,
    config: &PipelineConfig,
    generated_at: NaiveDateTime,
) -> Result<DocumentLayout, ForgeError> {
    config.validate()?;
    let fonts = config.font_manager()?;
    Ok(assemble(record, image, &config.assembly_options(generated_at), &fonts))
}
