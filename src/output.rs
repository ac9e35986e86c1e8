//! Output writer – serialises a finished layout and names the file.

use crate::error::ForgeError;
use crate::fonts::FontManager;
use crate::layout_config::DocumentLayout;
use crate::recipe::PLACEHOLDER_TITLE;
use crate::render::render_pdf;

pub const FILE_EXTENSION: &str = "pdf";

/// A serialised document and the filename it should be saved under.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
}

/// Serialise `layout` to PDF bytes. Any failure is terminal for the build.
pub fn serialize(layout: &DocumentLayout, fonts: &FontManager) -> Result<Vec<u8>, ForgeError> {
    let bytes = render_pdf(layout, fonts)?;
    log::info!(
        "Serialised '{}' ({} page(s), {} bytes)",
        layout.title,
        layout.page_count(),
        bytes.len()
    );
    Ok(bytes)
}

/// Serialise and name in one step.
pub fn write_document(
    layout: &DocumentLayout,
    fonts: &FontManager,
) -> Result<RenderedDocument, ForgeError> {
    Ok(RenderedDocument {
        bytes: serialize(layout, fonts)?,
        filename: suggest_filename(&layout.title),
        page_count: layout.page_count(),
    })
}

/// Lower-case `title`, replace everything outside `[a-z0-9]` with `_`, and
/// append the document extension.
pub fn suggest_filename(title: &str) -> String {
    let title = if title.trim().is_empty() {
        PLACEHOLDER_TITLE
    } else {
        title
    };
    let stem: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '_' })
        .collect();
    format!("{stem}.{FILE_EXTENSION}")
}
