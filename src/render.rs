//! PDF renderer – takes a [`DocumentLayout`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API) and the builtin Helvetica faces.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use crate::blocks::{
    Block, BADGE_FONT_SIZE, BADGE_GAP, BADGE_HEIGHT, BADGE_WIDTH, BODY_FONT_SIZE,
    SECTION_FONT_SIZE, STEP_MARKER_RADIUS, TITLE_FONT_SIZE,
};
use crate::error::ForgeError;
use crate::fonts::{truncate_to_width, FontManager, TextStyle};
use crate::layout_config::*;

type Rgb3 = [f32; 3];

const INK: Rgb3 = [0.13, 0.13, 0.13];
const MUTED: Rgb3 = [0.45, 0.45, 0.45];
const ACCENT: Rgb3 = [0.80, 0.33, 0.18];
const BADGE_FILL: Rgb3 = [0.99, 0.92, 0.86];
const WHITE: Rgb3 = [1.0, 1.0, 1.0];

const CHROME_FONT_SIZE: f32 = 9.0;
const HEADER_TITLE_SIZE: f32 = 14.0;
const CHROME_PADDING: f32 = 10.0;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Render a layout into PDF bytes.
///
/// Fails as a whole on invalid geometry or an image payload that cannot be
/// embedded; no partial document is produced.
pub fn render_pdf(layout: &DocumentLayout, fonts: &FontManager) -> Result<Vec<u8>, ForgeError> {
    layout.geometry.validate()?;

    let page_w = Mm(layout.geometry.width * 0.352778); // pt → mm
    let page_h = Mm(layout.geometry.height * 0.352778);

    let mut doc = PdfDocument::new(&layout.title);

    // ── Pre-register all images ────────────────────────────────────────────
    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();

    for placed in layout.blocks() {
        let Block::Image { image } = &placed.block else {
            continue;
        };
        if image_resources.contains_key(&image.src) {
            continue;
        }
        let bytes = parse_data_uri(&image.src).map_err(ForgeError::ImageEmbed)?;
        let raw = RawImage::decode_from_bytes(&bytes, &mut warnings)
            .map_err(|e| ForgeError::ImageEmbed(e.to_string()))?;
        let xobj_id = doc.add_image(&raw);
        image_resources.insert(
            image.src.clone(),
            ImageResource {
                xobj_id,
                px_width: image.px_width,
                px_height: image.px_height,
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages = Vec::new();
    for page_layout in &layout.pages {
        let mut canvas = Canvas {
            ops: Vec::new(),
            page_height: layout.geometry.height,
            fonts,
        };
        for placed in &page_layout.blocks {
            render_block(&mut canvas, placed, &image_resources, fonts);
        }
        if let Some(chrome) = &page_layout.chrome {
            render_chrome(&mut canvas, chrome, &layout.geometry, fonts);
        }
        pages.push(PdfPage::new(page_w, page_h, canvas.ops));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    log::debug!(
        "Rendering {} page(s) with {} metrics",
        pages.len(),
        if fonts.has_real_metrics() { "loaded" } else { "synthetic" }
    );
    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        log::debug!("printpdf reported {} warning(s)", warnings.len());
    }
    Ok(bytes)
}

/// Page ops plus the conversion from top-left layout coordinates to PDF's
/// bottom-left origin.
struct Canvas<'a> {
    ops: Vec<Op>,
    page_height: f32,
    fonts: &'a FontManager,
}

fn rgb(c: Rgb3) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn builtin(style: TextStyle) -> BuiltinFont {
    match style {
        TextStyle::Regular => BuiltinFont::Helvetica,
        TextStyle::Bold => BuiltinFont::HelveticaBold,
    }
}

impl Canvas<'_> {
    fn pdf_y(&self, y: f32) -> f32 {
        self.page_height - y
    }

    fn fill_polygon(&mut self, points: Vec<LinePoint>, color: Rgb3) {
        self.ops.push(Op::SetFillColor { col: rgb(color) });
        self.ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing { points }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    /// Filled rectangle; `y` is the top edge in layout coordinates.
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb3) {
        let top = self.pdf_y(y);
        let bottom = top - height;
        self.fill_polygon(
            vec![
                point(x, bottom),
                point(x + width, bottom),
                point(x + width, top),
                point(x, top),
            ],
            color,
        );
    }

    /// Filled circle approximated by a 32-gon.
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb3) {
        const SEGMENTS: usize = 32;
        let center_y = self.pdf_y(cy);
        let points = (0..SEGMENTS)
            .map(|i| {
                let angle = i as f32 / SEGMENTS as f32 * std::f32::consts::TAU;
                point(cx + radius * angle.cos(), center_y + radius * angle.sin())
            })
            .collect();
        self.fill_polygon(points, color);
    }

    fn hline(&mut self, x1: f32, x2: f32, y: f32, thickness: f32, color: Rgb3) {
        let pdf_y = self.pdf_y(y);
        self.ops.push(Op::SetOutlineColor { col: rgb(color) });
        self.ops.push(Op::SetOutlineThickness { pt: Pt(thickness) });
        self.ops.push(Op::DrawLine {
            line: Line {
                points: vec![point(x1, pdf_y), point(x2, pdf_y)],
                is_closed: false,
            },
        });
    }

    /// One line of text whose line box starts at `y` (top, layout coordinates).
    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, style: TextStyle, color: Rgb3) {
        if text.is_empty() {
            return;
        }
        let font = builtin(style);
        let baseline = self.pdf_y(y) - self.fonts.ascender(size, style);
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(x),
                y: Pt(baseline),
            },
        });
        self.ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(size),
            font,
        });
        self.ops.push(Op::SetFillColor { col: rgb(color) });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(to_winlatin(text))],
            font,
        });
        self.ops.push(Op::EndTextSection);
    }

    /// Pre-wrapped lines, one per `line_height`, with the text vertically
    /// centred in each line box.
    #[allow(clippy::too_many_arguments)]
    fn text_lines(
        &mut self,
        lines: &[String],
        x: f32,
        y: f32,
        line_height: f32,
        size: f32,
        style: TextStyle,
        color: Rgb3,
    ) {
        let leading = (line_height - size) / 2.0;
        for (i, line) in lines.iter().enumerate() {
            self.text(line, x, y + i as f32 * line_height + leading, size, style, color);
        }
    }
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{00BD}' => 0xBD, // one half
            '\u{00BC}' => 0xBC, // one quarter
            '\u{00B0}' => 0xB0, // degree
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0x9F range; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let rest = src.strip_prefix("data:").ok_or_else(|| {
        let preview: String = src.chars().take(80).collect();
        format!("image src must be a base64 data URI, got {preview:?}")
    })?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| "invalid data URI: missing `,` separator".to_string())?;
    if !header.contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(data.trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

fn render_block(
    canvas: &mut Canvas<'_>,
    placed: &PlacedBlock,
    images: &HashMap<String, ImageResource>,
    fonts: &FontManager,
) {
    let (x, y) = (placed.x, placed.y);
    match &placed.block {
        Block::Title { .. } => {
            canvas.text_lines(
                &placed.lines,
                x,
                y,
                placed.line_height,
                TITLE_FONT_SIZE,
                TextStyle::Bold,
                INK,
            );
        }
        Block::Badges { badges } => {
            for (i, badge) in badges.iter().enumerate() {
                let bx = x + i as f32 * (BADGE_WIDTH + BADGE_GAP);
                if bx + BADGE_WIDTH > x + placed.width {
                    break;
                }
                canvas.fill_rect(bx, y, BADGE_WIDTH, BADGE_HEIGHT, BADGE_FILL);
                let label = truncate_to_width(
                    &badge.text(),
                    BADGE_WIDTH - 2.0 * CHROME_PADDING,
                    TextStyle::Bold,
                    BADGE_FONT_SIZE,
                    fonts,
                );
                canvas.text(
                    &label,
                    bx + CHROME_PADDING,
                    y + (BADGE_HEIGHT - BADGE_FONT_SIZE) / 2.0,
                    BADGE_FONT_SIZE,
                    TextStyle::Bold,
                    ACCENT,
                );
            }
        }
        Block::Image { image } => {
            if let Some(res) = images.get(&image.src) {
                render_image(canvas, placed, res);
            }
        }
        Block::SectionHeader { heading } => {
            canvas.fill_rect(x, y, placed.width, placed.height, ACCENT);
            canvas.text(
                heading,
                x + CHROME_PADDING,
                y + (placed.height - SECTION_FONT_SIZE) / 2.0,
                SECTION_FONT_SIZE,
                TextStyle::Bold,
                WHITE,
            );
        }
        Block::IngredientLine { .. } => {
            let leading = (placed.line_height - BODY_FONT_SIZE) / 2.0;
            canvas.text("\u{2022}", x + 4.0, y + leading, BODY_FONT_SIZE, TextStyle::Bold, ACCENT);
            canvas.text_lines(
                &placed.lines,
                x + placed.block.text_indent(),
                y,
                placed.line_height,
                BODY_FONT_SIZE,
                TextStyle::Regular,
                INK,
            );
        }
        Block::InstructionStep { number, .. } => {
            let r = STEP_MARKER_RADIUS;
            canvas.fill_circle(x + r, y + r, r, ACCENT);
            let label = number.to_string();
            let label_w = fonts.measure_text_width(&label, CHROME_FONT_SIZE, TextStyle::Bold);
            canvas.text(
                &label,
                x + r - label_w / 2.0,
                y + r - CHROME_FONT_SIZE / 2.0,
                CHROME_FONT_SIZE,
                TextStyle::Bold,
                WHITE,
            );
            canvas.text_lines(
                &placed.lines,
                x + placed.block.text_indent(),
                y,
                placed.line_height,
                BODY_FONT_SIZE,
                TextStyle::Regular,
                INK,
            );
        }
    }
}

/// Fit the image inside its box, preserving aspect ratio, centred.
fn render_image(canvas: &mut Canvas<'_>, placed: &PlacedBlock, res: &ImageResource) {
    if res.px_width == 0 || res.px_height == 0 {
        return;
    }
    let (px_w, px_h) = (res.px_width as f32, res.px_height as f32);
    // At dpi=72 printpdf renders 1 px = 1 pt.
    let scale = (placed.width / px_w).min(placed.height / px_h);
    let (draw_w, draw_h) = (px_w * scale, px_h * scale);
    let left = placed.x + (placed.width - draw_w) / 2.0;
    let top = placed.y + (placed.height - draw_h) / 2.0;

    canvas.ops.push(Op::UseXobject {
        id: res.xobj_id.clone(),
        transform: XObjectTransform {
            translate_x: Some(Pt(left)),
            translate_y: Some(Pt(canvas.pdf_y(top + draw_h))),
            dpi: Some(72.0),
            scale_x: Some(scale),
            scale_y: Some(scale),
            rotate: None,
        },
    });
}

fn render_chrome(canvas: &mut Canvas<'_>, chrome: &PageChrome, g: &PageGeometry, fonts: &FontManager) {
    let left = g.margin;
    let right = g.width - g.margin;

    let band = g.header_band - CHROME_PADDING;
    // The header needs room for its title and timestamp lines.
    let header = chrome
        .header
        .as_ref()
        .filter(|_| band >= HEADER_TITLE_SIZE + CHROME_FONT_SIZE + 16.0);
    if chrome.header.is_some() && header.is_none() {
        log::debug!("Header band of {:.1}pt too small, header not drawn", g.header_band);
    }
    if let Some(header) = header {
        canvas.fill_rect(left, g.margin, g.content_width(), band, ACCENT);
        let title = truncate_to_width(
            &header.title,
            g.content_width() - 2.0 * CHROME_PADDING,
            TextStyle::Bold,
            HEADER_TITLE_SIZE,
            fonts,
        );
        canvas.text(
            &title,
            left + CHROME_PADDING,
            g.margin + 8.0,
            HEADER_TITLE_SIZE,
            TextStyle::Bold,
            WHITE,
        );
        canvas.text(
            &header.generated_at,
            left + CHROME_PADDING,
            g.margin + band - CHROME_FONT_SIZE - 8.0,
            CHROME_FONT_SIZE,
            TextStyle::Regular,
            WHITE,
        );
    }

    let footer_top = g.band_bottom();
    canvas.hline(left, right, footer_top + 6.0, 0.5, MUTED);
    let text_y = footer_top + 12.0;
    canvas.text(
        &chrome.footer.label,
        left,
        text_y,
        CHROME_FONT_SIZE,
        TextStyle::Regular,
        MUTED,
    );
    let page_label = chrome.footer.page_label();
    let label_w = fonts.measure_text_width(&page_label, CHROME_FONT_SIZE, TextStyle::Regular);
    canvas.text(
        &page_label,
        right - label_w,
        text_y,
        CHROME_FONT_SIZE,
        TextStyle::Regular,
        MUTED,
    );
}
