//! Text measurement and word wrapping.
//!
//! Documents are drawn with the PDF builtin Helvetica faces, which need no
//! embedding. Widths come from synthetic Helvetica-like metrics unless a
//! metric-compatible TTF/OTF (e.g. Liberation Sans) has been registered with
//! [`FontManager::load_metrics`], in which case real glyph advances are used.

use std::collections::HashMap;

use crate::error::ForgeError;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.35;

/// The two faces the layout uses.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum TextStyle {
    Regular,
    Bold,
}

/// Metrics of one face.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API). Empty for
    /// the synthetic metrics.
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
}

impl FontData {
    fn synthetic() -> Self {
        Self {
            bytes: Vec::new(),
            units_per_em: 1000.0,
            ascender: 750.0,
            descender: -250.0,
        }
    }
}

/// Read-only after construction, so one manager can serve concurrent builds.
pub struct FontManager {
    fonts: HashMap<TextStyle, FontData>,
}

impl FontManager {
    /// Manager with synthetic metrics for both faces.
    pub fn new() -> Self {
        let mut fonts = HashMap::new();
        fonts.insert(TextStyle::Regular, FontData::synthetic());
        fonts.insert(TextStyle::Bold, FontData::synthetic());
        Self { fonts }
    }

    /// Replace the metrics of `style` with those of a TTF/OTF face.
    pub fn load_metrics(&mut self, style: TextStyle, bytes: Vec<u8>) -> Result<(), ForgeError> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| ForgeError::Font(format!("failed to parse font: {e}")))?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            bytes,
        };
        log::debug!("Loaded {style:?} metrics ({} units/em)", data.units_per_em);
        self.fonts.insert(style, data);
        Ok(())
    }

    fn get(&self, style: TextStyle) -> Option<&FontData> {
        self.fonts.get(&style)
    }

    /// Width of `text` in points at `font_size`.
    ///
    /// Synthetic metrics use an average character width of 0.5 × size
    /// (0.55 × size for bold). Widths are additive per character, so
    /// measuring a joined line equals the sum of its parts.
    pub fn measure_text_width(&self, text: &str, font_size: f32, style: TextStyle) -> f32 {
        let avg = match style {
            TextStyle::Regular => 0.5,
            TextStyle::Bold => 0.55,
        };
        let data = match self.get(style) {
            Some(d) if !d.bytes.is_empty() => d,
            _ => return text.chars().count() as f32 * font_size * avg,
        };

        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) => {
                let scale = font_size / data.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        None => font_size * avg,
                    })
                    .sum()
            }
            Err(_) => text.chars().count() as f32 * font_size * avg,
        }
    }

    /// Line height in points.
    pub fn line_height(&self, font_size: f32) -> f32 {
        font_size * LINE_HEIGHT_FACTOR
    }

    /// Ascender in points, used to place the text baseline.
    pub fn ascender(&self, font_size: f32, style: TextStyle) -> f32 {
        match self.get(style) {
            Some(data) => data.ascender * font_size / data.units_per_em,
            None => font_size * 0.75,
        }
    }

    /// True when real font metrics are loaded for the regular face.
    pub fn has_real_metrics(&self) -> bool {
        self.get(TextStyle::Regular)
            .map(|d| !d.bytes.is_empty())
            .unwrap_or(false)
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Greedy word wrap of `text` to `max_width` points.
///
/// Words are accumulated until the next one would overflow; a single word
/// wider than `max_width` sits alone on its line. Embedded newlines start a
/// new line. Always returns at least one line.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    style: TextStyle,
    font_size: f32,
    fonts: &FontManager,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.lines() {
        let mut current_line = String::new();
        for word in paragraph.split_whitespace() {
            if current_line.is_empty() {
                current_line.push_str(word);
                continue;
            }
            let candidate = format!("{current_line} {word}");
            if fonts.measure_text_width(&candidate, font_size, style) > max_width {
                lines.push(std::mem::replace(&mut current_line, word.to_string()));
            } else {
                current_line = candidate;
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Shorten `text` with a trailing `...` until it fits `max_width`.
pub fn truncate_to_width(
    text: &str,
    max_width: f32,
    style: TextStyle,
    font_size: f32,
    fonts: &FontManager,
) -> String {
    if fonts.measure_text_width(text, font_size, style) <= max_width {
        return text.to_string();
    }
    ellipsize(text, max_width, style, font_size, fonts)
}

/// `text` followed by `...`, dropping trailing characters until the result
/// fits `max_width`. Falls back to a bare `...`.
pub fn ellipsize(
    text: &str,
    max_width: f32,
    style: TextStyle,
    font_size: f32,
    fonts: &FontManager,
) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    loop {
        let candidate = format!("{}...", chars.iter().collect::<String>().trim_end());
        if chars.is_empty() || fonts.measure_text_width(&candidate, font_size, style) <= max_width
        {
            return candidate;
        }
        chars.pop();
    }
}
