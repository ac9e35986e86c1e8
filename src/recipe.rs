//! Recipe record – the engine's input – and the normalization rules that
//! turn its loosely-shaped fields into layout-ready values.

use serde::{Deserialize, Serialize};

/// Title used when the record's title is empty.
pub const PLACEHOLDER_TITLE: &str = "Untitled Recipe";
/// Ingredient used when the record lists none.
pub const FALLBACK_INGREDIENT: &str = "No ingredients listed";
/// Instructions text used when the record has none.
pub const FALLBACK_INSTRUCTIONS: &str = "No instructions provided.";

/// Unnumbered instruction lines must be longer than this to count as a step.
pub const MIN_STEP_CHARS: usize = 15;

/// Metadata values that mean "not set".
const SENTINELS: &[&str] = &["unknown", "none", "n/a", "any"];

/// A recipe as supplied by the surrounding application.
///
/// Unknown fields (database ids, owner ids, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub ingredients: Ingredients,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub dietary_restriction: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Ingredients arrive either as a list or as one string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ingredients {
    List(Vec<String>),
    Single(String),
}

impl Default for Ingredients {
    fn default() -> Self {
        Ingredients::List(Vec::new())
    }
}

impl From<Vec<&str>> for Ingredients {
    fn from(items: Vec<&str>) -> Self {
        Ingredients::List(items.into_iter().map(str::to_string).collect())
    }
}

/// A metadata pill shown under the title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub label: String,
    pub value: String,
}

impl Badge {
    pub fn text(&self) -> String {
        format!("{}: {}", self.label, self.value)
    }
}

impl RecipeRecord {
    /// Title with the placeholder substituted for an empty one.
    pub fn display_title(&self) -> String {
        let title = self.title.trim();
        if title.is_empty() {
            PLACEHOLDER_TITLE.to_string()
        } else {
            title.to_string()
        }
    }

    /// Non-empty, trimmed ingredient list.
    pub fn ingredient_list(&self) -> Vec<String> {
        let raw: Vec<&str> = match &self.ingredients {
            Ingredients::List(items) => items.iter().map(String::as_str).collect(),
            Ingredients::Single(item) => vec![item.as_str()],
        };
        let list: Vec<String> = raw
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if list.is_empty() {
            vec![FALLBACK_INGREDIENT.to_string()]
        } else {
            list
        }
    }

    /// Ordered instruction steps, see [`normalize_steps`].
    pub fn instruction_steps(&self) -> Vec<String> {
        if self.instructions.trim().is_empty() {
            normalize_steps(FALLBACK_INSTRUCTIONS)
        } else {
            normalize_steps(&self.instructions)
        }
    }

    /// Cuisine and dietary badges, in that order, skipping unset values.
    pub fn badges(&self) -> Vec<Badge> {
        [
            ("CUISINE", self.cuisine.as_deref()),
            ("DIET", self.dietary_restriction.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            meaningful(value).map(|v| Badge {
                label: label.to_string(),
                value: capitalize(v),
            })
        })
        .collect()
    }

    /// Preferred image reference, if any.
    pub fn image_ref(&self) -> Option<&str> {
        meaningful(self.image_url.as_deref())
    }
}

fn meaningful(value: Option<&str>) -> Option<&str> {
    let v = value?.trim();
    if v.is_empty() || SENTINELS.iter().any(|s| v.eq_ignore_ascii_case(s)) {
        None
    } else {
        Some(v)
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split free-text instructions into steps.
///
/// Each line is trimmed and loses any leading `<digits>.` numbering. A line
/// that carried numbering is a step whenever text remains; any other line
/// must be longer than [`MIN_STEP_CHARS`] characters and must not start with
/// a `*` bullet.
pub fn normalize_steps(instructions: &str) -> Vec<String> {
    instructions
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            match strip_numbering(line) {
                Some(rest) => (!rest.is_empty()).then(|| rest.to_string()),
                None => (line.chars().count() > MIN_STEP_CHARS && !line.starts_with('*'))
                    .then(|| line.to_string()),
            }
        })
        .collect()
}

/// `"12. Whisk"` → `Some("Whisk")`; lines without numbering → `None`.
fn strip_numbering(line: &str) -> Option<&str> {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        // "3.5 cups" is a quantity, not numbering.
        return None;
    }
    Some(rest.trim_start())
}
