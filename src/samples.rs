//! Sample recipe records for testing and demonstration.
//!
//! Each sample exercises a different part of normalization or pagination.

use crate::recipe::{Ingredients, RecipeRecord};

/// Names accepted by [`by_name`].
pub const SAMPLE_NAMES: &[&str] = &["tomato_soup", "banquet", "fragments", "sparse"];

/// Short single-page recipe with numbered steps and a cuisine badge.
pub fn tomato_soup() -> RecipeRecord {
    RecipeRecord {
        title: "Tomato Soup".to_string(),
        ingredients: vec!["tomato", "salt"].into(),
        instructions: "1. Boil water\n2. Add tomato and salt and simmer for ten minutes"
            .to_string(),
        cuisine: Some("italian".to_string()),
        ..Default::default()
    }
}

/// Long recipe that needs several pages.
pub fn banquet() -> RecipeRecord {
    let ingredients = (1..=60)
        .map(|i| format!("{} g of ingredient number {i}, finely chopped", i * 25))
        .collect();
    let instructions = (1..=40)
        .map(|i| {
            format!(
                "{i}. Work through stage {i} carefully, stirring the pot gently and \
                 tasting for seasoning before moving on to the next stage of the banquet."
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    RecipeRecord {
        title: "Midsummer Banquet for Forty Guests".to_string(),
        ingredients: Ingredients::List(ingredients),
        instructions,
        cuisine: Some("french".to_string()),
        dietary_restriction: Some("vegetarian".to_string()),
        ..Default::default()
    }
}

/// Instructions made only of short, unnumbered fragments.
pub fn fragments() -> RecipeRecord {
    RecipeRecord {
        title: "Quick Salad".to_string(),
        ingredients: Ingredients::Single("lettuce".to_string()),
        instructions: "Chop.\nMix well.\n* garnish\nServe cold.".to_string(),
        cuisine: Some("Unknown".to_string()),
        dietary_restriction: Some("vegan".to_string()),
        ..Default::default()
    }
}

/// Record with every field missing or set to a sentinel.
pub fn sparse() -> RecipeRecord {
    RecipeRecord {
        cuisine: Some("n/a".to_string()),
        dietary_restriction: Some("None".to_string()),
        image_url: Some("unknown".to_string()),
        ..Default::default()
    }
}

/// Look up a sample by name.
pub fn by_name(name: &str) -> Option<RecipeRecord> {
    match name {
        "tomato_soup" => Some(tomato_soup()),
        "banquet" => Some(banquet()),
        "fragments" => Some(fragments()),
        "sparse" => Some(sparse()),
        _ => None,
    }
}
