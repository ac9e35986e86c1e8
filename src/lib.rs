//! # recipe-forge – Recipe record → PDF pipeline
//!
//! This crate turns a loosely-shaped recipe record into a paginated,
//! print-ready PDF. The pipeline stages are:
//!
//! 1. **Normalize** – clean title, ingredients, steps and badges ([`recipe`])
//! 2. **Resolve** – fetch the recipe image with a fallback ([`assets`])
//! 3. **Block** – build the ordered, measured block list ([`blocks`])
//! 4. **Paginate** – place blocks on A4 pages ([`pagination`])
//! 5. **Chrome** – stamp header and "Page i of N" footers ([`assembler`])
//! 6. **Render** – emit PDF bytes via printpdf ([`render`], [`output`])
//!
//! [`pipeline::generate_recipe_pdf`] runs all of them.

pub mod assembler;
pub mod assets;
pub mod blocks;
pub mod error;
pub mod fonts;
pub mod layout_config;
pub mod output;
pub mod pagination;
pub mod pipeline;
pub mod recipe;
pub mod render;
pub mod samples;

// Re-exports for convenience
pub use error::{FetchError, ForgeError};
pub use pipeline::{compute_document_layout, generate_recipe_pdf, PipelineConfig};
pub use recipe::RecipeRecord;
