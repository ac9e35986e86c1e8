use std::time::Duration;

use thiserror::Error;

/// Terminal errors of a document build.
///
/// Input defects and asset failures never surface here; they are resolved
/// inside the engine by substitution or by omitting the image.
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Page geometry leaves no room for content
    #[error("Invalid page geometry: {0}")]
    Geometry(String),

    /// A resolved image could not be embedded into the PDF stream
    #[error("Image could not be embedded: {0}")]
    ImageEmbed(String),

    /// A metrics font could not be parsed
    #[error("Font metrics could not be loaded: {0}")]
    Font(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors of a single image fetch. Contained inside the asset resolver.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Response body was empty")]
    EmptyBody,

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Unsupported image format")]
    UnsupportedFormat,
}
