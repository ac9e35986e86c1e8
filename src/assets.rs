//! Asset resolver – turns an optional image reference into a decoded raster
//! or "no image". Every failure (network, status, timeout, decode) degrades
//! to the fallback source and then to `None`; nothing here can fail a build.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::ImageFormat;
use log::{debug, info, warn};
use reqwest::Client;

use crate::error::FetchError;
use crate::layout_config::ImageContent;

/// Default bound on a single image fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// Generic food image used when the recipe has none or it cannot be loaded.
pub const DEFAULT_FALLBACK_IMAGE_URL: &str = "https://loremflickr.com/800/400/food";

/// Something that can fetch raw image bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`ImageFetcher`] over HTTP(S).
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; RecipeForge/0.1)")
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(bytes.to_vec())
    }
}

/// A fetched image that decoded successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub px_width: u32,
    pub px_height: u32,
}

impl ResolvedImage {
    /// Decode `bytes`, keeping them only if they are a PNG or JPEG raster.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, FetchError> {
        let format = image::guess_format(&bytes)?;
        let mime = match format {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            _ => return Err(FetchError::UnsupportedFormat),
        };
        let decoded = image::load_from_memory_with_format(&bytes, format)?;
        Ok(Self {
            mime,
            px_width: decoded.width(),
            px_height: decoded.height(),
            bytes,
        })
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64_STD.encode(&self.bytes))
    }

    /// The layout model's view of this image.
    pub fn to_content(&self) -> ImageContent {
        ImageContent {
            src: self.to_data_uri(),
            px_width: self.px_width,
            px_height: self.px_height,
        }
    }
}

/// Resolves the recipe image with one fallback attempt.
pub struct AssetResolver {
    fetcher: Option<Box<dyn ImageFetcher>>,
    fallback_url: Option<String>,
    timeout: Duration,
}

impl AssetResolver {
    pub fn new(
        fetcher: Box<dyn ImageFetcher>,
        fallback_url: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher: Some(fetcher),
            fallback_url,
            timeout,
        }
    }

    /// Resolver backed by [`HttpImageFetcher`]. If the HTTP client cannot be
    /// built the resolver is disabled rather than failing.
    pub fn http(fallback_url: Option<String>, timeout: Duration) -> Self {
        match HttpImageFetcher::new(timeout) {
            Ok(fetcher) => Self::new(Box::new(fetcher), fallback_url, timeout),
            Err(e) => {
                warn!("HTTP client unavailable, images disabled: {e}");
                Self::disabled()
            }
        }
    }

    /// Resolver that never fetches and always yields "no image".
    pub fn disabled() -> Self {
        Self {
            fetcher: None,
            fallback_url: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Fetch and decode `preferred`, then the fallback source; `None` if both
    /// fail.
    pub async fn resolve(&self, preferred: Option<&str>) -> Option<ResolvedImage> {
        let fetcher = self.fetcher.as_deref()?;

        if let Some(url) = preferred.map(str::trim).filter(|u| !u.is_empty()) {
            match self.fetch_decoded(fetcher, url).await {
                Ok(image) => {
                    info!("Resolved recipe image {url} ({}x{})", image.px_width, image.px_height);
                    return Some(image);
                }
                Err(e) => warn!("Recipe image {url} unavailable: {e}"),
            }
        }

        let fallback = self.fallback_url.as_deref()?;
        match self.fetch_decoded(fetcher, fallback).await {
            Ok(image) => {
                info!("Using fallback image {fallback}");
                Some(image)
            }
            Err(e) => {
                warn!("Fallback image {fallback} unavailable, continuing without image: {e}");
                None
            }
        }
    }

    async fn fetch_decoded(
        &self,
        fetcher: &dyn ImageFetcher,
        url: &str,
    ) -> Result<ResolvedImage, FetchError> {
        debug!("Fetching image {url} (timeout {:?})", self.timeout);
        let bytes = tokio::time::timeout(self.timeout, fetcher.fetch(url))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;
        ResolvedImage::decode(bytes)
    }
}

/// Encode a solid-colour PNG, e.g. a placeholder raster for tests.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Result<Vec<u8>, image::ImageError> {
    let buffer = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(buffer)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
