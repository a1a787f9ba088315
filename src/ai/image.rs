//! Image Generation Client
//!
//! Resolves an image prompt to a hosted image URL. Handles both response
//! shapes of the images endpoint: a direct URL, or inline base64 bytes that
//! get side-loaded through the content repository's media storage.
//!
//! Failure policy differs from the text path on purpose: transport and API
//! failures are typed errors for the caller to capture, but storage failures
//! during side-load degrade to "no image". The job queue records any of
//! these on the payload without failing the job.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{Config, ImageConfig};
use crate::constants::{diagnostics, network};
use crate::publish::ContentRepository;
use crate::types::error::excerpt;
use crate::types::{AutopressError, Result};

/// Seam for the job queue: anything that can illustrate a prompt.
///
/// `Ok(None)` means "no image, carry on"; `Err` is captured non-fatally by
/// the queue as `image_preview_error`.
#[async_trait]
pub trait GenerateImage: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Option<String>>;
}

/// Images-endpoint client with media side-load support
pub struct ImageGenerator {
    api_key: SecretString,
    api_base: String,
    config: ImageConfig,
    media: Arc<dyn ContentRepository>,
    client: reqwest::Client,
}

impl std::fmt::Debug for ImageGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageGenerator")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.config.model)
            .finish()
    }
}

impl ImageGenerator {
    pub fn new(config: &Config, media: Arc<dyn ContentRepository>) -> Result<Self> {
        let api_key = config
            .api
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(AutopressError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.api.connect_timeout_secs))
            .timeout(Duration::from_secs(network::IMAGE_TIMEOUT_SECS))
            .build()
            .map_err(|e| AutopressError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: config.api.api_base.clone(),
            config: config.image.clone(),
            media,
            client,
        })
    }

    fn build_request(&self, prompt: &str) -> ImagesRequest {
        ImagesRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            size: self.config.size.clone(),
            style: self.config.style.clone(),
            quality: self.config.quality.clone(),
            n: 1,
            response_format: response_format_for(&self.config.model),
        }
    }

    /// Persist inline image bytes through the repository's media storage.
    ///
    /// Returns `None` on any decode or storage failure; image trouble never
    /// blocks the content job.
    async fn sideload(&self, b64: &str) -> Option<String> {
        let bytes = match BASE64.decode(b64) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Discarding undecodable inline image payload: {err}");
                return None;
            }
        };

        let filename = format!("generated-{}.png", uuid::Uuid::new_v4().simple());
        match self.media.store_media(bytes, &filename).await {
            Ok(url) => {
                info!("Side-loaded generated image as {filename}");
                Some(url)
            }
            Err(err) => {
                warn!("Media storage failed, continuing without image: {err}");
                None
            }
        }
    }
}

#[async_trait]
impl GenerateImage for ImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<Option<String>> {
        if prompt.trim().is_empty() {
            return Ok(None);
        }

        let url = format!("{}/images/generations", self.api_base);
        let request = self.build_request(prompt);

        debug!(model = %request.model, size = %request.size, "Sending image generation request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| AutopressError::Http(format!("image request failed: {e}")))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| AutopressError::Http(format!("failed to read image response: {e}")))?;

        if !status.is_success() {
            return Err(AutopressError::image_api(
                status.as_u16(),
                &raw,
                diagnostics::IMAGE_BODY_EXCERPT_CHARS,
            ));
        }

        let body: ImagesResponse = serde_json::from_str(&raw).map_err(|_| {
            AutopressError::InvalidImageResponse(format!(
                "undecodable image body: {}",
                excerpt(&raw, diagnostics::IMAGE_BODY_EXCERPT_CHARS)
            ))
        })?;

        if let Some(error) = body.error {
            return Err(AutopressError::ImageApi {
                status: status.as_u16(),
                body: excerpt(&error.message, diagnostics::IMAGE_BODY_EXCERPT_CHARS),
            });
        }

        // A transport-level success must still produce a result; an empty
        // data array is an upstream failure, not "no image available".
        let Some(first) = body.data.into_iter().flatten().next() else {
            return Err(AutopressError::InvalidImageResponse(
                "image endpoint returned an empty result set".to_string(),
            ));
        };

        if let Some(url) = first.url.filter(|url| !url.is_empty()) {
            return Ok(Some(url));
        }

        if let Some(b64) = first.b64_json.filter(|b64| !b64.is_empty()) {
            return Ok(self.sideload(&b64).await);
        }

        Ok(None)
    }
}

/// dall-e-3 can return either shape; pin the URL form explicitly so the
/// common path avoids a side-load. Older models reject the parameter.
fn response_format_for(model: &str) -> Option<String> {
    model.starts_with("dall-e-3").then(|| "url".to_string())
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ImagesRequest {
    model: String,
    prompt: String,
    size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<String>,
    n: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Option<Vec<ImageData>>,
    error: Option<ImageApiError>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageApiError {
    #[serde(default)]
    message: String,
}
