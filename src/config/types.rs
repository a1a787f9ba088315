//! Configuration Types
//!
//! One immutable configuration object, dependency-injected into every
//! component constructor. No component reads settings from anywhere else.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{limits, network, queue as queue_constants};
use crate::types::{AutopressError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials and endpoints
    pub api: ApiConfig,

    /// Text-generation settings
    pub text: TextConfig,

    /// Image-generation settings
    pub image: ImageConfig,

    /// Article defaults used when a request leaves fields unset
    pub article: ArticleConfig,

    /// Job queue settings
    pub queue: QueueConfig,

    /// Usage accounting settings
    pub usage: UsageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            text: TextConfig::default(),
            image: ImageConfig::default(),
            article: ArticleConfig::default(),
            queue: QueueConfig::default(),
            usage: UsageConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `AutopressError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(limits::MIN_TEMPERATURE..=limits::MAX_TEMPERATURE).contains(&self.text.temperature) {
            return Err(AutopressError::Config(format!(
                "text.temperature must be between {} and {}, got {}",
                limits::MIN_TEMPERATURE,
                limits::MAX_TEMPERATURE,
                self.text.temperature
            )));
        }

        if !(limits::MIN_MAX_TOKENS..=limits::MAX_MAX_TOKENS).contains(&self.text.max_tokens) {
            return Err(AutopressError::Config(format!(
                "text.max_tokens must be between {} and {}, got {}",
                limits::MIN_MAX_TOKENS,
                limits::MAX_MAX_TOKENS,
                self.text.max_tokens
            )));
        }

        if self.queue.job_ttl_secs == 0 {
            return Err(AutopressError::Config(
                "queue.job_ttl_secs must be greater than 0".to_string(),
            ));
        }

        if self.text.model.trim().is_empty() {
            return Err(AutopressError::Config(
                "text.model must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// API Configuration
// =============================================================================

/// Credentials and endpoint bases.
///
/// The API key is never serialized to output and is redacted in debug output.
/// Components convert it to SecretString internally for runtime protection.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API key; falls back to the OPENAI_API_KEY env var when unset
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL for the OpenAI-compatible API
    pub api_base: String,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://api.openai.com/v1".to_string(),
            connect_timeout_secs: network::CONNECTION_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Text Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Chat model used for article generation
    pub model: String,

    /// Sampling temperature (0.0 = deterministic, 2.0 = maximum)
    pub temperature: f32,

    /// Maximum output tokens per completion
    pub max_tokens: u32,

    /// Override for the JSON-only system instruction; the built-in template
    /// is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            system_prompt: None,
        }
    }
}

// =============================================================================
// Image Generation Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Whether completed articles get an illustration
    pub enabled: bool,

    /// Image model name
    pub model: String,

    /// Output size, e.g. "1024x1024"
    pub size: String,

    /// Rendering style ("vivid" or "natural" for dall-e-3)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// Output quality ("standard" or "hd" for dall-e-3)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            style: None,
            quality: None,
        }
    }
}

// =============================================================================
// Article Defaults
// =============================================================================

/// Defaults merged into a request wherever it leaves a field unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleConfig {
    pub topic: String,
    pub language: String,
    pub style: String,
    pub tone: String,
    pub paragraphs: u32,
    pub words_per_paragraph: u32,
    /// Free-form SEO guidance appended to every user instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_hint: Option<String>,
    /// Tags always attached to generated articles
    pub fixed_tags: Vec<String>,
}

impl Default for ArticleConfig {
    fn default() -> Self {
        Self {
            topic: "Technology".to_string(),
            language: "en-US".to_string(),
            style: "Informative".to_string(),
            tone: "Neutral".to_string(),
            paragraphs: 3,
            words_per_paragraph: 120,
            seo_hint: None,
            fixed_tags: Vec::new(),
        }
    }
}

// =============================================================================
// Queue & Usage Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Retention window for job status records (seconds)
    pub job_ttl_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            job_ttl_secs: queue_constants::JOB_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    /// Path of the SQLite usage log
    pub db_path: PathBuf,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(".autopress/usage.db"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
