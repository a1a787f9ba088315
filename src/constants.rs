//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Job queue constants
pub mod queue {
    /// Retention window for job status records (seconds)
    pub const JOB_TTL_SECS: u64 = 600;

    /// Prefix for generated job ids
    pub const JOB_ID_PREFIX: &str = "job_";
}

/// HTTP/Network constants
pub mod network {
    /// Base request timeout before token scaling (seconds)
    pub const BASE_TIMEOUT_SECS: u64 = 60;

    /// Additional timeout granted per 1000 max output tokens (seconds)
    pub const TIMEOUT_SECS_PER_1K_TOKENS: u64 = 30;

    /// Absolute ceiling for a single request timeout (seconds)
    pub const MAX_TIMEOUT_SECS: u64 = 600;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// Timeout for image generation requests (seconds)
    pub const IMAGE_TIMEOUT_SECS: u64 = 120;
}

/// Content normalization constants
pub mod content {
    /// Maximum length of the SEO description (characters)
    pub const SEO_DESC_MAX_CHARS: usize = 160;

    /// Maximum length of the image prompt (characters)
    pub const IMAGE_PROMPT_MAX_CHARS: usize = 1000;

    /// Maximum number of tags attached to an article
    pub const MAX_TAGS: usize = 10;

    /// Placeholder used when the model omits a title
    pub const UNTITLED_PLACEHOLDER: &str = "Untitled";
}

/// Error diagnostics constants
pub mod diagnostics {
    /// Maximum excerpt of a text-endpoint error body carried in errors (characters)
    pub const TEXT_BODY_EXCERPT_CHARS: usize = 300;

    /// Maximum excerpt of an image-endpoint error body carried in errors (characters)
    pub const IMAGE_BODY_EXCERPT_CHARS: usize = 500;
}

/// Request validation bounds
pub mod limits {
    /// Paragraph count bounds per article
    pub const MIN_PARAGRAPHS: u32 = 1;
    pub const MAX_PARAGRAPHS: u32 = 10;

    /// Words-per-paragraph bounds
    pub const MIN_WORDS_PER_PARAGRAPH: u32 = 50;
    pub const MAX_WORDS_PER_PARAGRAPH: u32 = 400;

    /// Max-output-token bounds
    pub const MIN_MAX_TOKENS: u32 = 50;
    pub const MAX_MAX_TOKENS: u32 = 8000;

    /// Temperature bounds accepted by the chat endpoint
    pub const MIN_TEMPERATURE: f32 = 0.0;
    pub const MAX_TEMPERATURE: f32 = 2.0;
}
