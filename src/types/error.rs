//! Unified Error Type System
//!
//! Centralized error types for the entire pipeline.
//! Every variant maps to a stable taxonomy code via [`AutopressError::kind`];
//! those codes are what error-status job records and logs carry, so they must
//! not change between releases.
//!
//! ## Design Principles
//!
//! - Single unified error type (AutopressError) for the entire crate
//! - Structured variants with bounded diagnostic payloads
//! - Upstream response bodies are excerpted, never stored whole
//! - No panic/unwrap - all errors are recoverable

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum AutopressError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Credential / Configuration
    // -------------------------------------------------------------------------
    #[error("API key missing: set it in the configuration or the OPENAI_API_KEY env var")]
    MissingApiKey,

    #[error("Config error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Text-Generation Errors
    // -------------------------------------------------------------------------
    /// Transport-level failure before any HTTP status was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-2xx response from the text endpoint; `body` is a bounded excerpt
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// 2xx response that carried an explicit `error` object
    #[error("OpenAI: {0}")]
    OpenAi(String),

    /// 2xx response missing the expected fields
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No candidate substring of the model output parsed as JSON
    #[error("Invalid JSON in model output: {0}")]
    JsonParse(String),

    /// Parsed successfully but the HTML body sanitized to nothing
    #[error("Generated HTML body is empty")]
    ContentEmpty,

    // -------------------------------------------------------------------------
    // Image-Generation Errors
    // -------------------------------------------------------------------------
    /// Non-2xx response from the image endpoint; `body` is a bounded excerpt
    #[error("Image API error ({status}): {body}")]
    ImageApi { status: u16, body: String },

    /// 2xx image response missing a usable result (including an empty data array)
    #[error("Invalid image response: {0}")]
    InvalidImageResponse(String),

    // -------------------------------------------------------------------------
    // Infrastructure Errors
    // -------------------------------------------------------------------------
    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Job could not be submitted to the background worker
    #[error("Job queue unavailable: {0}")]
    QueueClosed(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, AutopressError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl AutopressError {
    /// Stable taxonomy code for this error.
    ///
    /// Non-2xx upstream responses encode their status (`api_502`); everything
    /// else maps to a fixed identifier. These codes appear in error-status
    /// job records and must stay stable.
    pub fn kind(&self) -> String {
        match self {
            Self::Io(_) => "io_error".to_string(),
            Self::Database(_) | Self::Storage(_) => "storage_error".to_string(),
            Self::Json(_) | Self::JsonParse(_) => "json_parse_error".to_string(),
            Self::MissingApiKey => "no_key".to_string(),
            Self::Config(_) => "config_error".to_string(),
            Self::Http(_) => "http_error".to_string(),
            Self::Api { status, .. } => format!("api_{status}"),
            Self::OpenAi(_) => "openai_error".to_string(),
            Self::InvalidResponse(_) => "invalid_response".to_string(),
            Self::ContentEmpty => "content_empty".to_string(),
            Self::ImageApi { .. } => "api_error".to_string(),
            Self::InvalidImageResponse(_) => "invalid_image_response".to_string(),
            Self::Timeout { .. } => "timeout".to_string(),
            Self::QueueClosed(_) => "queue_closed".to_string(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Non-2xx text-endpoint error with a bounded body excerpt
    pub fn api(status: u16, raw_body: &str, max_chars: usize) -> Self {
        Self::Api {
            status,
            body: excerpt(raw_body, max_chars),
        }
    }

    /// Non-2xx image-endpoint error with a bounded body excerpt
    pub fn image_api(status: u16, raw_body: &str, max_chars: usize) -> Self {
        Self::ImageApi {
            status,
            body: excerpt(raw_body, max_chars),
        }
    }
}

/// Collapse whitespace runs and truncate to `max_chars` characters.
///
/// Applied to upstream response bodies before they are carried in errors, so
/// diagnostics stay bounded no matter what the endpoint returned.
pub fn excerpt(raw: &str, max_chars: usize) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        collapsed.chars().take(max_chars).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_stable() {
        assert_eq!(AutopressError::MissingApiKey.kind(), "no_key");
        assert_eq!(AutopressError::Http("conn reset".into()).kind(), "http_error");
        assert_eq!(
            AutopressError::Api {
                status: 429,
                body: "rate limited".into()
            }
            .kind(),
            "api_429"
        );
        assert_eq!(AutopressError::OpenAi("bad".into()).kind(), "openai_error");
        assert_eq!(
            AutopressError::InvalidResponse("no choices".into()).kind(),
            "invalid_response"
        );
        assert_eq!(
            AutopressError::JsonParse("nope".into()).kind(),
            "json_parse_error"
        );
        assert_eq!(AutopressError::ContentEmpty.kind(), "content_empty");
        assert_eq!(
            AutopressError::ImageApi {
                status: 500,
                body: "boom".into()
            }
            .kind(),
            "api_error"
        );
        assert_eq!(
            AutopressError::InvalidImageResponse("empty data".into()).kind(),
            "invalid_image_response"
        );
    }

    #[test]
    fn test_excerpt_collapses_whitespace() {
        assert_eq!(excerpt("  a\n\n  b\t c  ", 300), "a b c");
    }

    #[test]
    fn test_excerpt_truncates_to_char_budget() {
        let long = "x".repeat(1000);
        assert_eq!(excerpt(&long, 300).chars().count(), 300);
    }

    #[test]
    fn test_excerpt_char_boundary_safe() {
        let multibyte = "é".repeat(400);
        let out = excerpt(&multibyte, 300);
        assert_eq!(out.chars().count(), 300);
    }

    #[test]
    fn test_api_error_bounds_body() {
        let err = AutopressError::api(502, &"junk ".repeat(200), 300);
        match err {
            AutopressError::Api { status, body } => {
                assert_eq!(status, 502);
                assert!(body.chars().count() <= 300);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
