//! Pipeline Domain Types
//!
//! Request, payload, and job-status shapes shared across the pipeline.
//!
//! `JobRecord` is the wire shape the polling accessor returns, tagged by a
//! `status` field so clients can branch without inspecting optional fields.
//! `RawArticle` is the loose intermediate the model output is decoded into
//! before normalization; the strict `GeneratedContent` is produced from it.

use serde::{Deserialize, Serialize};

// =============================================================================
// Generation Request
// =============================================================================

/// Caller-supplied generation parameters.
///
/// Every field is optional; unset fields resolve against the article defaults
/// in the configuration. Consumed once per dispatched job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    /// Article topic
    pub topic: Option<String>,
    /// Output language (e.g. "en-US")
    pub language: Option<String>,
    /// Writing style (e.g. "informative")
    pub style: Option<String>,
    /// Tone of voice (e.g. "neutral")
    pub tone: Option<String>,
    /// Number of sections to request
    pub paragraphs: Option<u32>,
    /// Approximate words per section
    pub words_per_paragraph: Option<u32>,
    /// Maximum output tokens for the completion
    pub max_tokens: Option<u32>,
    /// Text model override
    pub model: Option<String>,
    /// Sampling temperature override
    pub temperature: Option<f32>,
    /// Free-form SEO guidance appended to the user instruction
    pub seo_hint: Option<String>,
    /// Tags always attached to the article, independent of model output
    pub fixed_tags: Option<Vec<String>>,
}

// =============================================================================
// Generated Content
// =============================================================================

/// Validated article payload produced by the Content Generator.
///
/// Invariant: `content_html` is non-empty. An empty body never reaches this
/// type; normalization rejects it with `content_empty` first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub content_html: String,
    pub seo_desc: String,
    pub tags: Vec<String>,
    pub image_prompt: String,
    /// Resolved image URL, set only when illustration succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_preview_url: Option<String>,
    /// Non-fatal illustration failure, captured without failing the job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_preview_error: Option<String>,
}

/// Loose article shape as decoded from model output, before normalization.
///
/// Field presence and types are whatever the model produced; the tags field
/// in particular arrives as either a list or a comma-joined string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawArticle {
    pub title: Option<String>,
    pub content_html: Option<String>,
    pub seo_desc: Option<String>,
    pub tags: Option<TagsField>,
    pub image_prompt: Option<String>,
}

/// Tags as emitted by the model: a proper list or one comma-joined string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsField {
    List(Vec<String>),
    Joined(String),
}

impl TagsField {
    /// Flatten to raw tag strings, splitting the joined form on commas.
    /// No sanitization or capping happens here.
    pub fn into_raw_tags(self) -> Vec<String> {
        match self {
            Self::List(tags) => tags,
            Self::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        }
    }
}

// =============================================================================
// Job Records
// =============================================================================

/// Opaque job identifier returned by dispatch and accepted by polling.
pub type JobId = String;

/// Status record held in the TTL store and returned to pollers.
///
/// Transitions exactly once from `Processing` to a terminal variant and is
/// read-only afterwards. An expired or unknown id is reported as an `Error`
/// record with code `expired`, minted by the accessor rather than the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobRecord {
    Processing,
    Completed { data: GeneratedContent },
    Error { code: String, message: String },
}

impl JobRecord {
    /// Error record for a status key the TTL store no longer holds.
    pub fn expired() -> Self {
        Self::Error {
            code: "expired".to_string(),
            message: "Job expired or unknown. Dispatch a new job and poll its id.".to_string(),
        }
    }

    /// Whether this record will no longer change before expiry.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_record_serde_tagging() {
        let record = JobRecord::Error {
            code: "json_parse_error".to_string(),
            message: "Invalid JSON".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "json_parse_error");

        let processing = serde_json::to_value(JobRecord::Processing).unwrap();
        assert_eq!(processing["status"], "processing");
    }

    #[test]
    fn test_job_record_terminal() {
        assert!(!JobRecord::Processing.is_terminal());
        assert!(JobRecord::expired().is_terminal());
    }

    #[test]
    fn test_tags_field_accepts_both_shapes() {
        let list: RawArticle = serde_json::from_value(serde_json::json!({
            "tags": ["a", "b", "c"]
        }))
        .unwrap();
        let joined: RawArticle = serde_json::from_value(serde_json::json!({
            "tags": "a, b, c"
        }))
        .unwrap();

        assert_eq!(
            list.tags.unwrap().into_raw_tags(),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            joined.tags.unwrap().into_raw_tags(),
            vec!["a", " b", " c"]
        );
    }

    #[test]
    fn test_raw_article_tolerates_missing_fields() {
        let raw: RawArticle = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(raw.title.is_none());
        assert!(raw.tags.is_none());
    }
}
