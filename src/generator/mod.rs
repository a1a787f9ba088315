//! Content Generator
//!
//! Turns a [`GenerationRequest`] into validated [`GeneratedContent`]:
//! resolves the request against configuration defaults, builds the prompts,
//! calls the chat endpoint, accounts token usage, recovers the JSON payload,
//! and normalizes it into the strict output shape.
//!
//! Usage is recorded *before* content parsing: the billable call happened
//! whether or not the payload turns out usable. Recording is best-effort; a
//! failing usage store is logged and never fails the generation.

pub mod html;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::ai::{ArticlePrompt, ChatClient, ChatParams, extract_json};
use crate::config::Config;
use crate::constants::{content as content_constants, limits};
use crate::types::{AutopressError, GeneratedContent, GenerationRequest, RawArticle, Result};
use crate::usage::UsageTracker;

use html::{sanitize_html, sanitize_text, truncate_chars};

/// Seam for the job queue: anything that can produce a validated article.
#[async_trait]
pub trait GenerateArticle: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent>;
}

/// Request after merging with configuration defaults and clamping bounds.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub topic: String,
    pub language: String,
    pub style: String,
    pub tone: String,
    pub paragraphs: u32,
    pub words_per_paragraph: u32,
    pub max_tokens: u32,
    pub model: String,
    pub temperature: f32,
    pub seo_hint: Option<String>,
    pub fixed_tags: Vec<String>,
}

/// Merge a caller request with the article defaults, clamping numeric
/// fields to their accepted ranges.
pub fn resolve_request(config: &Config, request: &GenerationRequest) -> ResolvedRequest {
    let article = &config.article;
    ResolvedRequest {
        topic: request.topic.clone().unwrap_or_else(|| article.topic.clone()),
        language: request
            .language
            .clone()
            .unwrap_or_else(|| article.language.clone()),
        style: request.style.clone().unwrap_or_else(|| article.style.clone()),
        tone: request.tone.clone().unwrap_or_else(|| article.tone.clone()),
        paragraphs: request
            .paragraphs
            .unwrap_or(article.paragraphs)
            .clamp(limits::MIN_PARAGRAPHS, limits::MAX_PARAGRAPHS),
        words_per_paragraph: request
            .words_per_paragraph
            .unwrap_or(article.words_per_paragraph)
            .clamp(
                limits::MIN_WORDS_PER_PARAGRAPH,
                limits::MAX_WORDS_PER_PARAGRAPH,
            ),
        max_tokens: request
            .max_tokens
            .unwrap_or(config.text.max_tokens)
            .clamp(limits::MIN_MAX_TOKENS, limits::MAX_MAX_TOKENS),
        model: request
            .model
            .clone()
            .unwrap_or_else(|| config.text.model.clone()),
        temperature: request.temperature.unwrap_or(config.text.temperature),
        seo_hint: request
            .seo_hint
            .clone()
            .or_else(|| article.seo_hint.clone()),
        fixed_tags: request
            .fixed_tags
            .clone()
            .unwrap_or_else(|| article.fixed_tags.clone()),
    }
}

/// Normalize a recovered JSON payload into the strict content shape.
///
/// Tolerant of missing title (placeholder) and loose tag shapes; the one
/// hard requirement is a body that survives the HTML policy.
pub fn normalize(value: Value) -> Result<GeneratedContent> {
    let raw: RawArticle = serde_json::from_value(value)
        .map_err(|e| AutopressError::JsonParse(format!("unexpected payload shape: {e}")))?;

    let title = {
        let cleaned = sanitize_text(&raw.title.unwrap_or_default());
        if cleaned.is_empty() {
            content_constants::UNTITLED_PLACEHOLDER.to_string()
        } else {
            cleaned
        }
    };

    let content_html = sanitize_html(&raw.content_html.unwrap_or_default());
    if content_html.is_empty() {
        return Err(AutopressError::ContentEmpty);
    }

    let seo_desc = truncate_chars(
        &sanitize_text(&raw.seo_desc.unwrap_or_default()),
        content_constants::SEO_DESC_MAX_CHARS,
    );

    let tags: Vec<String> = raw
        .tags
        .map(|field| field.into_raw_tags())
        .unwrap_or_default()
        .into_iter()
        .map(|tag| sanitize_text(&tag))
        .filter(|tag| !tag.is_empty())
        .take(content_constants::MAX_TAGS)
        .collect();

    let image_prompt = truncate_chars(
        &sanitize_text(&raw.image_prompt.unwrap_or_default()),
        content_constants::IMAGE_PROMPT_MAX_CHARS,
    );

    Ok(GeneratedContent {
        title,
        content_html,
        seo_desc,
        tags,
        image_prompt,
        image_preview_url: None,
        image_preview_error: None,
    })
}

/// Chat-backed article generator
pub struct ContentGenerator {
    client: ChatClient,
    usage: Arc<UsageTracker>,
    config: Arc<Config>,
}

impl ContentGenerator {
    pub fn new(config: Arc<Config>, usage: Arc<UsageTracker>) -> Result<Self> {
        let client = ChatClient::new(&config)?;
        Ok(Self {
            client,
            usage,
            config,
        })
    }
}

#[async_trait]
impl GenerateArticle for ContentGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent> {
        let resolved = resolve_request(&self.config, request);

        let prompt = ArticlePrompt {
            topic: resolved.topic.clone(),
            language: resolved.language.clone(),
            style: resolved.style.clone(),
            tone: resolved.tone.clone(),
            paragraphs: resolved.paragraphs,
            words_per_paragraph: resolved.words_per_paragraph,
            seo_hint: resolved.seo_hint.clone(),
            fixed_tags: resolved.fixed_tags.clone(),
            system_override: self.config.text.system_prompt.clone(),
        };

        debug!(topic = %resolved.topic, model = %resolved.model, "Generating article");

        let completion = self
            .client
            .complete(ChatParams {
                model: resolved.model,
                system: prompt.system(),
                user: prompt.user(),
                max_tokens: resolved.max_tokens,
                temperature: resolved.temperature,
            })
            .await?;

        // Account the call before parsing; it is billable either way.
        if let Err(err) = self.usage.record(
            &completion.model,
            completion.prompt_tokens,
            completion.completion_tokens,
        ) {
            warn!("Usage recording failed, continuing: {err}");
        }

        let payload = extract_json(&completion.content)?;
        normalize(payload)
    }
}
