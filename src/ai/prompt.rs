//! Article Prompt Construction
//!
//! Two instructions per generation: a system instruction pinning the exact
//! JSON output contract, and a user instruction interpolating the resolved
//! request. The system template may be overridden from configuration; the
//! field list is part of the contract with the normalizer and must not drift
//! from [`crate::types::RawArticle`].

/// Built-in system instruction enforcing JSON-only output with exact fields.
const DEFAULT_SYSTEM_PROMPT: &str = r#"Act as a senior SEO and content marketing specialist.
Your task is to write highly engaging, well-optimized blog articles.

FORMAT RULES (CRITICAL - DO NOT DEVIATE):
1. Respond ONLY with valid JSON. No markdown fences, no commentary.
2. Required structure:
{
    "title": "Optimized H1 title (max 70 chars)",
    "content_html": "HTML using <h2>, <h3>, <p>, <ul>, <li>, <strong> tags.",
    "seo_desc": "Meta description (max 155 chars)",
    "tags": ["tag1", "tag2", "tag3"],
    "image_prompt": "Detailed English prompt for an image model"
}"#;

/// Fully-resolved prompt inputs for one article.
#[derive(Debug, Clone)]
pub struct ArticlePrompt {
    pub topic: String,
    pub language: String,
    pub style: String,
    pub tone: String,
    pub paragraphs: u32,
    pub words_per_paragraph: u32,
    pub seo_hint: Option<String>,
    pub fixed_tags: Vec<String>,
    pub system_override: Option<String>,
}

impl ArticlePrompt {
    /// System instruction: the configured override when present and
    /// non-blank, the built-in template otherwise.
    pub fn system(&self) -> String {
        match &self.system_override {
            Some(template) if !template.trim().is_empty() => template.clone(),
            _ => DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// User instruction interpolated from the resolved request.
    pub fn user(&self) -> String {
        let mut prompt = format!(
            "Write a complete article on the topic: \"{}\".\n\
             Context: language {}, style {}, tone {}.\n\
             Structure: {} sections of approx. {} words each.\n\
             Produce the JSON exactly as specified in the system instructions.",
            self.topic,
            self.language,
            self.style,
            self.tone,
            self.paragraphs,
            self.words_per_paragraph,
        );

        if let Some(hint) = &self.seo_hint
            && !hint.trim().is_empty()
        {
            prompt.push_str(&format!("\nSEO guidance: {}", hint.trim()));
        }

        if !self.fixed_tags.is_empty() {
            prompt.push_str(&format!(
                "\nAlways include these tags: {}.",
                self.fixed_tags.join(", ")
            ));
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ArticlePrompt {
        ArticlePrompt {
            topic: "Rust async runtimes".to_string(),
            language: "en-US".to_string(),
            style: "Informative".to_string(),
            tone: "Neutral".to_string(),
            paragraphs: 3,
            words_per_paragraph: 120,
            seo_hint: None,
            fixed_tags: Vec::new(),
            system_override: None,
        }
    }

    #[test]
    fn test_system_default_pins_json_contract() {
        let system = sample().system();
        assert!(system.contains("ONLY with valid JSON"));
        for field in ["title", "content_html", "seo_desc", "tags", "image_prompt"] {
            assert!(system.contains(field), "missing field {field}");
        }
    }

    #[test]
    fn test_system_override_wins_unless_blank() {
        let mut prompt = sample();
        prompt.system_override = Some("Custom instructions".to_string());
        assert_eq!(prompt.system(), "Custom instructions");

        prompt.system_override = Some("   ".to_string());
        assert!(prompt.system().contains("ONLY with valid JSON"));
    }

    #[test]
    fn test_user_interpolates_request() {
        let user = sample().user();
        assert!(user.contains("Rust async runtimes"));
        assert!(user.contains("3 sections"));
        assert!(user.contains("120 words"));
    }

    #[test]
    fn test_user_appends_seo_hint_and_tags() {
        let mut prompt = sample();
        prompt.seo_hint = Some("target long-tail keywords".to_string());
        prompt.fixed_tags = vec!["rust".to_string(), "async".to_string()];
        let user = prompt.user();
        assert!(user.contains("target long-tail keywords"));
        assert!(user.contains("rust, async"));
    }
}
