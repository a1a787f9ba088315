//! Safe-Subset HTML Policy
//!
//! Model output is untrusted markup. Before an article body is accepted it
//! passes an allowlist filter: script/style subtrees and comments are
//! removed outright, unknown tags are stripped (their text kept), and kept
//! tags lose every attribute except a small per-tag allowlist. URL-bearing
//! attributes reject the `javascript:` and `data:` schemes.
//!
//! Also hosts the plain-text sanitizer applied to titles, descriptions,
//! tags, and image prompts.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script pattern is valid")
});

static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("style pattern is valid")
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<\s*(/?)\s*([a-zA-Z][a-zA-Z0-9]*)((?:"[^"]*"|'[^']*'|[^>])*)>"#)
        .expect("tag pattern is valid")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z][a-zA-Z0-9-]*)\s*=\s*("[^"]*"|'[^']*'|[^\s>/]+)"#)
        .expect("attr pattern is valid")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("any-tag pattern is valid"));

const ALLOWED_TAGS: &[&str] = &[
    "p",
    "br",
    "hr",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "strong",
    "em",
    "b",
    "i",
    "u",
    "s",
    "a",
    "ul",
    "ol",
    "li",
    "blockquote",
    "code",
    "pre",
    "img",
    "figure",
    "figcaption",
    "table",
    "thead",
    "tbody",
    "tr",
    "th",
    "td",
    "span",
];

/// Attributes a kept tag may retain.
fn allowed_attrs(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href", "title", "rel"],
        "img" => &["src", "alt", "title", "width", "height"],
        _ => &["title"],
    }
}

/// Whether a URL-bearing attribute value is acceptable.
fn safe_url(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    !(lowered.starts_with("javascript:") || lowered.starts_with("data:"))
}

/// Apply the safe-subset policy to an article body.
///
/// The result is trimmed; an empty result means the body carried nothing
/// acceptable and the caller must treat the article as invalid.
pub fn sanitize_html(html: &str) -> String {
    let no_scripts = SCRIPT_BLOCK.replace_all(html, "");
    let no_styles = STYLE_BLOCK.replace_all(&no_scripts, "");
    let no_comments = COMMENT.replace_all(&no_styles, "");

    TAG.replace_all(&no_comments, |caps: &Captures<'_>| {
        let closing = !caps[1].is_empty();
        let tag = caps[2].to_ascii_lowercase();

        if !ALLOWED_TAGS.contains(&tag.as_str()) {
            return String::new();
        }

        if closing {
            return format!("</{tag}>");
        }

        let mut rebuilt = format!("<{tag}");
        for attr in ATTR.captures_iter(&caps[3]) {
            let name = attr[1].to_ascii_lowercase();
            if !allowed_attrs(&tag).contains(&name.as_str()) {
                continue;
            }
            let raw_value = attr[2].trim_matches(['"', '\'']);
            if matches!(name.as_str(), "href" | "src") && !safe_url(raw_value) {
                continue;
            }
            rebuilt.push_str(&format!(" {name}=\"{}\"", raw_value.replace('"', "&quot;")));
        }

        if caps[3].trim_end().ends_with('/') {
            rebuilt.push_str(" /");
        }
        rebuilt.push('>');
        rebuilt
    })
    .trim()
    .to_string()
}

/// Sanitize a single-line text field: strip tags, drop control characters,
/// collapse whitespace runs, trim.
pub fn sanitize_text(text: &str) -> String {
    let no_tags = ANY_TAG.replace_all(text, " ");
    let printable: String = no_tags.chars().filter(|c| !c.is_control()).collect();
    printable.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters on a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
