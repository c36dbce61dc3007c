//! HTML-to-text conversion for rich-text fields.
//!
//! Timeline archives store post bodies and profile bios as HTML fragments.
//! [`sanitize`] turns such a fragment into a single line of plain text,
//! keeping link targets visible:
//!
//! ```
//! use tootpack::sanitize::sanitize;
//!
//! let html = r#"<p>Hello <a href="http://x">world</a></p>"#;
//! assert_eq!(sanitize(html), "Hello world (http://x)");
//! ```
//!
//! # Rules
//!
//! | Node | Rendering |
//! |------|-----------|
//! | text | literal text |
//! | `<a href="u">inner</a>` | `inner (u)` |
//! | `<a>` without `href` | children only |
//! | any other element | children only |
//!
//! Afterwards entities are decoded, whitespace runs collapse to one space
//! and the result is trimmed.

mod entities;
mod tokenizer;
mod tree;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

pub use entities::decode_entities;

use tree::Document;

/// Maximum number of simultaneously open elements in one fragment.
pub const MAX_NESTING_DEPTH: usize = 512;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Reasons a fragment cannot be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    /// The fragment opens more nested elements than allowed.
    #[error("HTML nesting exceeds {max} open elements")]
    NestingTooDeep { max: usize },
}

/// Converts an HTML fragment to plain text.
///
/// Never fails: if the fragment cannot be parsed, it is returned unchanged.
/// Use [`try_sanitize`] to observe that fallback.
///
/// ```
/// use tootpack::sanitize::sanitize;
///
/// assert_eq!(sanitize(""), "");
/// assert_eq!(sanitize("<p>a&amp;b</p>\n<p>  c </p>"), "a&b c");
/// ```
pub fn sanitize(fragment: &str) -> String {
    match try_sanitize(fragment) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(error = %e, len = fragment.len(), "keeping raw HTML fragment");
            fragment.to_string()
        }
    }
}

/// Converts an HTML fragment to plain text, reporting unparsable input.
pub fn try_sanitize(fragment: &str) -> Result<String, SanitizeError> {
    if fragment.is_empty() {
        return Ok(String::new());
    }

    let rendered = Document::parse(fragment)?.render();
    let decoded = decode_entities(&rendered);
    let collapsed = WHITESPACE_RUN.replace_all(&decoded, " ");

    Ok(collapsed.trim().to_string())
}

/// Sanitizes a JSON value: strings are converted, everything else
/// (including `null`) yields an empty string.
pub fn sanitize_value(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize(s),
        _ => String::new(),
    }
}
