//! Configuration types for the merge pipeline.
//!
//! This module provides plain configuration structs for library usage,
//! without any CLI framework dependencies.
//!
//! - [`MergeConfig`] - field names, key predicates and streaming settings
//! - [`RichTextKeys`] - which keys hold HTML that must be sanitized
//!
//! # Example
//!
//! ```rust
//! use tootpack::config::{MergeConfig, RichTextKeys};
//! use tootpack::streaming::StreamingConfig;
//!
//! let config = MergeConfig::new()
//!     .with_timestamp_field("published")
//!     .with_rich_text_keys(RichTextKeys::new(["content", "note", "summary"]))
//!     .with_streaming(StreamingConfig::new().with_buffer_size(256 * 1024));
//!
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, TootpackError};
use crate::streaming::StreamingConfig;

/// Default timestamp field used for ordering.
pub const DEFAULT_TIMESTAMP_FIELD: &str = "created_at";

/// Default identifier field used for deduplication.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Case-insensitive predicate selecting rich-text keys.
///
/// A key matches when its lowercase form contains any of the patterns, so
/// the defaults cover `content`, `note`, `Content` and `spoiler_note` alike.
///
/// ```
/// use tootpack::config::RichTextKeys;
///
/// let keys = RichTextKeys::default();
/// assert!(keys.matches("content"));
/// assert!(keys.matches("NOTE"));
/// assert!(!keys.matches("created_at"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichTextKeys {
    patterns: Vec<String>,
}

impl Default for RichTextKeys {
    fn default() -> Self {
        Self::new(["content", "note"])
    }
}

impl RichTextKeys {
    /// Builds a predicate from patterns; patterns are lowercased.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Returns `true` if `key` denotes a rich-text field.
    pub fn matches(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.patterns.iter().any(|p| key.contains(p.as_str()))
    }

    /// The configured patterns (lowercase).
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Configuration for a merge run.
///
/// # Example
///
/// ```rust
/// use tootpack::config::MergeConfig;
///
/// let config = MergeConfig::new().with_id_field("uri");
/// assert_eq!(config.id_field, "uri");
/// assert_eq!(config.timestamp_field, "created_at");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Field holding the sort timestamp (default: `created_at`)
    pub timestamp_field: String,

    /// Field holding the dedup identifier (default: `id`)
    pub id_field: String,

    /// Keys whose string values are sanitized (default: `content`, `note`)
    pub rich_text_keys: RichTextKeys,

    /// Keys removed at every depth (default: `content_clean`)
    pub drop_keys: Vec<String>,

    /// Decoder settings
    pub streaming: StreamingConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            timestamp_field: DEFAULT_TIMESTAMP_FIELD.to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            rich_text_keys: RichTextKeys::default(),
            drop_keys: vec!["content_clean".to_string()],
            streaming: StreamingConfig::default(),
        }
    }
}

impl MergeConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timestamp field.
    #[must_use]
    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = field.into();
        self
    }

    /// Sets the identifier field.
    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Replaces the rich-text key predicate.
    #[must_use]
    pub fn with_rich_text_keys(mut self, keys: RichTextKeys) -> Self {
        self.rich_text_keys = keys;
        self
    }

    /// Replaces the list of dropped keys.
    #[must_use]
    pub fn with_drop_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the decoder settings.
    #[must_use]
    pub fn with_streaming(mut self, streaming: StreamingConfig) -> Self {
        self.streaming = streaming;
        self
    }

    /// Returns `true` if `key` must be removed from records.
    pub fn is_dropped(&self, key: &str) -> bool {
        self.drop_keys.iter().any(|k| k == key)
    }

    /// Checks the configuration for values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.timestamp_field.trim().is_empty() {
            return Err(TootpackError::invalid_config(
                "timestamp field must not be empty",
            ));
        }
        if self.id_field.trim().is_empty() {
            return Err(TootpackError::invalid_config("id field must not be empty"));
        }
        if self.rich_text_keys.patterns().is_empty() {
            return Err(TootpackError::invalid_config(
                "at least one rich-text key pattern is required",
            ));
        }
        if self.rich_text_keys.patterns().iter().any(String::is_empty) {
            return Err(TootpackError::invalid_config(
                "rich-text key patterns must not be empty",
            ));
        }
        if self.drop_keys.iter().any(String::is_empty) {
            return Err(TootpackError::invalid_config("dropped keys must not be empty"));
        }
        if self.drop_keys.contains(&self.id_field) {
            return Err(TootpackError::invalid_config(format!(
                "id field '{}' cannot also be dropped",
                self.id_field
            )));
        }
        if self.streaming.buffer_size == 0 {
            return Err(TootpackError::invalid_config("buffer size must be positive"));
        }
        if self.streaming.max_record_size == 0 {
            return Err(TootpackError::invalid_config(
                "max record size must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_config_defaults() {
        let config = MergeConfig::default();
        assert_eq!(config.timestamp_field, "created_at");
        assert_eq!(config.id_field, "id");
        assert_eq!(config.drop_keys, vec!["content_clean"]);
        assert_eq!(config.rich_text_keys.patterns(), &["content", "note"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_config_builder() {
        let config = MergeConfig::new()
            .with_timestamp_field("published")
            .with_id_field("uri")
            .with_drop_keys(["content_clean", "tmp"])
            .with_streaming(StreamingConfig::new().with_progress_interval(5));

        assert_eq!(config.timestamp_field, "published");
        assert_eq!(config.id_field, "uri");
        assert!(config.is_dropped("tmp"));
        assert!(!config.is_dropped("content"));
        assert_eq!(config.streaming.progress_interval, 5);
    }

    #[test]
    fn test_rich_text_keys_matching() {
        let keys = RichTextKeys::default();
        assert!(keys.matches("content"));
        assert!(keys.matches("Content"));
        assert!(keys.matches("spoiler_note"));
        assert!(keys.matches("content_map"));
        assert!(!keys.matches("id"));
        assert!(!keys.matches("url"));

        let custom = RichTextKeys::new(["Summary"]);
        assert!(custom.matches("summary"));
        assert!(!custom.matches("content"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            MergeConfig::new().with_timestamp_field(""),
            MergeConfig::new().with_id_field("  "),
            MergeConfig::new().with_rich_text_keys(RichTextKeys::new(Vec::<String>::new())),
            MergeConfig::new().with_rich_text_keys(RichTextKeys::new([""])),
            MergeConfig::new().with_drop_keys([""]),
            MergeConfig::new().with_drop_keys(["id"]),
            MergeConfig::new().with_streaming(StreamingConfig::new().with_buffer_size(0)),
            MergeConfig::new().with_streaming(StreamingConfig::new().with_max_record_size(0)),
        ];
        for config in cases {
            let err = config.validate().unwrap_err();
            assert!(err.is_invalid_config(), "unexpected error: {err}");
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = MergeConfig::new().with_id_field("uri");
        let json = serde_json::to_string(&config).unwrap();
        let back: MergeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_config_partial_deserialize_uses_defaults() {
        let config: MergeConfig = serde_json::from_str(r#"{"id_field": "uri"}"#).unwrap();
        assert_eq!(config.id_field, "uri");
        assert_eq!(config.timestamp_field, "created_at");
        assert_eq!(config.drop_keys, vec!["content_clean"]);
    }
}
