//! Deep sanitization of rich-text fields.
//!
//! Every string whose key matches [`RichTextKeys`] is passed through the
//! HTML sanitizer, at any depth and inside arrays of objects. Transient keys
//! (`content_clean` by default) are removed wherever they occur.

use serde_json::{Map, Value};

use crate::config::RichTextKeys;
use crate::record::{RawRecord, SanitizedRecord};
use crate::sanitize::try_sanitize;

/// Key removed by [`normalize`].
pub const DEFAULT_DROP_KEY: &str = "content_clean";

/// Counters collected while normalizing one or more records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Rich-text fields converted to plain text
    pub sanitized: usize,
    /// Rich-text fields kept raw because they could not be parsed
    pub fallbacks: usize,
    /// Keys removed from the record
    pub dropped_keys: usize,
}

impl NormalizeStats {
    /// Adds another record's counters to this one.
    pub fn absorb(&mut self, other: NormalizeStats) {
        self.sanitized += other.sanitized;
        self.fallbacks += other.fallbacks;
        self.dropped_keys += other.dropped_keys;
    }
}

/// Sanitizes rich-text fields and drops `content_clean` keys.
///
/// ```
/// use serde_json::json;
/// use tootpack::config::RichTextKeys;
/// use tootpack::core::normalize::normalize;
/// use tootpack::RawRecord;
///
/// let raw = RawRecord::from_value(json!({
///     "id": "1",
///     "content": "<p>Hello <a href=\"http://x\">world</a></p>",
///     "content_clean": "stale",
///     "account": {"note": "<p>bio</p>"}
/// })).unwrap();
///
/// let record = normalize(raw, &RichTextKeys::default());
/// assert_eq!(record.get_str("content"), Some("Hello world (http://x)"));
/// assert!(record.get("content_clean").is_none());
/// assert_eq!(record.get("account").unwrap()["note"], "bio");
/// ```
pub fn normalize(raw: RawRecord, keys: &RichTextKeys) -> SanitizedRecord {
    normalize_with_stats(raw, keys, &[DEFAULT_DROP_KEY]).0
}

/// Like [`normalize`], with a custom list of dropped keys and counters.
pub fn normalize_with_stats<S: AsRef<str>>(
    raw: RawRecord,
    keys: &RichTextKeys,
    drop_keys: &[S],
) -> (SanitizedRecord, NormalizeStats) {
    let mut map = raw.into_map();
    let mut stats = NormalizeStats::default();

    {
        let mut stack: Vec<&mut Value> = Vec::new();
        visit_object(&mut map, keys, drop_keys, &mut stats, &mut stack);

        while let Some(value) = stack.pop() {
            match value {
                Value::Object(obj) => visit_object(obj, keys, drop_keys, &mut stats, &mut stack),
                Value::Array(items) => stack.extend(items.iter_mut()),
                _ => {}
            }
        }
    }

    (SanitizedRecord::from_map(map), stats)
}

/// Processes the direct fields of one object and queues its containers.
fn visit_object<'a, S: AsRef<str>>(
    obj: &'a mut Map<String, Value>,
    keys: &RichTextKeys,
    drop_keys: &[S],
    stats: &mut NormalizeStats,
    stack: &mut Vec<&'a mut Value>,
) {
    obj.retain(|key, _| {
        let dropped = drop_keys.iter().any(|d| d.as_ref() == key);
        if dropped {
            stats.dropped_keys += 1;
        }
        !dropped
    });

    for (key, value) in obj.iter_mut() {
        if value.is_object() || value.is_array() {
            stack.push(value);
            continue;
        }
        let Value::String(text) = value else {
            continue;
        };
        if !keys.matches(key) {
            continue;
        }
        match try_sanitize(text) {
            Ok(plain) => {
                *text = plain;
                stats.sanitized += 1;
            }
            Err(e) => {
                tracing::debug!(field = %key, error = %e, "keeping raw HTML fragment");
                stats.fallbacks += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::MAX_NESTING_DEPTH;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    fn to_value(record: SanitizedRecord) -> Value {
        Value::Object(record.into_map())
    }

    #[test]
    fn test_top_level_content() {
        let record = normalize(
            raw(json!({
                "id": "1",
                "created_at": "2024-01-01",
                "content": "<p>Hello <a href=\"http://x\">world</a></p>"
            })),
            &RichTextKeys::default(),
        );
        assert_eq!(record.get_str("content"), Some("Hello world (http://x)"));
        assert_eq!(record.get_str("id"), Some("1"));
        assert_eq!(record.get_str("created_at"), Some("2024-01-01"));
    }

    #[test]
    fn test_nested_account_and_reblog() {
        let record = normalize(
            raw(json!({
                "id": "2",
                "account": {"note": "<p>I <b>like</b> Rust</p>", "url": "<p>not rich</p>"},
                "reblog": {
                    "content": "<p>boosted</p>",
                    "account": {"note": "<p>deep</p>"}
                }
            })),
            &RichTextKeys::default(),
        );
        let value = to_value(record);
        assert_eq!(value["account"]["note"], "I like Rust");
        assert_eq!(value["account"]["url"], "<p>not rich</p>");
        assert_eq!(value["reblog"]["content"], "boosted");
        assert_eq!(value["reblog"]["account"]["note"], "deep");
    }

    #[test]
    fn test_arrays_of_objects_are_visited() {
        let record = normalize(
            raw(json!({
                "id": "3",
                "replies": [{"content": "<i>a</i>"}, {"content": "<i>b</i>", "content_clean": "x"}]
            })),
            &RichTextKeys::default(),
        );
        let value = to_value(record);
        assert_eq!(value["replies"][0]["content"], "a");
        assert_eq!(value["replies"][1]["content"], "b");
        assert!(value["replies"][1].get("content_clean").is_none());
    }

    #[test]
    fn test_content_clean_dropped_at_every_depth() {
        let (record, stats) = normalize_with_stats(
            raw(json!({
                "id": "4",
                "content_clean": "top",
                "reblog": {"content_clean": "nested", "id": "5"}
            })),
            &RichTextKeys::default(),
            &[DEFAULT_DROP_KEY],
        );
        let value = to_value(record);
        assert!(value.get("content_clean").is_none());
        assert!(value["reblog"].get("content_clean").is_none());
        assert_eq!(value["reblog"]["id"], "5");
        assert_eq!(stats.dropped_keys, 2);
    }

    #[test]
    fn test_case_insensitive_key_match() {
        let record = normalize(
            raw(json!({"Content": "<b>x</b>", "spoiler_NOTE": "<b>y</b>"})),
            &RichTextKeys::default(),
        );
        assert_eq!(record.get_str("Content"), Some("x"));
        assert_eq!(record.get_str("spoiler_NOTE"), Some("y"));
    }

    #[test]
    fn test_non_string_rich_text_values_pass_through() {
        let record = normalize(
            raw(json!({"content": null, "note": 5, "content_map": {"en": "<p>hi</p>"}})),
            &RichTextKeys::default(),
        );
        let value = to_value(record);
        assert_eq!(value["content"], Value::Null);
        assert_eq!(value["note"], 5);
        // Recursed into, but "en" is not a rich-text key.
        assert_eq!(value["content_map"]["en"], "<p>hi</p>");
    }

    #[test]
    fn test_key_order_is_preserved() {
        let record = normalize(
            raw(json!({"z": 1, "content": "<p>a</p>", "content_clean": "x", "a": 2})),
            &RichTextKeys::default(),
        );
        let keys: Vec<&str> = record.as_map().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "content", "a"]);
    }

    #[test]
    fn test_fallback_is_counted() {
        let deep = "<b>".repeat(MAX_NESTING_DEPTH + 1);
        let (record, stats) = normalize_with_stats(
            raw(json!({"content": deep.clone(), "note": "<p>ok</p>"})),
            &RichTextKeys::default(),
            &[DEFAULT_DROP_KEY],
        );
        assert_eq!(record.get_str("content"), Some(deep.as_str()));
        assert_eq!(record.get_str("note"), Some("ok"));
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.sanitized, 1);
    }

    #[test]
    fn test_custom_keys_and_drop_list() {
        let (record, stats) = normalize_with_stats(
            raw(json!({"summary": "<p>cw</p>", "content": "<p>body</p>", "tmp": 1})),
            &RichTextKeys::new(["summary"]),
            &["tmp"],
        );
        assert_eq!(record.get_str("summary"), Some("cw"));
        assert_eq!(record.get_str("content"), Some("<p>body</p>"));
        assert!(record.get("tmp").is_none());
        assert_eq!(stats.dropped_keys, 1);
    }

    #[test]
    fn test_deeply_nested_record_does_not_overflow() {
        // Built by moving values: `json!` would recurse through the whole tree.
        let mut value = json!({"content": "<p>leaf</p>", "content_clean": "x"});
        for _ in 0..10_000 {
            let mut level = Map::new();
            level.insert("child".to_string(), value);
            value = Value::Object(level);
        }
        let mut root = Map::new();
        root.insert("root".to_string(), value);
        let (record, stats) =
            normalize_with_stats(RawRecord::from(root), &RichTextKeys::default(), &[DEFAULT_DROP_KEY]);

        let mut cursor = record.get("root").unwrap();
        while let Some(child) = cursor.get("child") {
            cursor = child;
        }
        assert_eq!(cursor["content"], "leaf");
        assert!(cursor.get("content_clean").is_none());
        assert_eq!(stats.sanitized, 1);
        assert_eq!(stats.dropped_keys, 1);

        // Dropping the tree would recurse as well.
        std::mem::forget(record);
    }

    #[test]
    fn test_stats_absorb() {
        let mut total = NormalizeStats::default();
        total.absorb(NormalizeStats {
            sanitized: 2,
            fallbacks: 1,
            dropped_keys: 3,
        });
        total.absorb(NormalizeStats {
            sanitized: 1,
            fallbacks: 0,
            dropped_keys: 0,
        });
        assert_eq!(total.sanitized, 3);
        assert_eq!(total.fallbacks, 1);
        assert_eq!(total.dropped_keys, 3);
    }
}
