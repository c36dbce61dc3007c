//! Structural flattening for tabular export.
//!
//! Nested objects are joined with dots, array elements get a `[i]` suffix:
//!
//! | Input | Columns |
//! |-------|---------|
//! | `{"a": {"b": 1}}` | `a.b` |
//! | `{"tags": [{"name": "x"}]}` | `tags[0].name` |
//! | `{"ids": [1, 2]}` | `ids[0]`, `ids[1]` |
//! | `{"m": [[1, 2]]}` | `m[0]` = `[1,2]` |
//! | `{"e": {}}`, `{"e": []}` | none |

use serde_json::Value;

use crate::record::{FlatRecord, SanitizedRecord};

/// Flattens a record into qualified key paths.
///
/// Columns appear in depth-first order. If two paths collide (a literal
/// `"a.b"` key next to `{"a": {"b": ..}}`), the later value wins.
///
/// ```
/// use serde_json::json;
/// use tootpack::config::RichTextKeys;
/// use tootpack::core::{flatten::flatten, normalize::normalize};
/// use tootpack::RawRecord;
///
/// let raw = RawRecord::from_value(json!({
///     "id": "1",
///     "account": {"username": "ferris"},
///     "tags": [{"name": "rust"}]
/// })).unwrap();
///
/// let flat = flatten(&normalize(raw, &RichTextKeys::default()));
/// let keys: Vec<&str> = flat.keys().collect();
/// assert_eq!(keys, vec!["id", "account.username", "tags[0].name"]);
/// ```
pub fn flatten(record: &SanitizedRecord) -> FlatRecord {
    let mut flat = FlatRecord::new();
    // The flag marks direct children of an array.
    let mut stack: Vec<(String, &Value, bool)> = record
        .as_map()
        .iter()
        .rev()
        .map(|(key, value)| (key.clone(), value, false))
        .collect();

    while let Some((path, value, in_array)) = stack.pop() {
        match value {
            Value::Object(obj) => {
                stack.extend(
                    obj.iter()
                        .rev()
                        .map(|(key, child)| (format!("{path}.{key}"), child, false)),
                );
            }
            // Arrays of arrays have no natural column layout.
            Value::Array(_) if in_array => flat.insert(path, Value::String(value.to_string())),
            Value::Array(items) => {
                stack.extend(
                    items
                        .iter()
                        .enumerate()
                        .rev()
                        .map(|(idx, item)| (format!("{path}[{idx}]"), item, true)),
                );
            }
            scalar => flat.insert(path, scalar.clone()),
        }
    }

    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RichTextKeys;
    use crate::core::normalize::normalize;
    use crate::record::RawRecord;
    use serde_json::{Map, json};

    fn record(value: Value) -> SanitizedRecord {
        normalize(RawRecord::from_value(value).unwrap(), &RichTextKeys::default())
    }

    fn keys(flat: &FlatRecord) -> Vec<&str> {
        flat.keys().collect()
    }

    #[test]
    fn test_flat_record_is_unchanged() {
        let rec = record(json!({"id": "1", "n": 2, "ok": true, "none": null}));
        let flat = flatten(&rec);
        assert_eq!(keys(&flat), vec!["id", "n", "ok", "none"]);
        assert_eq!(flat.get("n"), Some(&json!(2)));
        assert_eq!(flat.get("none"), Some(&Value::Null));
    }

    #[test]
    fn test_nested_objects_use_dots() {
        let flat = flatten(&record(json!({
            "id": "1",
            "account": {"username": "ferris", "emoji": {"count": 3}},
            "after": 1
        })));
        assert_eq!(
            keys(&flat),
            vec!["id", "account.username", "account.emoji.count", "after"]
        );
        assert_eq!(flat.cell("account.emoji.count"), "3");
    }

    #[test]
    fn test_arrays_are_index_expanded() {
        let flat = flatten(&record(json!({
            "media": [{"type": "image", "meta": {"w": 10}}, {"type": "video"}],
            "ids": [7, "eight"]
        })));
        assert_eq!(
            keys(&flat),
            vec![
                "media[0].type",
                "media[0].meta.w",
                "media[1].type",
                "ids[0]",
                "ids[1]"
            ]
        );
        assert_eq!(flat.cell("ids[1]"), "eight");
    }

    #[test]
    fn test_nested_arrays_are_serialized() {
        let flat = flatten(&record(json!({"m": [[1, 2], {"k": "v"}, []]})));
        assert_eq!(keys(&flat), vec!["m[0]", "m[1].k", "m[2]"]);
        assert_eq!(flat.cell("m[0]"), "[1,2]");
        assert_eq!(flat.cell("m[2]"), "[]");
    }

    #[test]
    fn test_empty_containers_produce_no_columns() {
        let flat = flatten(&record(json!({"id": "1", "e": {}, "a": [], "x": [{}]})));
        assert_eq!(keys(&flat), vec!["id"]);
    }

    #[test]
    fn test_collisions_last_write_wins() {
        let flat = flatten(&record(json!({"a.b": 1, "a": {"b": 2}})));
        assert_eq!(keys(&flat), vec!["a.b"]);
        assert_eq!(flat.get("a.b"), Some(&json!(2)));
    }

    #[test]
    fn test_sanitized_values_are_flattened() {
        let flat = flatten(&record(json!({
            "id": "9",
            "account": {"note": "<p>bio <a href=\"https://x\">link</a></p>"}
        })));
        assert_eq!(flat.cell("account.note"), "bio link (https://x)");
    }

    #[test]
    fn test_nested_array_columns_keep_index_order() {
        let flat = flatten(&record(json!({"m": [[1], [2], 3], "after": true})));
        assert_eq!(keys(&flat), vec!["m[0]", "m[1]", "m[2]", "after"]);
        assert_eq!(flat.cell("m[1]"), "[2]");
        assert_eq!(flat.cell("m[2]"), "3");
    }

    #[test]
    fn test_deep_nesting_is_iterative() {
        // Built by moving values: `json!` would recurse through the whole tree.
        let mut value = Value::from(1);
        for _ in 0..5_000 {
            let mut level = Map::new();
            level.insert("k".to_string(), value);
            value = Value::Object(level);
        }
        let mut root = Map::new();
        root.insert("root".to_string(), value);
        let rec = normalize(RawRecord::from(root), &RichTextKeys::default());

        let flat = flatten(&rec);
        assert_eq!(flat.len(), 1);
        let key = flat.keys().next().unwrap().to_string();
        assert!(key.starts_with("root.k.k"));
        assert!(key.ends_with(".k"));

        // Dropping the tree would recurse as well.
        std::mem::forget(rec);
    }
}
