//! Cross-archive deduplication by identifier.
//!
//! The first record seen with a given identifier wins; later copies and
//! records without an identifier are rejected. The index lives for one run
//! and is owned by whoever drives the merge.

use std::collections::{HashMap, HashSet};

use crate::config::DEFAULT_ID_FIELD;
use crate::record::SanitizedRecord;

/// Outcome of offering a record to the [`DedupIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First occurrence of the identifier; keep the record.
    Admitted,
    /// The record has no usable identifier.
    MissingIdentifier,
    /// The identifier was admitted earlier.
    Duplicate,
}

impl Admission {
    /// Returns `true` for [`Admission::Admitted`].
    pub fn is_admitted(self) -> bool {
        self == Admission::Admitted
    }
}

/// Set of identifiers admitted so far.
///
/// ```
/// use serde_json::json;
/// use tootpack::config::RichTextKeys;
/// use tootpack::core::{dedup::DedupIndex, normalize::normalize};
/// use tootpack::RawRecord;
///
/// let rec = |v| normalize(RawRecord::from_value(v).unwrap(), &RichTextKeys::default());
///
/// let mut index = DedupIndex::new();
/// assert!(index.admit(&rec(json!({"id": "42"}))));
/// assert!(!index.admit(&rec(json!({"id": 42}))));
/// assert!(!index.admit(&rec(json!({"content": "no id"}))));
/// assert_eq!(index.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DedupIndex {
    id_field: String,
    seen: HashSet<String>,
    missing_identifier: usize,
    duplicates: usize,
}

impl Default for DedupIndex {
    fn default() -> Self {
        Self::with_id_field(DEFAULT_ID_FIELD)
    }
}

impl DedupIndex {
    /// Creates an index keyed on the `id` field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an index keyed on a custom field.
    pub fn with_id_field(field: impl Into<String>) -> Self {
        Self {
            id_field: field.into(),
            seen: HashSet::new(),
            missing_identifier: 0,
            duplicates: 0,
        }
    }

    /// The field identifiers are read from.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Admits the record if its identifier is present and new.
    pub fn admit(&mut self, record: &SanitizedRecord) -> bool {
        self.admit_with_reason(record).is_admitted()
    }

    /// Like [`admit`](Self::admit), but reports why a record was rejected.
    pub fn admit_with_reason(&mut self, record: &SanitizedRecord) -> Admission {
        match record.identifier(&self.id_field) {
            None => {
                self.missing_identifier += 1;
                Admission::MissingIdentifier
            }
            Some(id) => {
                if self.seen.insert(id) {
                    Admission::Admitted
                } else {
                    self.duplicates += 1;
                    Admission::Duplicate
                }
            }
        }
    }

    /// Returns `true` if the identifier was admitted.
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Number of admitted records.
    pub fn admitted(&self) -> usize {
        self.seen.len()
    }

    /// Number of records rejected for lacking an identifier.
    pub fn missing_identifier(&self) -> usize {
        self.missing_identifier
    }

    /// Number of records rejected as duplicates.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Number of distinct identifiers held.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns `true` if nothing was admitted yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Lists identifiers that occur more than once, in order of their repeats.
///
/// An identifier seen three times is listed twice.
pub fn duplicate_identifiers<I>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut repeats = Vec::new();

    for id in ids {
        let count = counts.entry(id.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            repeats.push(id);
        }
    }

    repeats
}

/// Audits an already-merged dataset for repeated identifiers.
///
/// Records without an identifier are ignored.
pub fn find_duplicate_ids<'a, I>(records: I, id_field: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a SanitizedRecord>,
{
    duplicate_identifiers(
        records
            .into_iter()
            .filter_map(|record| record.identifier(id_field)),
    )
}
