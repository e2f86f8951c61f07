//! Search results.

use std::collections::{BTreeMap, HashSet};

use quarry_core::RecordId;
use quarry_storage::{Record, Row};
use serde_json::Value;

use crate::client::IndexMatch;

/// Output of [`Search::run`](crate::Search::run).
#[derive(Debug, Clone, PartialEq)]
pub enum ResultSet {
    /// Records of the only (or unnamed) table.
    Records(Vec<Record>),
    /// Records per table, when several tables were searched.
    Tables(BTreeMap<String, Vec<Record>>),
    /// One projected attribute per record.
    Values(Vec<Value>),
    /// Several projected attributes per record.
    Rows(Vec<Row>),
}

impl ResultSet {
    /// Number of top-level entries (records, values, rows, or records
    /// across all tables).
    pub fn len(&self) -> usize {
        match self {
            ResultSet::Records(records) => records.len(),
            ResultSet::Tables(tables) => tables.values().map(Vec::len).sum(),
            ResultSet::Values(values) => values.len(),
            ResultSet::Rows(rows) => rows.len(),
        }
    }

    /// Whether nothing was found.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The records, when this is a single-table result.
    pub fn records(&self) -> Option<&[Record]> {
        match self {
            ResultSet::Records(records) => Some(records),
            _ => None,
        }
    }

    /// Records for one table of a multi-table result.
    pub fn table(&self, name: &str) -> Option<&[Record]> {
        match self {
            ResultSet::Tables(tables) => tables.get(name).map(Vec::as_slice),
            _ => None,
        }
    }

    /// Projected values, when one attribute was requested.
    pub fn values(&self) -> Option<&[Value]> {
        match self {
            ResultSet::Values(values) => Some(values),
            _ => None,
        }
    }

    /// Projected rows, when several attributes were requested.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            ResultSet::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

/// Output of [`Search::count`](crate::Search::count).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchCount {
    /// Total for the only (or unnamed) table.
    Total(u64),
    /// Totals per table.
    ByTable(BTreeMap<String, u64>),
}

impl MatchCount {
    /// Sum over all tables.
    pub fn total(&self) -> u64 {
        match self {
            MatchCount::Total(n) => *n,
            MatchCount::ByTable(tables) => tables.values().sum(),
        }
    }
}

/// Read the target attribute out of each match, dropping duplicates.
///
/// Identifiers keep the order in which they were first seen. Matches
/// without a usable identifier are skipped.
pub fn collect_ids(matches: &[IndexMatch], target_attr: &str) -> Vec<RecordId> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(matches.len());
    for m in matches {
        match m.attrs.get(target_attr).and_then(RecordId::from_value) {
            Some(id) => {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
            None => log::warn!(
                "match {} has no usable '{target_attr}' attribute; skipping",
                m.id
            ),
        }
    }
    ids
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn matches(ids: &[Value]) -> Vec<IndexMatch> {
        ids.iter()
            .map(|id| IndexMatch::with_attrs(json!({ "item_id": id })))
            .collect()
    }

    #[test]
    fn test_collect_ids_dedupes_in_first_seen_order() {
        let ids = collect_ids(&matches(&[json!(5), json!(3), json!(5), json!(7)]), "item_id");
        assert_eq!(ids, vec![RecordId::Int(5), RecordId::Int(3), RecordId::Int(7)]);
    }

    #[test]
    fn test_collect_ids_skips_unusable() {
        let mut hits = matches(&[json!(1), json!(null), json!("abc")]);
        hits.push(IndexMatch::with_attrs(json!({"other": 9})));
        let ids = collect_ids(&hits, "item_id");
        assert_eq!(ids, vec![RecordId::Int(1), RecordId::Str("abc".into())]);
    }

    #[test]
    fn test_result_set_accessors() {
        let set = ResultSet::Records(vec![Record::from(json!({"a": 1}))]);
        assert_eq!(set.len(), 1);
        assert!(set.records().is_some());
        assert!(set.values().is_none());

        let mut tables = BTreeMap::new();
        tables.insert("venues".to_string(), vec![Record::from(json!({}))]);
        tables.insert("events".to_string(), vec![]);
        let set = ResultSet::Tables(tables);
        assert_eq!(set.len(), 1);
        assert_eq!(set.table("events").unwrap().len(), 0);
        assert!(set.table("artists").is_none());
    }

    #[test]
    fn test_match_count_total() {
        let mut tables = BTreeMap::new();
        tables.insert("venues".to_string(), 3);
        tables.insert("events".to_string(), 4);
        assert_eq!(MatchCount::ByTable(tables).total(), 7);
        assert_eq!(MatchCount::Total(2).total(), 2);
    }

    proptest! {
        #[test]
        fn prop_collect_ids_is_unique_and_ordered(raw in prop::collection::vec(0i64..20, 0..40)) {
            let values: Vec<Value> = raw.iter().map(|n| json!(n)).collect();
            let ids = collect_ids(&matches(&values), "item_id");

            let unique: HashSet<_> = ids.iter().cloned().collect();
            prop_assert_eq!(unique.len(), ids.len());

            let mut expected = Vec::new();
            for n in &raw {
                if !expected.contains(n) {
                    expected.push(*n);
                }
            }
            let expected: Vec<RecordId> = expected.into_iter().map(RecordId::Int).collect();
            prop_assert_eq!(ids, expected);
        }
    }
}
