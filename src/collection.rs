// Generic in-memory collection of records

use crate::filter::Filter;
use crate::record::Record;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Ordered, owned list of records of one type.
///
/// Records keep insertion order. Ids are allocated from a high-water mark, so
/// an id is never handed out twice even after the record holding it is deleted.
#[derive(Debug, Clone)]
pub struct Collection<T: Record> {
    records: Vec<T>,
    high_water: u64,
}

impl<T: Record> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Collection<T> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            high_water: 0,
        }
    }

    /// Build a collection from seed records
    ///
    /// Records repeating an id already seen are dropped; the first one wins.
    pub fn from_records(records: Vec<T>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(records.len());

        for record in records {
            if !seen.insert(record.id()) {
                warn!(
                    collection = T::collection_name(),
                    id = record.id(),
                    "Duplicate id in seed data, skipping"
                );
                continue;
            }
            kept.push(record);
        }

        let high_water = kept.iter().map(|r| r.id()).max().unwrap_or(0);
        debug!(
            collection = T::collection_name(),
            count = kept.len(),
            high_water,
            "Collection seeded"
        );

        Self {
            records: kept,
            high_water,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter()
    }

    /// The id the next inserted record should carry
    pub fn next_id(&self) -> u64 {
        self.high_water + 1
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    /// Get a copy of a record by id
    pub fn get(&self, id: u64) -> Option<T> {
        self.records.iter().find(|r| r.id() == id).cloned()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.position(id).is_some()
    }

    /// Append a record and return a copy of it
    pub fn insert(&mut self, record: T) -> T {
        self.high_water = self.high_water.max(record.id());
        debug!(collection = T::collection_name(), id = record.id(), "insert");
        self.records.push(record.clone());
        record
    }

    /// Apply `f` to the record with `id` in place and return a copy of the result
    pub fn modify<F>(&mut self, id: u64, f: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let index = self.position(id)?;
        let record = &mut self.records[index];
        f(record);
        debug!(collection = T::collection_name(), id, "modify");
        Some(record.clone())
    }

    /// Swap in a new version of an existing record, keeping its position
    pub fn replace(&mut self, record: T) -> Option<T> {
        let index = self.position(record.id())?;
        debug!(collection = T::collection_name(), id = record.id(), "replace");
        self.records[index] = record.clone();
        Some(record)
    }

    /// Remove a record, returning it if it existed
    pub fn remove(&mut self, id: u64) -> Option<T> {
        let index = self.position(id)?;
        debug!(collection = T::collection_name(), id, "remove");
        Some(self.records.remove(index))
    }

    /// Replace the whole sequence, e.g. after a renumbering pass.
    /// The caller must pass a permutation of the current records.
    pub(crate) fn set_records(&mut self, records: Vec<T>) {
        debug_assert_eq!(records.len(), self.records.len());
        self.records = records;
    }

    /// Copies of the records matching every filter (all records when empty)
    pub fn list(&self, filters: &[Filter]) -> Vec<T> {
        self.records
            .iter()
            .filter(|r| {
                if filters.is_empty() {
                    return true;
                }
                let fields = r.indexed_fields();
                filters.iter().all(|f| f.matches(&fields))
            })
            .cloned()
            .collect()
    }

    /// Copies of the records matching at least one filter
    pub fn list_any(&self, filters: &[Filter]) -> Vec<T> {
        self.records
            .iter()
            .filter(|r| {
                let fields = r.indexed_fields();
                filters.iter().any(|f| f.matches(&fields))
            })
            .cloned()
            .collect()
    }

    /// Copies of every record in insertion order
    pub fn to_vec(&self) -> Vec<T> {
        self.records.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::IndexValue;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRecord {
        id: u64,
        name: String,
        status: String,
        count: i64,
        active: bool,
    }

    impl Record for TestRecord {
        fn id(&self) -> u64 {
            self.id
        }

        fn collection_name() -> &'static str {
            "test_records"
        }

        fn indexed_fields(&self) -> HashMap<String, IndexValue> {
            let mut fields = HashMap::new();
            fields.insert("name".to_string(), IndexValue::String(self.name.clone()));
            fields.insert("status".to_string(), IndexValue::String(self.status.clone()));
            fields.insert("count".to_string(), IndexValue::Int(self.count));
            fields.insert("active".to_string(), IndexValue::Bool(self.active));
            fields
        }
    }

    fn record(id: u64, status: &str, count: i64) -> TestRecord {
        TestRecord {
            id,
            name: format!("Record {}", id),
            status: status.to_string(),
            count,
            active: count % 2 == 0,
        }
    }

    #[test]
    fn test_insert_and_get_returns_copies() {
        let mut coll = Collection::new();
        let inserted = coll.insert(record(1, "active", 1));
        assert_eq!(inserted.id, 1);

        let mut copy = coll.get(1).unwrap();
        copy.name = "changed outside".to_string();
        assert_eq!(coll.get(1).unwrap().name, "Record 1");
    }

    #[test]
    fn test_get_nonexistent() {
        let coll: Collection<TestRecord> = Collection::new();
        assert!(coll.get(1).is_none());
        assert!(!coll.contains(1));
    }

    #[test]
    fn test_next_id_never_reuses_deleted_ids() {
        let mut coll = Collection::from_records(vec![record(1, "a", 1), record(5, "a", 2)]);
        assert_eq!(coll.next_id(), 6);

        coll.remove(5).unwrap();
        assert_eq!(coll.next_id(), 6);

        let id = coll.next_id();
        coll.insert(record(id, "a", 3));
        assert_eq!(coll.next_id(), 7);
    }

    #[test]
    fn test_next_id_empty_collection_starts_at_one() {
        let coll: Collection<TestRecord> = Collection::new();
        assert_eq!(coll.next_id(), 1);
    }

    #[test]
    fn test_from_records_drops_duplicate_ids() {
        let coll = Collection::from_records(vec![record(1, "first", 1), record(1, "second", 2), record(2, "x", 3)]);
        assert_eq!(coll.len(), 2);
        assert_eq!(coll.get(1).unwrap().status, "first");
    }

    #[test]
    fn test_modify_and_replace() {
        let mut coll = Collection::from_records(vec![record(1, "draft", 1), record(2, "draft", 2)]);

        let modified = coll.modify(1, |r| r.status = "active".to_string()).unwrap();
        assert_eq!(modified.status, "active");
        assert!(coll.modify(9, |r| r.count = 0).is_none());

        let mut replacement = record(2, "done", 20);
        replacement.name = "Replaced".to_string();
        coll.replace(replacement.clone()).unwrap();
        assert_eq!(coll.get(2).unwrap(), replacement);
        assert!(coll.replace(record(3, "x", 0)).is_none());

        // Positions are preserved
        let ids: Vec<u64> = coll.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_remove() {
        let mut coll = Collection::from_records(vec![record(1, "a", 1), record(2, "b", 2)]);
        assert_eq!(coll.remove(1).unwrap().id, 1);
        assert!(coll.remove(1).is_none());
        assert_eq!(coll.len(), 1);
    }

    #[test]
    fn test_list_no_filters() {
        let coll = Collection::from_records(vec![record(1, "a", 1), record(2, "b", 2), record(3, "c", 3)]);
        assert_eq!(coll.list(&[]).len(), 3);
    }

    #[test]
    fn test_list_with_filters() {
        let coll = Collection::from_records(vec![
            record(1, "active", 1),
            record(2, "active", 2),
            record(3, "inactive", 4),
        ]);

        let active = coll.list(&[Filter::eq("status", IndexValue::String("active".into()))]);
        assert_eq!(active.len(), 2);

        let both = coll.list(&[
            Filter::eq("status", IndexValue::String("active".into())),
            Filter::eq("active", IndexValue::Bool(true)),
        ]);
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, 2);
    }

    #[test]
    fn test_list_any() {
        let coll = Collection::from_records(vec![
            record(1, "active", 1),
            record(2, "paused", 2),
            record(3, "inactive", 3),
        ]);

        let hits = coll.list_any(&[Filter::contains("status", "PAUSED"), Filter::contains("name", "record 3")]);
        let ids: Vec<u64> = hits.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(coll.list_any(&[]).is_empty());
    }
}
