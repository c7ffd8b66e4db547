// Record trait and id coercion for in-memory collections

use serde::{Serialize, de::DeserializeOwned};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Core trait that any storable record must implement
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Unique numeric identifier for this record
    fn id(&self) -> u64;

    /// Collection name for this record type (e.g., "tasks", "categories")
    /// Also names the fixture file: {collection}.jsonl
    fn collection_name() -> &'static str
    where
        Self: Sized;

    /// Fields exposed to `Filter` matching
    /// Return empty HashMap if the record cannot be filtered
    fn indexed_fields(&self) -> HashMap<String, IndexValue> {
        HashMap::new()
    }
}

/// Value types that can be indexed for filtering
#[derive(Debug, Clone, PartialEq)]
pub enum IndexValue {
    String(String),
    Int(i64),
    Bool(bool),
}

impl IndexValue {
    /// Ordering between values of the same kind; mixed kinds don't compare
    pub fn compare(&self, other: &IndexValue) -> Option<Ordering> {
        match (self, other) {
            (IndexValue::String(a), IndexValue::String(b)) => Some(a.cmp(b)),
            (IndexValue::Int(a), IndexValue::Int(b)) => Some(a.cmp(b)),
            (IndexValue::Bool(a), IndexValue::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl std::fmt::Display for IndexValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexValue::String(s) => write!(f, "{}", s),
            IndexValue::Int(i) => write!(f, "{}", i),
            IndexValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Anything a caller may pass where a record id is expected.
///
/// Values that are not a valid id (negative numbers, non-numeric strings,
/// out-of-range input) coerce to `None` and match no record.
pub trait RecordKey {
    fn record_id(&self) -> Option<u64>;
}

impl RecordKey for u64 {
    fn record_id(&self) -> Option<u64> {
        Some(*self)
    }
}

impl RecordKey for u32 {
    fn record_id(&self) -> Option<u64> {
        Some(u64::from(*self))
    }
}

impl RecordKey for usize {
    fn record_id(&self) -> Option<u64> {
        u64::try_from(*self).ok()
    }
}

impl RecordKey for i64 {
    fn record_id(&self) -> Option<u64> {
        u64::try_from(*self).ok()
    }
}

impl RecordKey for i32 {
    fn record_id(&self) -> Option<u64> {
        u64::try_from(*self).ok()
    }
}

impl RecordKey for str {
    fn record_id(&self) -> Option<u64> {
        self.trim().parse::<u64>().ok()
    }
}

impl RecordKey for String {
    fn record_id(&self) -> Option<u64> {
        self.as_str().record_id()
    }
}

impl<K: RecordKey + ?Sized> RecordKey for &K {
    fn record_id(&self) -> Option<u64> {
        (**self).record_id()
    }
}
