//! Cross-model result cache
//!
//! Completed items are stored under their name so later items can consume
//! them through `reference` connectors. Writes are last-writer-wins; readers
//! never block on a pending write, so producers must be ordered before their
//! consumers in the item list.

use std::sync::Arc;

use dashmap::DashMap;

use crate::value::Jsonable;

/// Name-keyed store of completed extraction results
#[derive(Debug, Default, Clone)]
pub struct ReferenceStore {
    inner: Arc<DashMap<String, Jsonable>>,
}

impl ReferenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name`, replacing any previous result.
    pub fn set(&self, name: &str, value: Jsonable) {
        self.inner.insert(name.to_string(), value);
    }

    /// Fetch the result stored under `name`; unknown names read as `Null`.
    pub fn get(&self, name: &str) -> Jsonable {
        self.inner
            .get(name)
            .map(|entry| entry.value().clone())
            .unwrap_or(Jsonable::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_yields_written_value() {
        let store = ReferenceStore::new();
        store.set("prices", Jsonable::Array(vec![Jsonable::Int(1)]));
        assert_eq!(store.get("prices"), Jsonable::Array(vec![Jsonable::Int(1)]));
    }

    #[test]
    fn unknown_name_reads_null() {
        let store = ReferenceStore::new();
        assert_eq!(store.get("missing"), Jsonable::Null);
    }

    #[test]
    fn name_collision_is_last_writer_wins() {
        let store = ReferenceStore::new();
        store.set("x", Jsonable::Int(1));
        store.set("x", Jsonable::Int(2));
        assert_eq!(store.get("x"), Jsonable::Int(2));
    }
}
