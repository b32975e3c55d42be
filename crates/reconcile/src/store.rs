use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use outlay_core::TxnStatus;

/// Address of one record range in the external store: a pending partition
/// per transaction status, plus one ledger partition per calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Pending(TxnStatus),
    Ledger(i32),
}

impl Partition {
    pub fn key(&self) -> String {
        match self {
            Partition::Pending(status) => format!("pending_{status}"),
            Partition::Ledger(year) => format!("ledger_{year}"),
        }
    }
}

/// Persistence failure, surfaced verbatim to the caller. The store has no
/// transaction primitive; the core never retries or rolls back on its own.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// The opaque, key-ordered record store the core reads and writes. Rows are
/// JSON objects carrying a string `"id"` field; everything else about the
/// backend (spreadsheet, database, file) is out of scope.
pub trait RecordStore {
    fn get_rows(&self, partition: &Partition) -> Result<Vec<Value>, StoreError>;
    fn append_rows(&mut self, partition: &Partition, rows: Vec<Value>) -> Result<(), StoreError>;
    fn update_row(&mut self, partition: &Partition, id: &str, row: Value) -> Result<(), StoreError>;
    fn delete_row(&mut self, partition: &Partition, id: &str) -> Result<(), StoreError>;
    fn replace_all(&mut self, partition: &Partition, rows: Vec<Value>) -> Result<(), StoreError>;
}

pub fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

/// In-memory reference store: partitions are key-ordered, rows keep append
/// order. Backs every engine test.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: BTreeMap<String, Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition_len(&self, partition: &Partition) -> usize {
        self.partitions.get(&partition.key()).map_or(0, Vec::len)
    }
}

impl RecordStore for MemoryStore {
    fn get_rows(&self, partition: &Partition) -> Result<Vec<Value>, StoreError> {
        Ok(self.partitions.get(&partition.key()).cloned().unwrap_or_default())
    }

    fn append_rows(&mut self, partition: &Partition, rows: Vec<Value>) -> Result<(), StoreError> {
        self.partitions.entry(partition.key()).or_default().extend(rows);
        Ok(())
    }

    fn update_row(&mut self, partition: &Partition, id: &str, row: Value) -> Result<(), StoreError> {
        let key = partition.key();
        let rows = self
            .partitions
            .get_mut(&key)
            .ok_or_else(|| StoreError(format!("no partition {key}")))?;
        match rows.iter_mut().find(|r| row_id(r) == Some(id)) {
            Some(existing) => {
                *existing = row;
                Ok(())
            }
            None => Err(StoreError(format!("no row {id} in {key}"))),
        }
    }

    fn delete_row(&mut self, partition: &Partition, id: &str) -> Result<(), StoreError> {
        let key = partition.key();
        let rows = self
            .partitions
            .get_mut(&key)
            .ok_or_else(|| StoreError(format!("no partition {key}")))?;
        let before = rows.len();
        rows.retain(|r| row_id(r) != Some(id));
        if rows.len() == before {
            return Err(StoreError(format!("no row {id} in {key}")));
        }
        Ok(())
    }

    fn replace_all(&mut self, partition: &Partition, rows: Vec<Value>) -> Result<(), StoreError> {
        self.partitions.insert(partition.key(), rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pending() -> Partition {
        Partition::Pending(TxnStatus::Uncategorized)
    }

    #[test]
    fn partition_keys() {
        assert_eq!(Partition::Pending(TxnStatus::AutoMapped).key(), "pending_auto_mapped");
        assert_eq!(Partition::Ledger(2024).key(), "ledger_2024");
    }

    #[test]
    fn append_and_get_keep_row_order() {
        let mut store = MemoryStore::new();
        store
            .append_rows(&pending(), vec![json!({"id": "a"}), json!({"id": "b"})])
            .unwrap();
        store.append_rows(&pending(), vec![json!({"id": "c"})]).unwrap();
        let ids: Vec<_> = store
            .get_rows(&pending())
            .unwrap()
            .iter()
            .map(|r| row_id(r).unwrap().to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn update_replaces_in_place() {
        let mut store = MemoryStore::new();
        store.append_rows(&pending(), vec![json!({"id": "a", "v": 1})]).unwrap();
        store.update_row(&pending(), "a", json!({"id": "a", "v": 2})).unwrap();
        assert_eq!(store.get_rows(&pending()).unwrap()[0]["v"], 2);
    }

    #[test]
    fn update_missing_row_errors() {
        let mut store = MemoryStore::new();
        store.append_rows(&pending(), vec![json!({"id": "a"})]).unwrap();
        assert!(store.update_row(&pending(), "zzz", json!({"id": "zzz"})).is_err());
    }

    #[test]
    fn delete_removes_exactly_one_id() {
        let mut store = MemoryStore::new();
        store
            .append_rows(&pending(), vec![json!({"id": "a"}), json!({"id": "b"})])
            .unwrap();
        store.delete_row(&pending(), "a").unwrap();
        assert_eq!(store.partition_len(&pending()), 1);
        assert!(store.delete_row(&pending(), "a").is_err());
    }

    #[test]
    fn replace_all_swaps_the_partition() {
        let mut store = MemoryStore::new();
        store.append_rows(&pending(), vec![json!({"id": "a"})]).unwrap();
        store.replace_all(&pending(), vec![json!({"id": "x"}), json!({"id": "y"})]).unwrap();
        assert_eq!(store.partition_len(&pending()), 2);
    }

    #[test]
    fn partitions_are_isolated() {
        let mut store = MemoryStore::new();
        store.append_rows(&pending(), vec![json!({"id": "a"})]).unwrap();
        store
            .append_rows(&Partition::Ledger(2024), vec![json!({"id": "2024-e1"})])
            .unwrap();
        assert_eq!(store.partition_len(&pending()), 1);
        assert_eq!(store.partition_len(&Partition::Ledger(2024)), 1);
        assert_eq!(store.partition_len(&Partition::Ledger(2023)), 0);
    }
}
