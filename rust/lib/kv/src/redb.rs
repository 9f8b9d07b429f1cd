use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::KVError;
use crate::traits::{CasOp, KVStore};

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

fn storage(e: impl std::fmt::Display) -> KVError {
    KVError::Storage(e.to_string())
}

/// RedbStore is a KVStore implementation backed by redb, a pure-Rust embedded
/// key-value database. redb serializes write transactions, so
/// `compare_and_swap` is atomic across every thread sharing the store.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(storage)?;

        // Ensure the table exists by doing a write transaction.
        let write_txn = db.begin_write().map_err(storage)?;
        {
            let _table = write_txn.open_table(TABLE).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(TABLE).map_err(storage)?;

        match table.get(key) {
            Ok(Some(val)) => Ok(Some(val.value().to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(storage(e)),
        }
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let read_txn = self.db.begin_read().map_err(storage)?;
        let table = read_txn.open_table(TABLE).map_err(storage)?;

        let mut results = Vec::new();
        let iter = table.range(prefix..).map_err(storage)?;

        for entry in iter {
            let entry = entry.map_err(storage)?;
            let key = entry.0.value().to_string();
            if !key.starts_with(prefix) {
                break;
            }
            let value = entry.1.value().to_vec();
            results.push((key, value));
        }

        Ok(results)
    }

    fn compare_and_swap(&self, ops: &[CasOp<'_>]) -> Result<bool, KVError> {
        let write_txn = self.db.begin_write().map_err(storage)?;
        let matched = {
            let mut table = write_txn.open_table(TABLE).map_err(storage)?;

            let mut matched = true;
            for op in ops {
                let current = table
                    .get(op.key)
                    .map_err(storage)?
                    .map(|v| v.value().to_vec());
                if current.as_deref() != op.expected {
                    debug!("cas mismatch on {}", op.key);
                    matched = false;
                    break;
                }
            }

            if matched {
                for op in ops {
                    match op.new {
                        Some(value) => {
                            table.insert(op.key, value).map_err(storage)?;
                        }
                        None => {
                            table.remove(op.key).map_err(storage)?;
                        }
                    }
                }
            }
            matched
        };

        if matched {
            write_txn.commit().map_err(storage)?;
        } else {
            write_txn.abort().map_err(storage)?;
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, RedbStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        (dir, store)
    }

    fn seed(kv: &RedbStore, key: &str, value: &[u8]) {
        assert!(kv.compare_and_swap(&[CasOp::insert(key, value)]).unwrap());
    }

    #[test]
    fn scan_stops_at_prefix_boundary() {
        let (_dir, kv) = store();
        seed(&kv, "social:blog:1", b"x");
        seed(&kv, "social:blog:2", b"y");
        seed(&kv, "social:group:1", b"z");

        let blogs = kv.scan("social:blog:").unwrap();
        let keys: Vec<_> = blogs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["social:blog:1", "social:blog:2"]);
    }

    #[test]
    fn cas_insert_only_once() {
        let (_dir, kv) = store();
        assert!(kv.compare_and_swap(&[CasOp::insert("k", b"v1")]).unwrap());
        assert!(!kv.compare_and_swap(&[CasOp::insert("k", b"v2")]).unwrap());
        assert_eq!(kv.get("k").unwrap().as_deref(), Some(&b"v1"[..]));
    }

    #[test]
    fn cas_replace_requires_current_value() {
        let (_dir, kv) = store();
        seed(&kv, "k", b"v1");

        assert!(!kv.compare_and_swap(&[CasOp::replace("k", b"stale", b"v2")]).unwrap());
        assert_eq!(kv.get("k").unwrap().as_deref(), Some(&b"v1"[..]));

        assert!(kv.compare_and_swap(&[CasOp::replace("k", b"v1", b"v2")]).unwrap());
        assert_eq!(kv.get("k").unwrap().as_deref(), Some(&b"v2"[..]));
    }

    #[test]
    fn cas_remove() {
        let (_dir, kv) = store();
        seed(&kv, "k", b"v1");
        assert!(kv.compare_and_swap(&[CasOp::remove("k", b"v1")]).unwrap());
        assert!(kv.get("k").unwrap().is_none());
        assert!(!kv.compare_and_swap(&[CasOp::remove("k", b"v1")]).unwrap());
    }

    #[test]
    fn cas_batch_is_all_or_nothing() {
        let (_dir, kv) = store();
        seed(&kv, "a", b"1");
        seed(&kv, "b", b"1");

        // Second op is stale, so neither key changes.
        let ops = [CasOp::replace("a", b"1", b"2"), CasOp::replace("b", b"0", b"2")];
        assert!(!kv.compare_and_swap(&ops).unwrap());
        assert_eq!(kv.get("a").unwrap().as_deref(), Some(&b"1"[..]));
        assert_eq!(kv.get("b").unwrap().as_deref(), Some(&b"1"[..]));

        let ops = [CasOp::replace("a", b"1", b"2"), CasOp::replace("b", b"1", b"2")];
        assert!(kv.compare_and_swap(&ops).unwrap());
        assert_eq!(kv.get("a").unwrap().as_deref(), Some(&b"2"[..]));
        assert_eq!(kv.get("b").unwrap().as_deref(), Some(&b"2"[..]));
    }

    #[test]
    fn cas_from_many_threads_applies_each_increment_once() {
        let (_dir, kv) = store();
        let kv = Arc::new(kv);
        seed(&kv, "n", b"0");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let kv = Arc::clone(&kv);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        loop {
                            let cur = kv.get("n").unwrap().unwrap();
                            let n: u32 = std::str::from_utf8(&cur).unwrap().parse().unwrap();
                            let next = (n + 1).to_string();
                            if kv.compare_and_swap(&[CasOp::replace("n", &cur, next.as_bytes())]).unwrap() {
                                break;
                            }
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(kv.get("n").unwrap().as_deref(), Some(&b"200"[..]));
    }
}
