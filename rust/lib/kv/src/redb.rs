use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, Table, TableDefinition};
use tracing::debug;

use crate::error::KVError;
use crate::traits::KVStore;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// KVStore backed by redb, a pure-Rust embedded database.
///
/// redb allows one write transaction at a time, which is what makes
/// `increment` safe to call from concurrent request handlers.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(KVError::storage)?;
        let store = Self { db: Arc::new(db) };
        // Create the table up front so read transactions never miss it.
        store.write(|_| Ok(()))?;
        debug!("opened redb store at {}", path.display());
        Ok(store)
    }

    fn write<R>(
        &self,
        f: impl FnOnce(&mut Table<'_, &'static str, &'static [u8]>) -> Result<R, KVError>,
    ) -> Result<R, KVError> {
        let txn = self.db.begin_write().map_err(KVError::storage)?;
        let out = {
            let mut table = txn.open_table(TABLE).map_err(KVError::storage)?;
            f(&mut table)?
        };
        txn.commit().map_err(KVError::storage)?;
        Ok(out)
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let txn = self.db.begin_read().map_err(KVError::storage)?;
        let table = txn.open_table(TABLE).map_err(KVError::storage)?;
        let value = table.get(key).map_err(KVError::storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.write(|table| {
            table.insert(key, value).map_err(KVError::storage)?;
            Ok(())
        })
    }

    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError> {
        self.write(|table| {
            for (key, value) in entries {
                table.insert(*key, *value).map_err(KVError::storage)?;
            }
            Ok(())
        })
    }

    fn write_if_absent(
        &self,
        guards: &[&str],
        sets: &[(&str, &[u8])],
        deletes: &[&str],
    ) -> Result<bool, KVError> {
        self.write(|table| {
            for guard in guards {
                if table.get(*guard).map_err(KVError::storage)?.is_some() {
                    return Ok(false);
                }
            }
            for key in deletes {
                table.remove(*key).map_err(KVError::storage)?;
            }
            for (key, value) in sets {
                table.insert(*key, *value).map_err(KVError::storage)?;
            }
            Ok(true)
        })
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let txn = self.db.begin_read().map_err(KVError::storage)?;
        let table = txn.open_table(TABLE).map_err(KVError::storage)?;

        let mut results = Vec::new();
        for entry in table.range(prefix..).map_err(KVError::storage)? {
            let (key, value) = entry.map_err(KVError::storage)?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_string(), value.value().to_vec()));
        }
        Ok(results)
    }

    fn increment(&self, key: &str) -> Result<u64, KVError> {
        self.write(|table| {
            let current = match table.get(key).map_err(KVError::storage)? {
                Some(raw) => {
                    let bytes: [u8; 8] = raw.value().try_into().map_err(|_| KVError::Corrupt {
                        key: key.to_string(),
                        reason: format!("expected 8 bytes, found {}", raw.value().len()),
                    })?;
                    u64::from_be_bytes(bytes)
                }
                None => 0,
            };
            let next = current + 1;
            table
                .insert(key, next.to_be_bytes().as_slice())
                .map_err(KVError::storage)?;
            Ok(next)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> (RedbStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("kv.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn set_and_get() {
        let (store, _dir) = open();
        assert!(store.get("portfolio:account:1").unwrap().is_none());

        store.set("portfolio:account:1", b"alice").unwrap();
        assert_eq!(store.get("portfolio:account:1").unwrap().unwrap(), b"alice");

        store.set("portfolio:account:1", b"bob").unwrap();
        assert_eq!(store.get("portfolio:account:1").unwrap().unwrap(), b"bob");
    }

    #[test]
    fn write_if_absent_respects_guards() {
        let (store, _dir) = open();
        let claim = |name: &str, value: &[u8]| {
            store.write_if_absent(&[name], &[(name, value), ("portfolio:account:1", value)], &[])
        };

        assert!(claim("unique:alice", b"1").unwrap());
        assert!(!claim("unique:alice", b"2").unwrap());
        // The losing write left nothing behind.
        assert_eq!(store.get("portfolio:account:1").unwrap().unwrap(), b"1");

        // Move the claim: release the old key, take the new one.
        assert!(store
            .write_if_absent(&["unique:alicia"], &[("unique:alicia", b"1".as_slice())], &["unique:alice"])
            .unwrap());
        assert!(store.get("unique:alice").unwrap().is_none());
        assert!(claim("unique:alice", b"3").unwrap());
    }

    #[test]
    fn concurrent_claims_have_one_winner() {
        let (store, _dir) = open();
        let store = Arc::new(store);
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .write_if_absent(&["unique:race"], &[("unique:race", [i].as_slice())], &[])
                        .unwrap()
                })
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn scan_stops_at_prefix_boundary() {
        let (store, _dir) = open();
        store
            .batch_set(&[
                ("portfolio:account:1", b"a".as_slice()),
                ("portfolio:account:2", b"b".as_slice()),
                ("portfolio:audit:1", b"c".as_slice()),
            ])
            .unwrap();

        let accounts = store.scan("portfolio:account:").unwrap();
        let keys: Vec<&str> = accounts.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["portfolio:account:1", "portfolio:account:2"]);
    }

    #[test]
    fn increment_starts_at_one() {
        let (store, _dir) = open();
        assert_eq!(store.increment("seq:portfolio:account").unwrap(), 1);
        assert_eq!(store.increment("seq:portfolio:account").unwrap(), 2);
        assert_eq!(store.increment("seq:portfolio:audit").unwrap(), 1);
    }

    #[test]
    fn increment_rejects_foreign_value() {
        let (store, _dir) = open();
        store.set("seq:broken", b"xyz").unwrap();
        let err = store.increment("seq:broken").unwrap_err();
        assert!(matches!(err, KVError::Corrupt { .. }));
    }

    #[test]
    fn concurrent_increments_are_unique() {
        let (store, _dir) = open();
        let store = Arc::new(store);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| store.increment("seq:race").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 100);
        assert_eq!(seen.last(), Some(&100));
    }
}
