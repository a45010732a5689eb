use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use geodata::BoxFuture;
use serde_json::Value;

use crate::store::{KeyValueStore, PutOp, Store, StoreError};

/// Deterministic in-memory store, primarily for tests and single-process use.
///
/// All stores live behind one mutex; a batch applies under that lock, which
/// gives the all-or-nothing commit the `KeyValueStore` contract requires.
#[derive(Debug, Default)]
pub struct MemoryStore {
    stores: Mutex<BTreeMap<Store, BTreeMap<String, Value>>>,
    gets: AtomicU64,
    puts: AtomicU64,
    fail_puts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get` calls served, for cache-idempotence assertions.
    pub fn gets(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }

    /// Number of individual writes committed.
    pub fn puts(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Makes every subsequent batch fail without committing anything,
    /// simulating an unavailable storage collaborator.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::Relaxed);
    }

    /// Number of entries in one named store.
    pub fn len(&self, store: Store) -> usize {
        self.stores
            .lock()
            .map(|stores| stores.get(&store).map(BTreeMap::len).unwrap_or(0))
            .unwrap_or(0)
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(
        &'a self,
        store: Store,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>, StoreError>> {
        Box::pin(async move {
            self.gets.fetch_add(1, Ordering::Relaxed);
            let stores = self
                .stores
                .lock()
                .map_err(|_| StoreError("store mutex poisoned".into()))?;
            Ok(stores
                .get(&store)
                .and_then(|entries| entries.get(key))
                .cloned())
        })
    }

    fn put_batch(&self, ops: Vec<PutOp>) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            if self.fail_puts.load(Ordering::Relaxed) {
                return Err(StoreError("store unavailable".into()));
            }
            let mut stores = self
                .stores
                .lock()
                .map_err(|_| StoreError("store mutex poisoned".into()))?;
            let count = ops.len() as u64;
            for op in ops {
                stores.entry(op.store).or_default().insert(op.key, op.value);
            }
            self.puts.fetch_add(count, Ordering::Relaxed);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::store::{KeyValueStore, PutOp, Store};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn batch_writes_land_in_their_stores() {
        let store = MemoryStore::new();
        store
            .put_batch(vec![
                PutOp::new(Store::Shapes, "03403", json!({"name": "Oldenburg"})),
                PutOp::new(Store::Queries, "5\u{1f}03403", json!({"shape_keys": ["03403"]})),
            ])
            .await
            .unwrap();

        assert_eq!(store.len(Store::Shapes), 1);
        assert_eq!(store.len(Store::Queries), 1);
        let shape = store.get(Store::Shapes, "03403").await.unwrap();
        assert_eq!(shape, Some(json!({"name": "Oldenburg"})));
    }

    #[tokio::test]
    async fn failed_batch_commits_nothing() {
        let store = MemoryStore::new();
        store.fail_puts(true);
        let result = store
            .put_batch(vec![PutOp::new(Store::Shapes, "a", json!(1))])
            .await;

        assert!(result.is_err());
        assert_eq!(store.len(Store::Shapes), 0);
        assert_eq!(store.puts(), 0);
    }
}
