use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use geodata::{BoundingBox, GeoError, GeoSource, LayerData, Resolution, ShapeData, ShapeKey};

use crate::query_key::QueryKey;
use crate::store::{KeyValueStore, PutOp, Store, StoreError};

/// Query-index record stored under `Store::Queries`.
///
/// Every listed shape key must exist in the shape store; the fetcher keeps
/// that invariant by writing the entry and its shapes in one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub bounding_box: BoundingBox,
    pub shape_keys: Vec<ShapeKey>,
}

/// Cache-first access to the remote geo-data source.
///
/// Fetched data is written back to the store and only retrieved lazily on
/// later identical queries. Concurrent identical fetches are not coalesced;
/// both may miss and both write, which is idempotent for equal data.
pub struct LayerFetcher<S, R> {
    store: S,
    remote: R,
}

impl<S: KeyValueStore, R: GeoSource> LayerFetcher<S, R> {
    pub fn new(store: S, remote: R) -> Self {
        Self { store, remote }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve a spatial query to layer data, consulting the cache first.
    ///
    /// `force` bypasses the cache lookup and overwrites whatever was stored
    /// for the same query.
    pub async fn fetch_layer_data(
        &self,
        resolution: Option<Resolution>,
        keys: &[String],
        force: bool,
    ) -> Result<LayerData, GeoError> {
        let query_key = QueryKey::build(resolution, keys);
        let storage_key = query_key.storage_key();

        if !force {
            if let Some(entry) = self.cached_entry(&storage_key).await? {
                debug!(shapes = entry.shape_keys.len(), "query cache hit");
                return self.reconstruct(entry).await;
            }
        }

        debug!(force, "query cache miss, requesting remote source");
        let data = self.remote.fetch_shapes(resolution, &query_key.keys).await?;
        self.persist(&storage_key, &data).await?;
        Ok(data)
    }

    async fn cached_entry(&self, storage_key: &str) -> Result<Option<CacheEntry>, GeoError> {
        let Some(raw) = self
            .store
            .get(Store::Queries, storage_key)
            .await
            .map_err(storage_err)?
        else {
            return Ok(None);
        };
        let entry = serde_json::from_value(raw).map_err(|e| GeoError::Storage(e.to_string()))?;
        Ok(Some(entry))
    }

    /// Rebuilds layer data from the shape store.
    ///
    /// Individually missing shapes are skipped rather than failing the whole
    /// read; this tolerates partial eviction of the shape store.
    async fn reconstruct(&self, entry: CacheEntry) -> Result<LayerData, GeoError> {
        let mut shapes = Vec::with_capacity(entry.shape_keys.len());
        for shape_key in &entry.shape_keys {
            match self
                .store
                .get(Store::Shapes, shape_key)
                .await
                .map_err(storage_err)?
            {
                Some(raw) => {
                    let shape: ShapeData =
                        serde_json::from_value(raw).map_err(|e| GeoError::Storage(e.to_string()))?;
                    shapes.push(shape);
                }
                None => warn!(shape = %shape_key, "cached query references missing shape"),
            }
        }
        Ok(LayerData {
            bounding_box: entry.bounding_box,
            shapes,
        })
    }

    async fn persist(&self, storage_key: &str, data: &LayerData) -> Result<(), GeoError> {
        let mut ops = Vec::with_capacity(data.shapes.len() + 1);
        let mut shape_keys = Vec::with_capacity(data.shapes.len());
        for shape in &data.shapes {
            let value =
                serde_json::to_value(shape).map_err(|e| GeoError::Storage(e.to_string()))?;
            ops.push(PutOp::new(Store::Shapes, shape.key.clone(), value));
            shape_keys.push(shape.key.clone());
        }

        let entry = CacheEntry {
            bounding_box: data.bounding_box,
            shape_keys,
        };
        let value = serde_json::to_value(&entry).map_err(|e| GeoError::Storage(e.to_string()))?;
        ops.push(PutOp::new(Store::Queries, storage_key, value));

        self.store.put_batch(ops).await.map_err(storage_err)
    }
}

fn storage_err(e: StoreError) -> GeoError {
    GeoError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use geodata::{
        BoxFuture, GeoError, GeoSource, LayerContent, LayerData, LayerFilter, LayerInfo,
        Resolution, ShapeData,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{CacheEntry, LayerFetcher};
    use crate::memory::MemoryStore;
    use crate::query_key::QueryKey;
    use crate::store::{KeyValueStore, PutOp, Store};

    const BOX: [[f64; 2]; 4] = [[6.0, 51.0], [12.0, 51.0], [12.0, 54.0], [6.0, 54.0]];

    fn shape(key: &str) -> ShapeData {
        ShapeData {
            name: format!("shape {key}"),
            key: key.to_string(),
            nuts_key: format!("DE{key}"),
            geometry: json!({"type": "Polygon", "coordinates": []}),
        }
    }

    fn layer_data(keys: &[&str]) -> LayerData {
        LayerData {
            bounding_box: BOX,
            shapes: keys.iter().map(|k| shape(k)).collect(),
        }
    }

    /// Remote double that serves a swappable canned response and records
    /// every shapes request it sees.
    struct FakeSource {
        data: Mutex<LayerData>,
        calls: Mutex<Vec<(Option<Resolution>, Vec<String>)>>,
    }

    impl FakeSource {
        fn new(data: LayerData) -> Self {
            Self {
                data: Mutex::new(data),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn set_data(&self, data: LayerData) {
            *self.data.lock().unwrap() = data;
        }

        fn calls(&self) -> Vec<(Option<Resolution>, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl GeoSource for FakeSource {
        fn fetch_shapes<'a>(
            &'a self,
            resolution: Option<Resolution>,
            keys: &'a [String],
        ) -> BoxFuture<'a, Result<LayerData, GeoError>> {
            Box::pin(async move {
                self.calls
                    .lock()
                    .unwrap()
                    .push((resolution, keys.to_vec()));
                Ok(self.data.lock().unwrap().clone())
            })
        }

        fn available_layers(&self) -> BoxFuture<'_, Result<Option<Vec<LayerInfo>>, GeoError>> {
            Box::pin(async move { Ok(None) })
        }

        fn layer_info<'a>(
            &'a self,
            _layer: &'a str,
        ) -> BoxFuture<'a, Result<Option<LayerInfo>, GeoError>> {
            Box::pin(async move { Ok(None) })
        }

        fn layer_contents<'a>(
            &'a self,
            _layer: &'a str,
            _filter: Option<&'a LayerFilter>,
        ) -> BoxFuture<'a, Result<Option<Vec<LayerContent>>, GeoError>> {
            Box::pin(async move { Ok(None) })
        }
    }

    fn fetcher(data: LayerData) -> LayerFetcher<MemoryStore, FakeSource> {
        LayerFetcher::new(MemoryStore::new(), FakeSource::new(data))
    }

    fn shape_keys(data: &LayerData) -> Vec<&str> {
        data.shapes.iter().map(|s| s.key.as_str()).collect()
    }

    #[tokio::test]
    async fn second_identical_fetch_is_served_from_cache() {
        let fetcher = fetcher(layer_data(&["03403", "03404"]));
        let keys = vec!["03403".to_string(), "03404".to_string()];

        let first = fetcher
            .fetch_layer_data(Some(Resolution::District), &keys, false)
            .await
            .unwrap();
        let second = fetcher
            .fetch_layer_data(Some(Resolution::District), &keys, false)
            .await
            .unwrap();

        assert_eq!(shape_keys(&first), shape_keys(&second));
        assert_eq!(second.bounding_box, BOX);
        // Exactly one remote request; the second call only read the store.
        assert_eq!(fetcher.remote.calls().len(), 1);
    }

    #[tokio::test]
    async fn force_bypasses_and_overwrites_the_cache() {
        let fetcher = fetcher(layer_data(&["03403"]));

        fetcher
            .fetch_layer_data(Some(Resolution::District), &[], false)
            .await
            .unwrap();

        fetcher.remote.set_data(layer_data(&["03403", "03405"]));
        let forced = fetcher
            .fetch_layer_data(Some(Resolution::District), &[], true)
            .await
            .unwrap();
        assert_eq!(shape_keys(&forced), vec!["03403", "03405"]);

        // A later plain fetch reflects the forced refresh without another
        // remote request.
        let cached = fetcher
            .fetch_layer_data(Some(Resolution::District), &[], false)
            .await
            .unwrap();
        assert_eq!(shape_keys(&cached), vec!["03403", "03405"]);
        assert_eq!(fetcher.remote.calls().len(), 2);
    }

    #[tokio::test]
    async fn over_specified_keys_are_truncated_for_the_remote() {
        let fetcher = fetcher(layer_data(&["03403"]));

        fetcher
            .fetch_layer_data(
                Some(Resolution::District),
                &["0340300000".to_string()],
                false,
            )
            .await
            .unwrap();

        let calls = fetcher.remote.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Some(Resolution::District));
        assert_eq!(calls[0].1, vec!["03403".to_string()]);
    }

    #[tokio::test]
    async fn unresolved_and_state_queries_never_share_an_entry() {
        let fetcher = fetcher(layer_data(&["03"]));

        fetcher.fetch_layer_data(None, &[], false).await.unwrap();
        fetcher
            .fetch_layer_data(Some(Resolution::State), &[], false)
            .await
            .unwrap();

        // Both missed the cache and produced distinct query-index entries.
        assert_eq!(fetcher.remote.calls().len(), 2);
        assert_eq!(fetcher.store().len(Store::Queries), 2);
    }

    #[tokio::test]
    async fn partially_evicted_shapes_are_skipped_not_fatal() {
        let store = MemoryStore::new();
        let entry = CacheEntry {
            bounding_box: BOX,
            shape_keys: vec!["03403".to_string(), "03404".to_string()],
        };
        let storage_key = QueryKey::build(Some(Resolution::District), &[]).storage_key();
        store
            .put_batch(vec![
                PutOp::new(Store::Queries, storage_key, serde_json::to_value(&entry).unwrap()),
                // Only one of the two referenced shapes survives.
                PutOp::new(
                    Store::Shapes,
                    "03403",
                    serde_json::to_value(shape("03403")).unwrap(),
                ),
            ])
            .await
            .unwrap();

        let fetcher = LayerFetcher::new(store, FakeSource::new(layer_data(&[])));
        let data = fetcher
            .fetch_layer_data(Some(Resolution::District), &[], false)
            .await
            .unwrap();

        assert_eq!(shape_keys(&data), vec!["03403"]);
        assert!(fetcher.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_surfaces_and_caches_nothing() {
        let fetcher = fetcher(layer_data(&["03403"]));
        fetcher.store().fail_puts(true);

        let result = fetcher
            .fetch_layer_data(Some(Resolution::District), &[], false)
            .await;
        assert!(matches!(result, Err(GeoError::Storage(_))));
        assert_eq!(fetcher.store().len(Store::Queries), 0);
        assert_eq!(fetcher.store().len(Store::Shapes), 0);

        // The next fetch misses again and succeeds once storage recovers.
        fetcher.store().fail_puts(false);
        let data = fetcher
            .fetch_layer_data(Some(Resolution::District), &[], false)
            .await
            .unwrap();
        assert_eq!(shape_keys(&data), vec!["03403"]);
        assert_eq!(fetcher.remote.calls().len(), 2);
    }
}
