use geodata::BoxFuture;
use serde_json::Value;

/// Named object stores of the persistent cache.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Store {
    /// Query index: composite query key to cache entry.
    Queries,
    /// Shape store: shape key to shape data.
    Shapes,
}

impl Store {
    pub fn name(self) -> &'static str {
        match self {
            Store::Queries => "queries",
            Store::Shapes => "shapes",
        }
    }
}

/// One write of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct PutOp {
    pub store: Store,
    pub key: String,
    pub value: Value,
}

impl PutOp {
    pub fn new(store: Store, key: impl Into<String>, value: Value) -> Self {
        Self {
            store,
            key: key.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// Durable key-value collaborator, shared process-wide across fetches.
///
/// `put_batch` is the multi-store transaction seam: implementations must
/// commit the whole batch or none of it, so a query-index entry can never be
/// committed without the shapes it references.
pub trait KeyValueStore: Send + Sync {
    fn get<'a>(
        &'a self,
        store: Store,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>, StoreError>>;

    fn put_batch(&self, ops: Vec<PutOp>) -> BoxFuture<'_, Result<(), StoreError>>;
}
