//! Cache-first access to remote spatial data.
//!
//! The persistent cache is an external key-value collaborator with two named
//! stores: a query index (composite query key to bounding box and shape key
//! list) and a shape store (shape key to shape data). `LayerFetcher` consults
//! the cache first and falls back to the remote source, writing results back
//! as one atomic batch.

pub mod fetcher;
pub mod memory;
pub mod query_key;
pub mod store;

pub use fetcher::*;
pub use memory::*;
pub use query_key::*;
pub use store::*;
