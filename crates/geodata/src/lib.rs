//! Data model and remote source for the geo-layer engine.
//!
//! This crate defines the shared spatial data types (shapes, layers,
//! resolutions, filters), the wire representations of the remote geo-data
//! API, and the `GeoSource` trait with its reqwest-backed implementation.

pub mod error;
pub mod filter;
pub mod model;
pub mod resolution;
pub mod source;
pub mod wire;

pub use error::*;
pub use filter::*;
pub use model::*;
pub use resolution::*;
pub use source::*;
