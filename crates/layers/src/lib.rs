//! Declarative layer configuration and its resolution into a render plan.
//!
//! A `LayerConfig` describes which layers a map shows and how they interact:
//! required layers, mutually exclusive base choices, and independently
//! toggleable overlays. `resolve_config` fetches the data every configured
//! layer needs; `build_render_plan` turns configuration plus resolved data
//! into a flat render-tree description for the host renderer.

pub mod config;
pub mod render;
pub mod resolver;

pub use config::*;
pub use render::*;
pub use resolver::*;
