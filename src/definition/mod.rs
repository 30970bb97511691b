//! Definitions: what a manifest on disk binds to in the running process.
//!
//! # Data Flow
//! ```text
//! *.mod.toml / *.sv.toml
//!     → manifest.rs (read, parse, check required fields)
//!     → catalog.rs (look up `def` among compiled-in definitions)
//!     → UnitDefinition   → registered into the DependencyGraph
//!     → RouteDefinition  → invoked once with a fresh Router
//!     → AppDefinition    → returns an AppBuilder stage list (app.rs)
//! ```
//!
//! # Design Decisions
//! - Manifests carry names and dependency aliases; behavior lives in Rust code
//! - Every load error names the offending file

pub mod app;
pub mod catalog;
pub mod manifest;

pub use app::AppBuilder;
pub use catalog::{AppDefinition, Catalog, RouteDefinition, UnitDefinition};
pub use manifest::{ManifestError, RouteManifest, UnitManifest};
