//! burrow: compose an axum application from a directory layout.
//!
//! A directory tree of definition manifests becomes a tree of nested routers.
//! Unit manifests (`*.mod.toml`) form a named dependency graph that is fully
//! resolved before any route is bound; route manifests (`*.sv.toml`) receive
//! the units they ask for under their own aliases.
//!
//! ```text
//! server/
//! ├── app.sv.toml          → app definition wrapping the whole tree
//! ├── index.sv.toml        → routes at /
//! ├── about.sv.toml        → routes at /about
//! ├── models/blog.mod.toml → unit "model.blog"
//! └── blog/
//!     └── index.sv.toml    → routes at /blog
//! ```

pub mod composer;
pub mod config;
pub mod definition;
pub mod error;
pub mod graph;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod tree;

pub use composer::{check, Composer, Composition};
pub use config::BurrowConfig;
pub use definition::{AppBuilder, Catalog};
pub use error::{Error, Result};
pub use graph::{share, DependencyGraph, FailurePolicy, Injected};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use tree::{RouteTreeNode, TreeBuilder};
