//! Route tree subsystem.
//!
//! # Data Flow
//! ```text
//! root directory
//!     → builder.rs (async walk, naming.rs classification)
//!     → RouteTreeNode tree + pending unit definition paths
//!     → [units registered and resolved by the composer]
//!     → node.rs (init: bind every mounted node to an axum Router)
//! ```
//!
//! # Design Decisions
//! - The tree mirrors the filesystem; children keep directory listing order
//! - Discovery finishes completely before any unit is loaded
//! - Nodes are mutated only by `init`, read-only afterwards

pub mod builder;
pub mod naming;
pub mod node;

pub use builder::{walk, TreeBuilder, TreeError, WalkOutcome};
pub use node::{InitError, NodeKind, NodeView, RouteTreeNode};
