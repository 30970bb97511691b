//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Composition (walk, resolve, bind) and serving produce:
//!     → tracing events with structured fields
//!     → logging.rs (subscriber: env filter + fmt/json output)
//! ```
//!
//! # Design Decisions
//! - Structured fields (unit, node, path) rather than formatted messages
//! - `RUST_LOG` overrides the configured level

pub mod logging;
