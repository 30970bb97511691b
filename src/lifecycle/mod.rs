//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (composer):
//!     Load config → Walk tree → Resolve units → Bind routers → Serve
//!
//! Shutdown (shutdown.rs):
//!     trigger() → every subscriber (server, tests) stops
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Composition finishes completely before the listener accepts traffic
//! - Shutdown stops accepting, then drains in-flight requests

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
