//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum::serve, graceful shutdown)
//!     → request.rs (request id) → TraceLayer → TimeoutLayer
//!     → composed route tree
//!     → static_files.rs (fallback, privacy filtered)
//! ```

pub mod request;
pub mod server;
pub mod static_files;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
pub use static_files::{
    is_private_segment, is_private_url, should_reject, should_reject_encoded, static_files,
};
