//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BurrowConfig (validated, immutable)
//!     → composer (root, static files, failure policy)
//!     → HttpServer (listener, timeouts)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BurrowConfig, CompositionConfig, ListenerConfig, ObservabilityConfig, TimeoutConfig,
};
pub use validation::ValidationError;
