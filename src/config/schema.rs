//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from a TOML file, and
//! every section has defaults so a minimal (or empty) file is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::graph::FailurePolicy;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BurrowConfig {
    /// Route tree composition settings.
    pub composition: CompositionConfig,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// How the route tree is composed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompositionConfig {
    /// Directory the route tree is built from.
    pub root: PathBuf,

    /// Serve non-definition files under `root` as static files.
    pub serve_static: bool,

    /// What a failing unit does to the build.
    pub failure_policy: FailurePolicy,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("server"),
            serve_static: false,
            failure_policy: FailurePolicy::Soft,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
