//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::definition::ManifestError;
use crate::graph::GraphError;
use crate::tree::{InitError, TreeError};

/// Any failure while composing or serving a route tree.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("route tree: {0}")]
    Tree(#[from] TreeError),

    #[error("definition: {0}")]
    Manifest(#[from] ManifestError),

    #[error("dependency graph: {0}")]
    Graph(#[from] GraphError),

    #[error("initialization: {0}")]
    Init(#[from] InitError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for burrow operations.
pub type Result<T> = std::result::Result<T, Error>;
