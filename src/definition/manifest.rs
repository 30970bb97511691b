//! Definition manifests.
//!
//! A unit manifest (`*.mod.toml`) must declare `name` and `def`.
//! A route, index or app manifest (`*.sv.toml`) must declare `def`.
//! Both may carry a `[deps]` table mapping local aliases to unit names.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::graph::DependencyRequest;

/// Errors raised while loading a definition file.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read definition {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse definition {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("definition {} must declare `{field}`", path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("definition {} names unknown {kind} definition \"{key}\"", path.display())]
    UnknownDefinition {
        path: PathBuf,
        kind: &'static str,
        key: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    name: Option<String>,
    def: Option<String>,
    #[serde(default)]
    deps: DependencyRequest,
}

impl RawManifest {
    fn parse(path: &Path, content: &str) -> Result<Self, ManifestError> {
        toml::from_str(content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn required(
        field: Option<String>,
        path: &Path,
        name: &'static str,
    ) -> Result<String, ManifestError> {
        field
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ManifestError::MissingField {
                path: path.to_path_buf(),
                field: name,
            })
    }
}

/// Manifest of a route, index or app definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteManifest {
    pub path: PathBuf,
    pub def: String,
    pub deps: DependencyRequest,
}

impl RouteManifest {
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self, ManifestError> {
        let path = path.into();
        let raw = RawManifest::parse(&path, content)?;
        let def = RawManifest::required(raw.def, &path, "def")?;
        Ok(Self {
            path,
            def,
            deps: raw.deps,
        })
    }

    /// Read a manifest synchronously. Tree initialization is a synchronous pass.
    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }
}

/// Manifest of a unit definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitManifest {
    pub path: PathBuf,
    pub name: String,
    pub def: String,
    pub deps: DependencyRequest,
}

impl UnitManifest {
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self, ManifestError> {
        let path = path.into();
        let raw = RawManifest::parse(&path, content)?;
        let name = RawManifest::required(raw.name, &path, "name")?;
        let def = RawManifest::required(raw.def, &path, "def")?;
        Ok(Self {
            path,
            name,
            def,
            deps: raw.deps,
        })
    }

    pub async fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ManifestError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(path, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_manifest() {
        let manifest = UnitManifest::parse(
            "models/blog.mod.toml",
            r#"
                name = "model.blog"
                def = "blog.model"

                [deps]
                Store = "store"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.name, "model.blog");
        assert_eq!(manifest.def, "blog.model");
        assert_eq!(manifest.deps.iter().collect::<Vec<_>>(), vec![("Store", "store")]);
    }

    #[test]
    fn test_route_manifest_without_deps() {
        let manifest = RouteManifest::parse("index.sv.toml", "def = \"home\"").unwrap();
        assert!(manifest.deps.is_empty());
    }

    #[test]
    fn test_missing_fields_name_the_file() {
        let err = UnitManifest::parse("lib/db.mod.toml", "def = \"db\"").unwrap_err();
        assert_eq!(err.to_string(), "definition lib/db.mod.toml must declare `name`");

        let err = RouteManifest::parse("blog/index.sv.toml", "[deps]\nBlog = \"model.blog\"")
            .unwrap_err();
        assert!(matches!(err, ManifestError::MissingField { field: "def", .. }));

        let err = RouteManifest::parse("about.sv.toml", "def = \"  \"").unwrap_err();
        assert!(matches!(err, ManifestError::MissingField { field: "def", .. }));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let err = RouteManifest::parse("broken.sv.toml", "def = ").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
        assert!(err.to_string().contains("broken.sv.toml"));
    }

    #[test]
    fn test_read_missing_file() {
        let err = RouteManifest::read(Path::new("/nonexistent/burrow/index.sv.toml")).unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
    }
}
