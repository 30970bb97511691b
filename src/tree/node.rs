//! Route tree nodes and their binding to routers.
//!
//! # Responsibilities
//! - Mirror the directory layout (directories and leaf route files)
//! - Bind each node to an `axum::Router` once every unit is resolved
//! - Nest children under `/<name>` in listing order
//!
//! # Design Decisions
//! - `init` is a single synchronous top-down pass
//! - An app definition decides, through its stage list, whether and where the
//!   subtree is mounted
//! - A directory without an index definition mounts nothing below it
//! - Children are checked before anything is nested: two children mounted
//!   at the same path, or a name axum would read as route syntax, is an
//!   error rather than a router panic

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use axum::Router;
use serde::Serialize;
use thiserror::Error;

use crate::definition::{AppBuilder, Catalog, ManifestError, RouteManifest};
use crate::graph::{GraphError, Injected, ResolvedUnits};
use crate::tree::naming::is_mountable_segment;

/// Errors raised while binding the tree to routers.
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A leaf and a directory of the same name would both mount at `/<name>`.
    #[error("{} has more than one child mounted at /{name}", dir.display())]
    RouteConflict { dir: PathBuf, name: String },

    /// The entry name cannot be used as a literal path segment.
    #[error("{} cannot be mounted: \"{name}\" is not a literal path segment", path.display())]
    InvalidSegment { path: PathBuf, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
    Leaf,
}

/// A node of the route tree.
pub struct RouteTreeNode {
    name: String,
    path: PathBuf,
    kind: NodeKind,
    children: Vec<RouteTreeNode>,
    app_definition: Option<PathBuf>,
    index_definition: Option<PathBuf>,
    router: Option<Router>,
}

impl RouteTreeNode {
    pub fn directory(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(name.into(), path.into(), NodeKind::Directory)
    }

    /// A leaf backed by the route file at `path`.
    pub fn leaf(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(name.into(), path.into(), NodeKind::Leaf)
    }

    fn new(name: String, path: PathBuf, kind: NodeKind) -> Self {
        Self {
            name,
            path,
            kind,
            children: Vec::new(),
            app_definition: None,
            index_definition: None,
            router: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn children(&self) -> &[RouteTreeNode] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&RouteTreeNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn app_definition(&self) -> Option<&Path> {
        self.app_definition.as_deref()
    }

    pub fn index_definition(&self) -> Option<&Path> {
        self.index_definition.as_deref()
    }

    /// The bound router; `None` until [`init`](Self::init) ran.
    pub fn router(&self) -> Option<&Router> {
        self.router.as_ref()
    }

    pub fn into_router(self) -> Option<Router> {
        self.router
    }

    pub fn add_child(&mut self, child: RouteTreeNode) {
        self.children.push(child);
    }

    /// Set the app definition. Returns false if one was already set.
    pub fn set_app_definition(&mut self, path: PathBuf) -> bool {
        set_once(&mut self.app_definition, path)
    }

    /// Set the index definition. Returns false if one was already set.
    pub fn set_index_definition(&mut self, path: PathBuf) -> bool {
        set_once(&mut self.index_definition, path)
    }

    /// Bind this node, and the part of the subtree it mounts, to routers.
    pub fn init(&mut self, resolved: &ResolvedUnits, catalog: &Catalog) -> Result<(), InitError> {
        let router = match self.kind {
            NodeKind::Leaf => {
                let path = self.path.clone();
                bind_route(&path, resolved, catalog, Router::new())?
            }
            NodeKind::Directory => match self.app_definition.clone() {
                Some(app_path) => {
                    let manifest = RouteManifest::read(&app_path)?;
                    let definition = catalog.lookup_app(&manifest)?;
                    let deps = inject(&manifest, resolved)?;
                    let app = definition.define(&deps, AppBuilder::new());
                    if !app.mounts_routes() {
                        tracing::warn!(
                            app = %app_path.display(),
                            "App definition never mounts routes, its subtree stays unmounted"
                        );
                    }
                    app.finalize(|| self.subroutes(resolved, catalog))?
                }
                None => self.subroutes(resolved, catalog)?,
            },
        };

        tracing::debug!(node = %self.name, kind = ?self.kind, "Route node bound");
        self.router = Some(router);
        Ok(())
    }

    /// Index route plus nested children.
    fn subroutes(
        &mut self,
        resolved: &ResolvedUnits,
        catalog: &Catalog,
    ) -> Result<Router, InitError> {
        let Some(index_path) = self.index_definition.clone() else {
            if !self.children.is_empty() {
                tracing::warn!(
                    dir = %self.path.display(),
                    children = self.children.len(),
                    "Directory has no index definition, its children are not mounted"
                );
            }
            return Ok(Router::new());
        };

        self.check_mounts()?;
        let mut router = bind_route(&index_path, resolved, catalog, Router::new())?;
        for child in &mut self.children {
            child.init(resolved, catalog)?;
            if let Some(child_router) = child.router.clone() {
                router = router.nest(&format!("/{}", child.name), child_router);
            }
        }
        Ok(router)
    }

    /// Check that every child can be nested under its own `/<name>`.
    pub fn check_mounts(&self) -> Result<(), InitError> {
        let mut seen = HashSet::new();
        for child in &self.children {
            if !is_mountable_segment(&child.name) {
                return Err(InitError::InvalidSegment {
                    path: child.path.clone(),
                    name: child.name.clone(),
                });
            }
            if !seen.insert(child.name.as_str()) {
                return Err(InitError::RouteConflict {
                    dir: self.path.clone(),
                    name: child.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Serializable outline of the tree.
    pub fn view(&self) -> NodeView {
        NodeView {
            name: self.name.clone(),
            kind: self.kind,
            path: self.path.clone(),
            app: self.app_definition.clone(),
            index: self.index_definition.clone(),
            bound: self.router.is_some(),
            children: self.children.iter().map(RouteTreeNode::view).collect(),
        }
    }
}

impl fmt::Debug for RouteTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTreeNode")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("app_definition", &self.app_definition)
            .field("index_definition", &self.index_definition)
            .field("bound", &self.router.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// Outline of a node, as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub name: String,
    pub kind: NodeKind,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<PathBuf>,
    pub bound: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeView>,
}

fn set_once(slot: &mut Option<PathBuf>, path: PathBuf) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(path);
    true
}

fn inject(manifest: &RouteManifest, resolved: &ResolvedUnits) -> Result<Injected, GraphError> {
    resolved.inject(&manifest.deps, &manifest.path.display().to_string())
}

/// Load a route file and invoke its definition once on `router`.
fn bind_route(
    path: &Path,
    resolved: &ResolvedUnits,
    catalog: &Catalog,
    router: Router,
) -> Result<Router, InitError> {
    let manifest = RouteManifest::read(path)?;
    let definition = catalog.lookup_route(&manifest)?;
    let deps = inject(&manifest, resolved)?;
    Ok(definition.define(&deps, router))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_definitions_are_set_once() {
        let mut node = RouteTreeNode::directory("blog", "/srv/blog");
        assert!(node.set_app_definition("/srv/blog/app.sv.toml".into()));
        assert!(!node.set_app_definition("/srv/blog/other".into()));
        assert_eq!(node.app_definition(), Some(Path::new("/srv/blog/app.sv.toml")));
        assert!(node.index_definition().is_none());
    }

    #[test]
    fn test_directory_without_index_binds_empty_router() {
        let mut root = RouteTreeNode::directory("root", "/srv");
        root.add_child(RouteTreeNode::leaf("about", "/srv/about.sv.toml"));

        root.init(&ResolvedUnits::default(), &Catalog::new()).unwrap();

        assert!(root.router().is_some());
        assert!(root.child("about").unwrap().router().is_none());
    }

    #[test]
    fn test_view_outline() {
        let mut root = RouteTreeNode::directory("root", "/srv");
        root.set_index_definition("/srv/index.sv.toml".into());
        root.add_child(RouteTreeNode::leaf("about", "/srv/about.sv.toml"));

        let view = root.view();
        assert_eq!(view.children.len(), 1);
        assert_eq!(view.children[0].kind, NodeKind::Leaf);
        assert!(!view.bound);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["kind"], "directory");
        assert_eq!(json["children"][0]["name"], "about");
    }

    #[test]
    fn test_leaf_and_directory_of_same_name_conflict() {
        let mut root = RouteTreeNode::directory("root", "/srv");
        root.add_child(RouteTreeNode::leaf("foo", "/srv/foo.sv.toml"));
        root.add_child(RouteTreeNode::directory("foo", "/srv/foo"));

        match root.check_mounts() {
            Err(InitError::RouteConflict { dir, name }) => {
                assert_eq!(dir, Path::new("/srv"));
                assert_eq!(name, "foo");
            }
            other => panic!("expected RouteConflict, got {other:?}"),
        }
    }

    #[test]
    fn test_route_syntax_names_are_rejected() {
        let mut root = RouteTreeNode::directory("root", "/srv");
        root.add_child(RouteTreeNode::directory("blog", "/srv/blog"));
        root.add_child(RouteTreeNode::directory(":id", "/srv/:id"));

        match root.check_mounts() {
            Err(InitError::InvalidSegment { path, name }) => {
                assert_eq!(path, Path::new("/srv/:id"));
                assert_eq!(name, ":id");
            }
            other => panic!("expected InvalidSegment, got {other:?}"),
        }
    }
}
