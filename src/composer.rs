//! Composition orchestration.
//!
//! # Responsibilities
//! - Walk the route tree, then load and register every unit it found
//! - Resolve the whole graph before any node is bound
//! - Bind the tree and mount it into the top-level router
//! - Statically check a tree without running any definition
//!
//! # Design Decisions
//! - The DependencyGraph is owned here and passed down by reference
//! - Each phase completes before the next starts: walk, register, resolve, init
//! - Fail fast: any walk, manifest, graph or init error aborts the build

use std::path::Path;
use std::time::Instant;

use axum::Router;
use futures_util::future::try_join_all;
use serde::Serialize;

use crate::config::CompositionConfig;
use crate::definition::{Catalog, RouteManifest, UnitManifest};
use crate::error::Result;
use crate::graph::{DependencyGraph, FailurePolicy, ResolveReport, ResolvedUnits};
use crate::http::static_files;
use crate::tree::{walk, NodeKind, RouteTreeNode, TreeBuilder, WalkOutcome};

type Hook = Box<dyn FnOnce(Router) -> Router + Send>;

/// Builds the application router from a directory and a catalog.
pub struct Composer {
    config: CompositionConfig,
    catalog: Catalog,
    before_routes: Vec<Hook>,
    after_routes: Vec<Hook>,
}

/// A composed application.
pub struct Composition {
    /// Top-level router, ready to serve.
    pub router: Router,
    /// The bound route tree.
    pub tree: RouteTreeNode,
    /// Unit resolution outcome, including soft failures.
    pub report: ResolveReport,
}

impl Composer {
    pub fn new(config: CompositionConfig, catalog: Catalog) -> Self {
        Self {
            config,
            catalog,
            before_routes: Vec::new(),
            after_routes: Vec::new(),
        }
    }

    /// Transform the top-level router before the tree is merged in.
    pub fn before_routes<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.before_routes.push(Box::new(hook));
        self
    }

    /// Transform the top-level router after the tree (and static files) are mounted.
    ///
    /// Layers added here wrap every route of the tree.
    pub fn after_routes<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.after_routes.push(Box::new(hook));
        self
    }

    pub async fn build(self) -> Result<Composition> {
        let started = Instant::now();
        let root_dir = self.config.root.clone();

        let WalkOutcome {
            root: mut tree,
            pending_units,
        } = TreeBuilder::new(&root_dir).build().await?;

        let mut graph = DependencyGraph::new(self.config.failure_policy);
        register_units(&mut graph, &self.catalog, &pending_units).await?;

        let report = graph.resolve_all()?;
        for failure in &report.failed {
            tracing::warn!(unit = %failure.name, error = %failure.message, "Unit has no value");
        }

        tree.init(&graph.resolved_units(), &self.catalog)?;

        let mut router = Router::new();
        for hook in self.before_routes {
            router = hook(router);
        }
        if let Some(routes) = tree.router() {
            router = router.merge(routes.clone());
        }
        if self.config.serve_static {
            router = router.fallback_service(static_files(&root_dir));
        }
        for hook in self.after_routes {
            router = hook(router);
        }

        tracing::info!(
            root = %root_dir.display(),
            units = graph.len(),
            failed = report.failed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Route tree composed"
        );
        Ok(Composition {
            router,
            tree,
            report,
        })
    }
}

async fn load_units(paths: &[std::path::PathBuf]) -> Result<Vec<UnitManifest>> {
    Ok(try_join_all(paths.iter().map(|path| UnitManifest::load(path))).await?)
}

async fn register_units(
    graph: &mut DependencyGraph,
    catalog: &Catalog,
    paths: &[std::path::PathBuf],
) -> Result<()> {
    for manifest in load_units(paths).await? {
        let definition = catalog.lookup_unit(&manifest)?;
        tracing::debug!(
            unit = %manifest.name,
            file = %manifest.path.display(),
            "Registering unit"
        );
        graph.register(manifest.name, manifest.deps, move |deps| definition.compute(deps))?;
    }
    Ok(())
}

/// Outcome of [`check`].
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Unit names, in discovery order.
    pub units: Vec<String>,
    /// Route, index and app definition files checked.
    pub route_files: usize,
}

/// Validate a tree without a catalog.
///
/// Every manifest must parse, every alias must name a unit, the unit graph
/// must be acyclic and every child must be mountable. Directories that would
/// not be mounted are checked too.
pub async fn check(root: &Path) -> Result<CheckReport> {
    let WalkOutcome {
        root: tree,
        pending_units,
    } = walk(root).await?;

    let mut graph = DependencyGraph::new(FailurePolicy::Strict);
    for manifest in load_units(&pending_units).await? {
        graph.register(manifest.name, manifest.deps, |_| Ok(None))?;
    }
    graph.resolve_all()?;

    let resolved = graph.resolved_units();
    let mut route_files = 0;
    check_node(&tree, &resolved, &mut route_files)?;

    Ok(CheckReport {
        units: graph.names().map(str::to_string).collect(),
        route_files,
    })
}

fn check_node(node: &RouteTreeNode, resolved: &ResolvedUnits, count: &mut usize) -> Result<()> {
    let own = match node.kind() {
        NodeKind::Leaf => Some(node.path()),
        NodeKind::Directory => None,
    };
    let files = own
        .into_iter()
        .chain(node.app_definition())
        .chain(node.index_definition());

    node.check_mounts()?;
    for file in files {
        let manifest = RouteManifest::read(file)?;
        resolved.inject(&manifest.deps, &file.display().to_string())?;
        *count += 1;
    }
    for child in node.children() {
        check_node(child, resolved, count)?;
    }
    Ok(())
}
