//! Directory walk producing the route tree.
//!
//! # Responsibilities
//! - List each directory and classify its entries by name
//! - Recurse into subdirectories
//! - Collect unit definition paths without loading them
//!
//! # Design Decisions
//! - All entries of a directory are processed concurrently and joined with
//!   `try_join_all`, which keeps listing order and stops at the first error
//! - No partial tree: any filesystem error fails the whole walk
//! - Unit files are only collected here so the graph is never observed half
//!   populated while the tree is still being discovered

use std::path::{Path, PathBuf};

use futures_util::future::{try_join_all, BoxFuture};
use thiserror::Error;

use crate::tree::naming::{classify, EntryClass};
use crate::tree::node::RouteTreeNode;

/// Errors raised while walking the route tree.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TreeError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| TreeError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of a completed walk.
#[derive(Debug)]
pub struct WalkOutcome {
    pub root: RouteTreeNode,
    /// Unit definition files, in discovery order.
    pub pending_units: Vec<PathBuf>,
}

/// Builds a [`RouteTreeNode`] tree from a directory.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    root: PathBuf,
}

impl TreeBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn build(&self) -> Result<WalkOutcome, TreeError> {
        walk(&self.root).await
    }
}

/// Walk `dir` and everything below it.
pub async fn walk(dir: &Path) -> Result<WalkOutcome, TreeError> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string());
    let (root, pending_units) = walk_dir(name, dir.to_path_buf()).await?;

    tracing::info!(
        root = %dir.display(),
        children = root.children().len(),
        units = pending_units.len(),
        "Route tree discovered"
    );
    Ok(WalkOutcome {
        root,
        pending_units,
    })
}

enum Discovered {
    App(PathBuf),
    Index(PathBuf),
    Leaf(RouteTreeNode),
    Unit(PathBuf),
    Directory(RouteTreeNode, Vec<PathBuf>),
    Ignored,
}

type DirWalk = BoxFuture<'static, Result<(RouteTreeNode, Vec<PathBuf>), TreeError>>;

fn walk_dir(name: String, dir: PathBuf) -> DirWalk {
    Box::pin(async move {
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(TreeError::io(&dir))?;
        let mut file_names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(TreeError::io(&dir))? {
            match entry.file_name().into_string() {
                Ok(file_name) => file_names.push(file_name),
                Err(raw) => {
                    tracing::debug!(dir = %dir.display(), entry = ?raw, "Skipping non UTF-8 entry")
                }
            }
        }

        let discovered = try_join_all(
            file_names
                .into_iter()
                .map(|file_name| discover(dir.clone(), file_name)),
        )
        .await?;

        let mut node = RouteTreeNode::directory(name, dir.clone());
        let mut pending = Vec::new();
        for item in discovered {
            match item {
                Discovered::App(path) => {
                    if !node.set_app_definition(path.clone()) {
                        tracing::debug!(file = %path.display(), "Duplicate app definition ignored");
                    }
                }
                Discovered::Index(path) => {
                    if !node.set_index_definition(path.clone()) {
                        tracing::debug!(
                            file = %path.display(),
                            "Duplicate index definition ignored"
                        );
                    }
                }
                Discovered::Leaf(leaf) => node.add_child(leaf),
                Discovered::Unit(path) => pending.push(path),
                Discovered::Directory(child, units) => {
                    node.add_child(child);
                    pending.extend(units);
                }
                Discovered::Ignored => {}
            }
        }
        Ok((node, pending))
    })
}

async fn discover(dir: PathBuf, file_name: String) -> Result<Discovered, TreeError> {
    let path = dir.join(&file_name);
    let discovered = match classify(&file_name) {
        EntryClass::App => Discovered::App(path),
        EntryClass::Index => Discovered::Index(path),
        EntryClass::Route(name) => Discovered::Leaf(RouteTreeNode::leaf(name, path)),
        EntryClass::Module => Discovered::Unit(path),
        EntryClass::DirectoryCandidate => {
            let metadata = tokio::fs::metadata(&path).await.map_err(TreeError::io(&path))?;
            if metadata.is_dir() {
                let (child, units) = walk_dir(file_name, path).await?;
                Discovered::Directory(child, units)
            } else {
                Discovered::Ignored
            }
        }
        EntryClass::Other => Discovered::Ignored,
    };
    Ok(discovered)
}
