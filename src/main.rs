//! burrow CLI: inspect and validate route trees.
//!
//! Serving needs a catalog of compiled-in definitions, so it happens in the
//! application embedding the library. This binary works on the directory alone.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use burrow::config::{load_config, BurrowConfig};
use burrow::observability::logging;
use burrow::tree::{walk, NodeKind, RouteTreeNode};

#[derive(Parser)]
#[command(name = "burrow")]
#[command(about = "Inspect and validate directory-composed route trees", long_about = None)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level, used when RUST_LOG is not set.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the discovered route tree and unit files
    Tree {
        /// Route tree root (defaults to composition.root)
        root: Option<PathBuf>,
        /// Print JSON instead of an outline
        #[arg(long)]
        json: bool,
    },
    /// Parse every manifest and check unit references and cycles
    Check {
        /// Route tree root (defaults to composition.root)
        root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BurrowConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    logging::init(&config.observability)?;

    match cli.command {
        Commands::Tree { root, json } => {
            let root = root.unwrap_or(config.composition.root);
            let outcome = walk(&root).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.root.view())?);
            } else {
                print_outline(&outcome.root, "/", 0);
                for unit in &outcome.pending_units {
                    println!("unit {}", relative(unit, &root).display());
                }
            }
        }
        Commands::Check { root } => {
            let root = root.unwrap_or(config.composition.root);
            let report = burrow::check(&root).await?;
            println!(
                "ok: {} units, {} route files",
                report.units.len(),
                report.route_files
            );
        }
    }

    Ok(())
}

fn print_outline(node: &RouteTreeNode, mount: &str, depth: usize) {
    let indent = "  ".repeat(depth);
    let mut markers = Vec::new();
    if node.app_definition().is_some() {
        markers.push("app");
    }
    if node.index_definition().is_some() {
        markers.push("index");
    }
    let bare_dir = node.kind() == NodeKind::Directory
        && node.index_definition().is_none()
        && node.app_definition().is_none();
    if bare_dir && !node.children().is_empty() {
        markers.push("unmounted children");
    }
    let suffix = if markers.is_empty() {
        String::new()
    } else {
        format!(" [{}]", markers.join(", "))
    };
    println!("{indent}{mount}{suffix}");

    for child in node.children() {
        let child_mount = format!("{}/{}", mount.trim_end_matches('/'), child.name());
        print_outline(child, &child_mount, depth + 1);
    }
}

fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
