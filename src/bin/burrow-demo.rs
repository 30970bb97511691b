//! Demo server composed from `demos/blog`.

use std::path::PathBuf;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::routing::get;
use clap::Parser;
use tokio::net::TcpListener;

use burrow::observability::logging;
use burrow::{share, BurrowConfig, Catalog, Composer, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "burrow-demo")]
#[command(about = "Serve the demo route tree", long_about = None)]
struct Args {
    /// Route tree root
    #[arg(long, default_value = "demos/blog")]
    root: PathBuf,

    /// Listen address
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,
}

#[derive(Debug)]
struct Blog {
    site: String,
    posts: Vec<String>,
}

impl Blog {
    fn find(&self, index: usize) -> Option<&str> {
        self.posts.get(index).map(String::as_str)
    }
}

/// Featured post, injected into every request by the app definition.
#[derive(Clone)]
struct Featured(String);

fn catalog() -> Catalog {
    Catalog::new()
        .unit("site.name", |_| Ok(Some(share("burrow demo".to_string()))))
        .unit("blog.model", |deps| {
            let site = deps.require::<String>("Site")?;
            Ok(Some(share(Blog {
                site: site.to_string(),
                posts: vec!["test blog".to_string()],
            })))
        })
        .app("site.app", |deps, app| {
            let featured = deps
                .get::<Blog>("Blog")
                .and_then(|blog| blog.find(0).map(str::to_string))
                .unwrap_or_default();
            app.mount_routes()
                .stage(move |router| router.layer(Extension(Featured(featured))))
        })
        .route("site.index", |_, router| {
            router
                .route("/", get(|| async { "home" }))
                .route(
                    "/app",
                    get(|Extension(Featured(post)): Extension<Featured>| async move { post }),
                )
        })
        .route("site.about", |deps, router| {
            let site = deps.get::<String>("Site");
            router.route(
                "/",
                get(move || {
                    let site = site.clone();
                    async move { site.map(|s| s.to_string()).unwrap_or_default() }
                }),
            )
        })
        .route("blog.index", |deps, router| {
            let blog = deps.get::<Blog>("Blog");
            router.route(
                "/",
                get(move || {
                    let blog = blog.clone();
                    async move {
                        blog.and_then(|b| b.find(0).map(|post| format!("{post} ({})", b.site)))
                            .ok_or(StatusCode::NOT_FOUND)
                    }
                }),
            )
        })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = BurrowConfig::default();
    config.composition.root = args.root;
    config.composition.serve_static = true;
    config.listener.bind_address = args.bind;
    logging::init(&config.observability)?;

    let composition = Composer::new(config.composition.clone(), catalog())
        .build()
        .await?;
    if !composition.report.is_clean() {
        tracing::warn!(failed = composition.report.failed.len(), "Some units have no value");
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let shutdown = Shutdown::new();
    HttpServer::new(composition.router, config)
        .run(listener, shutdown.subscribe())
        .await?;

    Ok(())
}
