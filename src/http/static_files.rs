//! Static file serving behind a privacy filter.
//!
//! # Responsibilities
//! - Decide whether a URL may be served from the route tree's directory
//! - Serve allowed files with `ServeDir`, answer 404 for everything else
//!
//! # Design Decisions
//! - A segment is private if it starts with `.` or `_`, or is `node_modules`
//! - Definition files are never served, wherever they live
//! - Rejected URLs look exactly like missing files (404)
//! - URLs are checked after percent-decoding, the form `ServeDir` opens;
//!   paths that do not decode to UTF-8 are rejected

use std::path::Path;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use percent_encoding::percent_decode_str;
use tower_http::services::ServeDir;

use crate::tree::naming::{is_module_file, is_route_file};

/// Conventional dependency folder name, never served.
pub const DEPENDENCY_DIR: &str = "node_modules";

/// True if a single path segment is private.
pub fn is_private_segment(segment: &str) -> bool {
    segment.starts_with('.') || segment.starts_with('_') || segment == DEPENDENCY_DIR
}

/// True if any segment of the URL path is private.
pub fn is_private_url(url: &str) -> bool {
    url.split('/')
        .filter(|segment| !segment.is_empty())
        .any(is_private_segment)
}

/// True if the URL points at a route or unit definition file.
pub fn is_definition_file(url: &str) -> bool {
    is_route_file(url) || is_module_file(url)
}

/// True if the static layer must not serve this URL.
pub fn should_reject(url: &str) -> bool {
    is_private_url(url) || is_definition_file(url)
}

/// True if the raw (still percent-encoded) request path must not be served.
///
/// Undecodable paths are rejected.
pub fn should_reject_encoded(raw_path: &str) -> bool {
    match percent_decode_str(raw_path).decode_utf8() {
        Ok(decoded) => should_reject(&decoded),
        Err(_) => true,
    }
}

/// Router serving files under `root`, filtered by [`should_reject_encoded`].
pub fn static_files(root: impl AsRef<Path>) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root.as_ref()))
        .layer(middleware::from_fn(reject_hidden))
}

async fn reject_hidden(req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path();
    if should_reject_encoded(path) {
        tracing::debug!(path = %path, "Static request rejected");
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_segments() {
        assert!(is_private_segment(".git"));
        assert!(is_private_segment("_test"));
        assert!(is_private_segment("node_modules"));
        assert!(!is_private_segment("blog"));
        assert!(!is_private_segment(""));
    }

    #[test]
    fn test_private_urls() {
        assert!(is_private_url("/blog/node_modules/x"));
        assert!(is_private_url("/_private/private.js"));
        assert!(is_private_url("/blog/.env"));
        assert!(!is_private_url("/blog/app.js"));
        assert!(!is_private_url("/"));
    }

    #[test]
    fn test_definition_files_are_rejected() {
        assert!(should_reject("/blog/index.sv.toml"));
        assert!(should_reject("/models/blog.mod.toml"));
        assert!(!should_reject("/blog/public.js"));
    }

    #[test]
    fn test_encoded_urls_are_decoded_before_checking() {
        assert!(should_reject_encoded("/%5Fprivate/secret.txt"));
        assert!(should_reject_encoded("/%2Egit/config"));
        assert!(should_reject_encoded("/blog/index.sv%2Etoml"));
        assert!(should_reject_encoded("/models/blog%2emod%2etoml"));
        assert!(should_reject_encoded("/blog%2F_private%2Fx.js"));
        assert!(should_reject_encoded("/blog/%FF.js"));
        assert!(!should_reject_encoded("/blog/public%20file.js"));
        assert!(!should_reject_encoded("/blog/public.js"));
    }
}
