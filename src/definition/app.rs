//! Two-phase application builder.
//!
//! An app definition does not mount its subtree directly. It returns an
//! [`AppBuilder`] listing ordered stages, and the tree later calls
//! [`AppBuilder::finalize`] with the subtree's routes.
//!
//! Stages run in the order they were added, each receiving the router built
//! so far. Because `Router::layer` wraps only the routes present when it is
//! called, a layer added after `mount_routes` wraps the subtree while one added
//! before it does not. A fallback added after `mount_routes` catches whatever
//! the subtree leaves unmatched.

use axum::Router;

type Stage = Box<dyn FnOnce(Router) -> Router + Send>;

enum Step {
    Transform(Stage),
    MountRoutes,
}

/// Ordered stage list returned by an app definition.
#[derive(Default)]
pub struct AppBuilder {
    steps: Vec<Step>,
    mounted: bool,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transform of the router built so far.
    pub fn stage<F>(mut self, stage: F) -> Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.steps.push(Step::Transform(Box::new(stage)));
        self
    }

    /// Mark where the subtree (index route and children) is merged in.
    ///
    /// Without this marker the subtree is never mounted.
    pub fn mount_routes(mut self) -> Self {
        if self.mounted {
            tracing::debug!("mount_routes called twice, ignoring the second marker");
            return self;
        }
        self.mounted = true;
        self.steps.push(Step::MountRoutes);
        self
    }

    /// True if the stage list mounts the subtree.
    pub fn mounts_routes(&self) -> bool {
        self.mounted
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Fold the stages over a fresh router.
    ///
    /// `routes` is only called when the stage list contains the mount marker.
    pub fn finalize<F, E>(self, routes: F) -> Result<Router, E>
    where
        F: FnOnce() -> Result<Router, E>,
    {
        let mut routes = Some(routes);
        let mut router = Router::new();
        for step in self.steps {
            router = match step {
                Step::Transform(stage) => stage(router),
                Step::MountRoutes => match routes.take() {
                    Some(build) => router.merge(build()?),
                    None => router,
                },
            };
        }
        Ok(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request, StatusCode};
    use axum::middleware::{self, Next};
    use axum::response::Response;
    use axum::routing::get;
    use std::convert::Infallible;
    use tower::ServiceExt;

    async fn tag(req: Request<Body>, next: Next) -> Response {
        let mut res = next.run(req).await;
        res.headers_mut().insert("x-wrapped", HeaderValue::from_static("yes"));
        res
    }

    fn subtree() -> Result<Router, Infallible> {
        Ok(Router::new().route("/", get(|| async { "home" })))
    }

    async fn call(router: Router, uri: &str) -> Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_layer_after_mount_wraps_routes() {
        let router = AppBuilder::new()
            .mount_routes()
            .stage(|r| r.layer(middleware::from_fn(tag)))
            .finalize(subtree)
            .unwrap();

        let res = call(router, "/").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers().get("x-wrapped").unwrap(), "yes");
    }

    #[tokio::test]
    async fn test_layer_before_mount_does_not_wrap_routes() {
        let router = AppBuilder::new()
            .stage(|r| r.layer(middleware::from_fn(tag)))
            .mount_routes()
            .finalize(subtree)
            .unwrap();

        let res = call(router, "/").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get("x-wrapped").is_none());
    }

    #[tokio::test]
    async fn test_without_marker_routes_are_never_built() {
        let mut built = false;
        let app = AppBuilder::new().stage(|r| r.route("/ping", get(|| async { "pong" })));
        assert!(!app.mounts_routes());

        let router = app
            .finalize(|| {
                built = true;
                subtree()
            })
            .unwrap();

        assert!(!built);
        assert_eq!(call(router.clone(), "/").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(call(router, "/ping").await.status(), StatusCode::OK);
    }

    #[test]
    fn test_second_marker_is_ignored() {
        let app = AppBuilder::new().mount_routes().mount_routes();
        assert_eq!(app.len(), 1);
    }

    #[test]
    fn test_subtree_error_propagates() {
        let result = AppBuilder::new()
            .mount_routes()
            .finalize(|| Err::<Router, _>("bad subtree"));
        assert_eq!(result.err(), Some("bad subtree"));
    }
}
