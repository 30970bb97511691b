//! Compiled-in definitions, looked up by the `def` key of a manifest.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::Router;

use crate::definition::app::AppBuilder;
use crate::definition::manifest::{ManifestError, RouteManifest, UnitManifest};
use crate::graph::{ComputeError, Injected, UnitValue};

/// Computes a unit value from its injected dependencies.
pub trait UnitDefinition: Send + Sync + 'static {
    fn compute(&self, deps: &Injected) -> Result<Option<UnitValue>, ComputeError>;
}

impl<F> UnitDefinition for F
where
    F: Fn(&Injected) -> Result<Option<UnitValue>, ComputeError> + Send + Sync + 'static,
{
    fn compute(&self, deps: &Injected) -> Result<Option<UnitValue>, ComputeError> {
        self(deps)
    }
}

/// Adds routes and middleware to the router bound to a leaf or index file.
pub trait RouteDefinition: Send + Sync + 'static {
    fn define(&self, deps: &Injected, router: Router) -> Router;
}

impl<F> RouteDefinition for F
where
    F: Fn(&Injected, Router) -> Router + Send + Sync + 'static,
{
    fn define(&self, deps: &Injected, router: Router) -> Router {
        self(deps, router)
    }
}

/// Describes the stages of a directory's application router.
pub trait AppDefinition: Send + Sync + 'static {
    fn define(&self, deps: &Injected, app: AppBuilder) -> AppBuilder;
}

impl<F> AppDefinition for F
where
    F: Fn(&Injected, AppBuilder) -> AppBuilder + Send + Sync + 'static,
{
    fn define(&self, deps: &Injected, app: AppBuilder) -> AppBuilder {
        self(deps, app)
    }
}

/// Registry of every definition a manifest may name.
#[derive(Clone, Default)]
pub struct Catalog {
    units: HashMap<String, Arc<dyn UnitDefinition>>,
    routes: HashMap<String, Arc<dyn RouteDefinition>>,
    apps: HashMap<String, Arc<dyn AppDefinition>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit<F>(mut self, key: impl Into<String>, definition: F) -> Self
    where
        F: Fn(&Injected) -> Result<Option<UnitValue>, ComputeError> + Send + Sync + 'static,
    {
        self.units.insert(key.into(), Arc::new(definition));
        self
    }

    pub fn route<F>(mut self, key: impl Into<String>, definition: F) -> Self
    where
        F: Fn(&Injected, Router) -> Router + Send + Sync + 'static,
    {
        self.routes.insert(key.into(), Arc::new(definition));
        self
    }

    pub fn app<F>(mut self, key: impl Into<String>, definition: F) -> Self
    where
        F: Fn(&Injected, AppBuilder) -> AppBuilder + Send + Sync + 'static,
    {
        self.apps.insert(key.into(), Arc::new(definition));
        self
    }

    /// Register a unit definition implemented on a type.
    pub fn unit_definition(
        mut self,
        key: impl Into<String>,
        definition: impl UnitDefinition,
    ) -> Self {
        self.units.insert(key.into(), Arc::new(definition));
        self
    }

    pub fn route_definition(
        mut self,
        key: impl Into<String>,
        definition: impl RouteDefinition,
    ) -> Self {
        self.routes.insert(key.into(), Arc::new(definition));
        self
    }

    pub fn app_definition(
        mut self,
        key: impl Into<String>,
        definition: impl AppDefinition,
    ) -> Self {
        self.apps.insert(key.into(), Arc::new(definition));
        self
    }

    pub(crate) fn lookup_unit(
        &self,
        manifest: &UnitManifest,
    ) -> Result<Arc<dyn UnitDefinition>, ManifestError> {
        self.units
            .get(&manifest.def)
            .cloned()
            .ok_or_else(|| unknown(&manifest.path, "unit", &manifest.def))
    }

    pub(crate) fn lookup_route(
        &self,
        manifest: &RouteManifest,
    ) -> Result<Arc<dyn RouteDefinition>, ManifestError> {
        self.routes
            .get(&manifest.def)
            .cloned()
            .ok_or_else(|| unknown(&manifest.path, "route", &manifest.def))
    }

    pub(crate) fn lookup_app(
        &self,
        manifest: &RouteManifest,
    ) -> Result<Arc<dyn AppDefinition>, ManifestError> {
        self.apps
            .get(&manifest.def)
            .cloned()
            .ok_or_else(|| unknown(&manifest.path, "app", &manifest.def))
    }
}

fn unknown(path: &std::path::Path, kind: &'static str, key: &str) -> ManifestError {
    ManifestError::UnknownDefinition {
        path: path.to_path_buf(),
        kind,
        key: key.to_string(),
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("units", &sorted_keys(&self.units))
            .field("routes", &sorted_keys(&self.routes))
            .field("apps", &sorted_keys(&self.apps))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{share, DependencyRequest};

    #[test]
    fn test_lookup_by_def_key() {
        let catalog = Catalog::new()
            .unit("answer", |_: &Injected| Ok(Some(share(42u32))))
            .route("home", |_: &Injected, router: Router| router);

        let manifest = UnitManifest {
            path: "answer.mod.toml".into(),
            name: "answer".into(),
            def: "answer".into(),
            deps: DependencyRequest::new(),
        };
        let value = catalog.lookup_unit(&manifest).unwrap().compute(&Injected::new()).unwrap();
        assert_eq!(value.unwrap().downcast::<u32>().ok().as_deref(), Some(&42));

        let route = RouteManifest::parse("index.sv.toml", "def = \"home\"").unwrap();
        assert!(catalog.lookup_route(&route).is_ok());
        assert!(catalog.lookup_app(&route).is_err());
    }

    #[test]
    fn test_unknown_key_names_file_and_key() {
        let route = RouteManifest::parse("blog/index.sv.toml", "def = \"blog.index\"").unwrap();
        let err = Catalog::new().lookup_route(&route).err().unwrap();
        assert_eq!(
            err.to_string(),
            "definition blog/index.sv.toml names unknown route definition \"blog.index\""
        );
    }
}
