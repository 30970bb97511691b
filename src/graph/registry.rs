//! Unit registry and resolution.
//!
//! # Responsibilities
//! - Hold every unit by name (last registration wins)
//! - Resolve units on demand, dependencies first, each at most once
//! - Detect cycles and missing units
//! - Record compute failures according to the FailurePolicy
//!
//! # Design Decisions
//! - Single owner, `&mut self` resolution; no locking, no suspension points
//! - Resolution order comes from the recursive pull, not registration order
//! - Registration order is kept so reports and `resolve_all` are deterministic

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::inject::{DependencyRequest, Injected};
use crate::graph::unit::{ComputeError, Unit, UnitState, UnitValue};

/// What to do when a unit's compute function fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure, cache "no value", keep resolving.
    #[default]
    Soft,
    /// Abort resolution with [`GraphError::ComputeFailed`].
    Strict,
}

/// Errors raised by the dependency graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A unit name (or alias target) that was never registered.
    #[error(
        "missing unit \"{name}\"{}",
        required_by.as_deref().map(|r| format!(" (required by {r})")).unwrap_or_default()
    )]
    MissingUnit {
        name: String,
        required_by: Option<String>,
    },

    /// Resolution re-entered a unit that was still computing.
    #[error("dependency cycle detected: {}", chain.join(" -> "))]
    CycleDetected { chain: Vec<String> },

    /// A compute function failed under [`FailurePolicy::Strict`].
    #[error("unit \"{name}\" failed: {message}")]
    ComputeFailed { name: String, message: String },

    /// `register` was called after resolution started.
    #[error("cannot register unit \"{0}\": resolution has already started")]
    RegistrationClosed(String),
}

/// A unit whose compute function failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub name: String,
    pub message: String,
}

/// Outcome of [`DependencyGraph::resolve_all`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolveReport {
    /// Units that settled, with or without a value.
    pub resolved: Vec<String>,
    /// Units whose compute failed; they read as "no value".
    pub failed: Vec<UnitFailure>,
}

impl ResolveReport {
    /// True when no unit failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Snapshot of settled unit values, handed to route tree initialization.
#[derive(Clone, Default)]
pub struct ResolvedUnits {
    values: HashMap<String, Option<UnitValue>>,
}

impl ResolvedUnits {
    /// Build the injected bag for a consumer.
    ///
    /// Every requested unit must exist in the snapshot.
    pub fn inject(
        &self,
        request: &DependencyRequest,
        required_by: &str,
    ) -> Result<Injected, GraphError> {
        let mut injected = Injected::new();
        for (alias, unit) in request.iter() {
            let value = self.values.get(unit).ok_or_else(|| GraphError::MissingUnit {
                name: unit.to_string(),
                required_by: Some(required_by.to_string()),
            })?;
            injected.insert(alias, value.clone());
        }
        Ok(injected)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The value of a unit; `None` if unknown or settled without a value.
    pub fn get(&self, name: &str) -> Option<&UnitValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Named registry of units with lazy, memoized resolution.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    units: HashMap<String, Unit>,
    order: Vec<String>,
    policy: FailurePolicy,
    started: bool,
}

impl DependencyGraph {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Register a unit, replacing any unit with the same name.
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        request: DependencyRequest,
        compute: F,
    ) -> Result<(), GraphError>
    where
        F: Fn(&Injected) -> Result<Option<UnitValue>, ComputeError> + Send + Sync + 'static,
    {
        self.register_unit(Unit::new(name, request, compute))
    }

    pub fn register_unit(&mut self, unit: Unit) -> Result<(), GraphError> {
        let name = unit.name().to_string();
        if self.started {
            return Err(GraphError::RegistrationClosed(name));
        }
        if self.units.insert(name.clone(), unit).is_some() {
            tracing::warn!(unit = %name, "Unit registered twice, keeping the last definition");
        } else {
            self.order.push(name);
        }
        Ok(())
    }

    /// Resolve one unit, computing its dependencies first.
    pub fn resolve(&mut self, name: &str) -> Result<Option<UnitValue>, GraphError> {
        self.started = true;
        let mut chain = Vec::new();
        self.resolve_inner(name, None, &mut chain)
    }

    /// Resolve every unit that has not settled yet.
    pub fn resolve_all(&mut self) -> Result<ResolveReport, GraphError> {
        self.started = true;
        let names = self.order.clone();
        for name in &names {
            if self.is_pending(name) {
                let mut chain = Vec::new();
                self.resolve_inner(name, None, &mut chain)?;
            }
        }

        let mut report = ResolveReport::default();
        for name in &self.order {
            match self.units.get(name).map(Unit::state) {
                Some(UnitState::Failed(message)) => report.failed.push(UnitFailure {
                    name: name.clone(),
                    message: message.clone(),
                }),
                Some(state) if !state.is_pending() => report.resolved.push(name.clone()),
                _ => {}
            }
        }

        tracing::info!(
            resolved = report.resolved.len(),
            failed = report.failed.len(),
            "Dependency graph resolved"
        );
        Ok(report)
    }

    /// State of a registered unit.
    pub fn state(&self, name: &str) -> Option<&UnitState> {
        self.units.get(name).map(Unit::state)
    }

    /// True if the unit exists and has not settled.
    pub fn is_pending(&self, name: &str) -> bool {
        self.state(name).is_some_and(UnitState::is_pending)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Registered unit names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Snapshot of every settled unit. Failed units appear as "no value".
    pub fn resolved_units(&self) -> ResolvedUnits {
        let values = self
            .units
            .iter()
            .filter(|(_, unit)| !unit.state().is_pending())
            .map(|(name, unit)| (name.clone(), unit.state().value().cloned()))
            .collect();
        ResolvedUnits { values }
    }

    fn resolve_inner(
        &mut self,
        name: &str,
        required_by: Option<&str>,
        chain: &mut Vec<String>,
    ) -> Result<Option<UnitValue>, GraphError> {
        let policy = self.policy;
        let unit = self.units.get_mut(name).ok_or_else(|| GraphError::MissingUnit {
            name: name.to_string(),
            required_by: required_by.map(|r| format!("unit \"{r}\"")),
        })?;

        match &unit.state {
            UnitState::Resolved(value) => return Ok(value.clone()),
            UnitState::Failed(message) => {
                return match policy {
                    FailurePolicy::Soft => Ok(None),
                    FailurePolicy::Strict => Err(GraphError::ComputeFailed {
                        name: name.to_string(),
                        message: message.clone(),
                    }),
                };
            }
            UnitState::InProgress => {
                let start = chain.iter().position(|n| n == name).unwrap_or(0);
                let mut cycle = chain[start..].to_vec();
                cycle.push(name.to_string());
                return Err(GraphError::CycleDetected { chain: cycle });
            }
            UnitState::Unresolved => {}
        }

        unit.state = UnitState::InProgress;
        let request = unit.request().clone();
        chain.push(name.to_string());

        let mut injected = Injected::new();
        for (alias, dependency) in request.iter() {
            match self.resolve_inner(dependency, Some(name), chain) {
                Ok(value) => injected.insert(alias, value),
                Err(e) => {
                    self.reset(name);
                    return Err(e);
                }
            }
        }
        chain.pop();

        let Some(unit) = self.units.get_mut(name) else {
            return Err(GraphError::MissingUnit {
                name: name.to_string(),
                required_by: None,
            });
        };
        match unit.compute(&injected) {
            Ok(value) => {
                tracing::debug!(unit = %name, has_value = value.is_some(), "Unit resolved");
                unit.state = UnitState::Resolved(value.clone());
                Ok(value)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(unit = %name, error = %message, "Unit compute failed");
                unit.state = UnitState::Failed(message.clone());
                match policy {
                    FailurePolicy::Soft => Ok(None),
                    FailurePolicy::Strict => Err(GraphError::ComputeFailed {
                        name: name.to_string(),
                        message,
                    }),
                }
            }
        }
    }

    fn reset(&mut self, name: &str) {
        if let Some(unit) = self.units.get_mut(name) {
            if matches!(unit.state, UnitState::InProgress) {
                unit.state = UnitState::Unresolved;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::unit::share;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn text(value: &Option<UnitValue>) -> Option<String> {
        value
            .clone()
            .and_then(|v| v.downcast::<String>().ok())
            .map(|s| s.as_ref().clone())
    }

    fn mod_a_and_b(graph: &mut DependencyGraph, a_calls: Arc<AtomicUsize>) {
        graph
            .register("a", DependencyRequest::new(), move |_| {
                a_calls.fetch_add(1, Ordering::SeqCst);
                Ok(Some(share("mod a".to_string())))
            })
            .unwrap();
        graph
            .register("b", DependencyRequest::new().with("A", "a"), |deps| {
                let a = deps.require::<String>("A")?;
                Ok(Some(share(format!("{a} and mod b"))))
            })
            .unwrap();
    }

    #[test]
    fn test_resolve_is_memoized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut graph = DependencyGraph::default();
        graph
            .register("config", DependencyRequest::new(), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some(share(42u32)))
            })
            .unwrap();

        let first = graph.resolve("config").unwrap().unwrap();
        let second = graph.resolve("config").unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dependency_value_flows_through_alias() {
        let a_calls = Arc::new(AtomicUsize::new(0));
        let mut graph = DependencyGraph::default();
        mod_a_and_b(&mut graph, a_calls.clone());

        let b = graph.resolve("b").unwrap();
        assert_eq!(text(&b).as_deref(), Some("mod a and mod b"));

        let a = graph.resolve("a").unwrap();
        assert_eq!(text(&a).as_deref(), Some("mod a"));
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_unit_is_named() {
        let mut graph = DependencyGraph::default();
        graph
            .register("blog", DependencyRequest::new().with("Db", "database"), |_| Ok(None))
            .unwrap();

        match graph.resolve("blog") {
            Err(GraphError::MissingUnit { name, required_by }) => {
                assert_eq!(name, "database");
                assert_eq!(required_by.as_deref(), Some("unit \"blog\""));
            }
            other => panic!("expected MissingUnit, got {other:?}"),
        }
        assert!(graph.is_pending("blog"));

        let err = graph.resolve("nope").unwrap_err();
        assert_eq!(err.to_string(), "missing unit \"nope\"");
    }

    #[test]
    fn test_resolve_all_settles_every_unit() {
        let mut graph = DependencyGraph::default();
        mod_a_and_b(&mut graph, Arc::new(AtomicUsize::new(0)));
        graph
            .register("c", DependencyRequest::new(), |_| Ok(Some(share("mod c".to_string()))))
            .unwrap();
        graph
            .register(
                "d",
                DependencyRequest::new().with("B", "b").with("C", "c"),
                |deps| {
                    assert_eq!(*deps.require::<String>("B")?, "mod a and mod b");
                    assert_eq!(*deps.require::<String>("C")?, "mod c");
                    Ok(None)
                },
            )
            .unwrap();

        let report = graph.resolve_all().unwrap();

        assert!(report.is_clean());
        assert_eq!(report.resolved, vec!["a", "b", "c", "d"]);
        assert!(graph.names().all(|n| !graph.is_pending(n)));
        assert!(matches!(graph.state("d"), Some(UnitState::Resolved(None))));
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut graph = DependencyGraph::default();
        graph
            .register("root", DependencyRequest::new().with("A", "a"), |_| Ok(None))
            .unwrap();
        graph
            .register("a", DependencyRequest::new().with("B", "b"), |_| Ok(None))
            .unwrap();
        graph
            .register("b", DependencyRequest::new().with("A", "a"), |_| Ok(None))
            .unwrap();

        match graph.resolve("root") {
            Err(GraphError::CycleDetected { chain }) => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("expected CycleDetected, got {other:?}"),
        }
        assert!(graph.names().all(|n| matches!(graph.state(n), Some(UnitState::Unresolved))));
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut graph = DependencyGraph::default();
        graph
            .register("loop", DependencyRequest::new().with("Me", "loop"), |_| Ok(None))
            .unwrap();

        let err = graph.resolve_all().unwrap_err();
        assert_eq!(err.to_string(), "dependency cycle detected: loop -> loop");
    }

    #[test]
    fn test_soft_failure_is_reported_and_injected_as_absent() {
        let mut graph = DependencyGraph::new(FailurePolicy::Soft);
        graph
            .register("broken", DependencyRequest::new(), |_| Err("no database".into()))
            .unwrap();
        graph
            .register("sibling", DependencyRequest::new(), |_| Ok(Some(share(1u8))))
            .unwrap();
        graph
            .register("user", DependencyRequest::new().with("B", "broken"), |deps| {
                Ok(Some(share(deps.contains("B") && deps.raw("B").is_none())))
            })
            .unwrap();

        let report = graph.resolve_all().unwrap();

        assert_eq!(
            report.failed,
            vec![UnitFailure {
                name: "broken".into(),
                message: "no database".into()
            }]
        );
        assert_eq!(report.resolved, vec!["sibling", "user"]);
        let user = graph.resolve("user").unwrap().unwrap();
        assert_eq!(user.downcast::<bool>().ok().as_deref(), Some(&true));
        assert!(graph.resolve("broken").unwrap().is_none());
    }

    #[test]
    fn test_strict_failure_aborts() {
        let mut graph = DependencyGraph::new(FailurePolicy::Strict);
        graph
            .register("broken", DependencyRequest::new(), |_| Err("boom".into()))
            .unwrap();

        let err = graph.resolve_all().unwrap_err();
        assert!(matches!(err, GraphError::ComputeFailed { ref name, .. } if name == "broken"));
        assert!(matches!(graph.state("broken"), Some(UnitState::Failed(_))));
    }

    #[test]
    fn test_last_registration_wins() {
        let mut graph = DependencyGraph::default();
        graph
            .register("x", DependencyRequest::new(), |_| Ok(Some(share("first".to_string()))))
            .unwrap();
        graph
            .register("x", DependencyRequest::new(), |_| Ok(Some(share("second".to_string()))))
            .unwrap();

        assert_eq!(graph.len(), 1);
        assert_eq!(text(&graph.resolve("x").unwrap()).as_deref(), Some("second"));
    }

    #[test]
    fn test_registration_closes_once_resolution_starts() {
        let mut graph = DependencyGraph::default();
        graph.register("x", DependencyRequest::new(), |_| Ok(None)).unwrap();
        graph.resolve("x").unwrap();

        let err = graph.register("y", DependencyRequest::new(), |_| Ok(None)).unwrap_err();
        assert!(matches!(err, GraphError::RegistrationClosed(ref n) if n == "y"));
    }

    #[test]
    fn test_snapshot_injects_by_alias() {
        let mut graph = DependencyGraph::default();
        mod_a_and_b(&mut graph, Arc::new(AtomicUsize::new(0)));
        graph.resolve_all().unwrap();
        let resolved = graph.resolved_units();

        let injected = resolved
            .inject(&DependencyRequest::new().with("Both", "b"), "index.sv.toml")
            .unwrap();
        assert_eq!(*injected.require::<String>("Both").unwrap(), "mod a and mod b");

        let err = resolved
            .inject(&DependencyRequest::new().with("X", "model.x"), "blog/index.sv.toml")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing unit \"model.x\" (required by blog/index.sv.toml)"
        );
    }
}
