//! Units: named, lazily computed values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::graph::inject::{DependencyRequest, Injected};

/// A resolved unit value. Consumers downcast it through [`Injected::get`].
pub type UnitValue = Arc<dyn Any + Send + Sync>;

/// Error type a compute function may return.
pub type ComputeError = Box<dyn std::error::Error + Send + Sync>;

pub(crate) type ComputeFn =
    Box<dyn Fn(&Injected) -> Result<Option<UnitValue>, ComputeError> + Send + Sync>;

/// Wrap a value so it can be returned from a compute function.
pub fn share<T: Any + Send + Sync>(value: T) -> UnitValue {
    Arc::new(value)
}

/// Resolution state of a unit.
#[derive(Clone)]
pub enum UnitState {
    /// Not computed yet.
    Unresolved,
    /// Currently computing; seeing this again while resolving means a cycle.
    InProgress,
    /// Computed. `None` means the compute function returned nothing.
    Resolved(Option<UnitValue>),
    /// Compute failed. Reads as "no value" for dependents.
    Failed(String),
}

impl UnitState {
    /// True while the unit has not settled.
    pub fn is_pending(&self) -> bool {
        matches!(self, UnitState::Unresolved | UnitState::InProgress)
    }

    /// The cached value, if the unit settled with one.
    pub fn value(&self) -> Option<&UnitValue> {
        match self {
            UnitState::Resolved(Some(value)) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Unresolved => write!(f, "Unresolved"),
            UnitState::InProgress => write!(f, "InProgress"),
            UnitState::Resolved(Some(_)) => write!(f, "Resolved(<value>)"),
            UnitState::Resolved(None) => write!(f, "Resolved(None)"),
            UnitState::Failed(message) => f.debug_tuple("Failed").field(message).finish(),
        }
    }
}

/// A registered computation in the dependency graph.
pub struct Unit {
    name: String,
    request: DependencyRequest,
    compute: ComputeFn,
    pub(crate) state: UnitState,
}

impl Unit {
    /// Create an unresolved unit.
    pub fn new<F>(name: impl Into<String>, request: DependencyRequest, compute: F) -> Self
    where
        F: Fn(&Injected) -> Result<Option<UnitValue>, ComputeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            request,
            compute: Box::new(compute),
            state: UnitState::Unresolved,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request(&self) -> &DependencyRequest {
        &self.request
    }

    pub fn state(&self) -> &UnitState {
        &self.state
    }

    pub(crate) fn compute(&self, injected: &Injected) -> Result<Option<UnitValue>, ComputeError> {
        (self.compute)(injected)
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("name", &self.name)
            .field("request", &self.request)
            .field("state", &self.state)
            .finish()
    }
}
