//! Alias indirection between consumers and units.
//!
//! # Responsibilities
//! - Describe what a consumer needs as (alias, unit name) pairs
//! - Carry resolved values to the consumer, keyed by its own aliases
//!
//! # Design Decisions
//! - A failed or empty unit is still injected, as an absent value
//! - Downcasting happens at the consumer, which knows the concrete type

use std::any::{type_name, Any};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::graph::unit::UnitValue;

/// The dependencies a unit or route definition asks for.
///
/// Each entry maps a local alias to the global unit name it resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, String>")]
pub struct DependencyRequest {
    entries: Vec<(String, String)>,
}

impl DependencyRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alias. A repeated alias replaces the earlier target.
    pub fn with(mut self, alias: impl Into<String>, unit: impl Into<String>) -> Self {
        let alias = alias.into();
        let unit = unit.into();
        match self.entries.iter_mut().find(|(a, _)| *a == alias) {
            Some(entry) => entry.1 = unit,
            None => self.entries.push((alias, unit)),
        }
        self
    }

    /// Iterate `(alias, unit name)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, u)| (a.as_str(), u.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, String>> for DependencyRequest {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl<A: Into<String>, U: Into<String>> FromIterator<(A, U)> for DependencyRequest {
    fn from_iter<I: IntoIterator<Item = (A, U)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |request, (alias, unit)| request.with(alias, unit))
    }
}

/// Errors raised when a consumer reads its injected values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InjectError {
    /// Alias not requested, or its unit produced no value.
    #[error("dependency \"{0}\" has no value")]
    Absent(String),

    /// Value present but of another type.
    #[error("dependency \"{alias}\" is not a {expected}")]
    TypeMismatch { alias: String, expected: &'static str },
}

/// Values handed to a definition, keyed by the aliases it declared.
#[derive(Clone, Default)]
pub struct Injected {
    values: HashMap<String, Option<UnitValue>>,
}

impl Injected {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, value: Option<UnitValue>) {
        self.values.insert(alias.into(), value);
    }

    /// True if the alias was requested, whether or not it has a value.
    pub fn contains(&self, alias: &str) -> bool {
        self.values.contains_key(alias)
    }

    /// The untyped value behind an alias.
    pub fn raw(&self, alias: &str) -> Option<&UnitValue> {
        self.values.get(alias).and_then(Option::as_ref)
    }

    /// Typed access. `None` when absent or of another type.
    pub fn get<T: Any + Send + Sync>(&self, alias: &str) -> Option<Arc<T>> {
        self.raw(alias).cloned().and_then(|v| v.downcast::<T>().ok())
    }

    /// Typed access that explains why the value is missing.
    pub fn require<T: Any + Send + Sync>(&self, alias: &str) -> Result<Arc<T>, InjectError> {
        let value = self
            .raw(alias)
            .cloned()
            .ok_or_else(|| InjectError::Absent(alias.to_string()))?;
        value.downcast::<T>().map_err(|_| InjectError::TypeMismatch {
            alias: alias.to_string(),
            expected: type_name::<T>(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Injected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (alias, value) in &self.values {
            map.entry(alias, &value.is_some());
        }
        map.finish()
    }
}
