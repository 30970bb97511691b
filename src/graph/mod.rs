//! Dependency graph subsystem.
//!
//! # Data Flow
//! ```text
//! unit manifests (*.mod.toml)
//!     → registry.rs (register: name, dependency request, compute)
//!     → resolve / resolve_all (lazy, memoized, dependency-first)
//!     → ResolvedUnits snapshot
//!     → inject.rs (alias → unit name → Injected bag per consumer)
//! ```
//!
//! # Design Decisions
//! - Registration closes once resolution starts
//! - Each unit computes at most once; the result is cached, including "no value"
//! - Re-entering a unit that is still computing is a cycle, reported as an error
//! - Compute failures follow an explicit FailurePolicy and are listed in the report

pub mod inject;
pub mod registry;
pub mod unit;

pub use inject::{DependencyRequest, InjectError, Injected};
pub use registry::{
    DependencyGraph, FailurePolicy, GraphError, ResolveReport, ResolvedUnits, UnitFailure,
};
pub use unit::{share, ComputeError, Unit, UnitState, UnitValue};
