//! High-level API for Concord.
//!
//! Wraps the reconciliation engine in a fluent [`Reconciler`] that owns the
//! caller's callbacks, resolves [`MergeOptions`] once, merges into
//! caller-owned targets in place, and turns callback failures into
//! [`ReconcileError`] values carrying snapshots of what was being merged.
//!
//! # Key Types
//!
//! - [`Reconciler`] -- configured callbacks plus terminal merge operations
//! - [`MergeOptions`] / [`MissingSource`] -- tuning resolved at the boundary
//! - [`SortedVec`] -- comparator-sorted target container
//! - [`ReconcileError`] -- wrapped callback failure

pub mod collection;
pub mod error;
pub mod group;
pub mod keyed;
pub mod options;
pub mod reconciler;

#[cfg(test)]
mod testing;

pub use collection::SortedVec;
pub use error::{CallbackError, ReconcileError, ReconcileResult};
pub use options::{MergeOptions, MissingSource};
pub use reconciler::Reconciler;

// Re-export engine types that appear in the API
pub use concord_engine::{MergeStats, Merged, TargetCollection};
