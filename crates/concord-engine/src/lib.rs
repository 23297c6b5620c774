//! Reconciliation engine for Concord.
//!
//! Merges a sequence of *source* elements into a collection of *target*
//! elements, deciding per element whether it is unchanged, updated, created,
//! deleted, or moved. Targets are mutated in place: whenever a match exists
//! the target keeps its identity.
//!
//! # Entry Points
//!
//! - [`merge_ordered`] / [`merge_ordered_with`] -- order-repairing merge into
//!   a `Vec`, guided by sequence alignment and identity rescue
//! - [`merge_mixed`] / [`merge_mixed_with`] -- unordered merge into any
//!   [`TargetCollection`]
//! - [`merge_slot`] -- merge and filter a single slot
//!
//! # Key Types
//!
//! - [`MergeStrategy`] / [`FnStrategy`] / [`TryFnStrategy`] -- caller-supplied match,
//!   merge, and filter
//! - [`Merged`] / [`Verdict`] -- merge outcome and resolved slot state
//! - [`AlignmentTable`] / [`Step`] -- LCS table over a match predicate
//! - [`RescuePool`] -- displaced targets awaiting reuse within one call
//! - [`MergeStats`] -- what a call did
//!
//! The engine is synchronous and keeps no state between calls. Callback
//! errors are returned as the strategy's own error type.

pub mod alignment;
pub mod collection;
pub mod mixed;
pub mod ordered;
pub mod rescue;
pub mod stats;
pub mod strategy;

#[cfg(test)]
mod fixtures;

pub use alignment::{AlignmentTable, Step};
pub use collection::TargetCollection;
pub use mixed::{merge_mixed, merge_mixed_with};
pub use ordered::{merge_ordered, merge_ordered_with};
pub use rescue::RescuePool;
pub use stats::MergeStats;
pub use strategy::{
    merge_slot, Filter, FnStrategy, KeepAll, MergeStrategy, Merged, TryFilter, TryFnStrategy,
    Verdict,
};
