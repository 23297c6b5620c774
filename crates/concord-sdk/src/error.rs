//! Error types for the SDK.

use std::fmt::Debug;

/// Error raised by a caller-supplied match, merge, filter, or hook callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by a [`Reconciler`](crate::Reconciler).
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A callback failed mid-merge. The snapshots describe the source and
    /// the target as they were when the failure surfaced.
    #[error("merge failed: {cause} (source: {source_snapshot}, target: {target_snapshot})")]
    Callback {
        source_snapshot: String,
        target_snapshot: String,
        #[source]
        cause: CallbackError,
    },
}

impl ReconcileError {
    /// Wrap a callback error with truncated `Debug` snapshots.
    pub fn callback(
        cause: CallbackError,
        source: &dyn Debug,
        target: &dyn Debug,
        limit: usize,
    ) -> Self {
        Self::Callback {
            source_snapshot: snapshot(source, limit),
            target_snapshot: snapshot(target, limit),
            cause,
        }
    }

    /// The underlying callback error.
    pub fn cause(&self) -> &CallbackError {
        match self {
            Self::Callback { cause, .. } => cause,
        }
    }
}

/// Convenience alias for SDK results.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Render `value` with `Debug`, keeping at most `limit` characters.
pub fn snapshot(value: &dyn Debug, limit: usize) -> String {
    let rendered = format!("{value:?}");
    if rendered.chars().count() <= limit {
        return rendered;
    }
    let mut truncated: String = rendered.chars().take(limit).collect();
    truncated.push_str("...");
    truncated
}
