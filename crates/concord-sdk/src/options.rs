//! Options that tune how a [`Reconciler`](crate::Reconciler) behaves.

use serde::{Deserialize, Serialize};

/// Default number of characters kept in an error snapshot.
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 256;

/// What to do when the source collection itself is absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSource {
    /// Empty the target.
    #[default]
    Clear,
    /// Return the target untouched.
    Ignore,
}

/// Merge options resolved once, before any element is visited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    pub missing_source: MissingSource,
    /// Keep targets absent from the source without calling the merge function.
    /// The result filter still applies to them.
    pub preserve_absent: bool,
    pub snapshot_limit: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            missing_source: MissingSource::Clear,
            preserve_absent: false,
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
        }
    }
}

impl MergeOptions {
    pub fn with_missing_source(mut self, missing_source: MissingSource) -> Self {
        self.missing_source = missing_source;
        self
    }

    pub fn with_preserve_absent(mut self, preserve_absent: bool) -> Self {
        self.preserve_absent = preserve_absent;
        self
    }

    pub fn with_snapshot_limit(mut self, snapshot_limit: usize) -> Self {
        self.snapshot_limit = snapshot_limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = MergeOptions::default();
        assert_eq!(options.missing_source, MissingSource::Clear);
        assert!(!options.preserve_absent);
        assert_eq!(options.snapshot_limit, DEFAULT_SNAPSHOT_LIMIT);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let options: MergeOptions = serde_json::from_str(r#"{"preserve_absent": true}"#).unwrap();
        assert_eq!(options, MergeOptions::default().with_preserve_absent(true));
    }

    #[test]
    fn missing_source_uses_snake_case() {
        let options: MergeOptions =
            serde_json::from_str(r#"{"missing_source": "ignore", "snapshot_limit": 8}"#).unwrap();
        assert_eq!(options.missing_source, MissingSource::Ignore);
        assert_eq!(options.snapshot_limit, 8);
        let json = serde_json::to_string(&MergeOptions::default()).unwrap();
        assert!(json.contains("\"missing_source\":\"clear\""));
    }
}
