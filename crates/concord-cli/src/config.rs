//! `concord.toml` configuration.

use std::path::Path;

use anyhow::Context;
use concord_sdk::MergeOptions;
use serde::{Deserialize, Serialize};

use crate::cli::{MergeArgs, PlanArgs};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcordConfig {
    /// Field identifying a record.
    pub key: String,
    pub ordered: bool,
    pub soft_delete: bool,
    /// Field set to `true` on soft-deleted records.
    pub tombstone_field: String,
    pub merge: MergeOptions,
}

impl Default for ConcordConfig {
    fn default() -> Self {
        Self {
            key: "id".into(),
            ordered: false,
            soft_delete: false,
            tombstone_field: "_deleted".into(),
            merge: MergeOptions::default(),
        }
    }
}

impl ConcordConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Resolve the configuration for `concord merge`. Flags override the file.
    pub fn for_merge(args: &MergeArgs) -> anyhow::Result<Self> {
        let mut config = Self::load_or_default(args.config.as_deref())?;
        if let Some(key) = &args.key {
            config.key = key.clone();
        }
        config.ordered |= args.ordered;
        config.soft_delete |= args.soft_delete;
        config.merge.preserve_absent |= args.preserve_absent;
        Ok(config)
    }

    /// Resolve the configuration for `concord plan`.
    pub fn for_plan(args: &PlanArgs) -> anyhow::Result<Self> {
        let mut config = Self::load_or_default(args.config.as_deref())?;
        if let Some(key) = &args.key {
            config.key = key.clone();
        }
        Ok(config)
    }
}
