//! JSON records identified by a key field.

use std::path::Path;

use anyhow::{bail, Context};
use concord_sdk::{CallbackError, Merged};
use serde_json::Value;

use crate::config::ConcordConfig;

/// How records are identified and merged.
#[derive(Clone, Debug)]
pub struct RecordSchema {
    key: String,
    soft_delete: bool,
    tombstone_field: String,
}

impl RecordSchema {
    pub fn from_config(config: &ConcordConfig) -> Self {
        Self {
            key: config.key.clone(),
            soft_delete: config.soft_delete,
            tombstone_field: config.tombstone_field.clone(),
        }
    }

    /// Two records match when both carry the same non-null key.
    pub fn matches(&self, source: &Value, target: &Value) -> bool {
        match (source.get(&self.key), target.get(&self.key)) {
            (Some(a), Some(b)) => !a.is_null() && a == b,
            _ => false,
        }
    }

    /// Overlay matched source fields onto the target in place, copy new
    /// records, and drop or mark records the source no longer names.
    pub fn merge(
        &self,
        source: Option<&Value>,
        target: Option<&mut Value>,
    ) -> Result<Merged<Value>, CallbackError> {
        match (source, target) {
            (Some(source), Some(target)) => {
                let fields = object(source)?;
                let record = target
                    .as_object_mut()
                    .ok_or("target record is not a JSON object")?;
                for (name, value) in fields {
                    record.insert(name.clone(), value.clone());
                }
                if self.soft_delete && !fields.contains_key(&self.tombstone_field) {
                    record.remove(&self.tombstone_field);
                }
                Ok(Merged::Retain)
            }
            (Some(source), None) => {
                object(source)?;
                Ok(Merged::Replace(source.clone()))
            }
            (None, Some(target)) if self.soft_delete => {
                let record = target
                    .as_object_mut()
                    .ok_or("target record is not a JSON object")?;
                record.insert(self.tombstone_field.clone(), Value::Bool(true));
                Ok(Merged::Retain)
            }
            (None, _) => Ok(Merged::Discard),
        }
    }

    /// The key of `record`, for display.
    pub fn describe(&self, record: &Value) -> String {
        match record.get(&self.key) {
            Some(Value::String(key)) => key.clone(),
            Some(Value::Null) | None => "<no key>".into(),
            Some(other) => other.to_string(),
        }
    }
}

fn object(record: &Value) -> Result<&serde_json::Map<String, Value>, CallbackError> {
    record
        .as_object()
        .ok_or_else(|| format!("source record is not a JSON object: {record}").into())
}

/// Read a JSON array of records.
pub fn load_records(path: &Path) -> anyhow::Result<Vec<Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    match value {
        Value::Array(records) => Ok(records),
        _ => bail!("{} does not contain a JSON array", path.display()),
    }
}
