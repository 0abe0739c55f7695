//! Pipeline context - shared state passed between jobs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Execution context for a pipeline run
///
/// A string-keyed map of JSON values shared by every job of a run. Job
/// results are stored under the reserved `job_<name>_result` keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineContext {
    values: HashMap<String, Value>,
}

impl PipelineContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Key under which the result of `job` is stored
    pub fn result_key(job: &str) -> String {
        format!("job_{}_result", job)
    }

    /// Set a value
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get the stored result of a job
    pub fn job_result(&self, job: &str) -> Option<&Value> {
        self.values.get(&Self::result_key(job))
    }

    pub(crate) fn set_job_result(&mut self, job: &str, result: Value) {
        self.values.insert(Self::result_key(job), result);
    }

    /// Resolve a dotted path such as `job_load_result.records.0`
    ///
    /// The first segment is a context key; the following segments index
    /// into objects by key and into arrays by position.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Merge another context into this one, overwriting existing keys
    pub fn merge(&mut self, other: PipelineContext) {
        self.values.extend(other.values);
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Convert into a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for PipelineContext {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl From<HashMap<String, Value>> for PipelineContext {
    fn from(values: HashMap<String, Value>) -> Self {
        Self { values }
    }
}
