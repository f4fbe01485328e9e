//! Structural diff primitive
//!
//! The recursive engine treats this as an opaque `diff(a, b)`; the default
//! implementation compares the artifacts' JSON forms.

#![allow(clippy::result_large_err)]

use serde_json::Value;

use crate::diff::model::DiffOperation;
use crate::errors::ExError;
use crate::model::Artifact;

/// Default JSON pointers excluded from comparison
pub const DEFAULT_IGNORE_PATHS: &[&str] = &["/id", "/meta"];

pub trait StructuralDiff {
    /// Operations turning `source` into `target`
    ///
    /// # Errors
    ///
    /// Implementation-defined (serialization for the JSON primitive).
    fn diff(&self, source: &Artifact, target: &Artifact) -> Result<Vec<DiffOperation>, ExError>;
}

/// Member-by-key, element-by-index JSON comparison with previous values
#[derive(Debug, Clone)]
pub struct JsonStructuralDiff {
    ignore_paths: Vec<String>,
}

impl Default for JsonStructuralDiff {
    fn default() -> Self {
        Self::with_ignore_paths(DEFAULT_IGNORE_PATHS.iter().map(|p| p.to_string()))
    }
}

impl JsonStructuralDiff {
    pub fn with_ignore_paths(paths: impl IntoIterator<Item = String>) -> Self {
        Self {
            ignore_paths: paths.into_iter().collect(),
        }
    }

    fn ignored(&self, path: &str) -> bool {
        self.ignore_paths.iter().any(|p| {
            path == p
                || path
                    .strip_prefix(p.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Diff two arbitrary JSON values
    pub fn diff_values(&self, source: &Value, target: &Value) -> Vec<DiffOperation> {
        let mut ops = Vec::new();
        self.walk("", source, target, &mut ops);
        ops
    }

    fn walk(&self, path: &str, source: &Value, target: &Value, ops: &mut Vec<DiffOperation>) {
        if self.ignored(path) && !path.is_empty() {
            return;
        }
        match (source, target) {
            (Value::Object(a), Value::Object(b)) => {
                for (key, av) in a {
                    let child = format!("{}/{}", path, escape(key));
                    match b.get(key) {
                        Some(bv) => self.walk(&child, av, bv, ops),
                        None if !self.ignored(&child) => {
                            ops.push(DiffOperation::remove(child, av.clone()))
                        }
                        None => {}
                    }
                }
                for (key, bv) in b {
                    if !a.contains_key(key) {
                        let child = format!("{}/{}", path, escape(key));
                        if !self.ignored(&child) {
                            ops.push(DiffOperation::add(child, bv.clone()));
                        }
                    }
                }
            }
            (Value::Array(a), Value::Array(b)) => {
                for i in 0..a.len().max(b.len()) {
                    let child = format!("{}/{}", path, i);
                    match (a.get(i), b.get(i)) {
                        (Some(av), Some(bv)) => self.walk(&child, av, bv, ops),
                        (Some(av), None) => ops.push(DiffOperation::remove(child, av.clone())),
                        (None, Some(bv)) => ops.push(DiffOperation::add(child, bv.clone())),
                        (None, None) => {}
                    }
                }
            }
            (a, b) if a != b => {
                ops.push(DiffOperation::replace(path, a.clone(), b.clone()));
            }
            _ => {}
        }
    }
}

fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

impl StructuralDiff for JsonStructuralDiff {
    fn diff(&self, source: &Artifact, target: &Artifact) -> Result<Vec<DiffOperation>, ExError> {
        let a = serde_json::to_value(source)?;
        let b = serde_json::to_value(target)?;
        Ok(self.diff_values(&a, &b))
    }
}
