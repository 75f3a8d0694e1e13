//! Partial updates as a closed set of typed operations.
//!
//! Clients send a JSON-Patch-shaped array:
//!
//! ```text
//! [{"op": "replace", "path": "/amount", "value": 12.5},
//!  {"op": "remove",  "path": "/description"}]
//! ```
//!
//! Only single-segment paths naming a writable field are accepted. `add` and
//! `replace` both become [`PatchStep::Set`]; `remove` becomes
//! [`PatchStep::Clear`]. The whole document is validated by
//! [`PatchDocument::compile`] before anything is applied.

use serde::{Deserialize, Serialize};

use crate::field::{FieldDef, FieldValue, Schema, Setter};
use crate::query::QueryError;

/// One operation as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl PatchOperation {
    pub fn replace(path: &str, value: serde_json::Value) -> Self {
        Self {
            op: "replace".to_string(),
            path: path.to_string(),
            value: Some(value),
        }
    }

    pub fn remove(path: &str) -> Self {
        Self {
            op: "remove".to_string(),
            path: path.to_string(),
            value: None,
        }
    }
}

/// A validated operation bound to a field setter.
#[derive(Debug)]
pub enum PatchStep<T: 'static> {
    Set { setter: Setter<T>, value: FieldValue },
    Clear { setter: Setter<T> },
}

/// An ordered, validated sequence of field mutations for entity `T`.
#[derive(Debug)]
pub struct PatchDocument<T: 'static> {
    steps: Vec<PatchStep<T>>,
}

impl<T: Schema> PatchDocument<T> {
    /// Validate every operation against `T`'s field table.
    pub fn compile(operations: &[PatchOperation]) -> Result<Self, QueryError> {
        let steps = operations
            .iter()
            .map(compile_step::<T>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { steps })
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply the steps in order. Later steps on the same field win.
    pub fn apply(&self, target: &mut T) -> Result<(), QueryError> {
        for step in &self.steps {
            match step {
                PatchStep::Set { setter, value } => setter(target, value.clone())?,
                PatchStep::Clear { setter } => setter(target, FieldValue::Null)?,
            }
        }
        Ok(())
    }
}

fn compile_step<T: Schema>(operation: &PatchOperation) -> Result<PatchStep<T>, QueryError> {
    let field = resolve_path::<T>(&operation.path)?;
    let setter = field
        .setter()
        .ok_or_else(|| QueryError::ReadOnlyProperty(field.name.to_string()))?;

    match operation.op.trim().to_ascii_lowercase().as_str() {
        op @ ("add" | "replace") => {
            let value = match &operation.value {
                None => {
                    return Err(QueryError::MissingPatchValue {
                        op: op.to_string(),
                        path: operation.path.clone(),
                    })
                }
                Some(serde_json::Value::Null) => FieldValue::Null,
                Some(json) => {
                    field
                        .kind
                        .from_json(json)
                        .ok_or_else(|| QueryError::InvalidValue {
                            property: field.name.to_string(),
                            value: json.to_string(),
                            expected: field.kind.name(),
                        })?
                }
            };
            if value.is_null() && !field.nullable {
                return Err(QueryError::NotNullable(field.name.to_string()));
            }
            Ok(PatchStep::Set { setter, value })
        }
        "remove" => {
            if !field.nullable {
                return Err(QueryError::NotNullable(field.name.to_string()));
            }
            Ok(PatchStep::Clear { setter })
        }
        other => Err(QueryError::UnsupportedPatchOperation(other.to_string())),
    }
}

/// `/fieldName` → field. Nested paths are not supported.
fn resolve_path<T: Schema>(path: &str) -> Result<&'static FieldDef<T>, QueryError> {
    let invalid = || QueryError::InvalidPatchPath(path.to_string());

    let segment = path.strip_prefix('/').ok_or_else(invalid)?;
    if segment.is_empty() || segment.contains('/') {
        return Err(invalid());
    }
    let name = segment.replace("~1", "/").replace("~0", "~");
    T::field(&name)
}
