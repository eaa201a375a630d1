use crate::common::{next_millis, Document, Value, DOC_ID};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// A single field-level update.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOperation {
    /// Sets the field, creating intermediate sub-documents as needed.
    Set(String, Value),
    /// Removes the field.
    Unset(String),
    /// Adds a number to the field. A missing field is set to the increment.
    Inc(String, Value),
    /// Sets the field to the store's current time, as epoch milliseconds rounded up to the
    /// next millisecond.
    CurrentDate(String),
}

impl UpdateOperation {
    pub fn field_name(&self) -> &str {
        match self {
            UpdateOperation::Set(field, _)
            | UpdateOperation::Unset(field)
            | UpdateOperation::Inc(field, _)
            | UpdateOperation::CurrentDate(field) => field,
        }
    }
}

impl Display for UpdateOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateOperation::Set(field, value) => write!(f, "$set({} = {})", field, value),
            UpdateOperation::Unset(field) => write!(f, "$unset({})", field),
            UpdateOperation::Inc(field, value) => write!(f, "$inc({} += {})", field, value),
            UpdateOperation::CurrentDate(field) => write!(f, "$currentDate({})", field),
        }
    }
}

/// An ordered list of update operations applied together to each matched document.
///
/// ```rust,ignore
/// use docrepo::update::{set, inc, UpdateDefinition};
///
/// let update = set("status", "active").then(inc("logins", 1));
/// let combined = UpdateDefinition::combine(vec![update, set("tier", "gold")]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateDefinition {
    operations: Vec<UpdateOperation>,
}

impl UpdateDefinition {
    pub fn new() -> UpdateDefinition {
        UpdateDefinition::default()
    }

    /// Concatenates several definitions, keeping their order.
    pub fn combine<I: IntoIterator<Item = UpdateDefinition>>(updates: I) -> UpdateDefinition {
        UpdateDefinition {
            operations: updates.into_iter().flat_map(|u| u.operations).collect(),
        }
    }

    pub fn then(mut self, other: UpdateDefinition) -> UpdateDefinition {
        self.operations.extend(other.operations);
        self
    }

    pub fn current_date(mut self, field: &str) -> UpdateDefinition {
        self.operations.push(UpdateOperation::CurrentDate(field.to_string()));
        self
    }

    pub fn operations(&self) -> &[UpdateOperation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Applies the operations in order to a copy of `document`.
    ///
    /// Either every operation applies or the document is left untouched. Touching `_id`
    /// is rejected with `ServerRejected`; incrementing a non-number fails with
    /// `InvalidQuery`.
    pub fn apply(&self, document: &Document, now: DateTime<Utc>) -> RepoResult<Document> {
        let mut updated = document.clone();
        for operation in &self.operations {
            let field = operation.field_name();
            if field == DOC_ID || field.starts_with("_id.") {
                log::error!("Update {} would modify the immutable field '_id'", operation);
                return Err(RepoError::new(
                    &format!("Performing {} would modify the immutable field '_id'", operation),
                    ErrorKind::ServerRejected,
                ));
            }

            match operation {
                UpdateOperation::Set(field, value) => updated.put(field, value.clone())?,
                UpdateOperation::Unset(field) => {
                    updated.remove(field);
                }
                UpdateOperation::Inc(field, amount) => {
                    let next = increment(updated.get(field), amount, field)?;
                    updated.put(field, next)?;
                }
                UpdateOperation::CurrentDate(field) => {
                    updated.put(field, next_millis(now).timestamp_millis())?;
                }
            }
        }
        Ok(updated)
    }
}

fn increment(current: Option<&Value>, amount: &Value, field: &str) -> RepoResult<Value> {
    let amount = match amount {
        Value::Number(n) => n,
        other => return Err(non_numeric(field, other)),
    };

    let current = match current {
        None => return Ok(Value::Number(amount.clone())),
        Some(Value::Number(n)) => n,
        Some(other) => return Err(non_numeric(field, other)),
    };

    if let (Some(a), Some(b)) = (current.as_i64(), amount.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Ok(Value::from(sum));
        }
    }

    match (current.as_f64(), amount.as_f64()) {
        (Some(a), Some(b)) => Ok(Value::from(a + b)),
        _ => Err(non_numeric(field, &Value::Number(current.clone()))),
    }
}

fn non_numeric(field: &str, value: &Value) -> RepoError {
    log::error!("Cannot apply $inc to non-numeric value {} of field {}", value, field);
    RepoError::new(
        &format!("Cannot apply $inc to a value of non-numeric type at '{}'", field),
        ErrorKind::InvalidQuery,
    )
}

impl Display for UpdateDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.operations.iter().map(|op| op.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

impl From<UpdateOperation> for UpdateDefinition {
    fn from(operation: UpdateOperation) -> Self {
        UpdateDefinition {
            operations: vec![operation],
        }
    }
}

pub fn set<T: Into<Value>>(field: &str, value: T) -> UpdateDefinition {
    UpdateOperation::Set(field.to_string(), value.into()).into()
}

/// Sets a field to any serializable value, such as an embedded struct.
pub fn set_value<T: Serialize>(field: &str, value: &T) -> RepoResult<UpdateDefinition> {
    Ok(UpdateOperation::Set(field.to_string(), serde_json::to_value(value)?).into())
}

pub fn unset(field: &str) -> UpdateDefinition {
    UpdateOperation::Unset(field.to_string()).into()
}

pub fn inc<T: Into<Value>>(field: &str, amount: T) -> UpdateDefinition {
    UpdateOperation::Inc(field.to_string(), amount.into()).into()
}

pub fn current_date(field: &str) -> UpdateDefinition {
    UpdateOperation::CurrentDate(field.to_string()).into()
}
