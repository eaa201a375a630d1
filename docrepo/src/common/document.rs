use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::fmt::{Display, Formatter};

/// A document as held by a store: an ordered map of field names to values.
///
/// Field paths may address embedded documents using the `.` separator, so
/// `address.city` reads the `city` field of the `address` sub-document.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::doc;
///
/// let mut doc = doc!{ "name": "Alice", "address": { "city": "Oslo" } };
/// assert_eq!(doc.get("address.city"), Some(&json!("Oslo")));
/// doc.put("address.zip", "0150")?;
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    pub fn new() -> Document {
        Document { fields: Map::new() }
    }

    /// Serializes an entity into a document.
    ///
    /// Fails with `ObjectMappingError` if the entity does not serialize to a JSON object.
    pub fn from_entity<T: Serialize>(entity: &T) -> RepoResult<Document> {
        match serde_json::to_value(entity)? {
            Value::Object(fields) => Ok(Document { fields }),
            other => {
                log::error!("Entity serialized to a non-object value: {}", other);
                Err(RepoError::new(
                    "Entity must serialize to a document",
                    ErrorKind::ObjectMappingError,
                ))
            }
        }
    }

    /// Deserializes the document into an entity. Unknown fields are ignored.
    pub fn to_entity<T: DeserializeOwned>(&self) -> RepoResult<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }

    /// Returns the value at `path`, or `None` if any segment is missing.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.fields.get(path) {
            return Some(value);
        }

        let mut segments = path.split(FIELD_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Puts a value at `path`, creating intermediate sub-documents as needed.
    pub fn put(&mut self, path: &str, value: impl Into<Value>) -> RepoResult<()> {
        let segments = split_path(path)?;
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return Err(empty_path_error()),
        };

        let mut current = &mut self.fields;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match entry {
                Value::Object(map) => map,
                _ => {
                    log::error!("Cannot put {} as {} is not a document", path, segment);
                    return Err(RepoError::new(
                        &format!("Cannot put {}: {} is not a document", path, segment),
                        ErrorKind::InvalidFieldName,
                    ));
                }
            };
        }
        current.insert(last.to_string(), value.into());
        Ok(())
    }

    /// Removes the value at `path` and returns it.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let segments: Vec<&str> = path.split(FIELD_SEPARATOR).collect();
        let (last, parents) = segments.split_last()?;

        let mut current = &mut self.fields;
        for segment in parents {
            current = current.get_mut(*segment)?.as_object_mut()?;
        }
        current.remove(*last)
    }

    pub fn contains_key(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// The `_id` field as a string, if present.
    pub fn id(&self) -> Option<&str> {
        self.fields.get(DOC_ID).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }
}

fn split_path(path: &str) -> RepoResult<Vec<&str>> {
    if path.is_empty() {
        return Err(empty_path_error());
    }
    let segments: Vec<&str> = path.split(FIELD_SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        log::error!("Invalid field path {}", path);
        return Err(RepoError::new(
            &format!("Invalid field path '{}'", path),
            ErrorKind::InvalidFieldName,
        ));
    }
    Ok(segments)
}

fn empty_path_error() -> RepoError {
    log::error!("Document does not support empty key");
    RepoError::new("Document does not support empty key", ErrorKind::InvalidFieldName)
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Document { fields }
    }
}

impl TryFrom<Value> for Document {
    type Error = RepoError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Document { fields }),
            other => Err(RepoError::new(
                &format!("{} is not a document", other),
                ErrorKind::ObjectMappingError,
            )),
        }
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.fields.clone()))
    }
}

/// Builds a [`Document`] from JSON-like syntax.
///
/// ```rust,ignore
/// let doc = doc!{ "name": "Alice", "age": 30 };
/// ```
#[macro_export]
macro_rules! doc {
    ($($json:tt)+) => {
        match $crate::__json::json!({ $($json)+ }) {
            $crate::__json::Value::Object(map) => $crate::common::Document::from(map),
            _ => unreachable!(),
        }
    };
    () => {
        $crate::common::Document::new()
    };
}
