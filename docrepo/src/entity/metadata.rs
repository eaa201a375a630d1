use crate::errors::{ErrorKind, RepoError, RepoResult};
use std::fmt::{Display, Formatter};

/// A collection name declared for an entity type.
///
/// # Purpose
/// Pins the collection an entity type is stored in, independent of the type's own name.
///
/// # Characteristics
/// - Holds exactly one non-blank string
/// - Construction fails with `ValidationError` for empty or whitespace-only values
/// - Stored as given; the naming resolver lower-cases it
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionName(String);

impl CollectionName {
    pub fn new(name: &str) -> RepoResult<CollectionName> {
        validate_name(name, "Collection")?;
        Ok(CollectionName(name.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for CollectionName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connection name declared for an entity type.
///
/// The connection name is the key used to look up a connection string in a
/// [`ConfigurationSource`](crate::config::ConfigurationSource). Same validation rules as
/// [`CollectionName`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionName(String);

impl ConnectionName {
    pub fn new(name: &str) -> RepoResult<ConnectionName> {
        validate_name(name, "Connection")?;
        Ok(ConnectionName(name.to_string()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Display for ConnectionName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_name(name: &str, label: &str) -> RepoResult<()> {
    if name.trim().is_empty() {
        log::error!("{} name cannot be empty", label);
        return Err(RepoError::new(
            &format!("{} name cannot be empty", label),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

/// Naming declarations for an entity type.
///
/// Used in two places: returned from [`Entity::declarations`](super::Entity::declarations)
/// as the type-level declarations, and passed to a repository builder as a
/// construction-time override that beats them.
///
/// ```rust,ignore
/// let metadata = EntityMetadata::new()
///     .collection_name(CollectionName::new("people")?)
///     .connection_name(ConnectionName::new("crm")?);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityMetadata {
    collection_name: Option<CollectionName>,
    connection_name: Option<ConnectionName>,
}

impl EntityMetadata {
    pub fn new() -> EntityMetadata {
        EntityMetadata::default()
    }

    pub fn collection_name(mut self, name: CollectionName) -> Self {
        self.collection_name = Some(name);
        self
    }

    pub fn connection_name(mut self, name: ConnectionName) -> Self {
        self.connection_name = Some(name);
        self
    }

    pub fn get_collection_name(&self) -> Option<&CollectionName> {
        self.collection_name.as_ref()
    }

    pub fn get_connection_name(&self) -> Option<&ConnectionName> {
        self.connection_name.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.collection_name.is_none() && self.connection_name.is_none()
    }
}
