use crate::common::{next_millis, Document};
use crate::entity::{EntityMetadata, ObjectId};
use crate::errors::RepoResult;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Identity and audit timestamps shared by every stored entity.
///
/// # Purpose
/// Embedded in user entities with `#[serde(flatten)]`, so that every entity persists an
/// `_id`, and optionally `_c` (created) and `_m` (modified) as epoch milliseconds.
///
/// # Characteristics
/// - The identifier is generated at construction and never changes afterwards
/// - Timestamps that were never set read as the identifier's creation time
/// - Unset timestamps are not written to the store
/// - Timestamps are kept at millisecond precision, the precision of the store
///
/// # Usage
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// pub struct Person {
///     #[serde(flatten)]
///     base: EntityBase,
///     name: String,
/// }
/// impl_entity!(Person);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBase {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(
        rename = "_c",
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    created_on: Option<DateTime<Utc>>,
    #[serde(
        rename = "_m",
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    modified_on: Option<DateTime<Utc>>,
}

impl EntityBase {
    pub fn new() -> EntityBase {
        EntityBase::with_id(ObjectId::new())
    }

    pub fn with_id(id: ObjectId) -> EntityBase {
        EntityBase {
            id,
            created_on: None,
            modified_on: None,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Creation time, falling back to the identifier's embedded time.
    pub fn created_on(&self) -> DateTime<Utc> {
        self.created_on.unwrap_or_else(|| self.id.timestamp())
    }

    /// Last modification time, falling back to the identifier's embedded time.
    pub fn modified_on(&self) -> DateTime<Utc> {
        self.modified_on.unwrap_or_else(|| self.id.timestamp())
    }

    pub fn set_created_on(&mut self, created_on: DateTime<Utc>) {
        self.created_on = Some(truncate_millis(created_on));
    }

    pub fn set_modified_on(&mut self, modified_on: DateTime<Utc>) {
        self.modified_on = Some(truncate_millis(modified_on));
    }

    /// Sets the modification time to now, rounded up to the next millisecond.
    pub fn touch(&mut self) {
        self.modified_on = Some(next_millis(Utc::now()));
    }

    pub(crate) fn fill_timestamps(&mut self) {
        let stamp = self.id.timestamp();
        self.created_on.get_or_insert(stamp);
        self.modified_on.get_or_insert(stamp);
    }
}

impl Default for EntityBase {
    fn default() -> Self {
        EntityBase::new()
    }
}

fn truncate_millis(time: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(time.timestamp_millis()).unwrap_or(time)
}

/// Where an entity type sits relative to [`EntityBase`].
///
/// Only connection-name resolution looks at the ancestor chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lineage {
    /// The type implements the entity contract itself.
    Direct,
    /// The type is built on the provided base, possibly through intermediate entity types.
    ///
    /// Ancestor names are listed from the immediate parent up to the base's direct
    /// subclass. An empty list means the type is itself the base's direct subclass.
    Derived(&'static [&'static str]),
}

/// Contract every persisted entity type satisfies.
///
/// # Purpose
/// Exposes the embedded [`EntityBase`] and the type-level metadata the naming resolver
/// needs. Usually implemented through [`impl_entity!`](crate::impl_entity).
///
/// # Methods
/// * `entity_name()` - the type name, used as the naming fallback
/// * `lineage()` - position relative to the base, `Direct` unless overridden
/// * `declarations()` - type-level collection/connection declarations; constructing an
///   invalid declaration surfaces here as `ValidationError`
/// * `base()` / `base_mut()` - the embedded identity and timestamps
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn entity_name() -> &'static str;

    fn lineage() -> Lineage {
        Lineage::Direct
    }

    fn declarations() -> RepoResult<EntityMetadata> {
        Ok(EntityMetadata::default())
    }

    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    fn id(&self) -> ObjectId {
        self.base().id()
    }
}

/// Fills in unset timestamps from the identifier's creation time.
///
/// Applied to every entity read from the store.
pub fn ensure_timestamps<T: Entity>(mut entity: T) -> T {
    entity.base_mut().fill_timestamps();
    entity
}

pub(crate) fn to_document<T: Entity>(entity: &T) -> RepoResult<Document> {
    Document::from_entity(entity)
}

pub(crate) fn from_document<T: Entity>(document: &Document) -> RepoResult<T> {
    let entity: T = document.to_entity()?;
    Ok(ensure_timestamps(entity))
}

/// Implements [`Entity`](crate::entity::Entity) for a struct with a `base: EntityBase` field.
///
/// ```ignore
/// impl_entity!(Person);
/// impl_entity!(Manager, lineage = Lineage::Derived(&["Employee"]));
/// impl_entity!(Invoice, declarations = EntityMetadata::new()
///     .collection_name(CollectionName::new("invoices")?));
/// ```
#[macro_export]
macro_rules! impl_entity {
    ($ty:ident, lineage = $lineage:expr, declarations = $declarations:expr) => {
        impl $crate::entity::Entity for $ty {
            fn entity_name() -> &'static str {
                stringify!($ty)
            }

            fn lineage() -> $crate::entity::Lineage {
                $lineage
            }

            fn declarations() -> $crate::errors::RepoResult<$crate::entity::EntityMetadata> {
                Ok($declarations)
            }

            fn base(&self) -> &$crate::entity::EntityBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut $crate::entity::EntityBase {
                &mut self.base
            }
        }
    };
    ($ty:ident, lineage = $lineage:expr) => {
        $crate::impl_entity!($ty, lineage = $lineage, declarations = $crate::entity::EntityMetadata::new());
    };
    ($ty:ident, declarations = $declarations:expr) => {
        $crate::impl_entity!($ty, lineage = $crate::entity::Lineage::Direct, declarations = $declarations);
    };
    ($ty:ident) => {
        $crate::impl_entity!(
            $ty,
            lineage = $crate::entity::Lineage::Direct,
            declarations = $crate::entity::EntityMetadata::new()
        );
    };
}
