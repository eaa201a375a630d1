use crate::entity::{Entity, EntityBase, Lineage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// An entity that stores an arbitrary payload under a `content` field.
///
/// Lets any serializable type be persisted without embedding [`EntityBase`] into it. The
/// collection and connection names default to `C`'s type name without its module path or
/// generic arguments, so `ContentEntity<Note>` lives in the `note` collection.
///
/// ```rust,ignore
/// let notes: Repository<ContentEntity<Note>> = Repository::new(&driver, &config)?;
/// notes.insert(&ContentEntity::new(Note { text: "hello".into() }))?;
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentEntity<C> {
    #[serde(flatten)]
    base: EntityBase,
    content: C,
}

impl<C> ContentEntity<C> {
    pub fn new(content: C) -> Self {
        ContentEntity {
            base: EntityBase::new(),
            content,
        }
    }

    pub fn with_base(base: EntityBase, content: C) -> Self {
        ContentEntity { base, content }
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut C {
        &mut self.content
    }

    pub fn into_content(self) -> C {
        self.content
    }
}

impl<C> Entity for ContentEntity<C>
where
    C: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn entity_name() -> &'static str {
        short_type_name(std::any::type_name::<C>())
    }

    fn lineage() -> Lineage {
        Lineage::Derived(&[])
    }

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

// `alloc::vec::Vec<my::Note>` -> `Vec`
fn short_type_name(full: &'static str) -> &'static str {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics.rsplit("::").next().unwrap_or(without_generics)
}
