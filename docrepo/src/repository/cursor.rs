use crate::entity::{from_document, Entity};
use crate::errors::RepoResult;
use crate::store::DocumentCursor;
use std::marker::PhantomData;

/// A lazy sequence of entities read from the store.
///
/// Each document is mapped to `T` as it is pulled, with unset timestamps filled in from
/// the identifier. A document that cannot be mapped yields an `ObjectMappingError` item
/// and iteration may continue past it.
pub struct EntityCursor<T> {
    cursor: DocumentCursor,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Entity> EntityCursor<T> {
    pub fn new(cursor: DocumentCursor) -> Self {
        EntityCursor {
            cursor,
            _phantom: PhantomData,
        }
    }

    /// Pulls the first entity and drops the rest of the cursor.
    pub fn first(mut self) -> RepoResult<Option<T>> {
        self.next().transpose()
    }

    /// Drains the cursor, failing on the first document that cannot be mapped.
    pub fn to_vec(self) -> RepoResult<Vec<T>> {
        self.collect()
    }
}

impl<T: Entity> Iterator for EntityCursor<T> {
    type Item = RepoResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor
            .next()
            .map(|result| result.and_then(|document| from_document(&document)))
    }
}
