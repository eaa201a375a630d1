use crate::common::{DOC_ID, DOC_MODIFIED};
use crate::config::ConfigurationSource;
use crate::entity::{to_document, Entity, ObjectId};
use crate::errors::RepoResult;
use crate::filter::{all, by_id, Filter};
use crate::repository::{EntityCursor, Paging, RepositoryBuilder};
use crate::retry::RetryPolicy;
use crate::store::{DocumentCollection, DocumentCursor, FindOptions, Projection, StoreDriver};
use crate::update::{current_date, set_value, UpdateDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// A typed repository over one store collection.
///
/// # Purpose
/// Gives an entity type a complete create, retrieve, update and delete surface without
/// store-specific query code. The collection and connection names are resolved from the
/// entity type once, at construction, and the bound collection never changes afterwards.
///
/// # Characteristics
/// - **Immutable binding**: holds the collection handle and the retry policy only
/// - **Thread-safe**: `Send + Sync`; share it behind an `Arc` across threads or tasks
/// - **Retried**: every store call runs through the [`RetryPolicy`]
/// - **Dual surface**: every operation has an `_async` counterpart
///
/// # Usage
///
/// ```rust,ignore
/// let config = ConnectionStrings::new().with("person", "memory://localhost/people");
/// let repo: Repository<Person> = Repository::new(&InMemoryDriver::new(), &config)?;
///
/// repo.insert(&Person::new("Alice", 31))?;
/// let page = repo.find_page(field("age").gte(18), 1, 20)?.to_vec()?;
/// repo.update(field("name").eq("Alice"), inc("age", 1))?;
/// ```
pub struct Repository<T: Entity> {
    pub(crate) collection: DocumentCollection,
    pub(crate) collection_name: String,
    pub(crate) connection_name: String,
    pub(crate) retry_policy: RetryPolicy,
    pub(crate) _phantom: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Repository {
            collection: self.collection.clone(),
            collection_name: self.collection_name.clone(),
            connection_name: self.connection_name.clone(),
            retry_policy: self.retry_policy.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    /// Binds to the connection string configured for `T`'s resolved connection name.
    ///
    /// Fails with `ConfigurationMissing` if `config` has no entry for that name.
    pub fn new(driver: &dyn StoreDriver, config: &dyn ConfigurationSource) -> RepoResult<Self> {
        RepositoryBuilder::new()
            .driver(driver)
            .configuration(config)
            .build()
    }

    /// Binds to the database of `connection_string`, using `T`'s resolved collection name.
    pub fn from_connection_string(
        driver: &dyn StoreDriver,
        connection_string: &str,
    ) -> RepoResult<Self> {
        RepositoryBuilder::new()
            .driver(driver)
            .connection_string(connection_string)
            .build()
    }

    /// Binds to `collection_name` verbatim in the database of `connection_string`.
    pub fn with_collection_name(
        driver: &dyn StoreDriver,
        connection_string: &str,
        collection_name: &str,
    ) -> RepoResult<Self> {
        RepositoryBuilder::new()
            .driver(driver)
            .connection_string(connection_string)
            .collection_name(collection_name)
            .build()
    }

    pub fn builder<'a>() -> RepositoryBuilder<'a, T> {
        RepositoryBuilder::new()
    }

    pub(crate) fn bind(
        collection: DocumentCollection,
        collection_name: String,
        connection_name: String,
        retry_policy: RetryPolicy,
    ) -> Self {
        log::debug!(
            "Repository for {} bound to collection {} (connection {})",
            T::entity_name(),
            collection_name,
            connection_name
        );
        Repository {
            collection,
            collection_name,
            connection_name,
            retry_policy,
            _phantom: PhantomData,
        }
    }

    /// The bound collection, for driver-level queries the repository does not cover.
    pub fn collection(&self) -> &DocumentCollection {
        &self.collection
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    // Create

    /// Inserts `entity` with its identifier. Timestamps are stored as they are.
    pub fn insert(&self, entity: &T) -> RepoResult<()> {
        let document = to_document(entity)?;
        self.retry_policy.execute_write("insert", || {
            self.collection.insert_one(document.clone()).map(|_| ())
        })
    }

    /// Inserts `entities` in order as one store call.
    ///
    /// The call is ordered: on failure the entities before the failing one stay inserted.
    pub fn insert_many(&self, entities: &[T]) -> RepoResult<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let documents = entities.iter().map(to_document).collect::<RepoResult<Vec<_>>>()?;
        self.retry_policy.execute_write("insert_many", || {
            self.collection.insert_many(documents.clone()).map(|_| ())
        })
    }

    // Retrieve

    pub fn get(&self, id: ObjectId) -> RepoResult<Option<T>> {
        self.find_one("get", &by_id(id), &FindOptions::new().limit(1))
    }

    /// All entities matching `filter`, in store order.
    pub fn find(&self, filter: Filter) -> RepoResult<EntityCursor<T>> {
        self.find_with("find", &filter, &FindOptions::new())
    }

    /// Page `page_index` (counted from 1) of entities matching `filter`, in ascending
    /// identifier order.
    pub fn find_page(
        &self,
        filter: Filter,
        page_index: u64,
        page_size: u64,
    ) -> RepoResult<EntityCursor<T>> {
        self.find_page_by(filter, DOC_ID, page_index, page_size, false)
    }

    /// Page `page_index` (counted from 1) of entities matching `filter`, ordered by `order`.
    pub fn find_page_by(
        &self,
        filter: Filter,
        order: &str,
        page_index: u64,
        page_size: u64,
        is_descending: bool,
    ) -> RepoResult<EntityCursor<T>> {
        let options = Paging::one_based(page_index, page_size).find_options(order, is_descending);
        self.find_with("find_page", &filter, &options)
    }

    pub fn find_all(&self) -> RepoResult<EntityCursor<T>> {
        self.find_with("find_all", &all(), &FindOptions::new())
    }

    /// Page `page_index` (counted from 0) of all entities, in ascending identifier order.
    pub fn find_all_page(&self, page_index: u64, page_size: u64) -> RepoResult<EntityCursor<T>> {
        self.find_all_page_by(DOC_ID, page_index, page_size, false)
    }

    /// Page `page_index` (counted from 0) of all entities, ordered by `order`.
    pub fn find_all_page_by(
        &self,
        order: &str,
        page_index: u64,
        page_size: u64,
        is_descending: bool,
    ) -> RepoResult<EntityCursor<T>> {
        let options = Paging::zero_based(page_index, page_size).find_options(order, is_descending);
        self.find_with("find_all_page", &all(), &options)
    }

    /// Documents matching `filter`, shaped by `options` and returned as stored.
    ///
    /// Use this for projections and other reads whose result does not map onto `T`.
    pub fn query(&self, filter: Filter, options: FindOptions) -> RepoResult<DocumentCursor> {
        self.retry_policy
            .execute("query", || self.collection.find(&filter, &options))
    }

    /// Entities matching `filter` with only the fields selected by `projection`,
    /// deserialized into `P`.
    pub fn find_projected<P: DeserializeOwned>(
        &self,
        filter: Filter,
        projection: Projection,
    ) -> RepoResult<Vec<P>> {
        let options = FindOptions::new().project(projection);
        let documents = self.retry_policy.execute("find_projected", || {
            self.collection.find(&filter, &options)?.collect::<RepoResult<Vec<_>>>()
        })?;
        documents.iter().map(|d| d.to_entity()).collect()
    }

    /// The entity with the smallest identifier.
    pub fn first(&self) -> RepoResult<Option<T>> {
        let options = Paging::zero_based(0, 1).find_options(DOC_ID, false);
        self.find_one("first", &all(), &options)
    }

    pub fn first_matching(&self, filter: Filter) -> RepoResult<Option<T>> {
        self.first_by(filter, DOC_ID, false)
    }

    pub fn first_by(&self, filter: Filter, order: &str, is_descending: bool) -> RepoResult<Option<T>> {
        let options = Paging::one_based(1, 1).find_options(order, is_descending);
        self.find_one("first", &filter, &options)
    }

    /// The entity with the largest identifier.
    pub fn last(&self) -> RepoResult<Option<T>> {
        let options = Paging::zero_based(0, 1).find_options(DOC_ID, true);
        self.find_one("last", &all(), &options)
    }

    pub fn last_matching(&self, filter: Filter) -> RepoResult<Option<T>> {
        self.last_by(filter, DOC_ID, false)
    }

    /// [`first_by`](Self::first_by) with the direction inverted: `is_descending = false`
    /// picks the largest `order` value.
    pub fn last_by(&self, filter: Filter, order: &str, is_descending: bool) -> RepoResult<Option<T>> {
        self.first_by(filter, order, !is_descending)
    }

    // Update

    /// Applies `update` to every entity matching `filter` and stamps `_m` with the store's
    /// current time. Returns the acknowledgement flag.
    pub fn update(&self, filter: Filter, update: UpdateDefinition) -> RepoResult<bool> {
        let update = stamp_modified(update);
        self.retry_policy.execute_write("update", || {
            self.collection
                .update_many(&filter, &update)
                .map(|result| result.acknowledged())
        })
    }

    pub fn update_by_id(&self, id: ObjectId, update: UpdateDefinition) -> RepoResult<bool> {
        self.update(by_id(id), update)
    }

    pub fn update_entity(&self, entity: &T, update: UpdateDefinition) -> RepoResult<bool> {
        self.update_by_id(entity.id(), update)
    }

    /// Sets a single field on every entity matching `filter`.
    pub fn update_field<V: Serialize>(&self, filter: Filter, field: &str, value: &V) -> RepoResult<bool> {
        self.update(filter, set_value(field, value)?)
    }

    pub fn update_entity_field<V: Serialize>(&self, entity: &T, field: &str, value: &V) -> RepoResult<bool> {
        self.update_field(by_id(entity.id()), field, value)
    }

    /// Replaces the stored document with the same identifier. `_m` is written as it is on
    /// `entity`; call [`EntityBase::touch`](crate::entity::EntityBase::touch) first to
    /// advance it.
    pub fn replace(&self, entity: &T) -> RepoResult<bool> {
        let filter = by_id(entity.id());
        let document = to_document(entity)?;
        self.retry_policy.execute_write("replace", || {
            self.collection
                .replace_one(&filter, document.clone())
                .map(|result| result.acknowledged())
        })
    }

    /// Replaces each entity in turn, each with its own retry budget.
    ///
    /// Stops at the first failure; earlier replacements are kept.
    pub fn replace_many(&self, entities: &[T]) -> RepoResult<Vec<bool>> {
        entities.iter().map(|entity| self.replace(entity)).collect()
    }

    // Delete

    pub fn delete_by_id(&self, id: ObjectId) -> RepoResult<bool> {
        let filter = by_id(id);
        self.retry_policy.execute_write("delete", || {
            self.collection
                .delete_one(&filter)
                .map(|result| result.acknowledged())
        })
    }

    pub fn delete_entity(&self, entity: &T) -> RepoResult<bool> {
        self.delete_by_id(entity.id())
    }

    /// Deletes every entity matching `filter`. Returns the acknowledgement flag, which is
    /// true even when nothing matched.
    pub fn delete(&self, filter: Filter) -> RepoResult<bool> {
        self.retry_policy.execute_write("delete", || {
            self.collection
                .delete_many(&filter)
                .map(|result| result.acknowledged())
        })
    }

    pub fn delete_all(&self) -> RepoResult<bool> {
        self.delete(all())
    }

    // Utility

    /// Whether any entity matches `filter`. Fetches the first match.
    pub fn any(&self, filter: Filter) -> RepoResult<bool> {
        Ok(self.first_matching(filter)?.is_some())
    }

    pub fn count(&self) -> RepoResult<u64> {
        self.count_matching(all())
    }

    pub fn count_matching(&self, filter: Filter) -> RepoResult<u64> {
        self.retry_policy
            .execute("count", || self.collection.count(&filter))
    }

    fn find_with(
        &self,
        operation: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> RepoResult<EntityCursor<T>> {
        self.retry_policy.execute(operation, || {
            self.collection
                .find(filter, options)
                .map(EntityCursor::new)
        })
    }

    // the cursor is drained inside the retried call
    fn find_one(&self, operation: &str, filter: &Filter, options: &FindOptions) -> RepoResult<Option<T>> {
        self.retry_policy.execute(operation, || {
            self.collection
                .find(filter, options)
                .and_then(|cursor| EntityCursor::new(cursor).first())
        })
    }
}

/// Appends the unconditional `_m` stamp to a caller's update.
pub(crate) fn stamp_modified(update: UpdateDefinition) -> UpdateDefinition {
    update.then(current_date(DOC_MODIFIED))
}
