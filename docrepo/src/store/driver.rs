use crate::common::Document;
use crate::errors::RepoResult;
use crate::filter::Filter;
use crate::store::{
    DeleteResult, FindOptions, InsertManyResult, InsertOneResult, StoreUrl, UpdateResult,
};
use crate::update::UpdateDefinition;
use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;

/// Entry point of a store driver.
///
/// A driver turns a parsed connection string into a client. Connection pooling, if any,
/// is the driver's own concern.
pub trait StoreDriver: Send + Sync {
    fn connect(&self, url: &StoreUrl) -> RepoResult<StoreClient>;
}

pub trait StoreClientProvider: Send + Sync {
    fn database(&self, name: &str) -> RepoResult<StoreDatabase>;

    fn database_names(&self) -> RepoResult<Vec<String>>;

    fn drop_database(&self, name: &str) -> RepoResult<()>;
}

/// A connected client.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<dyn StoreClientProvider>,
}

impl StoreClient {
    pub fn new<T: StoreClientProvider + 'static>(inner: T) -> Self {
        StoreClient { inner: Arc::new(inner) }
    }
}

impl Deref for StoreClient {
    type Target = Arc<dyn StoreClientProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub trait StoreDatabaseProvider: Send + Sync {
    fn name(&self) -> String;

    fn collection(&self, name: &str) -> RepoResult<DocumentCollection>;

    fn collection_names(&self) -> RepoResult<Vec<String>>;

    fn drop_collection(&self, name: &str) -> RepoResult<()>;
}

/// A database handle.
#[derive(Clone)]
pub struct StoreDatabase {
    inner: Arc<dyn StoreDatabaseProvider>,
}

impl StoreDatabase {
    pub fn new<T: StoreDatabaseProvider + 'static>(inner: T) -> Self {
        StoreDatabase { inner: Arc::new(inner) }
    }
}

impl Deref for StoreDatabase {
    type Target = Arc<dyn StoreDatabaseProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Collection-level primitives a driver provides.
///
/// # Purpose
/// The narrow surface the repository is written against. Every method exists in a
/// blocking and an `_async` form with identical semantics.
///
/// # Behavior
/// - Drivers report transient network trouble as `ConnectionFailure` caused by
///   `NetworkIo` or `SocketFailure`; anything else is treated as permanent
/// - `insert_many` is ordered: it stops at the first failing document and keeps the
///   documents inserted before it
/// - `find` applies the filter, then sort, then skip, then limit
/// - `replace_one` replaces the first matching document and may not change its `_id`
/// - Write results carry the store's acknowledgement flag
#[async_trait]
pub trait DocumentCollectionProvider: Send + Sync {
    fn name(&self) -> String;

    fn insert_one(&self, document: Document) -> RepoResult<InsertOneResult>;

    fn insert_many(&self, documents: Vec<Document>) -> RepoResult<InsertManyResult>;

    fn find(&self, filter: &Filter, options: &FindOptions) -> RepoResult<DocumentCursor>;

    fn update_many(&self, filter: &Filter, update: &UpdateDefinition) -> RepoResult<UpdateResult>;

    fn replace_one(&self, filter: &Filter, replacement: Document) -> RepoResult<UpdateResult>;

    fn delete_one(&self, filter: &Filter) -> RepoResult<DeleteResult>;

    fn delete_many(&self, filter: &Filter) -> RepoResult<DeleteResult>;

    fn count(&self, filter: &Filter) -> RepoResult<u64>;

    async fn insert_one_async(&self, document: Document) -> RepoResult<InsertOneResult>;

    async fn insert_many_async(&self, documents: Vec<Document>) -> RepoResult<InsertManyResult>;

    async fn find_async(&self, filter: &Filter, options: &FindOptions) -> RepoResult<Vec<Document>>;

    async fn update_many_async(
        &self,
        filter: &Filter,
        update: &UpdateDefinition,
    ) -> RepoResult<UpdateResult>;

    async fn replace_one_async(&self, filter: &Filter, replacement: Document) -> RepoResult<UpdateResult>;

    async fn delete_one_async(&self, filter: &Filter) -> RepoResult<DeleteResult>;

    async fn delete_many_async(&self, filter: &Filter) -> RepoResult<DeleteResult>;

    async fn count_async(&self, filter: &Filter) -> RepoResult<u64>;
}

/// A collection handle.
#[derive(Clone)]
pub struct DocumentCollection {
    inner: Arc<dyn DocumentCollectionProvider>,
}

impl DocumentCollection {
    pub fn new<T: DocumentCollectionProvider + 'static>(inner: T) -> Self {
        DocumentCollection { inner: Arc::new(inner) }
    }
}

impl Deref for DocumentCollection {
    type Target = Arc<dyn DocumentCollectionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Documents returned by a find, pulled one at a time.
pub struct DocumentCursor {
    inner: Box<dyn Iterator<Item = RepoResult<Document>> + Send>,
}

impl DocumentCursor {
    pub fn new<I>(inner: I) -> Self
    where
        I: Iterator<Item = RepoResult<Document>> + Send + 'static,
    {
        DocumentCursor { inner: Box::new(inner) }
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        DocumentCursor::new(documents.into_iter().map(Ok))
    }

    pub fn empty() -> Self {
        DocumentCursor::from_documents(Vec::new())
    }
}

impl Iterator for DocumentCursor {
    type Item = RepoResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
