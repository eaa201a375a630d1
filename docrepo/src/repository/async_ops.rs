use crate::common::{Document, DOC_ID};
use crate::entity::{from_document, to_document, Entity, ObjectId};
use crate::errors::RepoResult;
use crate::filter::{all, by_id, Filter};
use crate::repository::repository::stamp_modified;
use crate::repository::{Paging, Repository};
use crate::store::{FindOptions, Projection};
use crate::update::{set_value, UpdateDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Non-blocking counterparts of every repository operation.
///
/// Semantics match the blocking forms exactly, including retries and the `_m` stamp on
/// updates. Each call suspends at the driver instead of blocking the thread. Finds return
/// the collected entities instead of a cursor.
impl<T: Entity> Repository<T> {
    pub async fn insert_async(&self, entity: &T) -> RepoResult<()> {
        let document = &to_document(entity)?;
        self.retry_policy
            .execute_write_async("insert", move || async move {
                self.collection.insert_one_async(document.clone()).await.map(|_| ())
            })
            .await
    }

    pub async fn insert_many_async(&self, entities: &[T]) -> RepoResult<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let documents = &entities.iter().map(to_document).collect::<RepoResult<Vec<_>>>()?;
        self.retry_policy
            .execute_write_async("insert_many", move || async move {
                self.collection.insert_many_async(documents.clone()).await.map(|_| ())
            })
            .await
    }

    pub async fn get_async(&self, id: ObjectId) -> RepoResult<Option<T>> {
        self.find_one_async("get", by_id(id), FindOptions::new().limit(1))
            .await
    }

    pub async fn find_async(&self, filter: Filter) -> RepoResult<Vec<T>> {
        self.find_with_async("find", filter, FindOptions::new()).await
    }

    pub async fn find_page_async(
        &self,
        filter: Filter,
        page_index: u64,
        page_size: u64,
    ) -> RepoResult<Vec<T>> {
        self.find_page_by_async(filter, DOC_ID, page_index, page_size, false)
            .await
    }

    pub async fn find_page_by_async(
        &self,
        filter: Filter,
        order: &str,
        page_index: u64,
        page_size: u64,
        is_descending: bool,
    ) -> RepoResult<Vec<T>> {
        let options = Paging::one_based(page_index, page_size).find_options(order, is_descending);
        self.find_with_async("find_page", filter, options).await
    }

    pub async fn find_all_async(&self) -> RepoResult<Vec<T>> {
        self.find_with_async("find_all", all(), FindOptions::new()).await
    }

    pub async fn find_all_page_async(&self, page_index: u64, page_size: u64) -> RepoResult<Vec<T>> {
        self.find_all_page_by_async(DOC_ID, page_index, page_size, false)
            .await
    }

    pub async fn find_all_page_by_async(
        &self,
        order: &str,
        page_index: u64,
        page_size: u64,
        is_descending: bool,
    ) -> RepoResult<Vec<T>> {
        let options = Paging::zero_based(page_index, page_size).find_options(order, is_descending);
        self.find_with_async("find_all_page", all(), options).await
    }

    pub async fn query_async(&self, filter: Filter, options: FindOptions) -> RepoResult<Vec<Document>> {
        self.find_documents_async("query", filter, options).await
    }

    pub async fn find_projected_async<P: DeserializeOwned>(
        &self,
        filter: Filter,
        projection: Projection,
    ) -> RepoResult<Vec<P>> {
        let options = FindOptions::new().project(projection);
        let documents = self.find_documents_async("find_projected", filter, options).await?;
        documents.iter().map(|d| d.to_entity()).collect()
    }

    pub async fn first_async(&self) -> RepoResult<Option<T>> {
        let options = Paging::zero_based(0, 1).find_options(DOC_ID, false);
        self.find_one_async("first", all(), options).await
    }

    pub async fn first_matching_async(&self, filter: Filter) -> RepoResult<Option<T>> {
        self.first_by_async(filter, DOC_ID, false).await
    }

    pub async fn first_by_async(
        &self,
        filter: Filter,
        order: &str,
        is_descending: bool,
    ) -> RepoResult<Option<T>> {
        let options = Paging::one_based(1, 1).find_options(order, is_descending);
        self.find_one_async("first", filter, options).await
    }

    pub async fn last_async(&self) -> RepoResult<Option<T>> {
        let options = Paging::zero_based(0, 1).find_options(DOC_ID, true);
        self.find_one_async("last", all(), options).await
    }

    pub async fn last_matching_async(&self, filter: Filter) -> RepoResult<Option<T>> {
        self.last_by_async(filter, DOC_ID, false).await
    }

    pub async fn last_by_async(
        &self,
        filter: Filter,
        order: &str,
        is_descending: bool,
    ) -> RepoResult<Option<T>> {
        self.first_by_async(filter, order, !is_descending).await
    }

    pub async fn update_async(&self, filter: Filter, update: UpdateDefinition) -> RepoResult<bool> {
        let update = &stamp_modified(update);
        let filter = &filter;
        self.retry_policy
            .execute_write_async("update", move || async move {
                self.collection
                    .update_many_async(filter, update)
                    .await
                    .map(|result| result.acknowledged())
            })
            .await
    }

    pub async fn update_by_id_async(&self, id: ObjectId, update: UpdateDefinition) -> RepoResult<bool> {
        self.update_async(by_id(id), update).await
    }

    pub async fn update_entity_async(&self, entity: &T, update: UpdateDefinition) -> RepoResult<bool> {
        self.update_by_id_async(entity.id(), update).await
    }

    pub async fn update_field_async<V: Serialize>(
        &self,
        filter: Filter,
        field: &str,
        value: &V,
    ) -> RepoResult<bool> {
        let update = set_value(field, value)?;
        self.update_async(filter, update).await
    }

    pub async fn update_entity_field_async<V: Serialize>(
        &self,
        entity: &T,
        field: &str,
        value: &V,
    ) -> RepoResult<bool> {
        self.update_field_async(by_id(entity.id()), field, value)
            .await
    }

    pub async fn replace_async(&self, entity: &T) -> RepoResult<bool> {
        let filter = &by_id(entity.id());
        let document = &to_document(entity)?;
        self.retry_policy
            .execute_write_async("replace", move || async move {
                self.collection
                    .replace_one_async(filter, document.clone())
                    .await
                    .map(|result| result.acknowledged())
            })
            .await
    }

    /// Replaces each entity in turn; the next replace starts only after the previous one
    /// has finished.
    pub async fn replace_many_async(&self, entities: &[T]) -> RepoResult<Vec<bool>> {
        let mut acknowledged = Vec::with_capacity(entities.len());
        for entity in entities {
            acknowledged.push(self.replace_async(entity).await?);
        }
        Ok(acknowledged)
    }

    pub async fn delete_by_id_async(&self, id: ObjectId) -> RepoResult<bool> {
        let filter = &by_id(id);
        self.retry_policy
            .execute_write_async("delete", move || async move {
                self.collection
                    .delete_one_async(filter)
                    .await
                    .map(|result| result.acknowledged())
            })
            .await
    }

    pub async fn delete_entity_async(&self, entity: &T) -> RepoResult<bool> {
        self.delete_by_id_async(entity.id()).await
    }

    pub async fn delete_async(&self, filter: Filter) -> RepoResult<bool> {
        let filter = &filter;
        self.retry_policy
            .execute_write_async("delete", move || async move {
                self.collection
                    .delete_many_async(filter)
                    .await
                    .map(|result| result.acknowledged())
            })
            .await
    }

    pub async fn delete_all_async(&self) -> RepoResult<bool> {
        self.delete_async(all()).await
    }

    pub async fn any_async(&self, filter: Filter) -> RepoResult<bool> {
        Ok(self.first_matching_async(filter).await?.is_some())
    }

    pub async fn count_async(&self) -> RepoResult<u64> {
        self.count_matching_async(all()).await
    }

    pub async fn count_matching_async(&self, filter: Filter) -> RepoResult<u64> {
        let filter = &filter;
        self.retry_policy
            .execute_async("count", move || async move {
                self.collection.count_async(filter).await
            })
            .await
    }

    async fn find_with_async(
        &self,
        operation: &str,
        filter: Filter,
        options: FindOptions,
    ) -> RepoResult<Vec<T>> {
        let documents = self.find_documents_async(operation, filter, options).await?;
        documents.iter().map(from_document).collect()
    }

    async fn find_one_async(
        &self,
        operation: &str,
        filter: Filter,
        options: FindOptions,
    ) -> RepoResult<Option<T>> {
        let documents = self.find_documents_async(operation, filter, options).await?;
        documents.first().map(from_document).transpose()
    }

    async fn find_documents_async(
        &self,
        operation: &str,
        filter: Filter,
        options: FindOptions,
    ) -> RepoResult<Vec<Document>> {
        let (filter, options) = (&filter, &options);
        self.retry_policy
            .execute_async(operation, move || async move {
                self.collection.find_async(filter, options).await
            })
            .await
    }
}
