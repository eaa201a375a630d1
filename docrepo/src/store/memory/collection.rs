use crate::common::{total_order, Document, SortOrder, Value, DOC_ID};
use crate::entity::ObjectId;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::filter::Filter;
use crate::store::{
    DeleteResult, DocumentCollectionProvider, DocumentCursor, FindOptions, InsertManyResult,
    InsertOneResult, UpdateResult,
};
use crate::update::UpdateDefinition;
use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::sync::Arc;

/// Documents of one collection keyed by `_id`, in insertion order.
pub(crate) type CollectionData = Arc<RwLock<IndexMap<String, Document>>>;

pub(crate) struct InMemoryCollection {
    namespace: String,
    data: CollectionData,
    acknowledged: bool,
}

impl InMemoryCollection {
    pub(crate) fn new(namespace: String, data: CollectionData, acknowledged: bool) -> Self {
        InMemoryCollection {
            namespace,
            data,
            acknowledged,
        }
    }

    fn prepare_insert(&self, documents: &IndexMap<String, Document>, mut document: Document) -> RepoResult<(String, Document)> {
        let id = match document.get(DOC_ID) {
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                log::error!("Document id {} in {} is not a string", other, self.namespace);
                return Err(RepoError::new(
                    &format!("Document id must be a string, found {}", other),
                    ErrorKind::ServerRejected,
                ));
            }
            None => {
                let id = ObjectId::new().to_hex();
                document.put(DOC_ID, id.clone())?;
                id
            }
        };

        if documents.contains_key(&id) {
            return Err(RepoError::new(
                &format!(
                    "E11000 duplicate key error collection: {} index: _id_ dup key: {{ _id: \"{}\" }}",
                    self.namespace, id
                ),
                ErrorKind::DuplicateKey,
            ));
        }
        Ok((id, document))
    }

    fn matching_keys(&self, documents: &IndexMap<String, Document>, filter: &Filter) -> RepoResult<Vec<String>> {
        let mut keys = Vec::new();
        for (key, document) in documents.iter() {
            if filter.apply(document)? {
                keys.push(key.clone());
            }
        }
        Ok(keys)
    }
}

fn compare_documents(a: &Document, b: &Document, sort_by: &[(String, SortOrder)]) -> Ordering {
    for (field, order) in sort_by {
        let left = a.get(field).unwrap_or(&Value::Null);
        let right = b.get(field).unwrap_or(&Value::Null);
        let ordering = match order {
            SortOrder::Ascending => total_order(left, right),
            SortOrder::Descending => total_order(right, left),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl DocumentCollectionProvider for InMemoryCollection {
    fn name(&self) -> String {
        self.namespace
            .split_once('.')
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| self.namespace.clone())
    }

    fn insert_one(&self, document: Document) -> RepoResult<InsertOneResult> {
        let mut documents = self.data.write();
        let (id, document) = self.prepare_insert(&documents, document)?;
        documents.insert(id.clone(), document);
        Ok(InsertOneResult::new(self.acknowledged, id))
    }

    fn insert_many(&self, documents: Vec<Document>) -> RepoResult<InsertManyResult> {
        let mut stored = self.data.write();
        let mut inserted = Vec::with_capacity(documents.len());
        for document in documents {
            let (id, document) = self.prepare_insert(&stored, document)?;
            stored.insert(id.clone(), document);
            inserted.push(id);
        }
        Ok(InsertManyResult::new(self.acknowledged, inserted))
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> RepoResult<DocumentCursor> {
        if let Some(projection) = options.projection() {
            projection.validate()?;
        }

        let mut found = Vec::new();
        {
            let documents = self.data.read();
            for document in documents.values() {
                if filter.apply(document)? {
                    found.push(document.clone());
                }
            }
        }

        if !options.sort_fields().is_empty() {
            found.sort_by(|a, b| compare_documents(a, b, options.sort_fields()));
        }

        let skip = options.get_skip().unwrap_or(0) as usize;
        let limit = options.get_limit().map(|l| l as usize).unwrap_or(usize::MAX);
        let page = found.into_iter().skip(skip).take(limit);
        let page: Vec<Document> = match options.projection() {
            Some(projection) => page.map(|d| projection.apply(&d)).collect::<RepoResult<_>>()?,
            None => page.collect(),
        };
        Ok(DocumentCursor::from_documents(page))
    }

    fn update_many(&self, filter: &Filter, update: &UpdateDefinition) -> RepoResult<UpdateResult> {
        let mut documents = self.data.write();
        let keys = self.matching_keys(&documents, filter)?;
        let now = Utc::now();

        // compute every change before committing any
        let mut changes = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(document) = documents.get(key) {
                let updated = update.apply(document, now)?;
                if &updated != document {
                    changes.push((key.clone(), updated));
                }
            }
        }

        let modified = changes.len() as u64;
        for (key, updated) in changes {
            documents.insert(key, updated);
        }

        if !self.acknowledged {
            return Ok(UpdateResult::unacknowledged());
        }
        Ok(UpdateResult::new(true, keys.len() as u64, modified))
    }

    fn replace_one(&self, filter: &Filter, mut replacement: Document) -> RepoResult<UpdateResult> {
        let mut documents = self.data.write();
        let key = self.matching_keys(&documents, filter)?.into_iter().next();

        let Some(key) = key else {
            return Ok(if self.acknowledged {
                UpdateResult::new(true, 0, 0)
            } else {
                UpdateResult::unacknowledged()
            });
        };

        match replacement.id() {
            Some(id) if id != key => {
                log::error!("Replacement would change _id of {} in {}", key, self.namespace);
                return Err(RepoError::new(
                    &format!(
                        "After applying the update, the (immutable) field '_id' was found to have been altered to _id: \"{}\"",
                        id
                    ),
                    ErrorKind::ServerRejected,
                ));
            }
            Some(_) => {}
            None => replacement.put(DOC_ID, key.clone())?,
        }

        let modified = documents.get(&key) != Some(&replacement);
        documents.insert(key, replacement);

        if !self.acknowledged {
            return Ok(UpdateResult::unacknowledged());
        }
        Ok(UpdateResult::new(true, 1, modified as u64))
    }

    fn delete_one(&self, filter: &Filter) -> RepoResult<DeleteResult> {
        let mut documents = self.data.write();
        let key = self.matching_keys(&documents, filter)?.into_iter().next();
        let deleted = match key {
            Some(key) => documents.shift_remove(&key).map(|_| 1).unwrap_or(0),
            None => 0,
        };

        if !self.acknowledged {
            return Ok(DeleteResult::unacknowledged());
        }
        Ok(DeleteResult::new(true, deleted))
    }

    fn delete_many(&self, filter: &Filter) -> RepoResult<DeleteResult> {
        let mut documents = self.data.write();
        let keys = self.matching_keys(&documents, filter)?;
        for key in &keys {
            documents.shift_remove(key);
        }

        if !self.acknowledged {
            return Ok(DeleteResult::unacknowledged());
        }
        Ok(DeleteResult::new(true, keys.len() as u64))
    }

    fn count(&self, filter: &Filter) -> RepoResult<u64> {
        let documents = self.data.read();
        Ok(self.matching_keys(&documents, filter)?.len() as u64)
    }

    async fn insert_one_async(&self, document: Document) -> RepoResult<InsertOneResult> {
        self.insert_one(document)
    }

    async fn insert_many_async(&self, documents: Vec<Document>) -> RepoResult<InsertManyResult> {
        self.insert_many(documents)
    }

    async fn find_async(&self, filter: &Filter, options: &FindOptions) -> RepoResult<Vec<Document>> {
        self.find(filter, options)?.collect()
    }

    async fn update_many_async(
        &self,
        filter: &Filter,
        update: &UpdateDefinition,
    ) -> RepoResult<UpdateResult> {
        self.update_many(filter, update)
    }

    async fn replace_one_async(&self, filter: &Filter, replacement: Document) -> RepoResult<UpdateResult> {
        self.replace_one(filter, replacement)
    }

    async fn delete_one_async(&self, filter: &Filter) -> RepoResult<DeleteResult> {
        self.delete_one(filter)
    }

    async fn delete_many_async(&self, filter: &Filter) -> RepoResult<DeleteResult> {
        self.delete_many(filter)
    }

    async fn count_async(&self, filter: &Filter) -> RepoResult<u64> {
        self.count(filter)
    }
}
