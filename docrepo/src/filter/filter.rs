use crate::common::{Document, Value, DOC_ID};
use crate::entity::ObjectId;
use crate::errors::RepoResult;
use std::any::Any;
use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

use super::{AllFilter, AndFilter, EqualsFilter, NotFilter, OrFilter};

/// A predicate over documents.
///
/// Drivers evaluate filters either by calling [`apply`](FilterProvider::apply) on each
/// candidate document, or by downcasting through [`as_any`](FilterProvider::as_any) and
/// translating the filter into their native query language.
pub trait FilterProvider: Any + Send + Sync + Display {
    fn apply(&self, entry: &Document) -> RepoResult<bool>;

    fn as_any(&self) -> &dyn Any;
}

/// A cheaply cloneable, shareable filter.
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter { inner: Arc::new(inner) }
    }

    pub fn and(&self, filter: Filter) -> Self {
        Filter::new(AndFilter::new(vec![self.clone(), filter]))
    }

    pub fn or(&self, filter: Filter) -> Self {
        Filter::new(OrFilter::new(vec![self.clone(), filter]))
    }

    pub fn not(&self) -> Self {
        Filter::new(NotFilter::new(self.clone()))
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Filter{}", self.inner)
    }
}

impl Deref for Filter {
    type Target = Arc<dyn FilterProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Matches every document.
pub fn all() -> Filter {
    Filter::new(AllFilter)
}

/// Matches the document with the given identifier.
pub fn by_id(id: ObjectId) -> Filter {
    Filter::new(EqualsFilter::new(DOC_ID.to_string(), Value::String(id.to_hex())))
}

pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::new(AndFilter::new(filters))
}

pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::new(OrFilter::new(filters))
}

pub fn not(filter: Filter) -> Filter {
    Filter::new(NotFilter::new(filter))
}

pub fn is_all_filter(filter: &Filter) -> bool {
    filter.as_any().is::<AllFilter>()
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::String(id.to_hex())
    }
}
