use std::any::Any;
use std::fmt::Display;

use crate::common::Document;
use crate::errors::RepoResult;

use super::{Filter, FilterProvider};

/// Matches when every inner filter matches. An empty `and` matches everything.
pub struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        AndFilter { filters }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

impl Display for AndFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.filters.iter().map(|f| f.to_string()).collect();
        write!(f, "({})", parts.join(" && "))
    }
}

impl FilterProvider for AndFilter {
    fn apply(&self, entry: &Document) -> RepoResult<bool> {
        for filter in &self.filters {
            if !filter.apply(entry)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches when any inner filter matches. An empty `or` matches nothing.
pub struct OrFilter {
    filters: Vec<Filter>,
}

impl OrFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        OrFilter { filters }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

impl Display for OrFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.filters.iter().map(|f| f.to_string()).collect();
        write!(f, "({})", parts.join(" || "))
    }
}

impl FilterProvider for OrFilter {
    fn apply(&self, entry: &Document) -> RepoResult<bool> {
        for filter in &self.filters {
            if filter.apply(entry)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct NotFilter {
    filter: Filter,
}

impl NotFilter {
    pub(crate) fn new(filter: Filter) -> Self {
        NotFilter { filter }
    }
}

impl Display for NotFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "!{}", self.filter)
    }
}

impl FilterProvider for NotFilter {
    fn apply(&self, entry: &Document) -> RepoResult<bool> {
        Ok(!self.filter.apply(entry)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
