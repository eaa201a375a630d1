use crate::common::{Document, DOC_ID};
use crate::errors::{ErrorKind, RepoError, RepoResult};

/// Field selection applied to each document a find returns.
///
/// An inclusion projection keeps only the listed fields plus `_id`; an exclusion projection
/// drops the listed fields. The two cannot be mixed, except that `_id` may be excluded from
/// an inclusion projection. Dotted paths select fields of embedded documents.
///
/// ```rust,ignore
/// let summary = include_fields(&["name", "address.city"]).exclude("_id");
/// let cursor = repo.query(all(), FindOptions::new().project(summary))?;
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Projection {
    included: Vec<String>,
    excluded: Vec<String>,
}

pub fn include_fields(fields: &[&str]) -> Projection {
    fields.iter().fold(Projection::new(), |p, field| p.include(field))
}

pub fn exclude_fields(fields: &[&str]) -> Projection {
    fields.iter().fold(Projection::new(), |p, field| p.exclude(field))
}

impl Projection {
    pub fn new() -> Projection {
        Projection::default()
    }

    pub fn include(mut self, field_name: &str) -> Projection {
        self.included.push(field_name.to_string());
        self
    }

    pub fn exclude(mut self, field_name: &str) -> Projection {
        self.excluded.push(field_name.to_string());
        self
    }

    pub fn included_fields(&self) -> &[String] {
        &self.included
    }

    pub fn excluded_fields(&self) -> &[String] {
        &self.excluded
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty() && self.excluded.is_empty()
    }

    /// Rejects projections that mix inclusion and exclusion with `InvalidQuery`.
    pub fn validate(&self) -> RepoResult<()> {
        if !self.included.is_empty() && self.excluded.iter().any(|f| f != DOC_ID) {
            log::error!(
                "Projection mixes included fields {:?} with excluded fields {:?}",
                self.included,
                self.excluded
            );
            return Err(RepoError::new(
                "A projection cannot both include and exclude fields other than '_id'",
                ErrorKind::InvalidQuery,
            ));
        }
        Ok(())
    }

    pub fn apply(&self, document: &Document) -> RepoResult<Document> {
        self.validate()?;

        let mut projected = if self.included.is_empty() {
            document.clone()
        } else {
            let mut kept = Document::new();
            if let Some(id) = document.get(DOC_ID) {
                kept.put(DOC_ID, id.clone())?;
            }
            for field in &self.included {
                if let Some(value) = document.get(field) {
                    kept.put(field, value.clone())?;
                }
            }
            kept
        };

        for field in &self.excluded {
            projected.remove(field);
        }
        Ok(projected)
    }
}
