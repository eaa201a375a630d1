use crate::common::SortOrder;
use crate::store::Projection;

/// Sort, skip and limit applied to a find operation, in that order, then the projection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub(crate) sort_by: Vec<(String, SortOrder)>,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
    pub(crate) projection: Option<Projection>,
}

pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions::new().skip(skip)
}

pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions::new().limit(limit)
}

pub fn project_by(projection: Projection) -> FindOptions {
    FindOptions::new().project(projection)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    pub fn skip(mut self, skip: u64) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Adds a sort key. Earlier keys take precedence over later ones.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        self.sort_by.push((field_name.to_string(), sort_order));
        self
    }

    pub fn sort_fields(&self) -> &[(String, SortOrder)] {
        &self.sort_by
    }

    pub fn get_skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn get_limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn project(mut self, projection: Projection) -> FindOptions {
        self.projection = Some(projection);
        self
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }
}
