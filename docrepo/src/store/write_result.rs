/// Result of a single-document insert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertOneResult {
    acknowledged: bool,
    inserted_id: String,
}

impl InsertOneResult {
    pub fn new(acknowledged: bool, inserted_id: String) -> Self {
        InsertOneResult { acknowledged, inserted_id }
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub fn inserted_id(&self) -> &str {
        &self.inserted_id
    }
}

/// Result of an ordered multi-document insert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertManyResult {
    acknowledged: bool,
    inserted_ids: Vec<String>,
}

impl InsertManyResult {
    pub fn new(acknowledged: bool, inserted_ids: Vec<String>) -> Self {
        InsertManyResult { acknowledged, inserted_ids }
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub fn inserted_ids(&self) -> &[String] {
        &self.inserted_ids
    }
}

/// Result of an update or replace.
///
/// For unacknowledged writes the counts are unknown and reported as zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateResult {
    acknowledged: bool,
    matched_count: u64,
    modified_count: u64,
}

impl UpdateResult {
    pub fn new(acknowledged: bool, matched_count: u64, modified_count: u64) -> Self {
        UpdateResult {
            acknowledged,
            matched_count,
            modified_count,
        }
    }

    pub fn unacknowledged() -> Self {
        UpdateResult::new(false, 0, 0)
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub fn matched_count(&self) -> u64 {
        self.matched_count
    }

    pub fn modified_count(&self) -> u64 {
        self.modified_count
    }
}

/// Result of a delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteResult {
    acknowledged: bool,
    deleted_count: u64,
}

impl DeleteResult {
    pub fn new(acknowledged: bool, deleted_count: u64) -> Self {
        DeleteResult {
            acknowledged,
            deleted_count,
        }
    }

    pub fn unacknowledged() -> Self {
        DeleteResult::new(false, 0)
    }

    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    pub fn deleted_count(&self) -> u64 {
        self.deleted_count
    }
}
