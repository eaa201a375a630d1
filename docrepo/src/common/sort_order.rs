/// Specifies the direction for sorting documents.
///
/// # Variants
/// - `Ascending`: Sort from smallest to largest value (A to Z, 0 to 9, oldest to newest)
/// - `Descending`: Sort from largest to smallest value (Z to A, 9 to 0, newest to oldest)
///
/// # Usage
/// Used with `order_by()` when building find options:
/// ```text
/// let options = order_by("age", SortOrder::Ascending);
/// let cursor = collection.find(&filter, &options)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}

impl SortOrder {
    /// Maps the repository-level `is_descending` flag onto a sort order.
    pub fn from_descending(is_descending: bool) -> SortOrder {
        if is_descending {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    pub fn reverse(self) -> SortOrder {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}
