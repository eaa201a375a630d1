//! Update definitions applied to matched documents.

mod update_definition;

pub use update_definition::*;
