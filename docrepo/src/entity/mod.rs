//! Entity contract, identifiers, and naming resolution.

mod content_entity;
mod entity;
mod metadata;
mod naming;
mod object_id;

pub use content_entity::*;
pub use entity::*;
pub use metadata::*;
pub use naming::*;
pub use object_id::*;
