//! Typed repositories.
//!
//! A [`Repository`] binds an entity type to one store collection and exposes the create,
//! retrieve, update, delete and utility operations over it, each in a blocking and an
//! `_async` form. Construction resolves names (see [`crate::entity::ResolvedNames`]),
//! then opens the collection through a [`crate::store::StoreDriver`].

mod async_ops;
mod builder;
mod connection;
mod cursor;
mod paging;
mod repository;

pub use builder::*;
pub use connection::*;
pub use cursor::*;
pub use paging::*;
pub use repository::*;
