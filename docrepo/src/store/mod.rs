//! Store driver seam.
//!
//! A driver is reached through four layers, each a thin cloneable wrapper over a
//! provider trait object:
//!
//! - [`StoreDriver`] parses nothing itself; it connects a [`StoreUrl`] to a [`StoreClient`]
//! - [`StoreClient`] opens a [`StoreDatabase`]
//! - [`StoreDatabase`] opens a [`DocumentCollection`]
//! - [`DocumentCollection`] exposes the sync and async CRUD primitives
//!
//! The [`memory`] module provides a complete in-memory driver.

mod driver;
mod find_options;
pub mod memory;
mod projection;
mod store_url;
mod write_result;

pub use driver::*;
pub use find_options::*;
pub use projection::*;
pub use store_url::*;
pub use write_result::*;
