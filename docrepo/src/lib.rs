//! # docrepo - Typed repositories over document stores
//!
//! `docrepo` gives an entity type a complete create/read/update/delete surface over a
//! document-oriented store without writing store-specific query code per entity.
//!
//! ## Key Features
//!
//! - **Name resolution**: collection and connection names are derived from the entity
//!   type, its declarations, and an optional construction-time override
//! - **Connection resolution**: connection strings come from an injected
//!   [`config::ConfigurationSource`] or are passed explicitly
//! - **Transient-failure retries**: every store call goes through a [`retry::RetryPolicy`]
//!   that retries network and socket failures a bounded number of times
//! - **Sync and async**: every repository operation has an `_async` counterpart
//! - **Pluggable drivers**: stores plug in through the [`store::StoreDriver`] seam; an
//!   in-memory driver ships with the crate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docrepo::config::ConnectionStrings;
//! use docrepo::filter::field;
//! use docrepo::repository::Repository;
//! use docrepo::store::memory::InMemoryDriver;
//!
//! let config = ConnectionStrings::new().with("person", "memory://localhost/people");
//! let repo: Repository<Person> = Repository::new(&InMemoryDriver::new(), &config)?;
//!
//! repo.insert(&Person::new("Alice", 31))?;
//! let adults = repo.find(field("age").gte(18))?.collect::<Result<Vec<_>, _>>()?;
//! ```
//!
//! ## Module Organization
//!
//! - [`common`] - Documents, values, constants and sort order
//! - [`config`] - Configuration sources for connection strings
//! - [`entity`] - Entity contract, identifiers and naming resolution
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Query filters
//! - [`repository`] - The typed repository and its builder
//! - [`retry`] - Retry policy for transient failures
//! - [`store`] - Driver seam and the in-memory driver
//! - [`update`] - Update definitions

use crate::entity::ObjectIdGenerator;
use std::sync::LazyLock;

pub mod common;
pub mod config;
pub mod entity;
pub mod errors;
pub mod filter;
pub mod repository;
pub mod retry;
pub mod store;
pub mod update;

#[doc(hidden)]
pub use serde_json as __json;

pub(crate) static ID_GENERATOR: LazyLock<ObjectIdGenerator> = LazyLock::new(ObjectIdGenerator::new);
