//! Query filters for selecting documents.
//!
//! Filters are built with a fluent API and combined with logical operators:
//!
//! ```rust,ignore
//! use docrepo::filter::{field, all, by_id};
//!
//! let adults = field("age").gte(18);
//! let oslo_adults = adults.and(field("address.city").eq("Oslo"));
//! let by_mail = field("email").regex(r".*@example\.com$")?;
//! ```
//!
//! # Supported Operators
//!
//! - **Equality**: `eq`, `ne`
//! - **Comparison**: `gt`, `gte`, `lt`, `lte`
//! - **Membership**: `in_array`, `not_in`, `exists`
//! - **Pattern**: `regex`
//! - **Logical**: `and`, `or`, `not`
//! - **Special**: `all` (match all), `by_id` (match by identifier)

mod filter;
mod fluent;

mod basic_filters;
mod logical_filters;

pub use basic_filters::*;
pub use filter::*;
pub use fluent::*;
pub use logical_filters::*;
