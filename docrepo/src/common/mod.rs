//! Common types shared by the store seam, the filters and the repository.

mod constants;
mod document;
mod sort_order;
mod time;
mod value;

pub use constants::*;
pub use document::*;
pub use sort_order::*;
pub use time::*;
pub use value::*;
