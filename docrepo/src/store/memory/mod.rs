//! In-memory store driver.
//!
//! Implements the full driver seam over process memory, with store-side semantics:
//! server-assigned time for `current_date`, duplicate-key rejection on `_id`, ordered
//! bulk inserts, and acknowledgement flags honouring the `w` option of the URL.

mod collection;
mod driver;

pub use driver::*;
