//! Page type.
//!
//! A [`Page`] is the raw 4KB data container moved between paged files and
//! buffer pool frames. Its byte layout belongs to the callers.

#[allow(clippy::module_inception)]
mod page;

pub use page::Page;
