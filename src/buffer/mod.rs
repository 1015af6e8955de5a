//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between storage code and
//! paged files. It manages a fixed pool of frames, each holding one page.
//!
//! # Components
//! - [`BufferPoolManager`] - The page cache and its pin/unpin protocol
//! - [`descriptor`] - Per-frame bookkeeping (pin count, dirty/ref bits)
//! - [`page_table`] - Resident page → frame mapping
//! - [`replacer`] - CLOCK victim selection
//! - [`Frame`] / [`FrameRef`] - Frame store slots and handles into them
//! - [`PageReadGuard`] / [`PageWriteGuard`] - RAII guards for page access
//! - [`BufferPoolStats`] - Hit, miss and I/O counters

mod buffer_pool_manager;
pub mod descriptor;
mod frame;
mod page_guard;
pub mod page_table;
pub mod replacer;
mod stats;

pub use buffer_pool_manager::{BufferPoolManager, PoolDump};
pub use descriptor::DescriptorSnapshot;
pub use frame::{Frame, FrameRef};
pub use page_guard::{PageReadGuard, PageWriteGuard};
pub use stats::{BufferPoolStats, StatCounter, StatsSnapshot};
