//! clockpool - a fixed-capacity buffer pool manager with CLOCK replacement.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            Callers (index / heap-file code, not here)           │
//! │        fetch · alloc · unpin(dirty) · flush_file · dispose      │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 ↓
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Buffer Pool (buffer/)                        │
//! │   PageTable ──▶ DescriptorTable ◀── ClockReplacer (hand)        │
//! │                       │ FrameId                                 │
//! │                       ▼                                         │
//! │              Frame store: Vec<Frame>                            │
//! └─────────────────────────────────────────────────────────────────┘
//!                                 ↓
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Storage (storage/)                           │
//! │      PagedFile trait  ·  DiskFile  ·  MemFile  ·  Page          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (FileId, PageId, FrameId, Error, config)
//! - [`buffer`] - Buffer pool management and the CLOCK replacer
//! - [`storage`] - Paged files and the page type
//!
//! # Quick Start
//! ```no_run
//! use std::sync::Arc;
//! use clockpool::{BufferPoolManager, DiskFile, FileRef};
//!
//! let file: FileRef = Arc::new(DiskFile::open_or_create("heap.db").unwrap());
//! let bpm = BufferPoolManager::new(64);
//!
//! let (page_id, frame) = bpm.alloc_page(&file).unwrap();
//! frame.write().as_mut_slice()[0] = 1;
//! bpm.unpin_page(&file, page_id, true).unwrap();
//!
//! bpm.flush_file(&file).unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{BufferPoolConfig, PAGE_SIZE};
pub use common::{Error, FileId, FrameId, PageId, Result};

pub use buffer::{
    BufferPoolManager, BufferPoolStats, FrameRef, PageReadGuard, PageWriteGuard, PoolDump,
    StatCounter, StatsSnapshot,
};
pub use storage::page::Page;
pub use storage::{DiskFile, FileRef, MemFile, PagedFile};
