//! Storage layer - the paged files the buffer pool caches.
//!
//! This module handles persistent storage:
//! - [`PagedFile`] - The page-level read/write/allocate/delete contract
//! - [`DiskFile`] - A paged file backed by one OS file
//! - [`MemFile`] - An in-memory paged file that counts its I/O
//! - [`page`] - The raw page type

mod disk_file;
mod mem_file;
pub mod page;
mod paged_file;

pub use disk_file::DiskFile;
pub use mem_file::MemFile;
pub use paged_file::{FileRef, PagedFile};
