//! Common types and utilities shared across clockpool.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`BufferPoolConfig`](config::BufferPoolConfig)
//! - Error types
//! - Identifiers (FileId, PageId, FrameId)

pub mod config;
pub mod error;
mod file_id;
mod frame_id;
mod page_id;

pub use error::{Error, Result};
pub use file_id::FileId;
pub use frame_id::FrameId;
pub use page_id::PageId;
