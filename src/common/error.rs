//! Error types for clockpool.

use thiserror::Error;

use crate::common::{FileId, FrameId, PageId};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in clockpool.
///
/// A page-table miss is deliberately absent: lookups return `Option`, and
/// the fetch path turns a miss into a fill instead of an error.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from a paged file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The paged file has no such page.
    #[error("{page} not found in {file}")]
    PageNotFound { file: FileId, page: PageId },

    /// Victim selection went around the clock and every frame was pinned.
    ///
    /// Callers must unpin pages (or grow the pool) before retrying.
    #[error("buffer pool exhausted: all {frames} frames are pinned")]
    PoolExhausted { frames: usize },

    /// Attempted to unpin a page whose pin count is already zero.
    ///
    /// This indicates a bug - unpinning should match pinning.
    #[error("{page} of {file} is not pinned ({frame})")]
    PageNotPinned {
        file: FileId,
        page: PageId,
        frame: FrameId,
    },

    /// A file flush ran into a page that is still pinned.
    #[error("{page} of {file} is pinned ({frame})")]
    PagePinned {
        file: FileId,
        page: PageId,
        frame: FrameId,
    },

    /// A descriptor tagged to a file is invalid or holds the sentinel page.
    ///
    /// The page table and the descriptor table disagree; never expected.
    #[error("bad buffer in {frame}: dirty={dirty} valid={valid} ref_bit={ref_bit}")]
    BadBuffer {
        frame: FrameId,
        dirty: bool,
        valid: bool,
        ref_bit: bool,
    },

    /// The page table already maps this page to a frame.
    #[error("{page} of {file} is already present in the page table")]
    PageAlreadyPresent { file: FileId, page: PageId },

    /// A buffer pool configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
