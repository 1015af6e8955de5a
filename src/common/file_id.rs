//! File identifier type.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Source of process-unique file ids.
static NEXT_FILE_ID: AtomicU32 = AtomicU32::new(1);

/// Identifies an open paged file.
///
/// Together with a [`PageId`](crate::PageId) it forms the key of the
/// buffer pool's page table, and `flush_file` matches frames by it.
/// Ids are handed out once per opened file and never reused within a
/// process, so two handles to the same path are still distinct files.
///
/// # Example
/// ```
/// use clockpool::FileId;
///
/// let a = FileId::next();
/// let b = FileId::next();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a FileId from a raw value.
    #[inline]
    pub fn new(id: u32) -> Self {
        FileId(id)
    }

    /// Allocate a fresh, process-unique FileId.
    pub fn next() -> Self {
        FileId(NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_next_is_unique() {
        let ids: Vec<FileId> = (0..100).map(|_| FileId::next()).collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_file_id_display() {
        assert_eq!(format!("{}", FileId::new(9)), "File(9)");
    }
}
