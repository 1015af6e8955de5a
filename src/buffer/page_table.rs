//! Page table - maps resident pages to the frames holding them.

use std::collections::HashMap;

use crate::common::{Error, FileId, FrameId, PageId, Result};

/// Maps `(FileId, PageId)` to the [`FrameId`] holding that page.
///
/// Holds at most one entry per page. The buffer pool keeps it in lockstep
/// with the descriptor table: a key is present iff the descriptor of its
/// frame is valid and bound to that key.
#[derive(Debug, Default)]
pub struct PageTable {
    entries: HashMap<(FileId, PageId), FrameId>,
}

impl PageTable {
    /// Create a table pre-sized for `buckets` entries.
    ///
    /// See [`page_table_buckets`](crate::common::config::page_table_buckets).
    pub fn with_buckets(buckets: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(buckets),
        }
    }

    /// Map a page to a frame.
    ///
    /// # Errors
    /// `Error::PageAlreadyPresent` if the page is already mapped; the
    /// existing entry is left untouched.
    pub fn insert(&mut self, file: FileId, page: PageId, frame_id: FrameId) -> Result<()> {
        match self.entries.entry((file, page)) {
            std::collections::hash_map::Entry::Occupied(_) => {
                Err(Error::PageAlreadyPresent { file, page })
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(frame_id);
                Ok(())
            }
        }
    }

    /// Find the frame holding a page. `None` means the page is not resident.
    #[inline]
    pub fn lookup(&self, file: FileId, page: PageId) -> Option<FrameId> {
        self.entries.get(&(file, page)).copied()
    }

    /// Remove a page's entry, returning the frame it mapped to.
    #[inline]
    pub fn remove(&mut self, file: FileId, page: PageId) -> Option<FrameId> {
        self.entries.remove(&(file, page))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (FileId, PageId, FrameId)> + '_ {
        self.entries.iter().map(|(&(f, p), &fid)| (f, p, fid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_lookup_remove() {
        let mut table = PageTable::with_buckets(13);
        let file = FileId::new(1);

        table.insert(file, PageId::new(4), FrameId::new(2)).unwrap();
        assert_eq!(table.lookup(file, PageId::new(4)), Some(FrameId::new(2)));
        assert_eq!(table.len(), 1);

        assert_eq!(table.remove(file, PageId::new(4)), Some(FrameId::new(2)));
        assert_eq!(table.lookup(file, PageId::new(4)), None);
        assert_eq!(table.remove(file, PageId::new(4)), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut table = PageTable::default();
        let file = FileId::new(1);

        table.insert(file, PageId::new(0), FrameId::new(0)).unwrap();
        let err = table.insert(file, PageId::new(0), FrameId::new(5));
        assert!(matches!(err, Err(Error::PageAlreadyPresent { .. })));

        // Original mapping survives
        assert_eq!(table.lookup(file, PageId::new(0)), Some(FrameId::new(0)));
    }

    #[test]
    fn test_same_page_number_in_different_files() {
        let mut table = PageTable::default();
        table.insert(FileId::new(1), PageId::new(0), FrameId::new(0)).unwrap();
        table.insert(FileId::new(2), PageId::new(0), FrameId::new(1)).unwrap();

        assert_eq!(table.lookup(FileId::new(1), PageId::new(0)), Some(FrameId::new(0)));
        assert_eq!(table.lookup(FileId::new(2), PageId::new(0)), Some(FrameId::new(1)));
    }
}
