//! Disk-backed paged file.
//!
//! [`DiskFile`] handles direct file operations for one database file:
//! - Reading and writing pages
//! - Allocating and deleting pages

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::trace;
use parking_lot::Mutex;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, FileId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PagedFile;

/// A paged file stored as one OS file.
///
/// # File Layout
/// Pages are laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`.
///
/// # Deleted Pages
/// Deleted page ids are kept on an in-memory free list and handed out
/// again by [`allocate_page`](PagedFile::allocate_page). The free list is
/// not persisted: after reopening, every page within the file length is
/// considered allocated.
///
/// # Durability
/// All writes are followed by `fsync()`.
pub struct DiskFile {
    file_id: FileId,
    name: String,
    inner: Mutex<DiskFileInner>,
}

struct DiskFileInner {
    file: File,
    /// Number of page slots in the file, deleted ones included.
    page_count: u32,
    /// Deleted page slots available for reuse.
    free: BTreeSet<PageId>,
}

impl DiskFile {
    /// Create a new paged file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        Ok(Self::from_parts(path.as_ref(), file, 0))
    }

    /// Open an existing paged file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        // Calculate page count from file size
        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self::from_parts(path.as_ref(), file, page_count))
    }

    /// Open an existing paged file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    fn from_parts(path: &Path, file: File, page_count: u32) -> Self {
        Self {
            file_id: FileId::next(),
            name: path.display().to_string(),
            inner: Mutex::new(DiskFileInner {
                file,
                page_count,
                free: BTreeSet::new(),
            }),
        }
    }

    /// Number of live (allocated, not deleted) pages.
    pub fn page_count(&self) -> u32 {
        let inner = self.inner.lock();
        inner.page_count - inner.free.len() as u32
    }

    /// Total size of the file in bytes.
    pub fn file_size(&self) -> u64 {
        self.inner.lock().page_count as u64 * PAGE_SIZE as u64
    }
}

impl DiskFileInner {
    fn is_live(&self, page_id: PageId) -> bool {
        page_id.0 < self.page_count && !self.free.contains(&page_id)
    }

    fn write_at(&mut self, page_id: PageId, data: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(page_id.offset()))?;
        self.file.write_all(data)?;
        self.file.sync_all()?; // fsync for durability
        Ok(())
    }
}

impl PagedFile for DiskFile {
    fn file_id(&self) -> FileId {
        self.file_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_page(&self, page_id: PageId) -> Result<Page> {
        let mut inner = self.inner.lock();
        if !inner.is_live(page_id) {
            return Err(Error::PageNotFound {
                file: self.file_id,
                page: page_id,
            });
        }

        trace!("reading {} from {}", page_id, self.name);
        inner.file.seek(SeekFrom::Start(page_id.offset()))?;

        let mut page = Page::new();
        inner.file.read_exact(page.as_mut_slice())?;

        Ok(page)
    }

    fn write_page(&self, page_id: PageId, page: &Page) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.is_live(page_id) {
            return Err(Error::PageNotFound {
                file: self.file_id,
                page: page_id,
            });
        }

        trace!("writing {} to {}", page_id, self.name);
        inner.write_at(page_id, page.as_slice())
    }

    fn allocate_page(&self) -> Result<(PageId, Page)> {
        let mut inner = self.inner.lock();
        let page = Page::new();

        // Reuse the lowest deleted slot before growing the file
        let reusable = inner.free.first().copied();
        if let Some(page_id) = reusable {
            inner.write_at(page_id, page.as_slice())?;
            inner.free.remove(&page_id);
            trace!("reallocated {} in {}", page_id, self.name);
            return Ok((page_id, page));
        }

        let page_id = PageId::new(inner.page_count);
        inner.write_at(page_id, page.as_slice())?;
        inner.page_count += 1;

        trace!("allocated {} in {}", page_id, self.name);
        Ok((page_id, page))
    }

    fn delete_page(&self, page_id: PageId) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.is_live(page_id) {
            return Err(Error::PageNotFound {
                file: self.file_id,
                page: page_id,
            });
        }

        trace!("deleting {} from {}", page_id, self.name);
        inner.free.insert(page_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let df = DiskFile::create(&path).unwrap();
        assert_eq!(df.page_count(), 0);
        assert_eq!(df.file_size(), 0);
        assert!(df.name().ends_with("test.db"));
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        DiskFile::create(&path).unwrap();
        assert!(DiskFile::create(&path).is_err());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        assert!(DiskFile::open(dir.path().join("nonexistent.db")).is_err());
    }

    #[test]
    fn test_each_open_gets_a_new_file_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let a = DiskFile::create(&path).unwrap();
        let b = DiskFile::open(&path).unwrap();
        assert_ne!(a.file_id(), b.file_id());
    }

    #[test]
    fn test_allocate_write_read() {
        let dir = tempdir().unwrap();
        let df = DiskFile::create(dir.path().join("test.db")).unwrap();

        let (page_id, fresh) = df.allocate_page().unwrap();
        assert_eq!(page_id, PageId::new(0));
        assert!(fresh.as_slice().iter().all(|&b| b == 0));

        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xAB;
        page.as_mut_slice()[4095] = 0xEF;
        df.write_page(page_id, &page).unwrap();

        let read = df.read_page(page_id).unwrap();
        assert_eq!(read.as_slice()[0], 0xAB);
        assert_eq!(read.as_slice()[4095], 0xEF);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let df = DiskFile::create(&path).unwrap();
            for i in 0..3u8 {
                let (pid, mut page) = df.allocate_page().unwrap();
                page.as_mut_slice()[0] = i + 1;
                df.write_page(pid, &page).unwrap();
            }
        }

        let df = DiskFile::open_or_create(&path).unwrap();
        assert_eq!(df.page_count(), 3);
        for i in 0..3u32 {
            let page = df.read_page(PageId::new(i)).unwrap();
            assert_eq!(page.as_slice()[0], i as u8 + 1);
        }
    }

    #[test]
    fn test_missing_pages_are_not_found() {
        let dir = tempdir().unwrap();
        let df = DiskFile::create(dir.path().join("test.db")).unwrap();
        df.allocate_page().unwrap();

        let missing = PageId::new(1);
        assert!(matches!(df.read_page(missing), Err(Error::PageNotFound { .. })));
        assert!(matches!(
            df.write_page(missing, &Page::new()),
            Err(Error::PageNotFound { .. })
        ));
        assert!(matches!(df.delete_page(missing), Err(Error::PageNotFound { .. })));
    }

    #[test]
    fn test_delete_then_reallocate_reuses_slot() {
        let dir = tempdir().unwrap();
        let df = DiskFile::create(dir.path().join("test.db")).unwrap();

        for _ in 0..3 {
            df.allocate_page().unwrap();
        }

        let mut page = Page::new();
        page.as_mut_slice()[7] = 0x77;
        df.write_page(PageId::new(1), &page).unwrap();

        df.delete_page(PageId::new(1)).unwrap();
        assert_eq!(df.page_count(), 2);
        assert!(df.read_page(PageId::new(1)).is_err());
        assert!(df.delete_page(PageId::new(1)).is_err());

        // Slot 1 comes back zeroed, and the file does not grow
        let (pid, fresh) = df.allocate_page().unwrap();
        assert_eq!(pid, PageId::new(1));
        assert_eq!(fresh.as_slice()[7], 0);
        assert_eq!(df.read_page(pid).unwrap().as_slice()[7], 0);
        assert_eq!(df.file_size(), 3 * PAGE_SIZE as u64);
    }
}
