//! In-memory paged file with I/O accounting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::common::{Error, FileId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PagedFile;

/// A [`PagedFile`] kept entirely in memory.
///
/// Follows the same error contract as [`DiskFile`](crate::storage::DiskFile)
/// and counts every call, which makes buffer pool behaviour observable:
/// a cache hit leaves `reads()` untouched, a dirty eviction bumps `writes()`.
///
/// # Example
/// ```
/// use clockpool::storage::{MemFile, PagedFile};
///
/// let file = MemFile::new("scratch");
/// let (pid, _) = file.allocate_page().unwrap();
/// file.read_page(pid).unwrap();
/// assert_eq!(file.reads(), 1);
/// ```
pub struct MemFile {
    file_id: FileId,
    name: String,
    pages: Mutex<MemPages>,
    fail_writes: AtomicBool,
    reads: AtomicU64,
    writes: AtomicU64,
    allocations: AtomicU64,
    deletes: AtomicU64,
}

#[derive(Default)]
struct MemPages {
    pages: HashMap<PageId, Box<Page>>,
    next_page: u32,
}

impl MemFile {
    /// Create an empty in-memory file.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            file_id: FileId::next(),
            name: name.into(),
            pages: Mutex::new(MemPages::default()),
            fail_writes: AtomicBool::new(false),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            allocations: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        }
    }

    /// Make every subsequent `write_page` fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Copy of a page's persisted content, bypassing the counters.
    pub fn persisted(&self, page_id: PageId) -> Option<Page> {
        let pages = self.pages.lock();
        pages.pages.get(&page_id).map(|stored| {
            let mut page = Page::new();
            page.copy_from(stored);
            page
        })
    }

    /// Number of live pages.
    pub fn page_count(&self) -> usize {
        self.pages.lock().pages.len()
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn allocations(&self) -> u64 {
        self.allocations.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    fn not_found(&self, page_id: PageId) -> Error {
        Error::PageNotFound {
            file: self.file_id,
            page: page_id,
        }
    }
}

impl PagedFile for MemFile {
    fn file_id(&self) -> FileId {
        self.file_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_page(&self, page_id: PageId) -> Result<Page> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let pages = self.pages.lock();
        let stored = pages
            .pages
            .get(&page_id)
            .ok_or_else(|| self.not_found(page_id))?;

        let mut page = Page::new();
        page.copy_from(stored);
        Ok(page)
    }

    fn write_page(&self, page_id: PageId, page: &Page) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(std::io::Error::other(format!("{} is not writable", self.name)).into());
        }

        let mut pages = self.pages.lock();
        let stored = pages
            .pages
            .get_mut(&page_id)
            .ok_or_else(|| self.not_found(page_id))?;
        stored.copy_from(page);
        Ok(())
    }

    fn allocate_page(&self) -> Result<(PageId, Page)> {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        let mut pages = self.pages.lock();
        let page_id = PageId::new(pages.next_page);
        pages.next_page += 1;
        pages.pages.insert(page_id, Box::new(Page::new()));
        Ok((page_id, Page::new()))
    }

    fn delete_page(&self, page_id: PageId) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        let mut pages = self.pages.lock();
        pages
            .pages
            .remove(&page_id)
            .map(|_| ())
            .ok_or_else(|| self.not_found(page_id))
    }
}
