//! The paged-file contract the buffer pool reads from and writes back to.

use std::sync::Arc;

use crate::common::{FileId, PageId, Result};
use crate::storage::page::Page;

/// Shared handle to a paged file.
///
/// Frame descriptors keep one of these so a dirty victim can be written
/// back to its owning file without the caller being involved.
pub type FileRef = Arc<dyn PagedFile>;

/// Durable storage of fixed-size pages, addressed by [`PageId`].
///
/// All methods take `&self`: implementations synchronize internally, since
/// the buffer pool and its callers share files through [`FileRef`].
pub trait PagedFile: Send + Sync {
    /// Stable identity of this file, used as half of the page-table key.
    fn file_id(&self) -> FileId;

    /// Human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Read a page.
    ///
    /// # Errors
    /// `Error::PageNotFound` if the page is not allocated in this file.
    fn read_page(&self, page_id: PageId) -> Result<Page>;

    /// Overwrite a page's persisted content.
    ///
    /// # Errors
    /// `Error::PageNotFound` if the page is not allocated, or an I/O error.
    fn write_page(&self, page_id: PageId, page: &Page) -> Result<()>;

    /// Reserve a new page and return its id with its initial (zeroed) content.
    fn allocate_page(&self) -> Result<(PageId, Page)>;

    /// Release a page slot.
    ///
    /// # Errors
    /// `Error::PageNotFound` if the page is not allocated.
    fn delete_page(&self, page_id: PageId) -> Result<()>;
}
