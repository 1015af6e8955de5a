//! Page - the fundamental 4KB unit of storage.
//!
//! A [`Page`] is a raw 4KB byte array that serves as the unit of I/O
//! between paged files and memory. Pages are held in [`Frame`]s within
//! the buffer pool.
//!
//! [`Frame`]: crate::buffer::Frame

use crate::common::config::PAGE_SIZE;

/// A page of data (4KB, 4KB-aligned).
///
/// The buffer pool never interprets the bytes; index and heap-file code
/// above it owns the layout.
///
/// # Clone Implementation
/// `Page` does NOT implement `Clone` outside tests: copying 4KB should be
/// explicit, so use [`Page::copy_from`].
///
/// # Example
/// ```
/// use clockpool::storage::page::Page;
///
/// let mut page = Page::new();
/// page.as_mut_slice()[0] = 0xFF;
///
/// let mut copy = Page::new();
/// copy.copy_from(&page);
/// assert_eq!(copy.as_slice()[0], 0xFF);
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrite this page with the contents of `other`.
    #[inline]
    pub fn copy_from(&mut self, other: &Page) {
        self.data.copy_from_slice(&other.data);
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Get the size of a page.
    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.data.iter().filter(|&&b| b != 0).count();
        f.debug_struct("Page").field("nonzero_bytes", &used).finish()
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut new_page = Page::new();
        new_page.copy_from(self);
        new_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_and_alignment() {
        assert_eq!(std::mem::size_of::<Page>(), PAGE_SIZE);
        assert_eq!(std::mem::align_of::<Page>(), 4096);
    }

    #[test]
    fn test_page_copy_from() {
        let mut src = Page::new();
        src.as_mut_slice()[0] = 0xAB;
        src.as_mut_slice()[4095] = 0xCD;

        let mut dst = Page::new();
        dst.as_mut_slice()[100] = 0x11;
        dst.copy_from(&src);

        assert_eq!(dst.as_slice()[0], 0xAB);
        assert_eq!(dst.as_slice()[100], 0);
        assert_eq!(dst.as_slice()[4095], 0xCD);
    }

    #[test]
    fn test_page_reset() {
        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xFF;
        page.as_mut_slice()[100] = 0xAB;

        page.reset();

        assert!(page.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_page_debug_counts_nonzero() {
        let mut page = Page::new();
        page.as_mut_slice()[1] = 1;
        page.as_mut_slice()[2] = 2;
        assert_eq!(format!("{:?}", page), "Page { nonzero_bytes: 2 }");
    }
}
