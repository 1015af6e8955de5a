//! Frame - a page slot in the buffer pool's frame store.
//!
//! A [`Frame`] holds the in-memory copy of one page. Which page that is,
//! and whether it may be evicted, lives in the frame's
//! [`FrameDescriptor`](super::descriptor::FrameDescriptor); the frame
//! itself is just the bytes.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FileId, FrameId, PageId};
use crate::storage::page::Page;

/// A slot in the frame store.
///
/// # Thread Safety
/// The page sits behind an `RwLock` so pinned pages can be read and
/// written without taking the pool lock. The pool only takes a frame's
/// lock while filling, writing back or evicting it, which it does for
/// unpinned frames.
pub struct Frame {
    page: RwLock<Page>,
}

impl Frame {
    /// Create a new frame holding a zeroed page.
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new()),
        }
    }

    /// Acquire read lock on the page.
    #[inline]
    pub fn page(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Acquire write lock on the page.
    #[inline]
    pub fn page_mut(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    /// Replace the frame's content with `page`.
    pub fn load(&self, page: &Page) {
        self.page.write().copy_from(page);
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

/// A borrowed handle to the frame holding a pinned page.
///
/// Returned by [`fetch_page`] and [`alloc_page`]. It is meaningful until
/// the matching [`unpin_page`]: once the pin count drops to zero the frame
/// may be handed to another page, and the handle would then see that
/// page's bytes. Do not keep a handle (or a lock taken through it) past
/// the unpin.
///
/// [`fetch_page`]: super::BufferPoolManager::fetch_page
/// [`alloc_page`]: super::BufferPoolManager::alloc_page
/// [`unpin_page`]: super::BufferPoolManager::unpin_page
#[derive(Clone, Copy)]
pub struct FrameRef<'a> {
    frame: &'a Frame,
    frame_id: FrameId,
    file_id: FileId,
    page_id: PageId,
    generation: u64,
}

impl<'a> FrameRef<'a> {
    pub(crate) fn new(
        frame: &'a Frame,
        frame_id: FrameId,
        file_id: FileId,
        page_id: PageId,
        generation: u64,
    ) -> Self {
        Self {
            frame,
            frame_id,
            file_id,
            page_id,
            generation,
        }
    }

    /// Shared access to the page bytes.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'a, Page> {
        self.frame.page()
    }

    /// Exclusive access to the page bytes.
    ///
    /// Writing does not mark the frame dirty; pass `dirty = true` to
    /// `unpin_page` for that.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'a, Page> {
        self.frame.page_mut()
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    #[inline]
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Occupancy of the frame this handle was issued for.
    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::fmt::Debug for FrameRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRef")
            .field("frame_id", &self.frame_id)
            .field("file_id", &self.file_id)
            .field("page_id", &self.page_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_new_is_zeroed() {
        let frame = Frame::new();
        assert!(frame.page().as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_frame_load() {
        let frame = Frame::new();
        frame.page_mut().as_mut_slice()[10] = 0xFF;

        let mut incoming = Page::new();
        incoming.as_mut_slice()[0] = 0xAB;
        frame.load(&incoming);

        let page = frame.page();
        assert_eq!(page.as_slice()[0], 0xAB);
        assert_eq!(page.as_slice()[10], 0);
    }

    #[test]
    fn test_frame_ref_sees_frame_content() {
        let frame = Frame::new();
        let handle = FrameRef::new(&frame, FrameId::new(0), FileId::new(1), PageId::new(2), 0);

        handle.write().as_mut_slice()[5] = 0x55;
        assert_eq!(frame.page().as_slice()[5], 0x55);
        assert_eq!(handle.read().as_slice()[5], 0x55);
        assert_eq!(handle.page_id(), PageId::new(2));
    }

    #[test]
    fn test_frame_concurrent_reads() {
        use std::sync::Arc;
        use std::thread;

        let frame = Arc::new(Frame::new());
        frame.page_mut().as_mut_slice()[0] = 0x42;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let frame = Arc::clone(&frame);
                thread::spawn(move || {
                    assert_eq!(frame.page().as_slice()[0], 0x42);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
