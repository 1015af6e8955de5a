//! RAII guards for page access.
//!
//! These guards wrap the explicit pin/unpin protocol:
//! - [`PageReadGuard`] - Shared read access (multiple allowed)
//! - [`PageWriteGuard`] - Exclusive write access (unpins dirty)
//!
//! A guard holds the frame lock and one pin. On drop the lock is released
//! first, then the pin, so the pool lock is never waited on while a frame
//! lock is held.

use std::ops::{Deref, DerefMut};

use log::warn;
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use super::buffer_pool_manager::BufferPoolManager;
use super::frame::FrameRef;
use crate::common::{FrameId, PageId};
use crate::storage::page::Page;
use crate::storage::FileRef;

/// One pin on a page, released on drop.
///
/// The pin is tied to the frame occupancy it was taken on, not just to the
/// page id: a page disposed under a guard may come back with the same id
/// and new holders, and dropping the old guard must not release theirs.
struct Pin<'a> {
    bpm: &'a BufferPoolManager,
    file: FileRef,
    frame: FrameRef<'a>,
    dirty: bool,
}

impl Drop for Pin<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.bpm.unpin_frame(&self.frame, self.dirty) {
            warn!(
                "guard on {} of {} failed to unpin: {}",
                self.frame.page_id(),
                self.file.name(),
                e
            );
        }
    }
}

/// Guard for read-only page access.
///
/// Multiple `PageReadGuard`s can exist for the same page simultaneously.
/// The page is unpinned clean when the guard is dropped.
///
/// # Example
/// ```ignore
/// let guard = bpm.fetch_page_read(&file, page_id)?;
/// let data = guard.as_slice();  // Deref to &Page
/// // guard drops here, page unpinned
/// ```
pub struct PageReadGuard<'a> {
    // Field order is drop order: lock before pin
    lock: RwLockReadGuard<'a, Page>,
    pin: Pin<'a>,
}

impl<'a> PageReadGuard<'a> {
    /// Wrap a frame the pool has already pinned for us.
    pub(crate) fn new(bpm: &'a BufferPoolManager, file: FileRef, frame: FrameRef<'a>) -> Self {
        Self {
            lock: frame.read(),
            pin: Pin {
                bpm,
                file,
                frame,
                dirty: false,
            },
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.pin.frame.page_id()
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.pin.frame.frame_id()
    }
}

impl Deref for PageReadGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

/// Guard for exclusive write access to a page.
///
/// Only one `PageWriteGuard` can exist for a page at a time, and it
/// excludes readers. The page is unpinned dirty when the guard is
/// dropped, whether or not it was written to.
///
/// # Example
/// ```ignore
/// let mut guard = bpm.fetch_page_write(&file, page_id)?;
/// guard.as_mut_slice()[0] = 0xFF;  // DerefMut to &mut Page
/// // guard drops here, page marked dirty and unpinned
/// ```
pub struct PageWriteGuard<'a> {
    lock: RwLockWriteGuard<'a, Page>,
    pin: Pin<'a>,
}

impl<'a> PageWriteGuard<'a> {
    /// Wrap a frame the pool has already pinned for us.
    pub(crate) fn new(bpm: &'a BufferPoolManager, file: FileRef, frame: FrameRef<'a>) -> Self {
        Self {
            lock: frame.write(),
            pin: Pin {
                bpm,
                file,
                frame,
                dirty: true,
            },
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.pin.frame.page_id()
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.pin.frame.frame_id()
    }
}

impl Deref for PageWriteGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

impl DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        &mut self.lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemFile;
    use std::sync::Arc;

    fn setup() -> (BufferPoolManager, FileRef) {
        let file: FileRef = Arc::new(MemFile::new("guards"));
        (BufferPoolManager::new(4), file)
    }

    #[test]
    fn test_write_guard_unpins_dirty() {
        let (bpm, file) = setup();
        let pid = {
            let mut guard = bpm.new_page(&file).unwrap();
            guard.as_mut_slice()[0] = 0xAB;
            assert_eq!(bpm.pin_count(&file, guard.page_id()), Some(1));
            guard.page_id()
        };

        assert_eq!(bpm.pin_count(&file, pid), Some(0));
        let frame = bpm.dump().frames[0];
        assert!(frame.dirty);
    }

    #[test]
    fn test_read_guard_unpins_clean() {
        let (bpm, file) = setup();
        let (pid, _) = bpm.alloc_page(&file).unwrap();
        bpm.unpin_page(&file, pid, false).unwrap();

        {
            let a = bpm.fetch_page_read(&file, pid).unwrap();
            let b = bpm.fetch_page_read(&file, pid).unwrap();
            assert_eq!(a.frame_id(), b.frame_id());
            assert_eq!(bpm.pin_count(&file, pid), Some(2));
        }

        assert_eq!(bpm.pin_count(&file, pid), Some(0));
        assert!(!bpm.dump().frames[0].dirty);
    }

    #[test]
    fn test_guard_after_dispose_drops_quietly() {
        let (bpm, file) = setup();
        let (pid, _) = bpm.alloc_page(&file).unwrap();
        bpm.unpin_page(&file, pid, false).unwrap();

        let guard = bpm.fetch_page_read(&file, pid).unwrap();
        bpm.dispose_page(&file, pid).unwrap();
        drop(guard);

        assert_eq!(bpm.resident_page_count(), 0);
    }

    #[test]
    fn test_stale_guard_keeps_reused_page_id_pinned() {
        use crate::storage::DiskFile;
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let file: FileRef = Arc::new(DiskFile::create(dir.path().join("reuse.db")).unwrap());
        let bpm = BufferPoolManager::new(4);

        let pid = bpm.new_page(&file).unwrap().page_id();
        let stale = bpm.fetch_page_read(&file, pid).unwrap();
        bpm.dispose_page(&file, pid).unwrap();

        // The file hands the freed slot out again, into another frame
        let (again, frame) = bpm.alloc_page(&file).unwrap();
        assert_eq!(again, pid);
        assert_ne!(frame.frame_id(), stale.frame_id());
        assert_eq!(bpm.pin_count(&file, pid), Some(1));

        drop(stale);
        assert_eq!(bpm.pin_count(&file, pid), Some(1));
        assert!(bpm.dump().is_consistent());

        bpm.unpin_page(&file, pid, false).unwrap();
        assert_eq!(bpm.pin_count(&file, pid), Some(0));
    }

    #[test]
    fn test_stale_pin_ignores_refilled_frame() {
        let file: FileRef = Arc::new(MemFile::new("refill"));
        let bpm = BufferPoolManager::new(1);
        let (pid, _) = bpm.alloc_page(&file).unwrap();
        bpm.unpin_page(&file, pid, false).unwrap();

        // The only frame is emptied and refilled while a pin on it is held
        let stale = bpm.fetch_page(&file, pid).unwrap();
        bpm.dispose_page(&file, pid).unwrap();
        let (other, frame) = bpm.alloc_page(&file).unwrap();
        assert_eq!(frame.frame_id(), stale.frame_id());

        bpm.unpin_frame(&stale, true).unwrap();
        assert_eq!(bpm.pin_count(&file, other), Some(1));
        assert!(!bpm.dump().frames[0].dirty);
    }

    #[test]
    fn test_write_guard_blocks_until_released() {
        use std::thread;

        let (bpm, file) = setup();
        let pid = bpm.new_page(&file).unwrap().page_id();

        let mut writer = bpm.fetch_page_write(&file, pid).unwrap();
        writer.as_mut_slice()[0] = 1;

        thread::scope(|s| {
            let reader = s.spawn(|| bpm.fetch_page_read(&file, pid).unwrap().as_slice()[0]);
            writer.as_mut_slice()[0] = 2;
            drop(writer);
            assert_eq!(reader.join().unwrap(), 2);
        });
    }
}
