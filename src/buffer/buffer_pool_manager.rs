//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between paged files and memory
//! - Pin-based reference counting
//! - CLOCK replacement with write-back of dirty victims
//! - Per-file flush and page disposal

use std::fmt;

use log::{debug, error, trace, warn};
use parking_lot::Mutex;

use crate::buffer::descriptor::{DescriptorSnapshot, DescriptorTable};
use crate::buffer::frame::{Frame, FrameRef};
use crate::buffer::page_table::PageTable;
use crate::buffer::replacer::ClockReplacer;
use crate::buffer::{BufferPoolStats, PageReadGuard, PageWriteGuard, StatCounter};
use crate::common::config::BufferPoolConfig;
use crate::common::{Error, FileId, FrameId, PageId, Result};
use crate::storage::FileRef;

/// Manages a fixed pool of frames caching pages of any number of files.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                      BufferPoolManager                       │
/// │  state: Mutex<PoolState>                                     │
/// │  ┌──────────────────┐  ┌──────────────────────────────────┐  │
/// │  │   page_table     │  │  descriptors: DescriptorTable    │  │
/// │  │(File,Page) → Fid │─▶│  [Desc0] [Desc1] [Desc2] ...     │  │
/// │  └──────────────────┘  └──────────────────────────────────┘  │
/// │  ┌──────────────────┐                 │ same FrameId         │
/// │  │  ClockReplacer   │                 ▼                      │
/// │  │   (hand only)    │  frames: Vec<Frame> (RwLock<Page>)     │
/// │  └──────────────────┘  [Frame0] [Frame1] [Frame2] ...        │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `state`: one `Mutex` over the page table, descriptors and clock
///   hand; every protocol call runs under it, I/O for fills, write-backs,
///   flushes and disposals included
/// - `frames`: no pool lock needed - each frame has its own `RwLock`, so
///   pinned pages are read and written without serializing on the pool
/// - `stats`: no lock - all atomic counters
///
/// # Usage
/// ```
/// use std::sync::Arc;
/// use clockpool::{BufferPoolManager, FileRef};
/// use clockpool::storage::MemFile;
///
/// let file: FileRef = Arc::new(MemFile::new("heap"));
/// let bpm = BufferPoolManager::new(8);
///
/// // Allocate a page and write to it
/// let (page_id, frame) = bpm.alloc_page(&file).unwrap();
/// frame.write().as_mut_slice()[0] = 0xAB;
/// bpm.unpin_page(&file, page_id, true).unwrap();
///
/// // Fetch it again: a hit, no I/O
/// let frame = bpm.fetch_page(&file, page_id).unwrap();
/// assert_eq!(frame.read().as_slice()[0], 0xAB);
/// bpm.unpin_page(&file, page_id, false).unwrap();
///
/// // Write it back and drop it from the pool
/// bpm.flush_file(&file).unwrap();
/// ```
pub struct BufferPoolManager {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// Bookkeeping guarded by the pool lock.
    state: Mutex<PoolState>,

    /// Performance statistics.
    stats: BufferPoolStats,

    /// Number of frames in the pool (immutable after construction).
    pool_size: usize,
}

struct PoolState {
    descriptors: DescriptorTable,
    page_table: PageTable,
    clock: ClockReplacer,
}

impl BufferPoolManager {
    /// Create a buffer pool of `pool_size` frames.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");
        Self::build(BufferPoolConfig::default().with_pool_size(pool_size))
    }

    /// Create a buffer pool from a validated configuration.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if the configuration is rejected.
    pub fn with_config(config: BufferPoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: BufferPoolConfig) -> Self {
        let pool_size = config.pool_size;
        debug!(
            "creating buffer pool: {} frames, {} page table buckets",
            pool_size,
            config.page_table_buckets()
        );

        Self {
            frames: (0..pool_size).map(|_| Frame::new()).collect(),
            state: Mutex::new(PoolState {
                descriptors: DescriptorTable::new(pool_size),
                page_table: PageTable::with_buckets(config.page_table_buckets()),
                clock: ClockReplacer::new(pool_size),
            }),
            stats: BufferPoolStats::new(),
            pool_size,
        }
    }

    // ========================================================================
    // Public API: Pin protocol
    // ========================================================================

    /// Pin a page, reading it from `file` if it is not resident.
    ///
    /// Every successful call adds exactly one pin, to be released with
    /// [`unpin_page`](Self::unpin_page). A hit sets the reference bit and
    /// performs no I/O.
    ///
    /// # Errors
    /// - `Error::PoolExhausted` if the page is not resident and every frame
    ///   is pinned
    /// - `Error::PageNotFound` if the file has no such page
    /// - I/O errors from reading the page or writing back a dirty victim
    pub fn fetch_page(&self, file: &FileRef, page_id: PageId) -> Result<FrameRef<'_>> {
        let file_id = file.file_id();
        let mut state = self.state.lock();

        if let Some(frame_id) = state.page_table.lookup(file_id, page_id) {
            state.descriptors[frame_id].pin();
            self.stats.record(StatCounter::Hit);
            trace!("hit: {} of {} in {}", page_id, file_id, frame_id);
            return Ok(self.frame_ref(&state, frame_id, file_id, page_id));
        }

        self.stats.record(StatCounter::Miss);
        let frame_id = self.alloc_buf(&mut state)?;

        // On failure the frame stays cleared and is simply free again
        let page = file.read_page(page_id)?;
        self.stats.record(StatCounter::Read);
        self.frames[frame_id.0].load(&page);

        Self::install(&mut state, file, page_id, frame_id)?;
        trace!("miss: loaded {} of {} into {}", page_id, file_id, frame_id);

        Ok(self.frame_ref(&state, frame_id, file_id, page_id))
    }

    /// Release one pin on a page.
    ///
    /// `dirty = true` marks the frame as modified; the mark sticks until
    /// the page is written back, so a later clean unpin does not undo it.
    /// Unpinning a page that is not resident is a no-op.
    ///
    /// # Errors
    /// - `Error::PageNotPinned` if the page's pin count is already 0
    pub fn unpin_page(&self, file: &FileRef, page_id: PageId, dirty: bool) -> Result<()> {
        let file_id = file.file_id();
        let mut state = self.state.lock();

        let Some(frame_id) = state.page_table.lookup(file_id, page_id) else {
            trace!("unpin of non-resident {} of {} ignored", page_id, file_id);
            return Ok(());
        };

        Self::release(&mut state, file_id, page_id, frame_id, dirty)
    }

    /// Release the pin a guard took through `frame`.
    ///
    /// Unlike [`unpin_page`](Self::unpin_page) this is bound to the frame
    /// occupancy the pin was taken on: if the frame has been cleared since
    /// (the page was disposed, and its id may already be back in the pool
    /// with new holders), nothing is released.
    pub(crate) fn unpin_frame(&self, frame: &FrameRef<'_>, dirty: bool) -> Result<()> {
        let mut state = self.state.lock();

        let desc = &state.descriptors[frame.frame_id()];
        if desc.generation() != frame.generation() {
            trace!(
                "stale pin on {} of {} in {} ignored",
                frame.page_id(),
                frame.file_id(),
                frame.frame_id()
            );
            return Ok(());
        }

        Self::release(
            &mut state,
            frame.file_id(),
            frame.page_id(),
            frame.frame_id(),
            dirty,
        )
    }

    /// Allocate a new page in `file` and pin it in the pool.
    ///
    /// The page is allocated in the file first; if no frame can then be
    /// found the page stays allocated there and can be fetched later.
    ///
    /// # Errors
    /// - `Error::PoolExhausted` if every frame is pinned
    /// - I/O errors from the allocation or from writing back a dirty victim
    pub fn alloc_page(&self, file: &FileRef) -> Result<(PageId, FrameRef<'_>)> {
        let file_id = file.file_id();
        let mut state = self.state.lock();

        let (page_id, page) = file.allocate_page()?;
        self.stats.record(StatCounter::Allocation);

        let frame_id = self.alloc_buf(&mut state)?;
        self.frames[frame_id.0].load(&page);

        Self::install(&mut state, file, page_id, frame_id)?;
        trace!("allocated {} of {} into {}", page_id, file_id, frame_id);

        Ok((page_id, self.frame_ref(&state, frame_id, file_id, page_id)))
    }

    // ========================================================================
    // Public API: Flush and dispose
    // ========================================================================

    /// Write back every dirty page of `file` and evict all of its pages.
    ///
    /// All of the file's frames are checked before any is touched: if one
    /// is pinned (or inconsistent) the call fails and the pool is left
    /// exactly as it was.
    ///
    /// # Errors
    /// - `Error::PagePinned` if any page of the file is pinned
    /// - `Error::BadBuffer` if a frame tagged to the file is invalid or
    ///   holds the sentinel page id
    /// - I/O errors from write-back; frames already processed stay flushed
    ///   and evicted, the failing frame stays resident and dirty
    pub fn flush_file(&self, file: &FileRef) -> Result<()> {
        let file_id = file.file_id();
        let mut state = self.state.lock();

        let mut targets = Vec::new();
        for desc in state.descriptors.iter().filter(|d| d.belongs_to(file_id)) {
            if !desc.is_valid() || !desc.page_id().is_valid() {
                return Err(Error::BadBuffer {
                    frame: desc.frame_id(),
                    dirty: desc.is_dirty(),
                    valid: desc.is_valid(),
                    ref_bit: desc.ref_bit(),
                });
            }
            if desc.is_pinned() {
                return Err(Error::PagePinned {
                    file: file_id,
                    page: desc.page_id(),
                    frame: desc.frame_id(),
                });
            }
            targets.push(desc.frame_id());
        }

        let PoolState {
            descriptors,
            page_table,
            ..
        } = &mut *state;

        let mut written = 0;
        for frame_id in targets {
            let desc = &mut descriptors[frame_id];
            let page_id = desc.page_id();

            if desc.is_dirty() {
                file.write_page(page_id, &self.frames[frame_id.0].page())?;
                desc.clear_dirty();
                self.stats.record(StatCounter::Write);
                written += 1;
            }

            page_table.remove(file_id, page_id);
            desc.clear();
        }

        debug!("flushed {}: {} pages written back", file.name(), written);
        Ok(())
    }

    /// Drop a page from the pool and delete it from its file.
    ///
    /// No pin check is made: the caller asserts nobody still uses the page,
    /// and must not hold a guard or frame lock on it. The external delete
    /// is attempted even when the page is not resident.
    ///
    /// # Errors
    /// Errors from the file's `delete_page` (e.g. `Error::PageNotFound`).
    pub fn dispose_page(&self, file: &FileRef, page_id: PageId) -> Result<()> {
        let file_id = file.file_id();
        let mut state = self.state.lock();

        if let Some(frame_id) = state.page_table.remove(file_id, page_id) {
            let desc = &mut state.descriptors[frame_id];
            if desc.is_pinned() {
                warn!(
                    "disposing {} of {} with pin count {}",
                    page_id,
                    file_id,
                    desc.pin_count()
                );
            }
            desc.clear();
            debug!("disposed {} of {} from {}", page_id, file_id, frame_id);
        }

        file.delete_page(page_id)?;
        self.stats.record(StatCounter::Disposal);
        Ok(())
    }

    /// Write back every dirty, unpinned page without evicting anything.
    ///
    /// Pinned pages are skipped: their holders may still be changing them,
    /// and they become dirty only at unpin anyway. Returns the number of
    /// pages written.
    ///
    /// # Errors
    /// The first write-back error; earlier pages stay written.
    pub fn flush_all(&self) -> Result<usize> {
        let mut state = self.state.lock();
        let mut written = 0;

        for i in 0..self.pool_size {
            let frame_id = FrameId::new(i);
            let desc = &mut state.descriptors[frame_id];
            if !desc.is_valid() || !desc.is_dirty() || desc.is_pinned() {
                continue;
            }
            if let Some(file) = desc.file() {
                file.write_page(desc.page_id(), &self.frames[i].page())?;
                self.stats.record(StatCounter::Write);
                written += 1;
            }
            desc.clear_dirty();
        }

        debug!("flush_all: {} pages written back", written);
        Ok(written)
    }

    // ========================================================================
    // Public API: RAII guards
    // ========================================================================

    /// Fetch a page for shared access; it is unpinned (clean) on drop.
    pub fn fetch_page_read(&self, file: &FileRef, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let frame = self.fetch_page(file, page_id)?;
        Ok(PageReadGuard::new(self, file.clone(), frame))
    }

    /// Fetch a page for exclusive access; it is unpinned dirty on drop.
    pub fn fetch_page_write(&self, file: &FileRef, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let frame = self.fetch_page(file, page_id)?;
        Ok(PageWriteGuard::new(self, file.clone(), frame))
    }

    /// Allocate a page and return an exclusive guard over it.
    pub fn new_page(&self, file: &FileRef) -> Result<PageWriteGuard<'_>> {
        let (_, frame) = self.alloc_page(file)?;
        Ok(PageWriteGuard::new(self, file.clone(), frame))
    }

    // ========================================================================
    // Public API: Stats and inspection
    // ========================================================================

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Number of frames not holding a page.
    pub fn free_frame_count(&self) -> usize {
        let state = self.state.lock();
        self.pool_size - state.descriptors.valid_count()
    }

    /// Number of resident pages.
    pub fn resident_page_count(&self) -> usize {
        self.state.lock().page_table.len()
    }

    /// Whether a page is currently in the pool.
    pub fn is_resident(&self, file: &FileRef, page_id: PageId) -> bool {
        let state = self.state.lock();
        state.page_table.lookup(file.file_id(), page_id).is_some()
    }

    /// Pin count of a resident page, `None` if it is not resident.
    pub fn pin_count(&self, file: &FileRef, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        state
            .page_table
            .lookup(file.file_id(), page_id)
            .map(|frame_id| state.descriptors[frame_id].pin_count())
    }

    /// Snapshot of every descriptor and page-table entry.
    pub fn dump(&self) -> PoolDump {
        let state = self.state.lock();
        let mut page_table: Vec<_> = state.page_table.iter().collect();
        page_table.sort();

        PoolDump {
            frames: state.descriptors.iter().map(|d| d.snapshot()).collect(),
            page_table,
            hand: state.clock.hand(),
        }
    }

    /// Print every frame descriptor to stdout.
    pub fn print_self(&self) {
        println!("{}", self.dump());
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn frame_ref(
        &self,
        state: &PoolState,
        frame_id: FrameId,
        file_id: FileId,
        page_id: PageId,
    ) -> FrameRef<'_> {
        let generation = state.descriptors[frame_id].generation();
        FrameRef::new(&self.frames[frame_id.0], frame_id, file_id, page_id, generation)
    }

    /// Drop one pin on a resident frame, marking it dirty if asked.
    fn release(
        state: &mut PoolState,
        file_id: FileId,
        page_id: PageId,
        frame_id: FrameId,
        dirty: bool,
    ) -> Result<()> {
        let desc = &mut state.descriptors[frame_id];
        if !desc.unpin() {
            return Err(Error::PageNotPinned {
                file: file_id,
                page: page_id,
                frame: frame_id,
            });
        }
        if dirty {
            desc.mark_dirty();
        }
        Ok(())
    }

    /// Map `page_id` to `frame_id` and mark the frame resident and pinned.
    fn install(
        state: &mut PoolState,
        file: &FileRef,
        page_id: PageId,
        frame_id: FrameId,
    ) -> Result<()> {
        state.page_table.insert(file.file_id(), page_id, frame_id)?;
        state.descriptors[frame_id].set(file, page_id);
        Ok(())
    }

    /// Obtain a cleared frame, evicting (and writing back) a victim if needed.
    ///
    /// If write-back fails the victim keeps its page, dirty bit and
    /// page-table entry, and the I/O error is returned.
    fn alloc_buf(&self, state: &mut PoolState) -> Result<FrameId> {
        let PoolState {
            descriptors,
            page_table,
            clock,
        } = state;

        let Some(frame_id) = clock.select_victim(descriptors) else {
            warn!("buffer pool exhausted: all {} frames pinned", self.pool_size);
            return Err(Error::PoolExhausted {
                frames: self.pool_size,
            });
        };

        let desc = &mut descriptors[frame_id];
        if desc.is_valid() {
            let page_id = desc.page_id();
            if let Some(file) = desc.file() {
                if desc.is_dirty() {
                    if let Err(e) = file.write_page(page_id, &self.frames[frame_id.0].page()) {
                        error!(
                            "write-back of {} to {} failed: {}",
                            page_id,
                            file.name(),
                            e
                        );
                        return Err(e);
                    }
                    self.stats.record(StatCounter::Write);
                }
                page_table.remove(file.file_id(), page_id);
            }
            self.stats.record(StatCounter::Eviction);
            debug!("evicted {} from {}", page_id, frame_id);
        }

        desc.clear();
        Ok(frame_id)
    }
}

impl Drop for BufferPoolManager {
    fn drop(&mut self) {
        if let Err(e) = self.flush_all() {
            error!("failed to flush buffer pool on drop: {}", e);
        }
    }
}

/// Read-only snapshot of the pool's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolDump {
    /// One entry per frame, in frame order.
    pub frames: Vec<DescriptorSnapshot>,
    /// Page-table entries, sorted.
    pub page_table: Vec<(FileId, PageId, FrameId)>,
    /// Clock hand position.
    pub hand: FrameId,
}

impl PoolDump {
    /// Number of frames holding a page.
    pub fn valid_frames(&self) -> usize {
        self.frames.iter().filter(|d| d.valid).count()
    }

    /// Whether the page table and the descriptors agree: every entry points
    /// at a valid frame bound to that page, and every valid frame has its
    /// entry.
    pub fn is_consistent(&self) -> bool {
        let entries_match = self.page_table.iter().all(|&(file, page, frame)| {
            self.frames.get(frame.0).is_some_and(|d| {
                d.valid && d.file_id == Some(file) && d.page_id == page
            })
        });

        entries_match && self.page_table.len() == self.valid_frames()
    }
}

impl fmt::Display for PoolDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for desc in &self.frames {
            writeln!(f, "{}", desc)?;
        }
        write!(f, "Total Number of Valid Frames: {}", self.valid_frames())
    }
}
