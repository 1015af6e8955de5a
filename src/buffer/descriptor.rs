//! Frame descriptors - per-frame bookkeeping for the buffer pool.
//!
//! A [`FrameDescriptor`] records which page occupies a frame and the state
//! the replacer and the pin protocol need:
//! - Owning file and page id
//! - Valid, dirty and reference bits
//! - Pin count
//!
//! Descriptors are plain data. They are only mutated by the
//! [`BufferPoolManager`](super::BufferPoolManager) while it holds the pool
//! lock, always through `&mut` borrows out of the [`DescriptorTable`].

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::common::{FileId, FrameId, PageId};
use crate::storage::FileRef;

/// Bookkeeping for one frame.
pub struct FrameDescriptor {
    frame_id: FrameId,
    /// File owning the resident page; `None` once cleared.
    file: Option<FileRef>,
    page_id: PageId,
    valid: bool,
    dirty: bool,
    ref_bit: bool,
    pin_count: u32,
    /// Bumped on every `clear`, so a handle taken before the frame was
    /// emptied can tell it no longer refers to the same occupancy.
    generation: u64,
}

impl FrameDescriptor {
    /// Create an empty (invalid) descriptor for `frame_id`.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            file: None,
            page_id: PageId::INVALID,
            valid: false,
            dirty: false,
            ref_bit: false,
            pin_count: 0,
            generation: 0,
        }
    }

    /// Bind the frame to a freshly loaded page: valid, clean, referenced,
    /// pinned once.
    pub fn set(&mut self, file: &FileRef, page_id: PageId) {
        self.file = Some(file.clone());
        self.page_id = page_id;
        self.valid = true;
        self.dirty = false;
        self.ref_bit = true;
        self.pin_count = 1;
    }

    /// Reset to the empty state.
    pub fn clear(&mut self) {
        self.file = None;
        self.page_id = PageId::INVALID;
        self.valid = false;
        self.dirty = false;
        self.ref_bit = false;
        self.pin_count = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Record another holder of the page.
    pub fn pin(&mut self) {
        self.pin_count += 1;
        self.ref_bit = true;
    }

    /// Drop one holder. Returns `false` (and changes nothing) when the
    /// pin count is already zero.
    pub fn unpin(&mut self) -> bool {
        if self.pin_count == 0 {
            return false;
        }
        self.pin_count -= 1;
        true
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    #[inline]
    pub fn file(&self) -> Option<&FileRef> {
        self.file.as_ref()
    }

    #[inline]
    pub fn file_id(&self) -> Option<FileId> {
        self.file.as_ref().map(|f| f.file_id())
    }

    /// Whether this descriptor is tagged to `file_id`, valid or not.
    #[inline]
    pub fn belongs_to(&self, file_id: FileId) -> bool {
        self.file_id() == Some(file_id)
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn ref_bit(&self) -> bool {
        self.ref_bit
    }

    #[inline]
    pub fn clear_ref_bit(&mut self) {
        self.ref_bit = false;
    }

    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Point-in-time copy for diagnostics.
    pub fn snapshot(&self) -> DescriptorSnapshot {
        DescriptorSnapshot {
            frame_id: self.frame_id,
            file_id: self.file_id(),
            page_id: self.page_id,
            valid: self.valid,
            dirty: self.dirty,
            ref_bit: self.ref_bit,
            pin_count: self.pin_count,
        }
    }

    #[cfg(test)]
    pub(crate) fn force_invalid(&mut self) {
        self.valid = false;
    }

    #[cfg(test)]
    pub(crate) fn force_page_id(&mut self, page_id: PageId) {
        self.page_id = page_id;
    }
}

/// The descriptor for every frame, indexed by [`FrameId`].
pub struct DescriptorTable {
    descriptors: Vec<FrameDescriptor>,
}

impl DescriptorTable {
    /// Create `pool_size` empty descriptors.
    pub fn new(pool_size: usize) -> Self {
        Self {
            descriptors: (0..pool_size)
                .map(|i| FrameDescriptor::new(FrameId::new(i)))
                .collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameDescriptor> {
        self.descriptors.iter()
    }

    /// Number of descriptors holding a live page.
    pub fn valid_count(&self) -> usize {
        self.descriptors.iter().filter(|d| d.is_valid()).count()
    }
}

impl Index<FrameId> for DescriptorTable {
    type Output = FrameDescriptor;

    #[inline]
    fn index(&self, frame_id: FrameId) -> &FrameDescriptor {
        &self.descriptors[frame_id.0]
    }
}

impl IndexMut<FrameId> for DescriptorTable {
    #[inline]
    fn index_mut(&mut self, frame_id: FrameId) -> &mut FrameDescriptor {
        &mut self.descriptors[frame_id.0]
    }
}

/// A copy of one descriptor's state, detached from the pool lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSnapshot {
    pub frame_id: FrameId,
    pub file_id: Option<FileId>,
    pub page_id: PageId,
    pub valid: bool,
    pub dirty: bool,
    pub ref_bit: bool,
    pub pin_count: u32,
}

impl fmt::Display for DescriptorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file_id {
            Some(file_id) => write!(f, "{} {} {}", self.frame_id, file_id, self.page_id)?,
            None => write!(f, "{} File(NONE) {}", self.frame_id, self.page_id)?,
        }
        write!(
            f,
            " valid:{} pin_count:{} dirty:{} ref_bit:{}",
            self.valid, self.pin_count, self.dirty, self.ref_bit
        )
    }
}
