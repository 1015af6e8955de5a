//! CLOCK (second chance) replacement policy.
//!
//! Frames sit on a clock face. Each step advances the hand one frame and
//! looks only at the frame under it:
//! - invalid frame: take it
//! - reference bit set: clear it and move on (second chance)
//! - pinned: move on
//! - otherwise: take it
//!
//! This approximates LRU with O(1) bookkeeping per access.

use crate::buffer::descriptor::DescriptorTable;
use crate::common::FrameId;

/// CLOCK victim selection.
///
/// The hand is the only state. It starts on the last frame so the first
/// advance lands on frame 0, and it persists across calls.
#[derive(Debug)]
pub struct ClockReplacer {
    hand: FrameId,
    pool_size: usize,
}

impl ClockReplacer {
    /// Create a replacer for a pool of `pool_size` frames.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");
        Self {
            hand: FrameId::new(pool_size - 1),
            pool_size,
        }
    }

    /// Current hand position.
    #[inline]
    pub fn hand(&self) -> FrameId {
        self.hand
    }

    /// Choose a frame to (re)use.
    ///
    /// Returns a frame that is either invalid or valid, unpinned and
    /// unreferenced; the caller writes it back and clears it. Reference
    /// bits of frames passed over are cleared. Returns `None` when two
    /// full revolutions find nothing, i.e. every frame is pinned: the
    /// first revolution clears all reference bits, so the second would
    /// find any unpinned frame.
    pub fn select_victim(&mut self, descriptors: &mut DescriptorTable) -> Option<FrameId> {
        debug_assert_eq!(descriptors.len(), self.pool_size);

        for _ in 0..2 * self.pool_size {
            self.hand = self.hand.advance(self.pool_size);
            let desc = &mut descriptors[self.hand];

            if !desc.is_valid() {
                return Some(self.hand);
            }
            if desc.ref_bit() {
                desc.clear_ref_bit();
                continue;
            }
            if desc.is_pinned() {
                continue;
            }
            return Some(self.hand);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PageId;
    use crate::storage::{FileRef, MemFile};
    use std::sync::Arc;

    /// A table where every frame holds a page pinned once with its
    /// reference bit set, as right after a fetch.
    fn full_table(pool_size: usize) -> DescriptorTable {
        let file: FileRef = Arc::new(MemFile::new("clock"));
        let mut table = DescriptorTable::new(pool_size);
        for i in 0..pool_size {
            table[FrameId::new(i)].set(&file, PageId::new(i as u32));
        }
        table
    }

    #[test]
    fn test_first_advance_lands_on_frame_zero() {
        let mut clock = ClockReplacer::new(4);
        assert_eq!(clock.hand(), FrameId::new(3));

        let mut table = DescriptorTable::new(4);
        assert_eq!(clock.select_victim(&mut table), Some(FrameId::new(0)));
        assert_eq!(clock.select_victim(&mut table), Some(FrameId::new(1)));
    }

    #[test]
    fn test_all_pinned_returns_none() {
        let mut clock = ClockReplacer::new(3);
        let mut table = full_table(3);

        assert_eq!(clock.select_victim(&mut table), None);
        // The scan still cleared every reference bit
        assert!(table.iter().all(|d| !d.ref_bit()));
    }

    #[test]
    fn test_second_chance() {
        let mut clock = ClockReplacer::new(3);
        let mut table = full_table(3);
        for i in 0..3 {
            table[FrameId::new(i)].unpin();
        }

        // Every frame is referenced: first pass clears, second pass takes frame 0
        assert_eq!(clock.select_victim(&mut table), Some(FrameId::new(0)));
        assert_eq!(clock.hand(), FrameId::new(0));
    }

    #[test]
    fn test_skips_pinned_and_referenced() {
        let mut clock = ClockReplacer::new(3);
        let mut table = full_table(3);

        // Frame 0 pinned, frame 1 unpinned but referenced, frame 2 unpinned and cold
        table[FrameId::new(1)].unpin();
        table[FrameId::new(2)].unpin();
        table[FrameId::new(2)].clear_ref_bit();

        assert_eq!(clock.select_victim(&mut table), Some(FrameId::new(2)));
        assert!(!table[FrameId::new(1)].ref_bit());
    }

    #[test]
    fn test_only_unpinned_frame_found_after_full_revolution() {
        let mut clock = ClockReplacer::new(5);
        let mut table = full_table(5);

        // Only frame 4 can go, and it is still referenced
        table[FrameId::new(4)].unpin();

        assert_eq!(clock.select_victim(&mut table), Some(FrameId::new(4)));
    }

    #[test]
    fn test_hand_persists_across_calls() {
        let mut clock = ClockReplacer::new(3);
        let mut table = full_table(3);
        for i in 0..3 {
            let desc = &mut table[FrameId::new(i)];
            desc.unpin();
            desc.clear_ref_bit();
        }

        assert_eq!(clock.select_victim(&mut table), Some(FrameId::new(0)));
        assert_eq!(clock.select_victim(&mut table), Some(FrameId::new(1)));
        assert_eq!(clock.select_victim(&mut table), Some(FrameId::new(2)));
        assert_eq!(clock.select_victim(&mut table), Some(FrameId::new(0)));
    }
}
