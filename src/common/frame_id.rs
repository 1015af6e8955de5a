//! Frame identifier type.

use std::fmt;

/// Identifies a frame in the buffer pool.
///
/// The frame store and the descriptor table are both `Vec`s of the same
/// length, so a `FrameId` indexes either one directly: `descriptors[fid.0]`.
///
/// # Example
/// ```
/// use clockpool::FrameId;
///
/// let last = FrameId::new(3);
/// assert_eq!(last.advance(4), FrameId::new(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

impl FrameId {
    /// Create a new FrameId.
    #[inline]
    pub fn new(id: usize) -> Self {
        FrameId(id)
    }

    /// The next frame on a clock face of `pool_size` frames.
    #[inline]
    pub fn advance(self, pool_size: usize) -> Self {
        FrameId((self.0 + 1) % pool_size)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}
