//! Buffer pool statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Events the buffer pool counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCounter {
    /// A fetch found its page resident.
    Hit,
    /// A fetch had to fill a frame from the file.
    Miss,
    /// A valid frame was taken by victim selection.
    Eviction,
    /// A page was read from its file.
    Read,
    /// A dirty page was written back to its file.
    Write,
    /// A page was allocated through the pool.
    Allocation,
    /// A page was disposed through the pool.
    Disposal,
}

impl StatCounter {
    const COUNT: usize = 7;

    const ALL: [StatCounter; Self::COUNT] = [
        StatCounter::Hit,
        StatCounter::Miss,
        StatCounter::Eviction,
        StatCounter::Read,
        StatCounter::Write,
        StatCounter::Allocation,
        StatCounter::Disposal,
    ];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// Counters kept by the buffer pool.
///
/// Updates are `Relaxed` atomic increments, so they never take the pool
/// lock. Counters are independent of each other: a [`snapshot`] taken
/// while other threads work is not a consistent cut.
///
/// [`snapshot`]: BufferPoolStats::snapshot
///
/// # Example
/// ```
/// use clockpool::buffer::{BufferPoolStats, StatCounter};
///
/// let stats = BufferPoolStats::new();
/// stats.record(StatCounter::Hit);
/// assert_eq!(stats.get(StatCounter::Hit), 1);
/// ```
#[derive(Debug, Default)]
pub struct BufferPoolStats {
    counters: [AtomicU64; StatCounter::COUNT],
}

impl BufferPoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `counter`.
    #[inline]
    pub fn record(&self, counter: StatCounter) {
        self.counters[counter.slot()].fetch_add(1, Ordering::Relaxed);
    }

    /// Current value of `counter`.
    #[inline]
    pub fn get(&self, counter: StatCounter) -> u64 {
        self.counters[counter.slot()].load(Ordering::Relaxed)
    }

    /// Fraction of fetches that were hits, 0.0 before any fetch.
    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.get(StatCounter::Hit),
            cache_misses: self.get(StatCounter::Miss),
            evictions: self.get(StatCounter::Eviction),
            pages_read: self.get(StatCounter::Read),
            pages_written: self.get(StatCounter::Write),
            pages_allocated: self.get(StatCounter::Allocation),
            pages_disposed: self.get(StatCounter::Disposal),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        for counter in StatCounter::ALL {
            self.counters[counter.slot()].store(0, Ordering::Relaxed);
        }
    }
}

/// Plain copy of the counters at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub pages_read: u64,
    pub pages_written: u64,
    pub pages_allocated: u64,
    pub pages_disposed: u64,
}

impl StatsSnapshot {
    pub fn hit_rate(&self) -> f64 {
        match self.cache_hits + self.cache_misses {
            0 => 0.0,
            fetches => self.cache_hits as f64 / fetches as f64,
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={} misses={} ({:.1}% hit) evictions={} reads={} writes={} allocs={} disposals={}",
            self.cache_hits,
            self.cache_misses,
            self.hit_rate() * 100.0,
            self.evictions,
            self.pages_read,
            self.pages_written,
            self.pages_allocated,
            self.pages_disposed
        )
    }
}
