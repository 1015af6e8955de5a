//! Configuration for clockpool.

use crate::common::{Error, Result};

/// Size of a page in bytes (4KB).
///
/// Every frame in the pool holds exactly one page of this size, and
/// [`DiskFile`](crate::storage::DiskFile) lays pages out at multiples of it.
pub const PAGE_SIZE: usize = 4096;

/// Pool size used by [`BufferPoolConfig::default`].
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Initial bucket count for a page table serving `pool_size` frames.
///
/// An odd number within one of `1.2 × pool_size`. Purely a
/// sizing hint: any map with the insert/lookup/remove contract works.
pub fn page_table_buckets(pool_size: usize) -> usize {
    ((pool_size * 6 / 5) & !1) + 1
}

/// Construction parameters for a [`BufferPoolManager`](crate::BufferPoolManager).
///
/// # Example
/// ```
/// use clockpool::common::config::BufferPoolConfig;
///
/// let config = BufferPoolConfig::default().with_pool_size(16);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.page_table_buckets(), 21);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub pool_size: usize,
}

impl BufferPoolConfig {
    /// Set the number of frames.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Bucket count for this pool's page table.
    pub fn page_table_buckets(&self) -> usize {
        page_table_buckets(self.pool_size)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if the pool has no frames.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::InvalidConfig("pool_size must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert_eq!(PAGE_SIZE, 4096);
    }

    #[test]
    fn test_page_table_buckets() {
        assert_eq!(page_table_buckets(1), 1);
        assert_eq!(page_table_buckets(3), 3);
        assert_eq!(page_table_buckets(10), 13);
        assert_eq!(page_table_buckets(100), 121);

        for n in 1..500 {
            let buckets = page_table_buckets(n);
            assert_eq!(buckets % 2, 1, "bucket count must be odd");
            assert!(buckets * 5 >= n * 6 - 5, "buckets too small for {}", n);
        }
    }

    #[test]
    fn test_config_validate() {
        assert!(BufferPoolConfig::default().validate().is_ok());

        let err = BufferPoolConfig::default().with_pool_size(0).validate();
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }
}
