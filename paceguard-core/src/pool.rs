//! Bounded Pool of Reusable Scratch Buffers
//!
//! ## Overview
//!
//! Feature extraction needs working memory on every call: a sample window
//! for the transform and a band-energy accumulator. Allocating those per
//! call would put the allocator on the hot path; the pool keeps up to `P`
//! warm [`ScratchBuffer`]s and hands them out on demand.
//!
//! Pool discipline, in order of importance:
//!
//! - `acquire` **never fails**: an empty free list falls back to a fresh
//!   allocation.
//! - `release` on a full pool **discards** the buffer instead of growing:
//!   the pool never exceeds `P` entries, so worst-case retained memory is
//!   fixed at construction.
//! - Buffers are borrowed and returned strictly within one governed call;
//!   they are never shared between concurrent in-flight calls.
//!
//! ## Buffer Shape
//!
//! Every buffer is allocated at the *maximum* shape any complexity tier can
//! ask for ([`MAX_TRANSFORM_SIZE`] samples, [`MAX_BAND_COUNT`] bands), so a
//! buffer pooled while the governor ran at `Low` can be reused at `High`
//! without reallocation. Contents are scratch: unspecified on acquire,
//! overwritten by the extraction.

use heapless::Vec as BoundedVec;

use crate::complexity::{MAX_BAND_COUNT, MAX_TRANSFORM_SIZE};

use alloc::vec;
use alloc::vec::Vec;

/// Reusable working memory for one feature-extraction call
///
/// Fixed shape: sized for the largest complexity tier at construction and
/// never resized, so reuse costs nothing. Slice accessors narrow the
/// storage to the active tier's dimensions.
#[derive(Debug)]
pub struct ScratchBuffer {
    samples: Vec<f32>,
    bands: Vec<f32>,
}

impl ScratchBuffer {
    /// Allocate a buffer at the maximum shape
    pub fn new() -> Self {
        Self {
            samples: vec![0.0; MAX_TRANSFORM_SIZE],
            bands: vec![0.0; MAX_BAND_COUNT],
        }
    }

    /// Sample window narrowed to `transform_size` entries
    ///
    /// `transform_size` above the maximum shape is clamped; contents are
    /// scratch and may hold data from a previous call.
    pub fn samples_mut(&mut self, transform_size: usize) -> &mut [f32] {
        let len = transform_size.min(self.samples.len());
        &mut self.samples[..len]
    }

    /// Band accumulator narrowed to `band_count` entries, zeroed
    pub fn bands_mut(&mut self, band_count: usize) -> &mut [f32] {
        let len = band_count.min(self.bands.len());
        let bands = &mut self.bands[..len];
        bands.fill(0.0);
        bands
    }
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Pool health counters
///
/// Diagnostic only; a high `allocated`-to-`reused` ratio after warmup means
/// the pool capacity is undersized for the call pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers created fresh because the free list was empty
    pub allocated: u32,
    /// Buffers served from the free list
    pub reused: u32,
    /// Buffers dropped on release because the pool was full
    pub discarded: u32,
}

/// Bounded free list of scratch buffers, capacity `P`
#[derive(Debug, Default)]
pub struct BufferPool<const P: usize = 20> {
    free: BoundedVec<ScratchBuffer, P>,
    stats: PoolStats,
}

impl<const P: usize> BufferPool<P> {
    /// Create an empty pool; buffers are allocated lazily on first use
    pub fn new() -> Self {
        Self {
            free: BoundedVec::new(),
            stats: PoolStats::default(),
        }
    }

    /// Take a buffer: pooled if available, freshly allocated otherwise
    pub fn acquire(&mut self) -> ScratchBuffer {
        match self.free.pop() {
            Some(buffer) => {
                self.stats.reused += 1;
                buffer
            }
            None => {
                self.stats.allocated += 1;
                ScratchBuffer::new()
            }
        }
    }

    /// Return a buffer to the free list, or discard it if the pool is full
    pub fn release(&mut self, buffer: ScratchBuffer) {
        if self.free.push(buffer).is_err() {
            // Pool at capacity: let the buffer drop.
            self.stats.discarded += 1;
        }
    }

    /// Buffers currently idle in the pool
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// Whether the free list is empty
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Health counters
    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn acquire_from_empty_pool_allocates() {
        let mut pool: BufferPool<4> = BufferPool::new();
        let buffer = pool.acquire();

        assert_eq!(pool.stats().allocated, 1);
        assert_eq!(buffer.samples.len(), MAX_TRANSFORM_SIZE);
    }

    #[test]
    fn release_then_acquire_reuses() {
        let mut pool: BufferPool<4> = BufferPool::new();
        let buffer = pool.acquire();
        pool.release(buffer);
        let _again = pool.acquire();

        assert_eq!(pool.stats().reused, 1);
        assert_eq!(pool.stats().allocated, 1);
    }

    #[test]
    fn release_on_full_pool_discards() {
        let mut pool: BufferPool<2> = BufferPool::new();
        let buffers: alloc::vec::Vec<_> = (0..3).map(|_| pool.acquire()).collect();

        for buffer in buffers {
            pool.release(buffer);
        }

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn slices_narrow_to_tier_dimensions() {
        let mut buffer = ScratchBuffer::new();
        assert_eq!(buffer.samples_mut(256).len(), 256);
        assert_eq!(buffer.bands_mut(4).len(), 4);
        // Oversized requests clamp to the allocated shape
        assert_eq!(buffer.samples_mut(1 << 20).len(), MAX_TRANSFORM_SIZE);
    }

    #[test]
    fn bands_come_back_zeroed() {
        let mut buffer = ScratchBuffer::new();
        buffer.bands_mut(8).fill(7.0);

        assert!(buffer.bands_mut(8).iter().all(|&b| b == 0.0));
    }

    proptest! {
        /// The pool never exceeds its capacity for any acquire/release
        /// sequence, and N acquires followed by N releases settle at
        /// min(N, P).
        #[test]
        fn pool_size_bounded(n in 0usize..64) {
            const CAP: usize = 8;
            let mut pool: BufferPool<CAP> = BufferPool::new();

            let held: alloc::vec::Vec<_> = (0..n).map(|_| pool.acquire()).collect();
            prop_assert!(pool.len() <= CAP);

            for buffer in held {
                pool.release(buffer);
                prop_assert!(pool.len() <= CAP);
            }

            prop_assert_eq!(pool.len(), n.min(CAP));
        }

        /// Interleaved acquire/release driven by an arbitrary script keeps
        /// the invariant as well.
        #[test]
        fn pool_size_bounded_interleaved(script in proptest::collection::vec(any::<bool>(), 0..128)) {
            const CAP: usize = 4;
            let mut pool: BufferPool<CAP> = BufferPool::new();
            let mut held = alloc::vec::Vec::new();

            for acquire in script {
                if acquire {
                    held.push(pool.acquire());
                } else if let Some(buffer) = held.pop() {
                    pool.release(buffer);
                }
                prop_assert!(pool.len() <= CAP);
            }
        }
    }
}
