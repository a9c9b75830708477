use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU32, Ordering};

use crate::sample::Sample;

/// Exclusive handle to one checked-out block in a [`BlockPool`].
///
/// There is exactly one `Block` per claimed slot. Provides `Deref`/`DerefMut`
/// access to the underlying `[S; BLOCK]` samples. Dropping the handle
/// releases the slot back to the pool.
///
/// Handles are `Send` so they can move through a ring queue between the
/// producing and consuming context; whichever side currently holds the
/// handle owns the block's contents.
///
/// [`BlockPool`]: super::BlockPool
pub struct Block<'p, S: Sample, const BLOCK: usize> {
    data: *mut [S; BLOCK],
    claims: &'p AtomicU32,
    slot: u8,
}

// SAFETY: The handle is the unique accessor of its slot (bitmap claim), so
// moving it to another context moves that exclusive access with it.
unsafe impl<S: Sample, const BLOCK: usize> Send for Block<'_, S, BLOCK> {}

impl<'p, S: Sample, const BLOCK: usize> Block<'p, S, BLOCK> {
    /// Wrap a freshly claimed slot.
    ///
    /// Caller (the pool) must have just set the slot's claim bit.
    pub(super) fn new(data: *mut [S; BLOCK], claims: &'p AtomicU32, slot: u8) -> Self {
        Block { data, claims, slot }
    }

    /// Pool slot index of this block.
    pub fn slot(&self) -> u8 {
        self.slot
    }
}

impl<S: Sample, const BLOCK: usize> core::fmt::Debug for Block<'_, S, BLOCK> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Block").field("slot", &self.slot).finish()
    }
}

impl<S: Sample, const BLOCK: usize> Deref for Block<'_, S, BLOCK> {
    type Target = [S; BLOCK];

    fn deref(&self) -> &Self::Target {
        // SAFETY: We hold the slot's claim bit, so access is exclusive.
        unsafe { &*self.data }
    }
}

impl<S: Sample, const BLOCK: usize> DerefMut for Block<'_, S, BLOCK> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: We hold the slot's claim bit, so access is exclusive.
        unsafe { &mut *self.data }
    }
}

impl<S: Sample, const BLOCK: usize> Drop for Block<'_, S, BLOCK> {
    fn drop(&mut self) {
        let bit = 1u32 << (self.slot as u32);
        self.claims.fetch_and(!bit, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use crate::block::BlockPool;

    #[test]
    fn handle_moves_through_a_queue() {
        use crate::ring::RingQueue;

        let pool: BlockPool<i16, 4, 2> = BlockPool::new();
        let queue: RingQueue<_, 3> = RingQueue::new();

        let mut block = pool.claim().unwrap();
        block[0] = 77;
        queue.add(block).unwrap();
        assert_eq!(pool.claimed_count(), 1); // still checked out while queued

        let block = queue.remove().unwrap();
        assert_eq!(block[0], 77);
        drop(block);
        assert_eq!(pool.claimed_count(), 0);
    }

    #[test]
    fn queue_reset_releases_queued_blocks() {
        use crate::ring::RingQueue;

        let pool: BlockPool<i16, 4, 3> = BlockPool::new();
        let queue: RingQueue<_, 4> = RingQueue::new();

        queue.add(pool.claim().unwrap()).unwrap();
        queue.add(pool.claim().unwrap()).unwrap();
        assert_eq!(pool.claimed_count(), 2);

        queue.reset();
        assert_eq!(pool.claimed_count(), 0);
    }
}
