use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::sample::Sample;

use super::handle::Block;

/// Lock-free pool of `N` sample blocks of `BLOCK` samples each.
///
/// Storage is created once and never grows. An atomic bitmap tracks which
/// slots are currently checked out; [`claim_from()`](Self::claim_from) hands
/// out exclusive [`Block`] handles and dropping a handle returns its slot.
/// All operations are lock-free and safe to call from an interrupt context.
pub struct BlockPool<S: Sample, const BLOCK: usize, const N: usize> {
    /// Bitmap: bit N = 1 means slot N is checked out.
    claims: AtomicU32,
    /// Block storage.
    storage: UnsafeCell<[[S; BLOCK]; N]>,
}

// SAFETY: The claim bitmap is atomic, and the UnsafeCell storage is only
// reachable through a Block handle, which holds the slot exclusively from
// the bitmap claim until its Drop releases it.
unsafe impl<S: Sample, const BLOCK: usize, const N: usize> Sync for BlockPool<S, BLOCK, N> {}

impl<S: Sample, const BLOCK: usize, const N: usize> BlockPool<S, BLOCK, N> {
    /// Create a new pool. All slots start free and silent.
    ///
    /// # Panics
    ///
    /// Compile-time assertion: `1 <= N <= 32` (the claim bitmap is one `u32`).
    pub const fn new() -> Self {
        assert!(N >= 1, "block pool needs at least one block");
        assert!(N <= 32, "claim bitmap holds at most 32 blocks");

        let silent = [S::SILENCE; BLOCK];
        BlockPool {
            claims: AtomicU32::new(0),
            storage: UnsafeCell::new([silent; N]),
        }
    }

    /// Number of blocks in the pool.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Samples per block.
    pub const fn block_len(&self) -> usize {
        BLOCK
    }

    /// Claim the first free block. Returns `None` if every slot is checked out.
    pub fn claim(&self) -> Option<Block<'_, S, BLOCK>> {
        self.claim_from(0)
    }

    /// Claim a free block, scanning from `hint % N` and wrapping.
    ///
    /// The returned block is zeroed to `S::SILENCE`. `None` means every slot
    /// is checked out — backpressure, not an error; the caller retries on a
    /// later cycle.
    pub fn claim_from(&self, hint: usize) -> Option<Block<'_, S, BLOCK>> {
        let start = hint % N;
        for step in 0..N {
            let slot = (start + step) % N;
            let bit = 1u32 << slot;
            if self.claims.fetch_or(bit, Ordering::AcqRel) & bit == 0 {
                // Slot claimed — hand out an exclusive handle over silence.
                // SAFETY: The bitmap transition 0 -> 1 for this bit grants us
                // exclusive access to the slot until the handle is dropped.
                let data = unsafe {
                    let base = self.storage.get() as *mut [S; BLOCK];
                    let ptr = base.add(slot);
                    (*ptr) = [S::SILENCE; BLOCK];
                    ptr
                };
                return Some(Block::new(data, &self.claims, slot as u8));
            }
        }
        None
    }

    /// Number of blocks currently checked out.
    pub fn claimed_count(&self) -> u32 {
        self.claims.load(Ordering::Acquire).count_ones()
    }
}
