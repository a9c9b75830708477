//! Lock-free single-producer single-consumer ring queue of block handles.
//!
//! One instance carries IQ blocks from the RF front end to the pipeline
//! driver, a second carries audio blocks back the other way. The queue never
//! blocks, never allocates, and is safe to drive from an interrupt context
//! on one side and a low-priority service loop on the other.
//!
//! # Safety Contract
//!
//! - Only ONE context may call [`add()`](RingQueue::add) (the "producer").
//! - Only ONE context may call [`remove()`](RingQueue::remove) /
//!   [`peek()`](RingQueue::peek) (the "consumer").
//! - [`reset()`](RingQueue::reset) is a consumer-side operation and is only
//!   legal while the producer is quiescent — in this pipeline that is the
//!   transmit/receive mode transition, where both sides agree to discard
//!   in-flight work.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

/// A lock-free SPSC queue with `N` slots and `N - 1` usable capacity.
///
/// One slot stays reserved so that "full" and "empty" are distinguishable
/// from the head and tail indices alone (Lamport queue).
///
/// # Type Parameters
///
/// - `T`: The element type. Must be `Send` for cross-context safety.
/// - `N`: Total number of slots. Usable capacity is `N - 1`. Must be ≥ 2.
pub struct RingQueue<T, const N: usize> {
    buffer: [UnsafeCell<MaybeUninit<T>>; N],
    /// Write position (only modified by the producer).
    head: AtomicUsize,
    /// Read position (only modified by the consumer).
    tail: AtomicUsize,
}

// SAFETY: T: Send is required because values cross thread/ISR boundaries.
// The SPSC contract (single producer, single consumer) ensures that
// head and tail are only modified by their respective sides, and
// atomic ordering guarantees visibility of buffer writes.
unsafe impl<T: Send, const N: usize> Sync for RingQueue<T, N> {}
unsafe impl<T: Send, const N: usize> Send for RingQueue<T, N> {}

impl<T, const N: usize> RingQueue<T, N> {
    /// Create a new empty queue.
    ///
    /// # Panics
    ///
    /// Compile-time assertion: `N` must be at least 2 (usable capacity is `N - 1`).
    pub const fn new() -> Self {
        assert!(N >= 2, "ring queue must have at least 2 slots (1 usable)");

        RingQueue {
            // SAFETY: An array of uninitialized MaybeUninit<T> is always valid.
            // UnsafeCell is a transparent wrapper that doesn't affect validity.
            buffer: unsafe {
                MaybeUninit::<[UnsafeCell<MaybeUninit<T>>; N]>::uninit().assume_init()
            },
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Number of usable slots (`N - 1`).
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Append a value (producer side).
    ///
    /// Returns `Err(val)` without mutation if the queue is full, handing
    /// ownership back to the caller, who may hold or drop the block.
    pub fn add(&self, val: T) -> Result<(), T> {
        let head = self.head.load(Ordering::Relaxed);
        let next_head = (head + 1) % N;

        if next_head == self.tail.load(Ordering::Acquire) {
            return Err(val); // Queue is full
        }

        // SAFETY: We are the sole producer and `head` is only advanced by us.
        // `next_head != tail` guarantees this slot is not occupied by the consumer.
        unsafe {
            (*self.buffer[head].get()).write(val);
        }

        // Release ordering ensures the buffer write is visible before head advances.
        self.head.store(next_head, Ordering::Release);
        Ok(())
    }

    /// Borrow the oldest value without removing it (consumer side).
    ///
    /// Returns `None` if the queue is empty. No side effects: the element
    /// stays at the front until [`remove()`](Self::remove).
    pub fn peek(&self) -> Option<&T> {
        let tail = self.tail.load(Ordering::Relaxed);

        if tail == self.head.load(Ordering::Acquire) {
            return None; // Queue is empty
        }

        // SAFETY: We are the sole consumer, so the tail slot cannot be
        // reused by the producer while it is still unread. `tail != head`
        // guarantees it holds an initialized value.
        Some(unsafe { (*self.buffer[tail].get()).assume_init_ref() })
    }

    /// Take the oldest value (consumer side).
    ///
    /// Returns `None` if the queue is empty.
    pub fn remove(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);

        if tail == self.head.load(Ordering::Acquire) {
            return None; // Queue is empty
        }

        // SAFETY: We are the sole consumer and `tail` is only advanced by us.
        // `tail != head` guarantees this slot contains a valid value.
        let val = unsafe { (*self.buffer[tail].get()).assume_init_read() };

        // Release ordering ensures the read completes before tail advances,
        // freeing the slot for the producer.
        self.tail.store((tail + 1) % N, Ordering::Release);
        Some(val)
    }

    /// Logically empty the queue by draining and dropping every element.
    ///
    /// Consumer-side. Only legal at a mode-transition edge (see the module
    /// safety contract) — during steady-state operation it would destroy
    /// in-flight data.
    pub fn reset(&self) {
        while self.remove().is_some() {}
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Acquire) == self.head.load(Ordering::Acquire)
    }

    /// Check if the queue is full.
    pub fn is_full(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + 1) % N == tail
    }

    /// Number of elements currently queued.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + N - tail) % N
    }

    /// Number of free usable slots. `len() + room() == capacity()` always.
    pub fn room(&self) -> usize {
        self.capacity() - self.len()
    }
}

impl<T, const N: usize> Drop for RingQueue<T, N> {
    fn drop(&mut self) {
        // Drop any remaining items to avoid leaks.
        while self.remove().is_some() {}
    }
}
