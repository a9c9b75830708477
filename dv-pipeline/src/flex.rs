//! Partial-block accounting between fixed-size blocks and variable-size
//! codec transfers.
//!
//! The codec consumes and produces sample counts that differ from the block
//! size and vary call-to-call, so blocks have to be split and reassembled.
//! A [`FlexCursor`] remembers how far a transfer has progressed; both
//! [`assemble_request`] and [`distribute_response`] are *resumable*: an
//! early [`Transfer::Stalled`] return leaves the cursor positioned so the
//! next call continues exactly where this one stopped, with no sample
//! duplicated or dropped. That property is what the whole pipeline's
//! correctness rests on.

use crate::block::{Block, BlockPool};
use crate::ring::RingQueue;
use crate::sample::Sample;

/// Progress bookkeeping for one direction of the codec boundary.
///
/// - `start`: first unconsumed (or next-to-fill) sample index within the
///   current source/sink block.
/// - `offset`: samples already moved into/out of the transfer buffer this
///   round.
/// - `count`: total size of the current transfer (for the decode-output
///   side, the number of samples the codec produced this call).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlexCursor {
    pub start: usize,
    pub offset: usize,
    pub count: usize,
}

impl FlexCursor {
    pub const fn new() -> Self {
        FlexCursor {
            start: 0,
            offset: 0,
            count: 0,
        }
    }

    /// Zero all fields. Used at mode-transition edges, which deliberately
    /// discard partial progress.
    pub fn reset(&mut self) {
        *self = FlexCursor::new();
    }

    /// `true` when no transfer is in flight.
    pub fn is_idle(&self) -> bool {
        self.start == 0 && self.offset == 0 && self.count == 0
    }
}

/// Outcome of one resumable transfer pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transfer {
    /// The requested amount was moved in full.
    Done,
    /// The source ran dry or the sink filled up. Cursor state is preserved;
    /// call again on a later cycle to continue.
    Stalled,
}

/// Fill `request` from fixed-size blocks at the front of `source`.
///
/// A block whose samples are only partially needed stays in the queue, with
/// `cursor.start` marking the resume position inside it; a fully drained
/// block is removed and its handle dropped (releasing the pool slot back to
/// the producer). Returns [`Transfer::Done`] exactly when
/// `cursor.offset == request.len()` — the caller never sees a partially
/// filled request reported complete, so the codec is never invoked short.
///
/// The loop is bounded: every iteration either completes the request,
/// removes one block, or stalls.
pub fn assemble_request<'p, S: Sample, const BLOCK: usize, const QN: usize>(
    cursor: &mut FlexCursor,
    source: &RingQueue<Block<'p, S, BLOCK>, QN>,
    request: &mut [S],
) -> Transfer {
    while cursor.offset != request.len() {
        let Some(front) = source.peek() else {
            // Out of input mid-request. Progress so far stays in the cursor.
            return Transfer::Stalled;
        };

        let need = request.len() - cursor.offset;
        let avail = BLOCK - cursor.start;

        if need >= avail {
            // The rest of this block is consumed entirely.
            request[cursor.offset..cursor.offset + avail]
                .copy_from_slice(&front[cursor.start..]);
            cursor.offset += avail;
            cursor.start = 0;
            drop(source.remove());
        } else {
            // The block outlasts the request: take what is needed and leave
            // the block queued, holding position in `start`.
            request[cursor.offset..cursor.offset + need]
                .copy_from_slice(&front[cursor.start..cursor.start + need]);
            cursor.start += need;
            cursor.offset += need;
        }
    }
    Transfer::Done
}

/// Split `produced` (the codec's output for this round) into fixed-size
/// blocks pushed onto `sink`.
///
/// `staged` holds the block currently being filled across calls; a filled
/// block is pushed and a fresh one claimed from `pool`, scanning from
/// `hint` (advanced round-robin). Stalls when the sink has no room for a
/// completed block or the pool has no free slot; `cursor.offset`/`start`
/// keep the resume position so no sample is re-derived or discarded.
pub fn distribute_response<'p, S: Sample, const BLOCK: usize, const QN: usize, const PN: usize>(
    cursor: &mut FlexCursor,
    produced: &[S],
    staged: &mut Option<Block<'p, S, BLOCK>>,
    pool: &'p BlockPool<S, BLOCK, PN>,
    sink: &RingQueue<Block<'p, S, BLOCK>, QN>,
    hint: &mut usize,
) -> Transfer {
    debug_assert_eq!(produced.len(), cursor.count);

    while cursor.count > cursor.offset {
        let block = match staged.as_mut() {
            Some(block) => block,
            None => match pool.claim_from(*hint) {
                Some(fresh) => staged.insert(fresh),
                None => return Transfer::Stalled,
            },
        };

        let pending = cursor.count - cursor.offset;
        let room_in_block = BLOCK - cursor.start;

        if pending >= room_in_block {
            // This copy completes the staged block; make sure it can be
            // pushed before committing the samples.
            if sink.room() == 0 {
                return Transfer::Stalled;
            }
            block[cursor.start..]
                .copy_from_slice(&produced[cursor.offset..cursor.offset + room_in_block]);
            cursor.offset += room_in_block;
            cursor.start = 0;
            if let Some(full) = staged.take() {
                let pushed = sink.add(full).is_ok();
                debug_assert!(pushed, "room was checked and we are the sole producer");
            }
            *hint = (*hint + 1) % PN;
        } else {
            // Output exhausted mid-block: the remainder stays pending in the
            // staged block for the next round.
            block[cursor.start..cursor.start + pending]
                .copy_from_slice(&produced[cursor.offset..]);
            cursor.start += pending;
            break;
        }
    }

    cursor.offset = 0;
    cursor.count = 0;
    Transfer::Done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockPool;
    use crate::ring::RingQueue;

    // Small geometry for readable tests: 4 blocks of 4 samples, queue
    // capacity 4.
    type Pool = BlockPool<i16, 4, 4>;
    type Queue<'p> = RingQueue<Block<'p, i16, 4>, 5>;

    fn push_block<'p>(pool: &'p Pool, queue: &Queue<'p>, samples: [i16; 4]) {
        let mut block = pool.claim().unwrap();
        block.copy_from_slice(&samples);
        queue.add(block).unwrap();
    }

    #[test]
    fn assembly_spans_blocks_and_keeps_partial_block_queued() {
        let pool = Pool::new();
        let queue = Queue::new();
        push_block(&pool, &queue, [1, 2, 3, 4]);
        push_block(&pool, &queue, [5, 6, 7, 8]);

        let mut cursor = FlexCursor::new();
        let mut request = [0i16; 6];
        assert_eq!(
            assemble_request(&mut cursor, &queue, &mut request),
            Transfer::Done
        );

        assert_eq!(request, [1, 2, 3, 4, 5, 6]);
        // Two samples into the second block, which is still queued.
        assert_eq!(cursor.start, 2);
        assert_eq!(cursor.offset, 6);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek().unwrap()[0], 5);
        // The drained first block went back to the pool.
        assert_eq!(pool.claimed_count(), 1);
    }

    #[test]
    fn partial_assembly_resumes_without_recopying() {
        let pool = Pool::new();
        let queue = Queue::new();
        push_block(&pool, &queue, [1, 2, 3, 4]);

        let mut cursor = FlexCursor::new();
        let mut request = [0i16; 6];

        // Only four of six samples available: stall, progress preserved.
        assert_eq!(
            assemble_request(&mut cursor, &queue, &mut request),
            Transfer::Stalled
        );
        assert_eq!(cursor.offset, 4);
        assert_eq!(cursor.start, 0);
        assert!(queue.is_empty());

        // Second half arrives; the request completes exactly once and each
        // source sample is consumed exactly once.
        push_block(&pool, &queue, [5, 6, 7, 8]);
        assert_eq!(
            assemble_request(&mut cursor, &queue, &mut request),
            Transfer::Done
        );
        assert_eq!(request, [1, 2, 3, 4, 5, 6]);
        assert_eq!(cursor.start, 2);
    }

    #[test]
    fn request_equal_to_block_remainder_completes_and_removes() {
        let pool = Pool::new();
        let queue = Queue::new();
        push_block(&pool, &queue, [1, 2, 3, 4]);

        let mut cursor = FlexCursor::new();
        let mut request = [0i16; 4];
        assert_eq!(
            assemble_request(&mut cursor, &queue, &mut request),
            Transfer::Done
        );
        assert_eq!(request, [1, 2, 3, 4]);
        assert_eq!(cursor.start, 0);
        assert!(queue.is_empty());
        assert_eq!(pool.claimed_count(), 0);
    }

    #[test]
    fn zero_length_request_is_trivially_done() {
        let pool = Pool::new();
        let queue = Queue::new();
        push_block(&pool, &queue, [1, 2, 3, 4]);

        let mut cursor = FlexCursor::new();
        let mut request = [0i16; 0];
        assert_eq!(
            assemble_request(&mut cursor, &queue, &mut request),
            Transfer::Done
        );
        assert_eq!(queue.len(), 1);
        assert!(cursor.is_idle());
    }

    #[test]
    fn assembly_on_empty_queue_stalls_immediately() {
        let _pool = Pool::new();
        let queue = Queue::new();
        let mut cursor = FlexCursor::new();
        let mut request = [0i16; 3];
        assert_eq!(
            assemble_request(&mut cursor, &queue, &mut request),
            Transfer::Stalled
        );
        assert!(cursor.is_idle());
    }

    #[test]
    fn distribution_fills_blocks_and_stages_remainder() {
        let pool = Pool::new();
        let sink = Queue::new();
        let mut cursor = FlexCursor::new();
        let mut staged = None;
        let mut hint = 0;

        let produced = [10i16, 11, 12, 13, 14, 15];
        cursor.count = produced.len();
        assert_eq!(
            distribute_response(&mut cursor, &produced, &mut staged, &pool, &sink, &mut hint),
            Transfer::Done
        );

        // One complete block pushed, two samples staged for the next round.
        assert_eq!(sink.len(), 1);
        assert_eq!(**sink.peek().unwrap(), [10, 11, 12, 13]);
        assert_eq!(cursor.start, 2);
        assert_eq!(cursor.offset, 0);
        assert_eq!(cursor.count, 0);
        let staged_block = staged.as_ref().unwrap();
        assert_eq!(staged_block[..2], [14, 15]);
    }

    #[test]
    fn distribution_stalls_on_full_sink_and_resumes() {
        let pool = Pool::new();
        let sink: RingQueue<Block<'_, i16, 4>, 2> = RingQueue::new(); // capacity 1
        let mut cursor = FlexCursor::new();
        let mut staged = None;
        let mut hint = 0;

        let produced = [1i16, 2, 3, 4, 5, 6, 7, 8];
        cursor.count = produced.len();

        // First block fits, second has no room: stall mid-transfer.
        assert_eq!(
            distribute_response(&mut cursor, &produced, &mut staged, &pool, &sink, &mut hint),
            Transfer::Stalled
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(cursor.offset, 4);

        // Consumer drains; the resumed pass moves the rest exactly once.
        assert_eq!(**sink.remove().as_ref().unwrap(), [1, 2, 3, 4]);
        assert_eq!(
            distribute_response(&mut cursor, &produced, &mut staged, &pool, &sink, &mut hint),
            Transfer::Done
        );
        assert_eq!(**sink.remove().as_ref().unwrap(), [5, 6, 7, 8]);
        assert!(staged.is_none());
    }

    #[test]
    fn distribution_resumes_mid_block_across_rounds() {
        let pool = Pool::new();
        let sink = Queue::new();
        let mut cursor = FlexCursor::new();
        let mut staged = None;
        let mut hint = 0;

        // Round one: three samples, block not yet full.
        let first = [1i16, 2, 3];
        cursor.count = first.len();
        assert_eq!(
            distribute_response(&mut cursor, &first, &mut staged, &pool, &sink, &mut hint),
            Transfer::Done
        );
        assert!(sink.is_empty());
        assert_eq!(cursor.start, 3);

        // Round two: the next sample completes the block.
        let second = [4i16];
        cursor.count = second.len();
        assert_eq!(
            distribute_response(&mut cursor, &second, &mut staged, &pool, &sink, &mut hint),
            Transfer::Done
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(**sink.peek().unwrap(), [1, 2, 3, 4]);
        assert_eq!(cursor.start, 0);
    }

    #[test]
    fn distribution_of_empty_output_is_a_no_op() {
        let pool = Pool::new();
        let sink = Queue::new();
        let mut cursor = FlexCursor::new();
        let mut staged = None;
        let mut hint = 0;

        assert_eq!(
            distribute_response(&mut cursor, &[], &mut staged, &pool, &sink, &mut hint),
            Transfer::Done
        );
        assert!(sink.is_empty());
        assert!(staged.is_none());
    }
}
