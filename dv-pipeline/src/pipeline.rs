//! Pipeline driver: the per-invocation state machine that moves samples
//! between the front-end queues and the voice codec.
//!
//! The driver is polled at a fixed service rate from a low-priority loop
//! while the front end produces and consumes blocks from interrupt context.
//! There is no blocking primitive anywhere: whenever a queue runs dry or
//! fills up mid-transfer the driver simply returns, and the flex cursors
//! carry enough state for the next poll to resume exactly where this one
//! stopped. A transmit/receive flip is the one exception — it is a hard
//! reset that discards partial work in favor of a fast mode change.

use crate::block::{Block, BlockPool};
use crate::codec::VoiceCodec;
use crate::constants::{
    AUDIO_POOL_BLOCKS, AUDIO_QUEUE_SLOTS, BLOCK_SAMPLES, DECODE_SCRATCH_MAX, IQ_POOL_BLOCKS,
    IQ_QUEUE_SLOTS,
};
use crate::flex::{assemble_request, distribute_response, FlexCursor, Transfer};
use crate::ring::RingQueue;
use crate::sample::{AudioSample, IqSample, Sample};

/// Pool of IQ sample blocks shared between the RF front end and the driver.
pub type IqPool = BlockPool<IqSample, BLOCK_SAMPLES, IQ_POOL_BLOCKS>;

/// Pool of audio sample blocks shared between the audio front end and the driver.
pub type AudioPool = BlockPool<AudioSample, BLOCK_SAMPLES, AUDIO_POOL_BLOCKS>;

/// Exclusive handle to one IQ block.
pub type IqBlock<'p> = Block<'p, IqSample, BLOCK_SAMPLES>;

/// Exclusive handle to one audio block.
pub type AudioBlock<'p> = Block<'p, AudioSample, BLOCK_SAMPLES>;

/// SPSC queue of IQ blocks (front end ⇄ driver).
pub type IqQueue<'p> = RingQueue<IqBlock<'p>, IQ_QUEUE_SLOTS>;

/// SPSC queue of audio blocks (driver ⇄ front end).
pub type AudioQueue<'p> = RingQueue<AudioBlock<'p>, AUDIO_QUEUE_SLOTS>;

/// Current transceiver mode. Owned by the surrounding rig control code and
/// read once per [`poll()`](DvPipeline::poll); the pipeline never mutates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrxMode {
    Tx,
    Rx,
}

/// How hard the receive path drains its queues per poll.
///
/// The original firmware left this unresolved (a `while` loop shipped, with
/// an `if` variant commented as "may give more responsiveness"); here it is
/// an explicit configuration decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Keep decoding while input data and output room last (shipped
    /// behavior of the original).
    #[default]
    Greedy,
    /// At most one decode round per poll; trades throughput headroom for a
    /// shorter worst-case poll.
    OnePerPoll,
}

/// Pipeline tuning knobs.
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineConfig {
    pub rx_drain: DrainPolicy,
}

impl PipelineConfig {
    pub const fn new() -> Self {
        PipelineConfig {
            rx_drain: DrainPolicy::Greedy,
        }
    }
}

/// The digital-voice pipeline driver.
///
/// Owns the codec, all transfer bookkeeping and the decode scratch buffers;
/// borrows the two pools and two queues it shares with the front end. All
/// state that survives between polls lives in named fields — there are no
/// hidden persistent locals.
pub struct DvPipeline<'p, 'q, C: VoiceCodec> {
    codec: C,
    config: PipelineConfig,
    iq_pool: &'p IqPool,
    audio_pool: &'p AudioPool,
    iq_queue: &'q IqQueue<'p>,
    audio_queue: &'q AudioQueue<'p>,
    /// Input-side flex cursor (IQ blocks → decode request buffer).
    in_cursor: FlexCursor,
    /// Output-side flex cursor (decode output → audio blocks).
    out_cursor: FlexCursor,
    /// Round-robin claim hint into whichever pool the current mode fills.
    block_cursor: usize,
    /// Audio block currently being filled by output distribution.
    staged_audio: Option<AudioBlock<'p>>,
    /// Sticky mode flags for transition-edge detection.
    was_tx: bool,
    was_rx: bool,
    /// Decode scratch: sized above one block because `nin` drifts.
    iq_scratch: [IqSample; DECODE_SCRATCH_MAX],
    audio_scratch: [AudioSample; DECODE_SCRATCH_MAX],
}

impl<'p, 'q, C: VoiceCodec> DvPipeline<'p, 'q, C> {
    pub fn new(
        codec: C,
        config: PipelineConfig,
        iq_pool: &'p IqPool,
        audio_pool: &'p AudioPool,
        iq_queue: &'q IqQueue<'p>,
        audio_queue: &'q AudioQueue<'p>,
    ) -> Self {
        DvPipeline {
            codec,
            config,
            iq_pool,
            audio_pool,
            iq_queue,
            audio_queue,
            in_cursor: FlexCursor::new(),
            out_cursor: FlexCursor::new(),
            block_cursor: 0,
            staged_audio: None,
            was_tx: false,
            was_rx: false,
            iq_scratch: [IqSample::SILENCE; DECODE_SCRATCH_MAX],
            audio_scratch: [AudioSample::SILENCE; DECODE_SCRATCH_MAX],
        }
    }

    /// Access the codec stage (e.g. for error-rate telemetry).
    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn codec_mut(&mut self) -> &mut C {
        &mut self.codec
    }

    /// Run one pipeline invocation for the given transceiver mode.
    ///
    /// Never blocks; any work that cannot finish this poll resumes on the
    /// next one.
    pub fn poll(&mut self, mode: TrxMode) {
        let edge = (self.was_tx && mode == TrxMode::Rx) || (self.was_rx && mode == TrxMode::Tx);
        if edge {
            self.reset_in_flight();
        }

        match mode {
            TrxMode::Tx => self.poll_tx(),
            TrxMode::Rx => self.poll_rx(),
        }
    }

    /// Hard reset at a mode-transition edge: both queues, both cursors, the
    /// block cursor and any staged block are discarded. Partial audio is
    /// deliberately lost — a fast transition beats draining stale samples.
    fn reset_in_flight(&mut self) {
        #[cfg(feature = "log")]
        log::debug!("trx mode edge: discarding in-flight pipeline state");

        self.was_tx = false;
        self.was_rx = false;
        self.block_cursor = 0;
        self.in_cursor.reset();
        self.out_cursor.reset();
        self.staged_audio = None;
        // The front end is quiescent across the edge, so the consumer-side
        // reset is legal on both queues (see the ring module contract).
        self.iq_queue.reset();
        self.audio_queue.reset();
    }

    /// Transmit: one audio block in, exactly one encoded IQ block out.
    fn poll_tx(&mut self) {
        self.was_tx = true;

        if self.audio_queue.is_empty() || self.iq_queue.room() == 0 {
            return; // nothing to do this cycle; no busy-waiting
        }

        let hint = self.block_cursor % IQ_POOL_BLOCKS;
        let Some(mut iq_out) = self.iq_pool.claim_from(hint) else {
            return; // every IQ block is in flight; retry next cycle
        };
        let Some(audio_in) = self.audio_queue.remove() else {
            return; // sole consumer, cannot happen after the is_empty check
        };

        self.codec.encode(&mut iq_out[..], &audio_in[..]);
        drop(audio_in);

        let pushed = self.iq_queue.add(iq_out).is_ok();
        debug_assert!(pushed, "room was checked and we are the sole producer");
        self.block_cursor = (self.block_cursor + 1) % IQ_POOL_BLOCKS;
    }

    /// Receive: assemble `nin` IQ samples, decode, distribute the produced
    /// audio into fixed blocks. Loops while input and room last.
    fn poll_rx(&mut self) {
        if !self.was_rx {
            // First receive poll after a transition: error statistics
            // restart so the rate reflects the current over.
            self.codec.reset_error_totals();
        }
        self.was_rx = true;

        while !self.iq_queue.is_empty() && self.audio_queue.room() > 0 {
            let before = self.progress_marker();

            let nin = self.codec.nin();
            debug_assert!(nin <= DECODE_SCRATCH_MAX, "codec request exceeds scratch");
            let nin = nin.min(DECODE_SCRATCH_MAX);
            self.in_cursor.count = nin;

            if assemble_request(
                &mut self.in_cursor,
                self.iq_queue,
                &mut self.iq_scratch[..nin],
            ) == Transfer::Stalled
            {
                break; // input exhausted mid-request; resume next poll
            }

            if self.out_cursor.count == 0 {
                // The assembled request is consumed exactly once; clearing
                // the input cursor here re-arms assembly for the next nin.
                self.in_cursor.offset = 0;
                self.in_cursor.count = 0;
                let produced = self
                    .codec
                    .decode(&mut self.audio_scratch[..], &self.iq_scratch[..nin]);
                debug_assert!(produced <= DECODE_SCRATCH_MAX);
                self.out_cursor.count = produced.min(DECODE_SCRATCH_MAX);
                self.out_cursor.offset = 0;
            }

            let count = self.out_cursor.count;
            if distribute_response(
                &mut self.out_cursor,
                &self.audio_scratch[..count],
                &mut self.staged_audio,
                self.audio_pool,
                self.audio_queue,
                &mut self.block_cursor,
            ) == Transfer::Stalled
            {
                break; // output backpressure; state is kept for resumption
            }

            if self.config.rx_drain == DrainPolicy::OnePerPoll {
                break;
            }
            if self.progress_marker() == before {
                break; // bounded even for degenerate requests (nin == 0)
            }
        }
    }

    /// Snapshot of everything a receive round can advance; used to bound
    /// the drain loop.
    fn progress_marker(&self) -> (usize, usize, usize, usize, usize, usize, usize) {
        (
            self.in_cursor.start,
            self.in_cursor.offset,
            self.out_cursor.start,
            self.out_cursor.offset,
            self.out_cursor.count,
            self.iq_queue.len(),
            self.audio_queue.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LoopbackCodec;

    fn fill_audio_block(pool: &AudioPool, base: i16) -> AudioBlock<'_> {
        let mut block = pool.claim().unwrap();
        for (i, s) in block.iter_mut().enumerate() {
            *s = base + i as i16;
        }
        block
    }

    #[test]
    fn tx_encodes_one_block_per_poll() {
        let iq_pool = IqPool::new();
        let audio_pool = AudioPool::new();
        let iq_queue = IqQueue::new();
        let audio_queue = AudioQueue::new();
        let mut pipeline = DvPipeline::new(
            LoopbackCodec::new(BLOCK_SAMPLES),
            PipelineConfig::new(),
            &iq_pool,
            &audio_pool,
            &iq_queue,
            &audio_queue,
        );

        audio_queue.add(fill_audio_block(&audio_pool, 100)).unwrap();
        audio_queue.add(fill_audio_block(&audio_pool, 200)).unwrap();

        pipeline.poll(TrxMode::Tx);
        assert_eq!(iq_queue.len(), 1);
        assert_eq!(audio_queue.len(), 1);

        pipeline.poll(TrxMode::Tx);
        assert_eq!(iq_queue.len(), 2);
        assert_eq!(audio_queue.len(), 0);

        let first = iq_queue.remove().unwrap();
        assert_eq!(first[0].re, 100.0);
        assert_eq!(first[5].re, 105.0);
        let second = iq_queue.remove().unwrap();
        assert_eq!(second[0].re, 200.0);
    }

    #[test]
    fn tx_without_input_or_room_does_nothing() {
        let iq_pool = IqPool::new();
        let audio_pool = AudioPool::new();
        let iq_queue = IqQueue::new();
        let audio_queue = AudioQueue::new();
        let mut pipeline = DvPipeline::new(
            LoopbackCodec::new(BLOCK_SAMPLES),
            PipelineConfig::new(),
            &iq_pool,
            &audio_pool,
            &iq_queue,
            &audio_queue,
        );

        // No audio queued: nothing happens.
        pipeline.poll(TrxMode::Tx);
        assert!(iq_queue.is_empty());

        // IQ queue full: the audio block stays queued, nothing is lost.
        for _ in 0..iq_queue.capacity() {
            iq_queue.add(iq_pool.claim().unwrap()).unwrap();
        }
        audio_queue.add(fill_audio_block(&audio_pool, 1)).unwrap();
        pipeline.poll(TrxMode::Tx);
        assert_eq!(audio_queue.len(), 1);
    }

    #[test]
    fn mode_edge_resets_queues_cursors_and_stats() {
        let iq_pool = IqPool::new();
        let audio_pool = AudioPool::new();
        let iq_queue = IqQueue::new();
        let audio_queue = AudioQueue::new();
        let mut codec = LoopbackCodec::new(BLOCK_SAMPLES);
        codec.set_error_totals(9, 1000);
        let mut pipeline = DvPipeline::new(
            codec,
            PipelineConfig::new(),
            &iq_pool,
            &audio_pool,
            &iq_queue,
            &audio_queue,
        );

        // Transmit one block so the sticky TX flag is set and state exists.
        audio_queue.add(fill_audio_block(&audio_pool, 7)).unwrap();
        pipeline.poll(TrxMode::Tx);
        assert_eq!(iq_queue.len(), 1);

        // Flip to receive: everything in flight is discarded and the codec
        // error totals restart.
        pipeline.poll(TrxMode::Rx);
        assert!(iq_queue.is_empty());
        assert!(audio_queue.is_empty());
        assert!(pipeline.in_cursor.is_idle());
        assert!(pipeline.out_cursor.is_idle());
        assert!(pipeline.staged_audio.is_none());
        assert_eq!(pipeline.block_cursor, 0);
        assert_eq!(pipeline.codec().total_bits(), 0);
        assert_eq!(pipeline.codec().total_bit_errors(), 0);
    }

    #[test]
    fn rx_to_tx_edge_resets_without_touching_stats() {
        let iq_pool = IqPool::new();
        let audio_pool = AudioPool::new();
        let iq_queue = IqQueue::new();
        let audio_queue = AudioQueue::new();
        let mut pipeline = DvPipeline::new(
            LoopbackCodec::new(BLOCK_SAMPLES),
            PipelineConfig::new(),
            &iq_pool,
            &audio_pool,
            &iq_queue,
            &audio_queue,
        );

        pipeline.poll(TrxMode::Rx); // arms the sticky RX flag
        iq_queue.add(iq_pool.claim().unwrap()).unwrap();

        pipeline.codec_mut().set_error_totals(3, 50);
        pipeline.poll(TrxMode::Tx);
        assert!(iq_queue.is_empty(), "edge into TX drains the IQ queue");
        // No statistics reset on the TX edge.
        assert_eq!(pipeline.codec().total_bits(), 50);
    }
}
