/// Number of samples per transfer block, on both the IQ and the audio side.
///
/// One block is 40 ms of speech at the 8 kHz codec rate.
pub const BLOCK_SAMPLES: usize = 320;

/// Usable capacity of the IQ block queue.
pub const IQ_QUEUE_BLOCKS: usize = 4;

/// Usable capacity of the audio block queue.
pub const AUDIO_QUEUE_BLOCKS: usize = 5;

/// Ring slots backing the IQ queue (one sentinel slot on top of capacity).
pub const IQ_QUEUE_SLOTS: usize = IQ_QUEUE_BLOCKS + 1;

/// Ring slots backing the audio queue (one sentinel slot on top of capacity).
pub const AUDIO_QUEUE_SLOTS: usize = AUDIO_QUEUE_BLOCKS + 1;

/// Blocks in the IQ pool: queue capacity plus one block that may be staged
/// (filling or draining) outside the queue at any time.
pub const IQ_POOL_BLOCKS: usize = IQ_QUEUE_BLOCKS + 1;

/// Blocks in the audio pool, sized like [`IQ_POOL_BLOCKS`].
pub const AUDIO_POOL_BLOCKS: usize = AUDIO_QUEUE_BLOCKS + 1;

/// Upper bound on the codec's per-call input request and output production.
///
/// The decoder's `nin` drifts around one block as it tracks the remote
/// sample clock, so the scratch buffers must be larger than a single block.
pub const DECODE_SCRATCH_MAX: usize = 2 * BLOCK_SAMPLES;
