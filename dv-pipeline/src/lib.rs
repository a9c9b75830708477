//! # dv-pipeline
//!
//! A `no_std`, zero-allocation sample pipeline for the digital-voice
//! subsystem of an SDR transceiver. It sits between interrupt-driven audio
//! and RF front ends and a variable-rate voice codec, moving fixed-size
//! sample blocks through lock-free queues and bridging them to the codec's
//! variable-length requests without ever blocking or allocating.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Memory | [`block`] | Fixed-size sample block pool with exclusive handles |
//! | Transport | [`ring`] | Lock-free SPSC queue of block handles |
//! | Bridging | [`flex`] | Flex cursors: fixed blocks ⇄ variable codec requests |
//! | Codec | [`codec`] | [`VoiceCodec`](codec::VoiceCodec) trait and loopback test codec |
//! | Driver | [`pipeline`] | Polled TX/RX state machine with mode-edge resets |
//! | Text | [`text`] | Over-the-air text side channel (feature-gated) |
//! | Telemetry | [`stats`] | BER and smoothed SNR for display (feature-gated) |
//!
//! ## Quick start
//!
//! ```ignore
//! use dv_pipeline::codec::LoopbackCodec;
//! use dv_pipeline::constants::BLOCK_SAMPLES;
//! use dv_pipeline::pipeline::*;
//!
//! static IQ_POOL: IqPool = IqPool::new();
//! static AUDIO_POOL: AudioPool = AudioPool::new();
//! static IQ_QUEUE: IqQueue<'static> = IqQueue::new();
//! static AUDIO_QUEUE: AudioQueue<'static> = AudioQueue::new();
//!
//! let mut pipeline = DvPipeline::new(
//!     LoopbackCodec::new(BLOCK_SAMPLES),
//!     PipelineConfig::new(),
//!     &IQ_POOL, &AUDIO_POOL, &IQ_QUEUE, &AUDIO_QUEUE,
//! );
//!
//! // Front end (interrupt context): claim blocks, fill them, queue them.
//! // Service loop (thread context):
//! loop {
//!     pipeline.poll(TrxMode::Rx);
//!     // ... drain AUDIO_QUEUE into the DAC stream ...
//! #   break;
//! }
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `telemetry` | yes | [`stats`] — BER / SNR estimates (requires `libm`) |
//! | `text` | yes | [`text`] — over-the-air text side channel |
//! | `log` | no | debug logging on cold paths (mode transitions) |
//!
//! ## Stream parameters
//!
//! - **Block size:** 320 samples ([`constants::BLOCK_SAMPLES`])
//! - **Audio samples:** `i16`; **IQ samples:** `Complex<f32>` ([`sample`])
//! - **Queue depths:** 4 IQ / 5 audio blocks ([`constants`])

#![no_std]

pub mod constants;
pub mod sample;
pub mod block;
pub mod ring;
pub mod flex;
pub mod codec;
pub mod pipeline;

#[cfg(feature = "text")]
pub mod text;

#[cfg(feature = "telemetry")]
pub mod stats;
