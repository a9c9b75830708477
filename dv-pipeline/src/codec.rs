//! Voice codec stage contract.
//!
//! The codec is an external collaborator: the pipeline treats it as an
//! opaque stage with a fixed calling convention and never looks inside.
//! The asymmetry matters — encode is block-for-block, decode consumes a
//! sample count that varies call-to-call as the demodulator tracks the
//! remote sample clock.

use crate::sample::{AudioSample, IqSample};

/// Contract between the pipeline driver and the voice codec.
pub trait VoiceCodec {
    /// Number of IQ input samples the next [`decode()`](Self::decode) call
    /// requires. Re-queried before every decode; the driver must obey it
    /// exactly — passing a differently sized input is outside this
    /// contract.
    fn nin(&self) -> usize;

    /// Decode exactly [`nin()`](Self::nin) IQ samples into audio samples.
    ///
    /// Returns the number of samples written to `audio_out`, which varies
    /// call-to-call and is not tied to `iq_in.len()`.
    fn decode(&mut self, audio_out: &mut [AudioSample], iq_in: &[IqSample]) -> usize;

    /// Encode one fixed-size audio block into exactly one fixed-size IQ
    /// block. `iq_out` and `audio_in` have equal length (the block size).
    fn encode(&mut self, iq_out: &mut [IqSample], audio_in: &[AudioSample]);

    /// Running count of bit errors seen by the decoder since the last reset.
    fn total_bit_errors(&self) -> u32;

    /// Running count of bits processed by the decoder since the last reset.
    fn total_bits(&self) -> u32;

    /// Zero both running counters. The driver calls this on the edge into
    /// receive so the error rate reflects the current over.
    fn reset_error_totals(&mut self);
}

/// Maximum length of a [`LoopbackCodec`] `nin` schedule.
pub const LOOPBACK_PATTERN_MAX: usize = 8;

/// Deterministic pass-through codec for tests and demos.
///
/// Encode stores each audio sample in the real part of an IQ sample; decode
/// returns the real parts unchanged, consuming `nin` samples per call and
/// producing exactly as many. The `nin` schedule cycles through a small
/// configurable pattern so tests can exercise request sizes that straddle
/// block boundaries.
pub struct LoopbackCodec {
    pattern: [usize; LOOPBACK_PATTERN_MAX],
    pattern_len: usize,
    next: usize,
    bit_errors: u32,
    bits: u32,
}

impl LoopbackCodec {
    /// Loopback codec with a fixed `nin`.
    pub fn new(nin: usize) -> Self {
        Self::with_pattern(&[nin])
    }

    /// Loopback codec whose `nin` cycles through `pattern`.
    ///
    /// # Panics
    ///
    /// If `pattern` is empty or longer than [`LOOPBACK_PATTERN_MAX`].
    pub fn with_pattern(pattern: &[usize]) -> Self {
        assert!(!pattern.is_empty() && pattern.len() <= LOOPBACK_PATTERN_MAX);
        let mut stored = [0usize; LOOPBACK_PATTERN_MAX];
        stored[..pattern.len()].copy_from_slice(pattern);
        LoopbackCodec {
            pattern: stored,
            pattern_len: pattern.len(),
            next: 0,
            bit_errors: 0,
            bits: 0,
        }
    }

    /// Preload the running counters (test hook).
    pub fn set_error_totals(&mut self, bit_errors: u32, bits: u32) {
        self.bit_errors = bit_errors;
        self.bits = bits;
    }
}

impl VoiceCodec for LoopbackCodec {
    fn nin(&self) -> usize {
        self.pattern[self.next]
    }

    fn decode(&mut self, audio_out: &mut [AudioSample], iq_in: &[IqSample]) -> usize {
        debug_assert_eq!(iq_in.len(), self.nin());
        let produced = iq_in.len().min(audio_out.len());
        for (out, iq) in audio_out[..produced].iter_mut().zip(iq_in.iter()) {
            *out = iq.re as AudioSample;
        }
        self.bits = self.bits.wrapping_add(produced as u32);
        self.next = (self.next + 1) % self.pattern_len;
        produced
    }

    fn encode(&mut self, iq_out: &mut [IqSample], audio_in: &[AudioSample]) {
        debug_assert_eq!(iq_out.len(), audio_in.len());
        for (iq, &sample) in iq_out.iter_mut().zip(audio_in.iter()) {
            iq.re = sample as f32;
            iq.im = 0.0;
        }
    }

    fn total_bit_errors(&self) -> u32 {
        self.bit_errors
    }

    fn total_bits(&self) -> u32 {
        self.bits
    }

    fn reset_error_totals(&mut self) {
        self.bit_errors = 0;
        self.bits = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use num_complex::Complex;

    #[test]
    fn encode_decode_round_trip() {
        let mut codec = LoopbackCodec::new(4);
        let audio_in = [10i16, -20, 30, -40];
        let mut iq = [IqSample::SILENCE; 4];
        codec.encode(&mut iq, &audio_in);

        let mut audio_out = [0i16; 4];
        let produced = codec.decode(&mut audio_out, &iq);
        assert_eq!(produced, 4);
        assert_eq!(audio_out, audio_in);
    }

    #[test]
    fn nin_pattern_cycles() {
        let mut codec = LoopbackCodec::with_pattern(&[3, 5]);
        assert_eq!(codec.nin(), 3);
        let mut out = [0i16; 8];
        codec.decode(&mut out[..], &[Complex::new(0.0, 0.0); 3]);
        assert_eq!(codec.nin(), 5);
        codec.decode(&mut out[..], &[Complex::new(0.0, 0.0); 5]);
        assert_eq!(codec.nin(), 3);
    }

    #[test]
    fn error_totals_accumulate_and_reset() {
        let mut codec = LoopbackCodec::new(2);
        let mut out = [0i16; 2];
        codec.decode(&mut out, &[Complex::new(0.0, 0.0); 2]);
        assert_eq!(codec.total_bits(), 2);
        assert_eq!(codec.total_bit_errors(), 0);

        codec.set_error_totals(7, 100);
        codec.reset_error_totals();
        assert_eq!(codec.total_bits(), 0);
        assert_eq!(codec.total_bit_errors(), 0);
    }
}
