//! Receive-quality telemetry: bit error rate and smoothed SNR.

/// Bit error rate in parts per mille.
///
/// Computed from the codec's running totals; `bits == 0` (right after a
/// reset) reads as zero errors rather than dividing by zero.
pub fn ber_per_mille(bit_errors: u32, bits: u32) -> u32 {
    if bits == 0 {
        return 0;
    }
    ((bit_errors as u64 * 1000) / bits as u64) as u32
}

/// Exponentially smoothed SNR estimate for display.
///
/// The raw per-frame estimate from the demodulator jitters too much to
/// show directly; a 0.95/0.05 single-pole filter steadies it. Negative
/// smoothed values clamp to zero.
pub struct SnrEstimate {
    smoothed: f32,
}

impl SnrEstimate {
    pub const fn new() -> Self {
        SnrEstimate { smoothed: 0.0 }
    }

    /// Fold in one raw per-frame estimate (dB).
    pub fn update(&mut self, raw_snr_db: f32) {
        let next = 0.95 * self.smoothed + 0.05 * raw_snr_db;
        self.smoothed = if next < 0.0 { 0.0 } else { next };
    }

    /// Current smoothed value (dB).
    pub fn db(&self) -> f32 {
        self.smoothed
    }

    /// Smoothed value rounded to whole dB, as shown on the display.
    pub fn db_rounded(&self) -> i32 {
        libm::roundf(self.smoothed) as i32
    }

    pub fn reset(&mut self) {
        self.smoothed = 0.0;
    }
}

impl Default for SnrEstimate {
    fn default() -> Self {
        Self::new()
    }
}
