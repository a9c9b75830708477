//! Sample types carried by the pipeline.

use num_complex::Complex;

/// A single scalar audio sample (signed 16-bit PCM).
pub type AudioSample = i16;

/// A single complex baseband sample (in-phase/quadrature pair).
pub type IqSample = Complex<f32>;

/// Element type a block pool or ring queue can carry.
///
/// `SILENCE` is the value freshly claimed blocks are filled with.
pub trait Sample: Copy + Send + 'static {
    const SILENCE: Self;
}

impl Sample for AudioSample {
    const SILENCE: Self = 0;
}

impl Sample for IqSample {
    const SILENCE: Self = Complex { re: 0.0, im: 0.0 };
}
