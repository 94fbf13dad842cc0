//! RBJ cookbook biquads used by the mastering chain.

use std::f32::consts::PI;

use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BiquadKind {
    LowPass,
    HighPass,
}

/// Second-order IIR section (Butterworth Q).
#[derive(Clone, Debug)]
pub(crate) struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    pub(crate) fn new(kind: BiquadKind, sample_rate: u32, cutoff_hz: f32) -> ReelResult<Self> {
        let nyquist = sample_rate as f32 / 2.0;
        if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 || cutoff_hz >= nyquist {
            return Err(ReelError::mastering(format!(
                "filter cutoff {cutoff_hz} Hz must be within (0, {nyquist}) Hz"
            )));
        }

        let w0 = 2.0 * PI * cutoff_hz / sample_rate as f32;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let q = std::f32::consts::FRAC_1_SQRT_2;
        let alpha = sin_w0 / (2.0 * q);

        let (b0, b1, b2) = match kind {
            BiquadKind::LowPass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            BiquadKind::HighPass => {
                let b1 = -(1.0 + cos_w0);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Ok(Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        })
    }

    /// Filter a mono buffer in place.
    pub(crate) fn process(&mut self, signal: &mut [f32]) {
        for s in signal {
            let x0 = *s;
            let y0 = self.b0 * x0 + self.b1 * self.x1 + self.b2 * self.x2
                - self.a1 * self.y1
                - self.a2 * self.y2;
            self.x2 = self.x1;
            self.x1 = x0;
            self.y2 = self.y1;
            self.y1 = y0;
            *s = y0;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/filter.rs"]
mod tests;
