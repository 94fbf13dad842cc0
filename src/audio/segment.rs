use crate::foundation::error::{ReelError, ReelResult};

/// Mono floating-point waveform with its sample rate.
///
/// Segments move between stages by value; a stage that needs to change the waveform takes the
/// segment, edits its samples and hands it on.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSegment {
    /// Wrap mono samples recorded at `sample_rate`.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> ReelResult<Self> {
        if sample_rate == 0 {
            return Err(ReelError::validation("audio sample_rate must be > 0"));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Empty segment at `sample_rate`.
    pub fn empty(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate: sample_rate.max(1),
        }
    }

    /// Digital silence lasting `secs` (rounded to the nearest sample).
    pub fn silence(secs: f64, sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        let n = (secs.max(0.0) * f64::from(sample_rate)).round() as usize;
        Self {
            samples: vec![0.0; n],
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    /// Root-mean-square level.
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
        (sum / self.samples.len() as f64).sqrt() as f32
    }

    /// Append `other`, which must share this segment's sample rate.
    pub fn append(&mut self, other: &AudioSegment) -> ReelResult<()> {
        if other.sample_rate != self.sample_rate {
            return Err(ReelError::validation(format!(
                "cannot append {} Hz audio to {} Hz audio",
                other.sample_rate, self.sample_rate
            )));
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }

    /// Append `secs` of silence.
    pub fn append_silence(&mut self, secs: f64) {
        let n = (secs.max(0.0) * f64::from(self.sample_rate)).round() as usize;
        self.samples.resize(self.samples.len() + n, 0.0);
    }

    /// Linear-interpolation resample to `target_rate`, preserving duration.
    pub fn resample(&self, target_rate: u32) -> ReelResult<AudioSegment> {
        if target_rate == 0 {
            return Err(ReelError::validation("resample target rate must be > 0"));
        }
        if target_rate == self.sample_rate || self.samples.is_empty() {
            return Ok(Self {
                samples: self.samples.clone(),
                sample_rate: target_rate,
            });
        }

        let src = &self.samples;
        let ratio = f64::from(self.sample_rate) / f64::from(target_rate);
        let out_len =
            ((src.len() as f64) * f64::from(target_rate) / f64::from(self.sample_rate)).round();
        let out_len = out_len.max(1.0) as usize;
        let last = src.len() - 1;

        let mut out = Vec::with_capacity(out_len);
        for i in 0..out_len {
            let pos = (i as f64) * ratio;
            let i0 = (pos.floor() as usize).min(last);
            let i1 = (i0 + 1).min(last);
            let frac = (pos - i0 as f64) as f32;
            let v0 = src[i0];
            let v1 = src[i1];
            out.push(v0 + (v1 - v0) * frac);
        }

        Ok(Self {
            samples: out,
            sample_rate: target_rate,
        })
    }

    /// Reinterpret the samples as if recorded at `sample_rate * factor`, then resample back to the
    /// original rate.
    ///
    /// `factor < 1` lowers pitch and lengthens the segment by `1 / factor`; the returned duration
    /// is the one every later stage must match.
    pub fn reinterpret_rate(&self, factor: f32) -> ReelResult<AudioSegment> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ReelError::validation(
                "rate reinterpretation factor must be finite and > 0",
            ));
        }
        let virtual_rate = ((self.sample_rate as f32) * factor).round().max(1.0) as u32;
        let virt = Self {
            samples: self.samples.clone(),
            sample_rate: virtual_rate,
        };
        virt.resample(self.sample_rate)
    }

    /// Mix `other` into this segment starting at `at_secs`, scaled by `gain`.
    ///
    /// The result never grows: samples of `other` that would land past the end are dropped.
    /// Returns the number of samples mixed.
    pub fn overlay(&mut self, other: &AudioSegment, at_secs: f64, gain: f32) -> ReelResult<usize> {
        if other.sample_rate != self.sample_rate {
            return Err(ReelError::validation(format!(
                "cannot overlay {} Hz audio onto {} Hz audio",
                other.sample_rate, self.sample_rate
            )));
        }
        if !at_secs.is_finite() || at_secs < 0.0 {
            return Err(ReelError::validation("overlay position must be finite and >= 0"));
        }
        let start = (at_secs * f64::from(self.sample_rate)).round() as usize;
        if start >= self.samples.len() {
            return Ok(0);
        }
        let n = other.samples.len().min(self.samples.len() - start);
        for (dst, &src) in self.samples[start..start + n]
            .iter_mut()
            .zip(other.samples.iter())
        {
            *dst += src * gain;
        }
        Ok(n)
    }

    /// Return `true` when every sample magnitude is below `threshold`.
    pub fn is_silent(&self, threshold: f32) -> bool {
        self.samples.iter().all(|s| s.abs() < threshold)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/segment.rs"]
mod tests;
