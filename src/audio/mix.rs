use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{ReelError, ReelResult};

/// Decoded PCM at its own rate and channel count.
#[derive(Clone, Debug)]
pub(crate) struct PcmSource {
    pub(crate) sample_rate: u32,
    pub(crate) channels: u16,
    pub(crate) interleaved: Arc<Vec<f32>>,
}

impl PcmSource {
    pub(crate) fn mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels: 1,
            interleaved: Arc::new(samples),
        }
    }

    fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            ch => self.interleaved.len() / usize::from(ch),
        }
    }

    /// Linear-interpolated (left, right) at fractional source frame `pos`. Mono is duplicated.
    /// `None` once an unlooped source has run out.
    fn stereo_at(&self, pos: f64, looped: bool) -> Option<(f32, f32)> {
        let frames = self.frames();
        if frames == 0 || !pos.is_finite() || pos < 0.0 {
            return None;
        }
        let whole = pos.floor() as usize;
        let (a, b) = if looped {
            (whole % frames, (whole + 1) % frames)
        } else if whole < frames {
            (whole, (whole + 1).min(frames - 1))
        } else {
            return None;
        };
        let frac = (pos - pos.floor()) as f32;
        let ch = usize::from(self.channels);
        let pick = |frame: usize, c: usize| self.interleaved[frame * ch + c.min(ch - 1)];
        let lerp = |c: usize| {
            let v0 = pick(a, c);
            v0 + (pick(b, c) - v0) * frac
        };
        Some((lerp(0), lerp(1)))
    }
}

/// Linear fade in from silence and out to silence at the segment edges.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Envelope {
    pub(crate) fade_in_secs: f64,
    pub(crate) fade_out_secs: f64,
}

impl Envelope {
    fn gain(self, t: f64, len_secs: f64) -> f32 {
        let ramp = |x: f64, over: f64| if over > 0.0 { (x / over).clamp(0.0, 1.0) } else { 1.0 };
        (ramp(t, self.fade_in_secs) * ramp(len_secs - t, self.fade_out_secs)) as f32
    }
}

/// One source laid onto the mix at `start` for `len` output samples.
#[derive(Clone, Debug)]
pub(crate) struct MixSegment {
    pub(crate) start: u64,
    pub(crate) len: u64,
    pub(crate) source: PcmSource,
    /// Restart the source instead of going silent when it runs out.
    pub(crate) looped: bool,
    pub(crate) gain: f32,
    pub(crate) envelope: Envelope,
}

/// Everything that sounds in one render, in output sample space.
#[derive(Clone, Debug)]
pub(crate) struct MixPlan {
    pub(crate) sample_rate: u32,
    pub(crate) channels: u16,
    pub(crate) total_samples: u64,
    pub(crate) segments: Vec<MixSegment>,
}

/// Sum every segment into interleaved PCM of `plan.total_samples` frames, clipped to [-1, 1].
pub(crate) fn mix_plan(plan: &MixPlan) -> Vec<f32> {
    let ch = usize::from(plan.channels);
    let mut out = vec![0.0f32; plan.total_samples as usize * ch];
    if ch == 0 || plan.sample_rate == 0 {
        return out;
    }
    let rate = f64::from(plan.sample_rate);

    for seg in &plan.segments {
        let end = seg.start.saturating_add(seg.len).min(plan.total_samples);
        if end <= seg.start {
            continue;
        }
        let len_secs = (end - seg.start) as f64 / rate;
        let step = f64::from(seg.source.sample_rate) / rate;
        let frames = out
            .chunks_exact_mut(ch)
            .skip(seg.start as usize)
            .take((end - seg.start) as usize);
        for (i, dst) in frames.enumerate() {
            let Some((l, r)) = seg.source.stereo_at(i as f64 * step, seg.looped) else {
                break;
            };
            let g = seg.gain * seg.envelope.gain(i as f64 / rate, len_secs);
            dst[0] += l * g;
            if let Some(right) = dst.get_mut(1) {
                *right += r * g;
            }
        }
    }

    out.iter_mut().for_each(|s| *s = s.clamp(-1.0, 1.0));
    out
}

/// Write interleaved samples as raw little-endian `f32` (ffmpeg `-f f32le`).
pub(crate) fn write_mix_to_f32le_file(samples: &[f32], path: &Path) -> ReelResult<()> {
    let io_err =
        |e: std::io::Error| ReelError::media(format!("write mix '{}': {e}", path.display()));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut w = std::io::BufWriter::new(std::fs::File::create(path).map_err(io_err)?);
    for s in samples {
        w.write_all(&s.to_le_bytes()).map_err(io_err)?;
    }
    w.flush().map_err(io_err)
}

/// Nearest sample index for `secs` at `sample_rate`.
pub(crate) fn secs_to_sample(secs: f64, sample_rate: u32) -> u64 {
    (secs.max(0.0) * f64::from(sample_rate)).round() as u64
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
