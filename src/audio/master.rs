use serde::{Deserialize, Serialize};

use crate::audio::filter::{Biquad, BiquadKind};
use crate::audio::segment::AudioSegment;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{db_to_gain, gain_to_db};

/// Fixed mastering parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MasteringConfig {
    /// Disable to pass audio through untouched.
    pub enabled: bool,
    /// High-pass cutoff in Hz (`None` skips it).
    pub highpass_hz: Option<f32>,
    /// Low-pass cutoff in Hz (`None` skips it).
    pub lowpass_hz: Option<f32>,
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    /// Peak normalization target below 0 dBFS.
    pub headroom_db: f32,
}

impl Default for MasteringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            highpass_hz: Some(80.0),
            lowpass_hz: Some(5_000.0),
            threshold_db: -20.0,
            ratio: 4.0,
            attack_ms: 5.0,
            release_ms: 50.0,
            headroom_db: 0.5,
        }
    }
}

impl MasteringConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if !(self.ratio.is_finite() && self.ratio >= 1.0) {
            return Err(ReelError::validation("mastering.ratio must be >= 1"));
        }
        if !(self.attack_ms > 0.0 && self.release_ms > 0.0) {
            return Err(ReelError::validation(
                "mastering attack_ms/release_ms must be > 0",
            ));
        }
        if !(self.headroom_db.is_finite() && self.headroom_db >= 0.0) {
            return Err(ReelError::validation("mastering.headroom_db must be >= 0"));
        }
        Ok(())
    }
}

/// Filter → compress → normalize, in that order.
///
/// Mastering is never a hard dependency: if any stage fails the untouched input is returned.
#[derive(Clone, Debug, Default)]
pub struct MasteringChain {
    config: MasteringConfig,
}

impl MasteringChain {
    pub fn new(config: MasteringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MasteringConfig {
        &self.config
    }

    /// Master `input`, falling back to the unmodified input on any stage failure.
    pub fn master(&self, input: AudioSegment) -> AudioSegment {
        if !self.config.enabled || input.is_empty() {
            return input;
        }
        match self.try_master(&input) {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(error = %e, "mastering failed; using unmastered audio");
                input
            }
        }
    }

    /// Run every stage, surfacing the first failure.
    pub fn try_master(&self, input: &AudioSegment) -> ReelResult<AudioSegment> {
        let mut out = input.clone();
        let sr = out.sample_rate();
        filter_stage(out.samples_mut(), sr, &self.config)?;
        compress_stage(out.samples_mut(), sr, &self.config)?;
        normalize_stage(out.samples_mut(), &self.config)?;
        debug_assert_eq!(out.len(), input.len());
        Ok(out)
    }
}

fn filter_stage(samples: &mut [f32], sample_rate: u32, cfg: &MasteringConfig) -> ReelResult<()> {
    if let Some(hz) = cfg.highpass_hz {
        Biquad::new(BiquadKind::HighPass, sample_rate, hz)?.process(samples);
    }
    if let Some(hz) = cfg.lowpass_hz {
        Biquad::new(BiquadKind::LowPass, sample_rate, hz)?.process(samples);
    }
    ensure_finite(samples, "filter")
}

fn compress_stage(samples: &mut [f32], sample_rate: u32, cfg: &MasteringConfig) -> ReelResult<()> {
    cfg.validate()
        .map_err(|e| ReelError::mastering(format!("compressor config: {e}")))?;

    let sr = sample_rate as f32;
    let attack = (-1.0 / (cfg.attack_ms / 1000.0 * sr)).exp();
    let release = (-1.0 / (cfg.release_ms / 1000.0 * sr)).exp();
    let threshold = db_to_gain(cfg.threshold_db);
    let slope = 1.0 - 1.0 / cfg.ratio;

    let mut env = 0.0f32;
    for s in samples.iter_mut() {
        let level = s.abs();
        let coeff = if level > env { attack } else { release };
        env = coeff * env + (1.0 - coeff) * level;
        if env > threshold {
            let over_db = gain_to_db(env) - cfg.threshold_db;
            *s *= db_to_gain(-over_db * slope);
        }
    }
    ensure_finite(samples, "compressor")
}

fn normalize_stage(samples: &mut [f32], cfg: &MasteringConfig) -> ReelResult<()> {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak <= f32::EPSILON {
        return Ok(());
    }
    let gain = db_to_gain(-cfg.headroom_db) / peak;
    for s in samples.iter_mut() {
        *s *= gain;
    }
    ensure_finite(samples, "normalize")
}

fn ensure_finite(samples: &[f32], stage: &str) -> ReelResult<()> {
    if samples.iter().all(|s| s.is_finite()) {
        Ok(())
    } else {
        Err(ReelError::mastering(format!(
            "{stage} stage produced non-finite samples"
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/master.rs"]
mod tests;
