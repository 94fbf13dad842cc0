use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::assets::media::decode_audio_f32;
use crate::audio::segment::AudioSegment;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::db_to_gain;

/// Sound effects the placer knows how to schedule.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Knock,
    Scream,
    Whisper,
    Footsteps,
    Door,
    Heartbeat,
    Glitch,
    Thunder,
    Breath,
    Static,
    Drone,
    Wind,
}

impl Effect {
    /// File name looked up in the effects folder.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Knock => "knock.mp3",
            Self::Scream => "scream.mp3",
            Self::Whisper => "whisper.mp3",
            Self::Footsteps => "footsteps.mp3",
            Self::Door => "door_creak.mp3",
            Self::Heartbeat => "heartbeat.mp3",
            Self::Glitch => "glitch.mp3",
            Self::Thunder => "thunder.mp3",
            Self::Breath => "gasp.mp3",
            Self::Static => "static.mp3",
            Self::Drone => "drone.mp3",
            Self::Wind => "wind.mp3",
        }
    }
}

const DEFAULT_TRIGGERS: &[(&str, Effect)] = &[
    ("knock", Effect::Knock),
    ("knocking", Effect::Knock),
    ("knocked", Effect::Knock),
    ("scream", Effect::Scream),
    ("screamed", Effect::Scream),
    ("screaming", Effect::Scream),
    ("whisper", Effect::Whisper),
    ("whispered", Effect::Whisper),
    ("whispering", Effect::Whisper),
    ("footsteps", Effect::Footsteps),
    ("steps", Effect::Footsteps),
    ("door", Effect::Door),
    ("creak", Effect::Door),
    ("heart", Effect::Heartbeat),
    ("heartbeat", Effect::Heartbeat),
    ("glitch", Effect::Glitch),
    ("blinked", Effect::Glitch),
    ("mirror", Effect::Glitch),
    ("thunder", Effect::Thunder),
    ("storm", Effect::Thunder),
    ("gasp", Effect::Breath),
    ("gasps", Effect::Breath),
    ("breath", Effect::Breath),
    ("breathing", Effect::Breath),
    ("static", Effect::Static),
    ("phone", Effect::Static),
    ("caller", Effect::Static),
];

const AMBIENCE: &[Effect] = &[Effect::Drone, Effect::Wind];

/// Whether to stop at the first trigger word or layer every match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    FirstMatch,
    EveryMatch,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SfxConfig {
    /// Folder holding the effect files. `None` disables effects.
    pub dir: Option<PathBuf>,
    pub match_mode: MatchMode,
    /// Multiplier applied to the proportional start time (`None` = 1.0).
    pub safety_factor: Option<f64>,
    /// Effect level relative to the voice.
    pub gain_db: f32,
    /// Chance of adding an ambience bed to a line without triggers.
    pub ambience_probability: f64,
    pub ambience_gain_db: f32,
    /// Extra trigger words, merged over the built-in table.
    pub extra_triggers: BTreeMap<String, Effect>,
}

impl Default for SfxConfig {
    fn default() -> Self {
        Self {
            dir: None,
            match_mode: MatchMode::FirstMatch,
            safety_factor: Some(0.9),
            gain_db: -6.0,
            ambience_probability: 0.3,
            ambience_gain_db: -18.0,
            extra_triggers: BTreeMap::new(),
        }
    }
}

impl SfxConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if let Some(f) = self.safety_factor
            && !(f.is_finite() && f > 0.0 && f <= 1.0)
        {
            return Err(ReelError::validation(
                "sfx.safety_factor must be within (0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.ambience_probability) {
            return Err(ReelError::validation(
                "sfx.ambience_probability must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

/// One scheduled effect inside a line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SfxPlacement {
    pub effect: Effect,
    /// Index of the trigger token, `None` for ambience.
    pub token_index: Option<usize>,
    pub start_secs: f64,
    pub gain_db: f32,
}

/// Lowercase word tokens, apostrophes kept inside words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Lazily decoded effect clips; a missing file is cached as "no effect".
#[derive(Debug, Default)]
pub struct SfxBank {
    dir: Option<PathBuf>,
    cache: Mutex<HashMap<(Effect, u32), Option<Arc<AudioSegment>>>>,
}

impl SfxBank {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Pre-load a clip, bypassing the folder lookup.
    pub fn insert(&self, effect: Effect, clip: AudioSegment) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert((effect, clip.sample_rate()), Some(Arc::new(clip)));
        }
    }

    /// Clip for `effect` at `sample_rate`, or `None` when unavailable.
    pub fn get(&self, effect: Effect, sample_rate: u32) -> Option<Arc<AudioSegment>> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(hit) = cache.get(&(effect, sample_rate)) {
            return hit.clone();
        }
        // A preloaded clip at another rate is resampled rather than re-read.
        let preloaded = cache
            .iter()
            .find(|((e, _), v)| *e == effect && v.is_some())
            .and_then(|(_, v)| v.clone());
        let loaded = match preloaded {
            Some(clip) => clip.resample(sample_rate).ok().map(Arc::new),
            None => self.load(effect, sample_rate),
        };
        cache.insert((effect, sample_rate), loaded.clone());
        loaded
    }

    fn load(&self, effect: Effect, sample_rate: u32) -> Option<Arc<AudioSegment>> {
        let path = self.dir.as_ref()?.join(effect.file_name());
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "sfx file missing; skipping effect");
            return None;
        }
        match decode_audio_f32(&path, sample_rate, 1)
            .and_then(|pcm| AudioSegment::new(pcm.interleaved_f32, pcm.sample_rate))
        {
            Ok(seg) if !seg.is_empty() => Some(Arc::new(seg)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "sfx decode failed");
                None
            }
        }
    }
}

/// Schedules effect clips inside a line's audio from trigger words in its text.
#[derive(Debug)]
pub struct SfxPlacer {
    config: SfxConfig,
    triggers: HashMap<String, Effect>,
    bank: SfxBank,
}

impl SfxPlacer {
    pub fn new(config: SfxConfig) -> Self {
        let bank = SfxBank::new(config.dir.clone());
        Self::with_bank(config, bank)
    }

    pub fn with_bank(config: SfxConfig, bank: SfxBank) -> Self {
        let mut triggers: HashMap<String, Effect> = DEFAULT_TRIGGERS
            .iter()
            .map(|(w, e)| ((*w).to_owned(), *e))
            .collect();
        for (w, e) in &config.extra_triggers {
            triggers.insert(w.to_lowercase(), *e);
        }
        Self {
            config,
            triggers,
            bank,
        }
    }

    pub fn bank(&self) -> &SfxBank {
        &self.bank
    }

    /// Trigger-word effects for `text` with their start times inside `duration_secs`.
    ///
    /// Start time is `(token_index / total_tokens) * duration * safety_factor`; anything landing
    /// at or past the end is dropped.
    pub fn plan_triggers(&self, text: &str, duration_secs: f64) -> Vec<SfxPlacement> {
        let tokens = tokenize(text);
        let total = tokens.len();
        let factor = self.config.safety_factor.unwrap_or(1.0);
        let mut out = Vec::new();

        for (i, tok) in tokens.iter().enumerate() {
            let Some(&effect) = self.triggers.get(tok) else {
                continue;
            };
            let start_secs = (i as f64 / total as f64) * duration_secs * factor;
            if start_secs >= duration_secs {
                tracing::debug!(?effect, start_secs, "effect would start after voice; dropped");
                continue;
            }
            out.push(SfxPlacement {
                effect,
                token_index: Some(i),
                start_secs,
                gain_db: self.config.gain_db,
            });
            if self.config.match_mode == MatchMode::FirstMatch {
                break;
            }
        }
        out
    }

    /// Full placement plan, including the optional ambience bed for lines without triggers.
    pub fn plan(&self, text: &str, duration_secs: f64, seed: u64) -> Vec<SfxPlacement> {
        let placements = self.plan_triggers(text, duration_secs);
        if !placements.is_empty() || duration_secs <= 0.0 {
            return placements;
        }

        let mut rng = StdRng::seed_from_u64(seed);
        if !rng.gen_bool(self.config.ambience_probability) {
            return placements;
        }
        match AMBIENCE.choose(&mut rng) {
            Some(&effect) => vec![SfxPlacement {
                effect,
                token_index: None,
                start_secs: 0.0,
                gain_db: self.config.ambience_gain_db,
            }],
            None => placements,
        }
    }

    /// Mix planned effects into `audio`. Output length always equals input length.
    pub fn place(&self, mut audio: AudioSegment, text: &str, seed: u64) -> SfxOutcome {
        let plan = self.plan(text, audio.duration_secs(), seed);
        let mut applied = Vec::with_capacity(plan.len());
        for p in plan {
            let Some(clip) = self.bank.get(p.effect, audio.sample_rate()) else {
                continue;
            };
            match audio.overlay(&clip, p.start_secs, db_to_gain(p.gain_db)) {
                Ok(_) => {
                    tracing::debug!(effect = ?p.effect, start = p.start_secs, "sfx placed");
                    applied.push(p);
                }
                Err(e) => tracing::warn!(effect = ?p.effect, error = %e, "sfx mix failed"),
            }
        }
        SfxOutcome { audio, applied }
    }
}

/// Result of [`SfxPlacer::place`].
#[derive(Clone, Debug)]
pub struct SfxOutcome {
    pub audio: AudioSegment,
    /// Effects that were actually mixed in.
    pub applied: Vec<SfxPlacement>,
}

#[cfg(test)]
#[path = "../../tests/unit/audio/sfx.rs"]
mod tests;
