use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::master::MasteringConfig;
use crate::audio::sfx::SfxConfig;
use crate::compose::timeline::TimelineConfig;
use crate::foundation::core::{Fps, FrameSize};
use crate::foundation::error::{ReelError, ReelResult};
use crate::visual::resolver::VisualConfig;
use crate::voice::backend::SpeechCommandConfig;
use crate::voice::profile::ProfileTable;
use crate::voice::synth::VOICE_SAMPLE_RATE;

/// Output video settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub overwrite: bool,
    /// x264 constant rate factor.
    pub crf: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: Fps { num: 30, den: 1 },
            overwrite: true,
            crf: 20,
        }
    }
}

impl OutputConfig {
    pub fn frame_size(&self) -> ReelResult<FrameSize> {
        FrameSize::new(self.width, self.height)
    }

    pub fn fps(&self) -> ReelResult<Fps> {
        Fps::new(self.fps.num, self.fps.den)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoiceConfig {
    pub sample_rate: u32,
    /// Per-style overrides laid over the built-in profile table.
    pub profiles: ProfileTable,
    /// Remove bracketed cues such as `[gasps]` before synthesis.
    pub strip_cues: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            sample_rate: VOICE_SAMPLE_RATE,
            profiles: ProfileTable::empty(),
            strip_cues: false,
        }
    }
}

impl VoiceConfig {
    /// Built-in profiles with this config's overrides applied.
    pub fn profile_table(&self) -> ProfileTable {
        ProfileTable::default().merged(&self.profiles)
    }
}

/// Everything a run needs besides the script and the collaborators.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub output: OutputConfig,
    pub voice: VoiceConfig,
    pub mastering: MasteringConfig,
    pub sfx: SfxConfig,
    pub visual: VisualConfig,
    pub timeline: TimelineConfig,
    pub speech: SpeechCommandConfig,
    /// Folder of local footage searched by keyword. `None` means no footage provider.
    pub library: Option<PathBuf>,
    /// Parent for the run work directory; the system temp dir when unset.
    pub work_dir: Option<PathBuf>,
    /// Drives every random choice of a run.
    pub seed: u64,
}

impl PipelineConfig {
    /// Parse a config from a JSON reader. Missing fields take their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> ReelResult<Self> {
        let cfg: PipelineConfig = serde_json::from_reader(r)
            .map_err(|e| ReelError::serde(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ReelError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> ReelResult<()> {
        self.output.frame_size()?;
        self.output.fps()?;
        if self.output.crf > 51 {
            return Err(ReelError::validation("output.crf must be within 0..=51"));
        }
        if self.voice.sample_rate == 0 {
            return Err(ReelError::validation("voice.sample_rate must be > 0"));
        }
        self.voice.profiles.validate()?;
        self.mastering.validate()?;
        self.sfx.validate()?;
        self.visual.validate()?;
        self.timeline.validate()?;
        if self.speech.program.trim().is_empty() {
            return Err(ReelError::validation("speech.program must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/config.rs"]
mod tests;
