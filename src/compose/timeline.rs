use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::assets::media::{MIX_SAMPLE_RATE, decode_audio_f32};
use crate::audio::mix::{Envelope, MixPlan, MixSegment, PcmSource, secs_to_sample};
use crate::compose::scene::{Scene, SceneComposer};
use crate::foundation::core::{Fps, FrameSize};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::db_to_gain;

/// How consecutive scenes meet. One mode per run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TransitionMode {
    Cut,
    /// Each scene after the first starts `secs` before the previous one ends.
    Crossfade { secs: f64 },
}

impl Default for TransitionMode {
    fn default() -> Self {
        Self::Crossfade { secs: 0.5 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimelineConfig {
    pub transition: TransitionMode,
    /// Fade from black at the start and to black at the end of the run.
    pub edge_fade_secs: f64,
    /// Folder of background tracks; `None` disables music.
    pub music_dir: Option<PathBuf>,
    pub music_gain_db: f32,
    /// Music fade-out at the end of the run.
    pub music_fade_secs: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            transition: TransitionMode::default(),
            edge_fade_secs: 0.5,
            music_dir: None,
            music_gain_db: -20.0,
            music_fade_secs: 1.5,
        }
    }
}

impl TimelineConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if let TransitionMode::Crossfade { secs } = self.transition
            && !(secs.is_finite() && secs >= 0.0)
        {
            return Err(ReelError::validation("timeline crossfade secs must be >= 0"));
        }
        for (name, v) in [
            ("edge_fade_secs", self.edge_fade_secs),
            ("music_fade_secs", self.music_fade_secs),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(ReelError::validation(format!("timeline.{name} must be >= 0")));
            }
        }
        if self.music_gain_db > 0.0 {
            return Err(ReelError::validation(
                "timeline.music_gain_db must attenuate (<= 0)",
            ));
        }
        Ok(())
    }
}

/// A global audio bed laid under the whole timeline.
#[derive(Clone, Debug)]
pub struct AudioLayer {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Arc<Vec<f32>>,
    pub gain_db: f32,
}

/// Where one scene sits on the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Placement {
    pub start_secs: f64,
    pub duration_secs: f64,
    pub start_frame: u64,
    pub frames: u64,
    /// Edge fade from black (first scene only).
    pub fade_in_secs: f64,
    /// Edge fade to black (last scene only).
    pub fade_out_secs: f64,
}

impl Placement {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    pub fn end_frame(&self) -> u64 {
        self.start_frame + self.frames
    }
}

/// Ordered scenes, their placements and the global audio layers of one render.
#[derive(Clone, Debug)]
pub struct Timeline {
    scenes: Vec<Scene>,
    placements: Vec<Placement>,
    layers: Vec<AudioLayer>,
    crossfade_secs: f64,
    total_secs: f64,
    music_fade_secs: f64,
    fps: Fps,
    frame: FrameSize,
}

impl Timeline {
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn layers(&self) -> &[AudioLayer] {
        &self.layers
    }

    /// Effective overlap between consecutive scenes (after clamping).
    pub fn crossfade_secs(&self) -> f64 {
        self.crossfade_secs
    }

    /// `sum(scene durations) - (count - 1) * crossfade`.
    pub fn duration_secs(&self) -> f64 {
        self.total_secs
    }

    pub fn total_frames(&self) -> u64 {
        self.fps.secs_to_frames_ceil(self.total_secs).max(1)
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn frame_size(&self) -> FrameSize {
        self.frame
    }

    /// Stereo mix plan: every scene's voice plus looped music, in timeline sample space.
    pub(crate) fn mix_plan(&self, sample_rate: u32) -> MixPlan {
        let total_samples = secs_to_sample(self.total_secs, sample_rate);
        let mut segments = Vec::with_capacity(self.scenes.len() + self.layers.len());
        let last = self.scenes.len().saturating_sub(1);

        for (i, (scene, p)) in self.scenes.iter().zip(&self.placements).enumerate() {
            let xfade_in = if i > 0 { self.crossfade_secs } else { 0.0 };
            let xfade_out = if i < last { self.crossfade_secs } else { 0.0 };
            segments.push(MixSegment {
                start: secs_to_sample(p.start_secs, sample_rate),
                len: secs_to_sample(p.duration_secs, sample_rate),
                source: PcmSource::mono(scene.audio().sample_rate(), scene.audio().samples().to_vec()),
                looped: false,
                gain: 1.0,
                envelope: Envelope {
                    fade_in_secs: p.fade_in_secs.max(xfade_in),
                    fade_out_secs: p.fade_out_secs.max(xfade_out),
                },
            });
        }

        for layer in &self.layers {
            segments.push(MixSegment {
                start: 0,
                len: total_samples,
                source: PcmSource {
                    sample_rate: layer.sample_rate,
                    channels: layer.channels,
                    interleaved: layer.interleaved_f32.clone(),
                },
                looped: true,
                gain: db_to_gain(layer.gain_db),
                envelope: Envelope {
                    fade_in_secs: 0.0,
                    fade_out_secs: self.music_fade_secs.min(self.total_secs),
                },
            });
        }

        MixPlan {
            sample_rate,
            channels: 2,
            total_samples,
            segments,
        }
    }
}

/// Orders scenes onto one timeline with the configured transition and music.
#[derive(Clone, Debug)]
pub struct TimelineAssembler {
    config: TimelineConfig,
    fps: Fps,
    frame: FrameSize,
}

impl TimelineAssembler {
    pub fn new(config: TimelineConfig, fps: Fps, frame: FrameSize) -> ReelResult<Self> {
        config.validate()?;
        Ok(Self { config, fps, frame })
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Overlap actually used for these scene durations: never more than half the shortest scene,
    /// whole frames only, zero for a single scene or in cut mode.
    pub fn effective_crossfade(&self, durations: &[f64]) -> f64 {
        let TransitionMode::Crossfade { secs } = self.config.transition else {
            return 0.0;
        };
        if durations.len() < 2 {
            return 0.0;
        }
        let shortest = durations.iter().copied().fold(f64::INFINITY, f64::min);
        let secs = secs.min(shortest / 2.0).max(0.0);
        self.fps.frames_to_secs(self.fps.secs_to_frames_floor(secs + 1e-9))
    }

    pub fn assemble(&self, scenes: Vec<Scene>, music: Option<AudioLayer>) -> ReelResult<Timeline> {
        if scenes.is_empty() {
            return Err(ReelError::NoScenes);
        }
        for s in &scenes {
            if s.frame_size() != self.frame || s.fps() != self.fps {
                return Err(ReelError::composition(format!(
                    "scene for line {} was composed for a different output",
                    s.line_index()
                )));
            }
        }

        let durations: Vec<f64> = scenes.iter().map(Scene::duration_secs).collect();
        let xfade = self.effective_crossfade(&durations);
        let count = scenes.len();

        let mut placements = Vec::with_capacity(count);
        let mut cursor = 0.0f64;
        for (i, scene) in scenes.iter().enumerate() {
            let start_secs = if i == 0 { 0.0 } else { cursor - xfade };
            let (fade_in_secs, fade_out_secs) =
                SceneComposer::edge_fades(i, count, self.config.edge_fade_secs);
            placements.push(Placement {
                start_secs,
                duration_secs: scene.duration_secs(),
                start_frame: self.fps.secs_to_frames_round(start_secs),
                frames: scene.frames(),
                fade_in_secs: fade_in_secs.min(scene.duration_secs()),
                fade_out_secs: fade_out_secs.min(scene.duration_secs()),
            });
            cursor = start_secs + scene.duration_secs();
        }
        let total_secs = durations.iter().sum::<f64>() - (count - 1) as f64 * xfade;

        let layers = music
            .into_iter()
            .filter(|m| !m.interleaved_f32.is_empty() && m.channels > 0 && m.sample_rate > 0)
            .map(|mut m| {
                m.gain_db = m.gain_db.min(0.0);
                m
            })
            .collect();

        tracing::info!(
            scenes = count,
            crossfade = xfade,
            total_secs,
            "timeline assembled"
        );
        Ok(Timeline {
            scenes,
            placements,
            layers,
            crossfade_secs: xfade,
            total_secs,
            music_fade_secs: self.config.music_fade_secs,
            fps: self.fps,
            frame: self.frame,
        })
    }

    /// Pick and decode one background track from the configured folder.
    ///
    /// Missing folder, no tracks or an undecodable track mean "no music".
    pub fn load_music(&self, seed: u64) -> Option<AudioLayer> {
        let dir = self.config.music_dir.as_deref()?;
        let tracks = music_tracks(dir);
        let mut rng = StdRng::seed_from_u64(seed);
        let Some(path) = tracks.choose(&mut rng) else {
            tracing::warn!(dir = %dir.display(), "no background tracks found");
            return None;
        };
        match decode_audio_f32(path, MIX_SAMPLE_RATE, 2) {
            Ok(pcm) if !pcm.interleaved_f32.is_empty() => {
                tracing::info!(track = %path.display(), "background music selected");
                Some(AudioLayer {
                    name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    sample_rate: pcm.sample_rate,
                    channels: pcm.channels,
                    interleaved_f32: Arc::new(pcm.interleaved_f32),
                    gain_db: self.config.music_gain_db,
                })
            }
            Ok(_) => {
                tracing::warn!(track = %path.display(), "background track has no audio");
                None
            }
            Err(e) => {
                tracing::warn!(track = %path.display(), error = %e, "background track unreadable");
                None
            }
        }
    }
}

const MUSIC_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac", "aac"];

fn music_tracks(dir: &Path) -> Vec<PathBuf> {
    let Ok(read) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut tracks: Vec<PathBuf> = read
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| MUSIC_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    tracks.sort();
    tracks
}

#[cfg(test)]
#[path = "../../tests/unit/compose/timeline.rs"]
mod tests;
