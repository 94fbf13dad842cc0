use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::audio::master::MasteringChain;
use crate::audio::segment::AudioSegment;
use crate::audio::sfx::{Effect, SfxPlacement, SfxPlacer};
use crate::compose::scene::{Scene, SceneComposer};
use crate::compose::timeline::{Timeline, TimelineAssembler};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::FrameSink;
use crate::foundation::core::{Fps, FrameSize};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::derive_seed;
use crate::pipeline::config::PipelineConfig;
use crate::render::session::{RenderOpts, RenderStats, render_timeline};
use crate::script::model::{Line, Script};
use crate::visual::asset::VisualOrigin;
use crate::visual::generate::{ImageGenerator, ProceduralImageGenerator};
use crate::visual::provider::{AssetProvider, LocalLibraryProvider, NoProvider};
use crate::visual::resolver::VisualResolver;
use crate::voice::backend::{CommandSpeechBackend, SharedSpeech};
use crate::voice::profile::StyleTag;
use crate::voice::synth::{LinePlan, VoiceSynthesizer};

/// What happened to one script line.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineStatus {
    Produced {
        duration_secs: f64,
        visual: VisualOrigin,
        sfx: Vec<Effect>,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineReport {
    pub index: usize,
    pub text: String,
    pub style: StyleTag,
    #[serde(flatten)]
    pub status: LineStatus,
}

/// Summary of one run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunReport {
    pub title: String,
    pub lines: Vec<LineReport>,
    pub scenes: usize,
    pub skipped: usize,
    pub duration_secs: f64,
    pub crossfade_secs: f64,
    pub music: Option<String>,
    pub output: Option<PathBuf>,
    pub render: RenderStats,
}

/// Per-line dry-run plan printed by `reelsmith inspect`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineInspection {
    pub index: usize,
    pub text: String,
    pub voice: LinePlan,
    pub visual_queries: Vec<String>,
    /// Trigger effects with `start_secs` expressed for a one-second line.
    pub sfx_triggers: Vec<SfxPlacement>,
}

/// One line's finished audio plus the effects that went into it.
struct LineAudio {
    audio: AudioSegment,
    sfx: Vec<SfxPlacement>,
}

/// Turns a script into a rendered timeline, one line at a time.
pub struct Pipeline {
    config: PipelineConfig,
    fps: Fps,
    frame: FrameSize,
    voice: VoiceSynthesizer,
    mastering: MasteringChain,
    sfx: SfxPlacer,
    visuals: VisualResolver,
    assembler: TimelineAssembler,
}

impl Pipeline {
    /// Build a pipeline around explicitly constructed collaborators.
    pub fn new(
        config: PipelineConfig,
        speech: SharedSpeech,
        provider: Arc<dyn AssetProvider>,
        generator: Option<Arc<dyn ImageGenerator>>,
    ) -> ReelResult<Self> {
        config.validate()?;
        let fps = config.output.fps()?;
        let frame = config.output.frame_size()?;
        let voice = VoiceSynthesizer::new(
            speech,
            config.voice.profile_table(),
            config.voice.sample_rate,
        )?
        .with_strip_cues(config.voice.strip_cues);
        let visuals = VisualResolver::new(provider, generator, config.visual.clone(), frame)?;
        let assembler = TimelineAssembler::new(config.timeline.clone(), fps, frame)?;
        Ok(Self {
            fps,
            frame,
            voice,
            mastering: MasteringChain::new(config.mastering.clone()),
            sfx: SfxPlacer::new(config.sfx.clone()),
            visuals,
            assembler,
            config,
        })
    }

    /// Build a pipeline with the shipped collaborators: the command speech backend, the local
    /// footage library (when configured) and the procedural image generator.
    pub fn from_config(config: PipelineConfig) -> ReelResult<Self> {
        let speech = SharedSpeech::new(CommandSpeechBackend::new(
            config.speech.clone(),
            config.voice.sample_rate,
        )?);
        let provider: Arc<dyn AssetProvider> = match &config.library {
            Some(dir) => Arc::new(LocalLibraryProvider::new(dir)?),
            None => Arc::new(NoProvider),
        };
        let generator: Option<Arc<dyn ImageGenerator>> = config
            .visual
            .generated_fallback
            .then(|| Arc::new(ProceduralImageGenerator::default()) as Arc<dyn ImageGenerator>);
        Self::new(config, speech, provider, generator)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn line_seed(&self, index: usize) -> u64 {
        derive_seed(self.config.seed, &format!("line:{index}"))
    }

    /// Voice, then mastering, then effects.
    fn line_audio(&self, index: usize, line: &Line) -> ReelResult<LineAudio> {
        let voice = self
            .voice
            .synthesize_line(&line.text, line.style_tag(), line.emotion())?;
        let mastered = self.mastering.master(voice);
        let outcome = self.sfx.place(mastered, &line.text, self.line_seed(index));
        if outcome.audio.is_empty() {
            return Err(ReelError::synthesis("line audio is empty after processing"));
        }
        Ok(LineAudio {
            audio: outcome.audio,
            sfx: outcome.applied,
        })
    }

    /// Produce one scene. Footage lookup runs alongside synthesis; downloads live in a per-line
    /// scratch directory that is removed on every exit path.
    #[tracing::instrument(skip_all, fields(line = index, style = line.style_tag().as_str()))]
    pub fn process_line(
        &self,
        index: usize,
        line: &Line,
        composer: &SceneComposer,
    ) -> ReelResult<(Scene, Vec<SfxPlacement>)> {
        let scratch = tempfile::Builder::new()
            .prefix("reelsmith_line_")
            .tempdir()
            .map_err(|e| ReelError::media(format!("create line scratch dir: {e}")))?;
        let seed = self.line_seed(index);
        let keyword = line.keyword();

        let (audio, fetched) = rayon::join(
            || self.line_audio(index, line),
            || self.visuals.lookup(keyword, seed, scratch.path()),
        );
        let LineAudio { audio, sfx } = audio?;
        let visual = self.visuals.fit(fetched, keyword, audio.duration_secs());
        let scene = composer.compose(index, &line.text, audio, visual)?;
        tracing::info!(
            secs = scene.duration_secs(),
            visual = scene.origin().label(),
            "line done"
        );
        Ok((scene, sfx))
    }

    /// Process every line in order and assemble the timeline. Line failures are logged and
    /// skipped; only an empty result aborts the run.
    pub fn build_timeline(
        &self,
        script: &Script,
        composer: &SceneComposer,
    ) -> ReelResult<(Timeline, Vec<LineReport>)> {
        script.validate()?;
        let mut scenes = Vec::with_capacity(script.lines.len());
        let mut reports = Vec::with_capacity(script.lines.len());

        for (index, line) in script.lines.iter().enumerate() {
            let status = match self.process_line(index, line, composer) {
                Ok((scene, sfx)) => {
                    let status = LineStatus::Produced {
                        duration_secs: scene.duration_secs(),
                        visual: scene.origin().clone(),
                        sfx: sfx.iter().map(|p| p.effect).collect(),
                    };
                    scenes.push(scene);
                    status
                }
                Err(e) if e.is_line_fatal() => {
                    tracing::warn!(line = index, error = %e, "line skipped");
                    LineStatus::Skipped {
                        reason: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            };
            reports.push(LineReport {
                index,
                text: line.text.clone(),
                style: line.style_tag(),
                status,
            });
        }

        if scenes.is_empty() {
            return Err(ReelError::NoScenes);
        }
        let music = self
            .assembler
            .load_music(derive_seed(self.config.seed, "music"));
        let timeline = self.assembler.assemble(scenes, music)?;
        Ok((timeline, reports))
    }

    /// Run the whole script into `sink`.
    pub fn render(&self, script: &Script, sink: &mut dyn FrameSink) -> ReelResult<RunReport> {
        let work = self.run_work_dir()?;
        tracing::info!(
            title = %script.title,
            lines = script.lines.len(),
            work_dir = %work.path().display(),
            "run started"
        );
        let composer = SceneComposer::new(self.fps, self.frame, work.path());
        let (timeline, lines) = self.build_timeline(script, &composer)?;
        let render = render_timeline(&timeline, sink, &RenderOpts::new(work.path()))?;

        let skipped = lines
            .iter()
            .filter(|l| matches!(l.status, LineStatus::Skipped { .. }))
            .count();
        Ok(RunReport {
            title: script.title.clone(),
            scenes: timeline.scenes().len(),
            skipped,
            lines,
            duration_secs: timeline.duration_secs(),
            crossfade_secs: timeline.crossfade_secs(),
            music: timeline.layers().first().map(|l| l.name.clone()),
            output: None,
            render,
        })
    }

    /// Run the whole script into an MP4 file.
    pub fn render_to_file(&self, script: &Script, out: &Path) -> ReelResult<RunReport> {
        let mut sink = FfmpegSink::new(FfmpegSinkOpts {
            overwrite: self.config.output.overwrite,
            crf: self.config.output.crf,
            ..FfmpegSinkOpts::new(out)
        });
        let mut report = self.render(script, &mut sink)?;
        report.output = Some(out.to_path_buf());
        tracing::info!(out = %out.display(), secs = report.duration_secs, "video written");
        Ok(report)
    }

    /// Describe what a run would do for each line, without calling any collaborator.
    pub fn inspect(&self, script: &Script) -> Vec<LineInspection> {
        script
            .lines
            .iter()
            .enumerate()
            .map(|(index, line)| LineInspection {
                index,
                text: line.text.clone(),
                voice: self.voice.plan(&line.text, line.style_tag(), line.emotion()),
                visual_queries: self
                    .visuals
                    .queries(line.keyword())
                    .into_iter()
                    .map(|(q, _)| q)
                    .collect(),
                sfx_triggers: self.sfx.plan_triggers(&line.text, 1.0),
            })
            .collect()
    }

    fn run_work_dir(&self) -> ReelResult<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("reelsmith_run_");
        match &self.config.work_dir {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ReelError::media(format!("create work dir '{}': {e}", parent.display()))
                })?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| ReelError::media(format!("create run work dir: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/run.rs"]
mod tests;
