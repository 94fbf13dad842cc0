use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;

use crate::audio::segment::AudioSegment;
use crate::foundation::core::{Fps, FrameSize};
use crate::foundation::error::{ReelError, ReelResult};
use crate::visual::asset::{VisualAsset, VisualOrigin, VisualSource};

/// Picture content of a composed scene, ready to be read frame by frame.
#[derive(Clone, Debug)]
pub enum SceneVisual {
    /// Pre-fitted clip at the output frame size and rate, at least `frames` long.
    Clip { path: PathBuf },
    Still { image: Arc<RgbaImage>, zoom_rate: f64 },
    Solid { rgb: [u8; 3] },
}

/// One line's audio bound to its visual. Immutable once composed.
#[derive(Clone, Debug)]
pub struct Scene {
    line_index: usize,
    text: String,
    audio: AudioSegment,
    visual: SceneVisual,
    origin: VisualOrigin,
    frames: u64,
    fps: Fps,
    frame: FrameSize,
}

impl Scene {
    pub fn line_index(&self) -> usize {
        self.line_index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn audio(&self) -> &AudioSegment {
        &self.audio
    }

    pub fn visual(&self) -> &SceneVisual {
        &self.visual
    }

    pub fn origin(&self) -> &VisualOrigin {
        &self.origin
    }

    /// Video length in whole frames (audio length rounded up).
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn frame_size(&self) -> FrameSize {
        self.frame
    }

    /// Authoritative scene duration: the audio's.
    pub fn duration_secs(&self) -> f64 {
        self.audio.duration_secs()
    }

    pub fn visual_duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.frames)
    }
}

/// Binds a line's finished audio to its fitted visual.
#[derive(Clone, Debug)]
pub struct SceneComposer {
    fps: Fps,
    frame: FrameSize,
    work_dir: PathBuf,
}

impl SceneComposer {
    /// `work_dir` receives materialized clips and must outlive the render.
    pub fn new(fps: Fps, frame: FrameSize, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            fps,
            frame,
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Compose one scene. Clip visuals are rendered into the work directory so the line's
    /// downloads can be dropped; a clip that cannot be materialized degrades to a solid fill.
    pub fn compose(
        &self,
        line_index: usize,
        text: &str,
        audio: AudioSegment,
        visual: VisualAsset,
    ) -> ReelResult<Scene> {
        if audio.is_empty() {
            return Err(ReelError::composition(format!(
                "line {line_index} has no audio to compose"
            )));
        }
        if visual.frame != self.frame {
            return Err(ReelError::composition(format!(
                "visual is {} but output is {}",
                visual.frame, self.frame
            )));
        }
        let audio_secs = audio.duration_secs();
        if (visual.duration_secs - audio_secs).abs() >= self.fps.frame_duration_secs() {
            return Err(ReelError::composition(format!(
                "visual lasts {:.3}s but audio lasts {audio_secs:.3}s",
                visual.duration_secs
            )));
        }

        let frames = self.fps.secs_to_frames_ceil(audio_secs).max(1);
        let (scene_visual, origin) = match visual.source {
            VisualSource::Clip {
                path,
                frame_fit,
                duration_fit,
                ..
            } => {
                let out = self.work_dir.join(format!("scene_{line_index:03}.mp4"));
                match materialize_clip(
                    &path,
                    &out,
                    self.fps,
                    self.frame,
                    &frame_fit.ffmpeg_filter(),
                    duration_fit.is_loop(),
                    frames,
                ) {
                    Ok(()) => (SceneVisual::Clip { path: out }, visual.origin),
                    Err(e) => {
                        tracing::warn!(line = line_index, error = %e, "clip materialization failed; using solid fill");
                        (SceneVisual::Solid { rgb: [0, 0, 0] }, VisualOrigin::Solid)
                    }
                }
            }
            VisualSource::Still { image, zoom_rate } => {
                (SceneVisual::Still { image, zoom_rate }, visual.origin)
            }
            VisualSource::Solid { rgb } => (SceneVisual::Solid { rgb }, visual.origin),
        };

        tracing::debug!(
            line = line_index,
            secs = audio_secs,
            frames,
            origin = origin.label(),
            "scene composed"
        );
        Ok(Scene {
            line_index,
            text: text.to_owned(),
            audio,
            visual: scene_visual,
            origin,
            frames,
            fps: self.fps,
            frame: self.frame,
        })
    }

    /// Fade-in/out seconds for the scene at `position` of `count`: only the run's first scene
    /// fades in and only its last fades out.
    pub fn edge_fades(position: usize, count: usize, fade_secs: f64) -> (f64, f64) {
        let fade_secs = fade_secs.max(0.0);
        let fade_in = if position == 0 { fade_secs } else { 0.0 };
        let fade_out = if position + 1 == count { fade_secs } else { 0.0 };
        (fade_in, fade_out)
    }
}

#[cfg(feature = "media-ffmpeg")]
fn materialize_clip(
    src: &Path,
    out: &Path,
    fps: Fps,
    frame: FrameSize,
    filter: &str,
    looped: bool,
    frames: u64,
) -> ReelResult<()> {
    use crate::assets::media::ClipFrameReader;
    use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
    use crate::encode::sink::{Frame, FrameSink, SinkConfig};
    use crate::foundation::core::FrameIndex;

    let mut reader = ClipFrameReader::open(src, fps, frame, filter, looped)?;
    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        crf: 16,
        ..FfmpegSinkOpts::new(out)
    });
    sink.begin(SinkConfig {
        width: frame.width,
        height: frame.height,
        fps,
        audio: None,
    })?;
    let mut buf = Frame {
        width: frame.width,
        height: frame.height,
        data: Vec::new(),
    };
    for i in 0..frames {
        buf.data.clear();
        buf.data.extend_from_slice(reader.next_frame()?);
        sink.push_frame(FrameIndex(i), &buf)?;
    }
    sink.end()
}

#[cfg(not(feature = "media-ffmpeg"))]
fn materialize_clip(
    _src: &Path,
    _out: &Path,
    _fps: Fps,
    _frame: FrameSize,
    _filter: &str,
    _looped: bool,
    _frames: u64,
) -> ReelResult<()> {
    Err(ReelError::media(
        "clip visuals require the 'media-ffmpeg' feature",
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/compose/scene.rs"]
mod tests;
