use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::assets::media::decode_audio_f32;
use crate::audio::segment::AudioSegment;
use crate::foundation::error::{ReelError, ReelResult};
use crate::voice::profile::SpeakerSelection;

/// One call into a speech engine.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub speaker: SpeakerSelection,
    pub instruct: String,
    /// Playback speed multiplier (`> 1` is faster).
    pub speed: f32,
}

/// A text-to-speech engine.
///
/// Implementations are not required to be reentrant; the pipeline serializes calls through
/// [`SharedSpeech`].
pub trait SpeechBackend: Send {
    fn name(&self) -> &str;

    /// Return `true` when [`SpeakerSelection::Blend`] is honored natively.
    fn supports_blend(&self) -> bool {
        false
    }

    /// Synthesize one chunk. Only the primary speaker of a blend is used unless
    /// [`SpeechBackend::supports_blend`] is `true`.
    fn synthesize(&mut self, request: &SpeechRequest) -> ReelResult<AudioSegment>;
}

/// Mutex-guarded speech engine shared by handle for the duration of a run.
#[derive(Clone)]
pub struct SharedSpeech {
    inner: Arc<Mutex<Box<dyn SpeechBackend>>>,
    name: Arc<str>,
    supports_blend: bool,
}

impl SharedSpeech {
    pub fn new(backend: impl SpeechBackend + 'static) -> Self {
        let name: Arc<str> = Arc::from(backend.name());
        let supports_blend = backend.supports_blend();
        Self {
            inner: Arc::new(Mutex::new(Box::new(backend))),
            name,
            supports_blend,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supports_blend(&self) -> bool {
        self.supports_blend
    }

    pub fn synthesize(&self, request: &SpeechRequest) -> ReelResult<AudioSegment> {
        let mut backend = self
            .inner
            .lock()
            .map_err(|_| ReelError::synthesis("speech backend lock poisoned"))?;
        backend.synthesize(request)
    }
}

impl std::fmt::Debug for SharedSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSpeech")
            .field("name", &self.name)
            .field("supports_blend", &self.supports_blend)
            .finish()
    }
}

/// Settings for [`CommandSpeechBackend`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpeechCommandConfig {
    pub program: String,
    /// Argument template. `{speaker}`, `{speed}`, `{length_scale}`, `{instruct}` and `{out}` are
    /// substituted per call.
    pub args: Vec<String>,
    /// Pass blends through as `a:0.70,b:0.30` in `{speaker}`.
    pub blend_speakers: bool,
}

impl Default for SpeechCommandConfig {
    fn default() -> Self {
        Self {
            program: "piper".to_owned(),
            args: vec![
                "--speaker".to_owned(),
                "{speaker}".to_owned(),
                "--length_scale".to_owned(),
                "{length_scale}".to_owned(),
                "--output_file".to_owned(),
                "{out}".to_owned(),
            ],
            blend_speakers: false,
        }
    }
}

/// Runs an external TTS program once per chunk, text on stdin, audio written to a file.
#[derive(Clone, Debug)]
pub struct CommandSpeechBackend {
    config: SpeechCommandConfig,
    sample_rate: u32,
}

impl CommandSpeechBackend {
    pub fn new(config: SpeechCommandConfig, sample_rate: u32) -> ReelResult<Self> {
        if config.program.trim().is_empty() {
            return Err(ReelError::validation("speech.program must not be empty"));
        }
        if !config.args.iter().any(|a| a.contains("{out}")) {
            return Err(ReelError::validation(
                "speech.args must contain an {out} placeholder",
            ));
        }
        if sample_rate == 0 {
            return Err(ReelError::validation("speech sample rate must be > 0"));
        }
        Ok(Self {
            config,
            sample_rate,
        })
    }

    pub(crate) fn render_args(&self, request: &SpeechRequest, out: &std::path::Path) -> Vec<String> {
        let speaker = if self.config.blend_speakers {
            request.speaker.selector()
        } else {
            request.speaker.primary().to_owned()
        };
        let speed = request.speed.max(f32::EPSILON);
        self.config
            .args
            .iter()
            .map(|a| {
                a.replace("{speaker}", &speaker)
                    .replace("{speed}", &format!("{speed:.3}"))
                    .replace("{length_scale}", &format!("{:.3}", 1.0 / speed))
                    .replace("{instruct}", &request.instruct)
                    .replace("{out}", &out.to_string_lossy())
            })
            .collect()
    }
}

impl SpeechBackend for CommandSpeechBackend {
    fn name(&self) -> &str {
        &self.config.program
    }

    fn supports_blend(&self) -> bool {
        self.config.blend_speakers
    }

    fn synthesize(&mut self, request: &SpeechRequest) -> ReelResult<AudioSegment> {
        // Dropped on every return path, taking the produced file with it.
        let dir = tempfile::tempdir()
            .map_err(|e| ReelError::synthesis(format!("failed to create speech temp dir: {e}")))?;
        let out: PathBuf = dir.path().join("speech.wav");

        let mut child = Command::new(&self.config.program)
            .args(self.render_args(request, &out))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelError::synthesis(format!(
                    "failed to spawn speech program '{}': {e}",
                    self.config.program
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(request.text.as_bytes())
        {
            // The program quit without reading its input; reap it before giving up on the chunk.
            drop(stdin);
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReelError::synthesis(format!(
                "failed to write text to stdin: {e}"
            )));
        }
        let output = child
            .wait_with_output()
            .map_err(|e| ReelError::synthesis(format!("speech program did not finish: {e}")))?;
        if !output.status.success() {
            return Err(ReelError::synthesis(format!(
                "speech program exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if !out.is_file() {
            return Err(ReelError::synthesis("speech program produced no output file"));
        }

        let pcm = decode_audio_f32(&out, self.sample_rate, 1)
            .map_err(|e| ReelError::synthesis(format!("speech output unreadable: {e}")))?;
        AudioSegment::new(pcm.interleaved_f32, pcm.sample_rate)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/voice/backend.rs"]
mod tests;
