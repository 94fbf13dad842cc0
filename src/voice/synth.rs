use serde::Serialize;

use crate::audio::segment::AudioSegment;
use crate::foundation::error::{ReelError, ReelResult};
use crate::voice::backend::{SharedSpeech, SpeechRequest};
use crate::voice::chunk::{Boundary, split_chunks, strip_cues};
use crate::voice::profile::{ProfileTable, SpeakerSelection, StyleTag, VoiceProfile};

/// Nominal output rate of the voice stage.
pub const VOICE_SAMPLE_RATE: u32 = 24_000;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChunkPlan {
    pub text: String,
    pub boundary: Boundary,
    pub speed: f32,
    pub gap_secs: f64,
}

/// What [`VoiceSynthesizer::synthesize_line`] would send to the backend for one line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinePlan {
    pub style: StyleTag,
    pub profile: VoiceProfile,
    pub instruct: String,
    /// Pitch factor applied afterwards to emulate a blend, if any.
    pub blend_emulation: Option<f32>,
    pub chunks: Vec<ChunkPlan>,
}

/// Turns one line of text into one waveform, chunk by chunk.
#[derive(Clone, Debug)]
pub struct VoiceSynthesizer {
    speech: SharedSpeech,
    profiles: ProfileTable,
    sample_rate: u32,
    strip_cues: bool,
}

impl VoiceSynthesizer {
    pub fn new(speech: SharedSpeech, profiles: ProfileTable, sample_rate: u32) -> ReelResult<Self> {
        if sample_rate == 0 {
            return Err(ReelError::validation("voice sample rate must be > 0"));
        }
        profiles.validate()?;
        Ok(Self {
            speech,
            profiles,
            sample_rate,
            strip_cues: false,
        })
    }

    /// Drop bracketed cues like `[gasps]` before chunking.
    pub fn with_strip_cues(mut self, strip: bool) -> Self {
        self.strip_cues = strip;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    pub fn plan(&self, text: &str, style: StyleTag, emotion: Option<&str>) -> LinePlan {
        let profile = self.profiles.resolve(style);
        let instruct = emotion
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map_or_else(|| profile.instruct.clone(), str::to_owned);

        let text = if self.strip_cues {
            strip_cues(text)
        } else {
            text.to_owned()
        };
        let chunks = split_chunks(&text)
            .into_iter()
            .map(|c| ChunkPlan {
                speed: c.boundary.speed_factor() * profile.speed,
                gap_secs: c.boundary.gap_secs(),
                text: c.text,
                boundary: c.boundary,
            })
            .collect();

        let blend_emulation = match profile.speaker {
            SpeakerSelection::Blend { .. } if !self.speech.supports_blend() => profile.blend_pitch,
            _ => None,
        };

        LinePlan {
            style,
            profile,
            instruct,
            blend_emulation,
            chunks,
        }
    }

    pub fn synthesize(&self, text: &str, style: StyleTag) -> ReelResult<AudioSegment> {
        self.synthesize_line(text, style, None)
    }

    /// Synthesize every chunk, append its punctuation gap, then apply the profile's pitch
    /// adjustments. A chunk the backend fails on is skipped; the line fails only when nothing
    /// was produced.
    pub fn synthesize_line(
        &self,
        text: &str,
        style: StyleTag,
        emotion: Option<&str>,
    ) -> ReelResult<AudioSegment> {
        let plan = self.plan(text, style, emotion);
        if plan.chunks.is_empty() {
            return Err(ReelError::empty_synthesis(format!(
                "no speakable chunks in {text:?}"
            )));
        }

        let mut out = AudioSegment::empty(self.sample_rate);
        let mut produced = 0usize;
        let mut last_error = None;
        for (i, chunk) in plan.chunks.iter().enumerate() {
            let request = SpeechRequest {
                text: chunk.text.clone(),
                speaker: plan.profile.speaker.clone(),
                instruct: plan.instruct.clone(),
                speed: chunk.speed,
            };
            let audio = match self
                .speech
                .synthesize(&request)
                .and_then(|a| a.resample(self.sample_rate))
            {
                Ok(a) if !a.is_empty() => a,
                Ok(_) => {
                    tracing::warn!(chunk = i, "speech backend returned no samples; chunk skipped");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(chunk = i, error = %e, "chunk synthesis failed; chunk skipped");
                    last_error = Some(e);
                    continue;
                }
            };
            tracing::debug!(
                chunk = i,
                speed = chunk.speed,
                secs = audio.duration_secs(),
                "chunk synthesized"
            );
            out.append(&audio)?;
            out.append_silence(chunk.gap_secs);
            produced += 1;
        }

        if produced == 0 {
            return Err(match last_error {
                Some(e) => ReelError::synthesis(format!("every chunk failed; last error: {e}")),
                None => ReelError::synthesis("backend produced no audio for any chunk"),
            });
        }

        if let Some(factor) = plan.blend_emulation {
            out = out.reinterpret_rate(factor)?;
        }
        if let Some(factor) = plan.profile.deepen {
            out = out.reinterpret_rate(factor)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/voice/synth.rs"]
mod tests;
