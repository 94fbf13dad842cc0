use std::path::PathBuf;

use crate::foundation::core::{Fps, FrameIndex, FrameSize};
use crate::foundation::error::{ReelError, ReelResult};

/// One opaque RGBA8 video frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn black(size: FrameSize) -> Self {
        let mut data = vec![0u8; size.rgba_len()];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            width: size.width,
            height: size.height,
            data,
        }
    }

    pub fn size(&self) -> ReelResult<FrameSize> {
        FrameSize::new(self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }
}

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Optional external raw PCM audio file input.
    pub audio: Option<AudioInputConfig>,
}

/// Raw PCM audio input for sinks that encode audio.
#[derive(Debug, Clone)]
pub struct AudioInputConfig {
    /// Path to interleaved `f32le` PCM data.
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Sink contract for consuming frames in timeline order.
///
/// `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> ReelResult<()>;
    fn end(&mut self) -> ReelResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    /// Raw mixed audio copied out of the configured PCM file at `end`.
    audio: Option<Vec<f32>>,
    pub(crate) frames: Vec<(FrameIndex, Frame)>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    pub fn frames(&self) -> &[(FrameIndex, Frame)] {
        &self.frames
    }

    /// Interleaved PCM that would have been muxed, if audio was configured.
    pub fn audio(&self) -> Option<&[f32]> {
        self.audio.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.audio = None;
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> ReelResult<()> {
        if let Some((last, _)) = self.frames.last()
            && idx.0 <= last.0
        {
            return Err(ReelError::composition(
                "in-memory sink received out-of-order frame index",
            ));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        // The PCM file is removed by the renderer right after `end`, so read it now.
        if let Some(audio) = self.cfg.as_ref().and_then(|c| c.audio.as_ref()) {
            let bytes = std::fs::read(&audio.path).map_err(|e| {
                ReelError::media(format!(
                    "failed to read mixed audio '{}': {e}",
                    audio.path.display()
                ))
            })?;
            self.audio = Some(crate::assets::media::f32le_to_samples(&bytes)?);
        }
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
