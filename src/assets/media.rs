use std::path::{Path, PathBuf};

use crate::foundation::error::{ReelError, ReelResult};

/// Internal audio mixing sample rate used across decode/mix/encode.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

#[derive(Clone, Debug, PartialEq)]
/// Basic metadata about a source clip.
pub struct MediaInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Container duration in seconds; `0.0` when ffprobe reports none (still images).
    pub duration_secs: f64,
    pub has_audio: bool,
}

#[derive(Clone, Debug)]
/// Decoded interleaved floating-point PCM.
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

/// Probe clip metadata through `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_media(source_path: &Path) -> ReelResult<MediaInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::media(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ReelError::media(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelError::media("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| ReelError::media("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ReelError::media("missing video height from ffprobe"))?;
    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video_stream.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(0.0);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(MediaInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_secs,
        has_audio,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_media(_source_path: &Path) -> ReelResult<MediaInfo> {
    Err(ReelError::media(
        "clip and audio files require the 'media-ffmpeg' feature",
    ))
}

/// Decode any audio file ffmpeg understands into interleaved `f32` PCM.
///
/// A file without an audio stream decodes to empty PCM.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_audio_f32(path: &Path, sample_rate: u32, channels: u16) -> ReelResult<AudioPcm> {
    if sample_rate == 0 || channels == 0 {
        return Err(ReelError::validation(
            "audio decode needs a non-zero sample rate and channel count",
        ));
    }
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &channels.to_string(),
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::media(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        if msg.contains("Stream specifier")
            || msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
        {
            return Ok(AudioPcm {
                sample_rate,
                channels,
                interleaved_f32: Vec::new(),
            });
        }
        return Err(ReelError::media(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    Ok(AudioPcm {
        sample_rate,
        channels,
        interleaved_f32: f32le_to_samples(&out.stdout)?,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_audio_f32(_path: &Path, _sample_rate: u32, _channels: u16) -> ReelResult<AudioPcm> {
    Err(ReelError::media(
        "clip and audio files require the 'media-ffmpeg' feature",
    ))
}

pub(crate) fn f32le_to_samples(bytes: &[u8]) -> ReelResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(ReelError::media(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Streams fitted RGBA8 frames out of a clip through a long-running `ffmpeg` process.
///
/// `video_filter` (may be empty) is applied after frame-rate conversion; it must produce frames of
/// exactly `size`. With `looped` the source restarts at its first frame when it runs out;
/// otherwise the last decoded frame is held.
#[cfg(feature = "media-ffmpeg")]
pub struct ClipFrameReader {
    process: crate::encode::ffmpeg::FfmpegProcess,
    stdout: std::process::ChildStdout,
    path: PathBuf,
    frame: Vec<u8>,
    decoded: u64,
    exhausted: bool,
}

#[cfg(feature = "media-ffmpeg")]
impl ClipFrameReader {
    pub fn open(
        path: &Path,
        fps: crate::foundation::core::Fps,
        size: crate::foundation::core::FrameSize,
        video_filter: &str,
        looped: bool,
    ) -> ReelResult<Self> {
        use std::process::{Command, Stdio};

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .args(["-v", "error"]);
        if looped {
            cmd.args(["-stream_loop", "-1"]);
        }
        let mut vf = format!("fps={}/{}", fps.num, fps.den);
        if !video_filter.is_empty() {
            vf.push(',');
            vf.push_str(video_filter);
        }
        cmd.arg("-i").arg(path).args([
            "-an",
            "-vf",
            &vf,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ]);

        let mut process = crate::encode::ffmpeg::FfmpegProcess::spawn(cmd)?;
        let stdout = process.take_stdout()?;
        Ok(Self {
            process,
            stdout,
            path: path.to_path_buf(),
            frame: vec![0u8; size.rgba_len()],
            decoded: 0,
            exhausted: false,
        })
    }

    /// Next frame in presentation order. Fails only when the clip yields no frame at all.
    pub fn next_frame(&mut self) -> ReelResult<&[u8]> {
        use std::io::Read as _;

        if !self.exhausted {
            match self.stdout.read_exact(&mut self.frame) {
                Ok(()) => self.decoded += 1,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    self.exhausted = true;
                }
                Err(e) => {
                    return Err(ReelError::media(format!(
                        "failed to read frames from '{}': {e}",
                        self.path.display()
                    )));
                }
            }
        }
        if self.decoded == 0 {
            let log = self.process.abort();
            return Err(ReelError::media(format!(
                "ffmpeg produced no frames for '{}': {}",
                self.path.display(),
                log.trim()
            )));
        }
        Ok(&self.frame)
    }

    pub fn frames_decoded(&self) -> u64 {
        self.decoded
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
