use std::ffi::OsString;
use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use crate::assets::media::is_ffmpeg_on_path;
use crate::encode::sink::{Frame, FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, FrameSize};
use crate::foundation::error::{ReelError, ReelResult};

/// A running `ffmpeg` with its stderr collected on a side thread.
///
/// Dropping it kills the process, so an abandoned encode or decode never lingers.
pub(crate) struct FfmpegProcess {
    child: Child,
    stderr: Option<JoinHandle<Vec<u8>>>,
}

impl FfmpegProcess {
    pub(crate) fn spawn(mut cmd: Command) -> ReelResult<Self> {
        let mut child = cmd
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReelError::media(format!("cannot start ffmpeg: {e}")))?;
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut bytes = Vec::new();
                let _ = pipe.read_to_end(&mut bytes);
                bytes
            })
        });
        Ok(Self { child, stderr })
    }

    pub(crate) fn take_stdin(&mut self) -> ReelResult<ChildStdin> {
        self.child
            .stdin
            .take()
            .ok_or_else(|| ReelError::media("ffmpeg stdin is not piped"))
    }

    pub(crate) fn take_stdout(&mut self) -> ReelResult<ChildStdout> {
        self.child
            .stdout
            .take()
            .ok_or_else(|| ReelError::media("ffmpeg stdout is not piped"))
    }

    /// Wait for a clean exit. A failing exit carries ffmpeg's own message.
    pub(crate) fn finish(mut self, what: &str) -> ReelResult<()> {
        let status = self
            .child
            .wait()
            .map_err(|e| ReelError::media(format!("{what}: wait for ffmpeg: {e}")))?;
        let log = self.stderr_text();
        if status.success() {
            return Ok(());
        }
        Err(ReelError::media(format!("{what}: ffmpeg {status}: {}", log.trim())))
    }

    /// Stop the process and return whatever it logged.
    pub(crate) fn abort(&mut self) -> String {
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.stderr_text()
    }

    fn stderr_text(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|h| h.join().ok())
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        if self.stderr.is_some() {
            self.abort();
        }
    }
}

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    /// Replace an existing file at `out_path`.
    pub overwrite: bool,
    /// x264 constant rate factor.
    pub crf: u8,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            crf: 20,
        }
    }
}

fn push_args(args: &mut Vec<OsString>, items: &[&str]) {
    args.extend(items.iter().map(OsString::from));
}

/// Arguments turning opaque RGBA on stdin (plus the optional PCM file) into an h264/aac MP4.
pub(crate) fn encoder_args(cfg: &SinkConfig, opts: &FfmpegSinkOpts) -> Vec<OsString> {
    let mut args = Vec::new();
    let size = format!("{}x{}", cfg.width, cfg.height);
    let rate = format!("{}/{}", cfg.fps.num, cfg.fps.den);
    push_args(&mut args, &[if opts.overwrite { "-y" } else { "-n" }, "-v", "error"]);
    push_args(
        &mut args,
        &[
            "-f", "rawvideo", "-pix_fmt", "rgba", "-video_size", &size, "-framerate", &rate, "-i",
            "pipe:0",
        ],
    );
    if let Some(audio) = &cfg.audio {
        let ar = audio.sample_rate.to_string();
        let ac = audio.channels.to_string();
        push_args(&mut args, &["-f", "f32le", "-ar", &ar, "-ac", &ac, "-i"]);
        args.push(audio.path.clone().into_os_string());
    }
    let crf = opts.crf.to_string();
    push_args(
        &mut args,
        &["-c:v", "libx264", "-crf", &crf, "-pix_fmt", "yuv420p"],
    );
    if cfg.audio.is_some() {
        push_args(&mut args, &["-c:a", "aac", "-shortest"]);
    } else {
        push_args(&mut args, &["-an"]);
    }
    push_args(&mut args, &["-movflags", "+faststart"]);
    args.push(opts.out_path.clone().into_os_string());
    args
}

struct Encoding {
    process: FfmpegProcess,
    stdin: ChildStdin,
    frame_len: usize,
    next: u64,
}

/// Streams frames into a system `ffmpeg` writing an MP4.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    encoding: Option<Encoding>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            encoding: None,
        }
    }

    pub fn out_path(&self) -> &Path {
        &self.opts.out_path
    }

    fn check(&self, cfg: &SinkConfig) -> ReelResult<FrameSize> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ReelError::validation("encoder fps must be non-zero"));
        }
        let size = FrameSize::new(cfg.width, cfg.height)?;
        if !size.width.is_multiple_of(2) || !size.height.is_multiple_of(2) {
            return Err(ReelError::validation(format!(
                "yuv420p output needs even dimensions, got {size}"
            )));
        }
        if let Some(audio) = &cfg.audio
            && (audio.sample_rate == 0 || audio.channels == 0)
        {
            return Err(ReelError::validation("audio input needs a rate and channels"));
        }
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(ReelError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        Ok(size)
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        let size = self.check(&cfg)?;
        ensure_parent_dir(&self.opts.out_path)?;
        if !is_ffmpeg_on_path() {
            return Err(ReelError::media("MP4 output needs ffmpeg on PATH"));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.args(encoder_args(&cfg, &self.opts))
            .stdin(Stdio::piped())
            .stdout(Stdio::null());
        let mut process = FfmpegProcess::spawn(cmd)?;
        let stdin = process.take_stdin()?;
        self.encoding = Some(Encoding {
            process,
            stdin,
            frame_len: size.rgba_len(),
            next: 0,
        });
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> ReelResult<()> {
        let enc = self
            .encoding
            .as_mut()
            .ok_or_else(|| ReelError::media("encoder is not running"))?;
        if idx.0 < enc.next {
            return Err(ReelError::media(format!(
                "frame {} arrived after frame {}",
                idx.0,
                enc.next - 1
            )));
        }
        if frame.data.len() != enc.frame_len {
            return Err(ReelError::validation(format!(
                "frame {} has {} bytes, encoder expects {}",
                idx.0,
                frame.data.len(),
                enc.frame_len
            )));
        }
        enc.stdin
            .write_all(&frame.data)
            .map_err(|e| ReelError::media(format!("encoder rejected frame {}: {e}", idx.0)))?;
        enc.next = idx.0 + 1;
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        let Encoding { process, stdin, .. } = self
            .encoding
            .take()
            .ok_or_else(|| ReelError::media("encoder is not running"))?;
        drop(stdin);
        process.finish(&format!("encode '{}'", self.opts.out_path.display()))
    }
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    use anyhow::Context as _;
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output directory '{}'", parent.display()))?;
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
