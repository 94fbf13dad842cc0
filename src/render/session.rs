use std::path::{Path, PathBuf};
use std::sync::mpsc;

use rayon::prelude::*;
use serde::Serialize;

use crate::assets::media::MIX_SAMPLE_RATE;
use crate::audio::mix::{mix_plan, write_mix_to_f32le_file};
use crate::compose::timeline::Timeline;
use crate::encode::sink::{AudioInputConfig, Frame, FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::lerp_u8;
use crate::render::frames::{FrameSource, open_source};

/// Options controlling [`render_timeline`].
#[derive(Clone, Debug)]
pub struct RenderOpts {
    /// Directory for the temporary mixed-audio file.
    pub work_dir: PathBuf,
    /// Mix and attach the soundtrack.
    pub enable_audio: bool,
    /// Bounded channel capacity between the compositor and the encoder thread.
    pub channel_capacity: usize,
}

impl RenderOpts {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            enable_audio: true,
            channel_capacity: 4,
        }
    }
}

/// Render statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub frames_total: u64,
    /// Frames where two scenes were blended.
    pub frames_blended: u64,
    /// Interleaved stereo samples handed to the encoder.
    pub audio_samples: u64,
}

/// Render a timeline and stream its frames, with the mixed soundtrack, into `sink`.
///
/// Frames are composited on the calling thread and encoded on a scoped encoder thread behind a
/// bounded channel.
pub fn render_timeline(
    timeline: &Timeline,
    sink: &mut dyn FrameSink,
    opts: &RenderOpts,
) -> ReelResult<RenderStats> {
    let mut stats = RenderStats {
        frames_total: timeline.total_frames(),
        ..RenderStats::default()
    };

    let mut audio_tmp = TempFileGuard(None);
    let audio_cfg = if opts.enable_audio {
        let mixed = mix_plan(&timeline.mix_plan(MIX_SAMPLE_RATE));
        stats.audio_samples = mixed.len() as u64;
        let path = unique_mix_path(&opts.work_dir);
        write_mix_to_f32le_file(&mixed, &path)?;
        audio_tmp.0 = Some(path.clone());
        Some(AudioInputConfig {
            path,
            sample_rate: MIX_SAMPLE_RATE,
            channels: 2,
        })
    } else {
        None
    };

    let size = timeline.frame_size();
    let cfg = SinkConfig {
        width: size.width,
        height: size.height,
        fps: timeline.fps(),
        audio: audio_cfg,
    };
    let cap = opts.channel_capacity.max(1);
    let total = stats.frames_total;

    let res = std::thread::scope(|scope| -> ReelResult<u64> {
        let (tx, rx) = mpsc::sync_channel::<(FrameIndex, Frame)>(cap);
        let sink_ref: &mut dyn FrameSink = sink;

        let enc = scope.spawn(move || -> ReelResult<()> {
            sink_ref.begin(cfg)?;
            for (idx, frame) in rx {
                sink_ref.push_frame(idx, &frame)?;
            }
            sink_ref.end()
        });

        let produce_res = (|| -> ReelResult<u64> {
            let mut compositor = Compositor::new(timeline);
            for k in 0..total {
                let frame = compositor.frame(k)?;
                tx.send((FrameIndex(k), frame))
                    .map_err(|_| ReelError::media("encoder thread is not accepting frames"))?;
            }
            Ok(compositor.blended)
        })();

        drop(tx);
        let enc_res = enc
            .join()
            .map_err(|_| ReelError::media("encoder thread panicked"))?;

        // The encoder error is the root cause when it stopped accepting frames.
        enc_res?;
        produce_res
    });
    drop(audio_tmp);

    stats.frames_blended = res?;
    tracing::info!(
        frames = stats.frames_total,
        blended = stats.frames_blended,
        "timeline rendered"
    );
    Ok(stats)
}

/// Per-frame compositing state: lazily opened scene sources plus scratch buffers.
struct Compositor<'a> {
    timeline: &'a Timeline,
    sources: Vec<Option<Box<dyn FrameSource>>>,
    scratch: Vec<u8>,
    /// Whole frames shared by consecutive scenes; zero for cuts.
    overlap_frames: u64,
    blended: u64,
}

impl<'a> Compositor<'a> {
    fn new(timeline: &'a Timeline) -> Self {
        Self {
            timeline,
            sources: (0..timeline.scenes().len()).map(|_| None).collect(),
            scratch: vec![0u8; timeline.frame_size().rgba_len()],
            overlap_frames: if timeline.crossfade_secs() > 0.0 {
                timeline
                    .fps()
                    .secs_to_frames_round(timeline.crossfade_secs())
            } else {
                0
            },
            blended: 0,
        }
    }

    fn frame(&mut self, k: u64) -> ReelResult<Frame> {
        let timeline = self.timeline;
        let placements = timeline.placements();
        let primary = placements
            .iter()
            .rposition(|p| p.start_frame <= k)
            .unwrap_or(0);
        self.release_before(primary.saturating_sub(1));

        let mut out = Frame::black(timeline.frame_size());
        self.render_scene(primary, k, &mut out.data)?;

        // Cuts never mix scenes: the rounded-up tail of the outgoing scene is dropped.
        let overlap = self.overlap_frames;
        if primary > 0 && overlap > 0 {
            let prev = placements[primary - 1];
            let cur = placements[primary];
            if k < prev.end_frame() && k < cur.start_frame + overlap {
                let t = ((k - cur.start_frame) as f64 + 0.5) / overlap as f64;
                let w = (t.clamp(0.0, 1.0) * 255.0).round() as u8;

                let mut scratch = std::mem::take(&mut self.scratch);
                let res = self.render_scene(primary - 1, k, &mut scratch);
                if res.is_ok() {
                    out.data
                        .par_chunks_mut(4)
                        .zip(scratch.par_chunks(4))
                        .for_each(|(dst, src)| {
                            for c in 0..3 {
                                dst[c] = lerp_u8(src[c], dst[c], w);
                            }
                        });
                    self.blended += 1;
                }
                self.scratch = scratch;
                res?;
            }
        }

        let gain = self.edge_gain(k);
        if gain < 1.0 {
            let g = (gain.clamp(0.0, 1.0) * 255.0).round() as u8;
            out.data.par_chunks_mut(4).for_each(|px| {
                for c in px.iter_mut().take(3) {
                    *c = lerp_u8(0, *c, g);
                }
            });
        }
        Ok(out)
    }

    fn render_scene(&mut self, i: usize, k: u64, out: &mut [u8]) -> ReelResult<()> {
        let p = self.timeline.placements()[i];
        let local = k.saturating_sub(p.start_frame).min(p.frames.saturating_sub(1));
        let slot = &mut self.sources[i];
        if slot.is_none() {
            *slot = Some(open_source(&self.timeline.scenes()[i])?);
        }
        match slot.as_mut() {
            Some(src) => src.render_into(local, out),
            None => Err(ReelError::composition("scene source missing")),
        }
    }

    /// Drop sources of scenes that can no longer appear.
    fn release_before(&mut self, first_live: usize) {
        for s in self.sources.iter_mut().take(first_live) {
            s.take();
        }
    }

    /// Fade from black at the start of the run and to black at its end.
    fn edge_gain(&self, k: u64) -> f64 {
        let placements = self.timeline.placements();
        let fps = self.timeline.fps();
        // Sample at the frame centre.
        let t = fps.frames_to_secs(k) + fps.frame_duration_secs() / 2.0;
        let mut gain = 1.0f64;
        if let Some(first) = placements.first()
            && first.fade_in_secs > 0.0
        {
            gain *= (t / first.fade_in_secs).min(1.0);
        }
        if let Some(last) = placements.last()
            && last.fade_out_secs > 0.0
        {
            let rem = self.timeline.duration_secs() - t;
            gain *= (rem / last.fade_out_secs).clamp(0.0, 1.0);
        }
        gain
    }
}

fn unique_mix_path(dir: &Path) -> PathBuf {
    dir.join(format!(
        "reelsmith_mix_{}_{}.f32le",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ))
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/session.rs"]
mod tests;
