use std::sync::Arc;

use image::RgbaImage;
use rayon::prelude::*;

use crate::compose::scene::{Scene, SceneVisual};
use crate::foundation::core::{Fps, FrameSize};
use crate::foundation::error::{ReelError, ReelResult};

/// Produces a scene's frames in increasing local frame order.
///
/// Requests past the end of the source hold its last frame.
pub trait FrameSource: Send {
    fn render_into(&mut self, local_frame: u64, out: &mut [u8]) -> ReelResult<()>;
}

/// Open the frame source for a composed scene.
pub fn open_source(scene: &Scene) -> ReelResult<Box<dyn FrameSource>> {
    let frame = scene.frame_size();
    Ok(match scene.visual() {
        SceneVisual::Solid { rgb } => Box::new(SolidSource { rgb: *rgb }),
        SceneVisual::Still { image, zoom_rate } => Box::new(StillSource::new(
            image.clone(),
            *zoom_rate,
            scene.fps(),
            frame,
        )?),
        SceneVisual::Clip { path } => Box::new(ClipSource::open(path, scene.fps(), frame)?),
    })
}

#[derive(Clone, Copy, Debug)]
pub struct SolidSource {
    pub rgb: [u8; 3],
}

impl FrameSource for SolidSource {
    fn render_into(&mut self, _local_frame: u64, out: &mut [u8]) -> ReelResult<()> {
        let [r, g, b] = self.rgb;
        for px in out.chunks_exact_mut(4) {
            px.copy_from_slice(&[r, g, b, 255]);
        }
        Ok(())
    }
}

/// Frame-sized still with a centred slow zoom of `1 + zoom_rate * t`.
#[derive(Clone, Debug)]
pub struct StillSource {
    image: Arc<RgbaImage>,
    zoom_rate: f64,
    fps: Fps,
}

impl StillSource {
    pub fn new(image: Arc<RgbaImage>, zoom_rate: f64, fps: Fps, frame: FrameSize) -> ReelResult<Self> {
        if image.dimensions() != (frame.width, frame.height) {
            return Err(ReelError::composition(format!(
                "still is {}x{} but output is {frame}",
                image.width(),
                image.height()
            )));
        }
        if !(zoom_rate.is_finite() && zoom_rate >= 0.0) {
            return Err(ReelError::validation("still zoom rate must be >= 0"));
        }
        Ok(Self {
            image,
            zoom_rate,
            fps,
        })
    }

    pub fn scale_at(&self, local_frame: u64) -> f64 {
        1.0 + self.zoom_rate * self.fps.frames_to_secs(local_frame)
    }
}

impl FrameSource for StillSource {
    fn render_into(&mut self, local_frame: u64, out: &mut [u8]) -> ReelResult<()> {
        let img = self.image.as_ref();
        let (w, h) = img.dimensions();
        let scale = self.scale_at(local_frame);
        if (scale - 1.0).abs() < 1e-9 {
            out.copy_from_slice(img.as_raw());
            return Ok(());
        }

        let cx = f64::from(w) / 2.0;
        let cy = f64::from(h) / 2.0;
        let row_len = w as usize * 4;
        out.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                let sy = cy + (y as f64 + 0.5 - cy) / scale - 0.5;
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let sx = cx + (x as f64 + 0.5 - cx) / scale - 0.5;
                    px.copy_from_slice(&sample_bilinear(img, sx, sy));
                }
            });
        Ok(())
    }
}

fn sample_bilinear(img: &RgbaImage, x: f64, y: f64) -> [u8; 4] {
    let max_x = f64::from(img.width() - 1);
    let max_y = f64::from(img.height() - 1);
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(img.width() - 1);
    let y1 = (y0 + 1).min(img.height() - 1);
    let fx = x - f64::from(x0);
    let fy = y - f64::from(y0);

    let p00 = img.get_pixel(x0, y0).0;
    let p10 = img.get_pixel(x1, y0).0;
    let p01 = img.get_pixel(x0, y1).0;
    let p11 = img.get_pixel(x1, y1).0;
    let mut px = [0u8; 4];
    for c in 0..3 {
        let top = f64::from(p00[c]) * (1.0 - fx) + f64::from(p10[c]) * fx;
        let bottom = f64::from(p01[c]) * (1.0 - fx) + f64::from(p11[c]) * fx;
        px[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    px[3] = 255;
    px
}

/// Reads a materialized scene clip, which is already at the output size and rate.
#[cfg(feature = "media-ffmpeg")]
pub struct ClipSource {
    reader: crate::assets::media::ClipFrameReader,
    last: Vec<u8>,
    next_local: u64,
}

#[cfg(feature = "media-ffmpeg")]
impl ClipSource {
    pub fn open(path: &std::path::Path, fps: Fps, frame: FrameSize) -> ReelResult<Self> {
        Ok(Self {
            reader: crate::assets::media::ClipFrameReader::open(path, fps, frame, "", false)?,
            last: Vec::with_capacity(frame.rgba_len()),
            next_local: 0,
        })
    }
}

#[cfg(feature = "media-ffmpeg")]
impl FrameSource for ClipSource {
    fn render_into(&mut self, local_frame: u64, out: &mut [u8]) -> ReelResult<()> {
        if local_frame + 1 < self.next_local {
            return Err(ReelError::composition(
                "clip frames must be requested in increasing order",
            ));
        }
        while self.next_local <= local_frame {
            let data = self.reader.next_frame()?;
            self.last.clear();
            self.last.extend_from_slice(data);
            self.next_local += 1;
        }
        out.copy_from_slice(&self.last);
        Ok(())
    }
}

#[cfg(not(feature = "media-ffmpeg"))]
pub struct ClipSource;

#[cfg(not(feature = "media-ffmpeg"))]
impl ClipSource {
    pub fn open(_path: &std::path::Path, _fps: Fps, _frame: FrameSize) -> ReelResult<Self> {
        Err(ReelError::media(
            "clip visuals require the 'media-ffmpeg' feature",
        ))
    }
}

#[cfg(not(feature = "media-ffmpeg"))]
impl FrameSource for ClipSource {
    fn render_into(&mut self, _local_frame: u64, _out: &mut [u8]) -> ReelResult<()> {
        Err(ReelError::media(
            "clip visuals require the 'media-ffmpeg' feature",
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frames.rs"]
mod tests;
