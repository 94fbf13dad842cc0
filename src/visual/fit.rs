use image::RgbaImage;
use image::imageops::{self, FilterType};
use serde::Serialize;

use crate::foundation::core::FrameSize;
use crate::foundation::error::{ReelError, ReelResult};

/// How a source of native duration `d` is stretched over a target duration `t`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DurationFit {
    /// Play from the start and cut at `t` (`d >= t`).
    Trim,
    /// Play `cycles = ceil(t / d)` back-to-back copies, cut at `t`.
    Loop { cycles: u32 },
}

impl DurationFit {
    /// Sources with no usable duration are treated as trims (held frames).
    pub fn for_durations(native_secs: f64, target_secs: f64) -> Self {
        if !(native_secs.is_finite() && native_secs > 0.0) || native_secs >= target_secs {
            return Self::Trim;
        }
        let cycles = (target_secs / native_secs).ceil().max(1.0);
        Self::Loop {
            cycles: cycles.min(f64::from(u32::MAX)) as u32,
        }
    }

    pub fn is_loop(self) -> bool {
        matches!(self, Self::Loop { .. })
    }
}

/// Scale-to-cover then center-crop geometry. Never letterboxes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FrameFit {
    pub source_width: u32,
    pub source_height: u32,
    pub scale: f64,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub crop_x: u32,
    pub crop_y: u32,
    pub target: FrameSize,
}

impl FrameFit {
    pub fn cover(source_width: u32, source_height: u32, target: FrameSize) -> ReelResult<Self> {
        if source_width == 0 || source_height == 0 {
            return Err(ReelError::visual("source has zero width or height"));
        }
        let sx = f64::from(target.width) / f64::from(source_width);
        let sy = f64::from(target.height) / f64::from(source_height);
        let scale = sx.max(sy);
        let scaled_width = scaled_dim(source_width, scale).max(target.width);
        let scaled_height = scaled_dim(source_height, scale).max(target.height);
        Ok(Self {
            source_width,
            source_height,
            scale,
            scaled_width,
            scaled_height,
            crop_x: (scaled_width - target.width) / 2,
            crop_y: (scaled_height - target.height) / 2,
            target,
        })
    }

    /// `ffmpeg -vf` chain performing the same fit.
    pub fn ffmpeg_filter(&self) -> String {
        format!(
            "scale={}:{}:flags=bicubic,crop={}:{}:{}:{},setsar=1",
            self.scaled_width,
            self.scaled_height,
            self.target.width,
            self.target.height,
            self.crop_x,
            self.crop_y
        )
    }

    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        let scaled = if image.dimensions() == (self.scaled_width, self.scaled_height) {
            image.clone()
        } else {
            imageops::resize(image, self.scaled_width, self.scaled_height, FilterType::Triangle)
        };
        imageops::crop_imm(
            &scaled,
            self.crop_x,
            self.crop_y,
            self.target.width,
            self.target.height,
        )
        .to_image()
    }
}

fn scaled_dim(dim: u32, scale: f64) -> u32 {
    // Absorb float noise so an exact fit does not round up by a pixel.
    ((f64::from(dim) * scale) - 1e-6).ceil() as u32
}

/// Cover-fit a still image to `target`.
pub fn fit_still(image: &RgbaImage, target: FrameSize) -> ReelResult<RgbaImage> {
    let (w, h) = image.dimensions();
    Ok(FrameFit::cover(w, h, target)?.apply(image))
}

#[cfg(test)]
#[path = "../../tests/unit/visual/fit.rs"]
mod tests;
