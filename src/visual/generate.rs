use image::RgbaImage;
use rayon::prelude::*;
use xxhash_rust::xxh3::xxh3_64;

use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::splitmix64;

/// Produces a still image for a prompt when no footage is available.
pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn generate(&self, prompt: &str, width: u32, height: u32) -> ReelResult<RgbaImage>;
}

/// Deterministic dark gradient with vignette and film grain, keyed by the prompt.
#[derive(Clone, Copy, Debug)]
pub struct ProceduralImageGenerator {
    /// Grain amplitude in 8-bit steps.
    pub grain: u8,
}

impl Default for ProceduralImageGenerator {
    fn default() -> Self {
        Self { grain: 10 }
    }
}

impl ImageGenerator for ProceduralImageGenerator {
    fn name(&self) -> &str {
        "procedural"
    }

    fn generate(&self, prompt: &str, width: u32, height: u32) -> ReelResult<RgbaImage> {
        if width == 0 || height == 0 {
            return Err(ReelError::visual("generated image needs non-zero size"));
        }
        let hash = xxh3_64(prompt.trim().to_lowercase().as_bytes());
        let top = palette(hash, 0.22);
        let bottom = palette(splitmix64(hash), 0.06);
        let grain = i32::from(self.grain);

        let w = width as usize;
        let (cx, cy) = (f64::from(width) / 2.0, f64::from(height) / 2.0);
        let max_r = (cx * cx + cy * cy).sqrt();

        let mut buf = vec![0u8; w * height as usize * 4];
        buf.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
            let v = y as f64 / f64::from(height.max(2) - 1);
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                let vignette = 1.0 - 0.65 * ((dx * dx + dy * dy).sqrt() / max_r).powi(2);
                let noise = splitmix64(hash ^ ((y * w + x) as u64));
                let n = (noise % (2 * grain as u64 + 1)) as i32 - grain;
                for c in 0..3 {
                    let base = top[c] + (bottom[c] - top[c]) * v;
                    let val = (base * vignette * 255.0).round() as i32 + n;
                    px[c] = val.clamp(0, 255) as u8;
                }
                px[3] = 255;
            }
        });

        RgbaImage::from_raw(width, height, buf)
            .ok_or_else(|| ReelError::visual("generated buffer size mismatch"))
    }
}

/// Muted color of brightness `level` with a hue taken from `seed`.
fn palette(seed: u64, level: f64) -> [f64; 3] {
    let hue = (seed % 360) as f64 / 60.0;
    let x = 1.0 - (hue % 2.0 - 1.0).abs();
    let (r, g, b) = match hue as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    // Low saturation: mix toward grey.
    [
        level * (0.6 + 0.4 * r),
        level * (0.6 + 0.4 * g),
        level * (0.6 + 0.4 * b),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/visual/generate.rs"]
mod tests;
