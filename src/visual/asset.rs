use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;
use serde::Serialize;

use crate::assets::media::MediaInfo;
use crate::foundation::core::FrameSize;
use crate::visual::fit::{DurationFit, FrameFit};

/// Which fallback tier produced a visual.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum VisualOrigin {
    Provider { candidate: String },
    FallbackKeyword { candidate: String },
    Generated,
    Solid,
}

impl VisualOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Provider { .. } => "provider",
            Self::FallbackKeyword { .. } => "fallback_keyword",
            Self::Generated => "generated",
            Self::Solid => "solid",
        }
    }
}

#[derive(Clone, Debug)]
pub enum VisualSource {
    /// Footage on disk plus the plan that fits it.
    Clip {
        path: PathBuf,
        info: MediaInfo,
        frame_fit: FrameFit,
        duration_fit: DurationFit,
    },
    /// Frame-sized still with a continuous slow zoom (`1 + zoom_rate * t`).
    Still { image: Arc<RgbaImage>, zoom_rate: f64 },
    Solid { rgb: [u8; 3] },
}

/// A visual already bound to the target frame size and exact duration.
#[derive(Clone, Debug)]
pub struct VisualAsset {
    pub source: VisualSource,
    pub frame: FrameSize,
    pub duration_secs: f64,
    pub origin: VisualOrigin,
}

impl VisualAsset {
    pub fn solid(rgb: [u8; 3], frame: FrameSize, duration_secs: f64) -> Self {
        Self {
            source: VisualSource::Solid { rgb },
            frame,
            duration_secs,
            origin: VisualOrigin::Solid,
        }
    }
}
