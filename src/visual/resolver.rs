use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::media::{MediaInfo, probe_media};
use crate::foundation::core::FrameSize;
use crate::foundation::error::{ReelError, ReelResult};
use crate::visual::asset::{VisualAsset, VisualOrigin, VisualSource};
use crate::visual::fit::{DurationFit, FrameFit, fit_still};
use crate::visual::generate::ImageGenerator;
use crate::visual::provider::{AssetProvider, Candidate};
use crate::visual::select::{SelectionPolicy, SelectionPolicyConfig};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisualConfig {
    /// Mood words appended to every keyword query.
    pub qualifiers: String,
    /// Relaxed query tried when the keyword finds nothing.
    pub fallback_keyword: String,
    pub candidate_count: usize,
    pub policy: SelectionPolicyConfig,
    /// Zoom growth per second for generated stills.
    pub zoom_rate: f64,
    pub solid_rgb: [u8; 3],
    /// Try the image generator before settling for a solid color.
    pub generated_fallback: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            qualifiers: "dark cinematic".to_owned(),
            fallback_keyword: "dark abstract background".to_owned(),
            candidate_count: 5,
            policy: SelectionPolicyConfig::default(),
            zoom_rate: 0.04,
            solid_rgb: [8, 8, 12],
            generated_fallback: true,
        }
    }
}

impl VisualConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if self.candidate_count == 0 {
            return Err(ReelError::validation("visual.candidate_count must be >= 1"));
        }
        if !(self.zoom_rate.is_finite() && self.zoom_rate >= 0.0) {
            return Err(ReelError::validation("visual.zoom_rate must be >= 0"));
        }
        self.policy.validate()
    }
}

/// A provider clip copied into a line's scratch directory.
#[derive(Clone, Debug)]
pub struct FetchedClip {
    pub candidate: Candidate,
    pub path: PathBuf,
    pub info: MediaInfo,
    /// Found through the relaxed fallback keyword.
    pub relaxed: bool,
}

/// Finds footage for a keyword and fits it to an exact duration and frame.
///
/// Resolution never fails: provider footage, then the relaxed keyword, then a generated still,
/// then a solid color.
pub struct VisualResolver {
    provider: Arc<dyn AssetProvider>,
    generator: Option<Arc<dyn ImageGenerator>>,
    policy: Box<dyn SelectionPolicy>,
    config: VisualConfig,
    frame: FrameSize,
}

impl VisualResolver {
    pub fn new(
        provider: Arc<dyn AssetProvider>,
        generator: Option<Arc<dyn ImageGenerator>>,
        config: VisualConfig,
        frame: FrameSize,
    ) -> ReelResult<Self> {
        config.validate()?;
        Ok(Self {
            provider,
            generator,
            policy: config.policy.build(),
            config,
            frame,
        })
    }

    pub fn frame(&self) -> FrameSize {
        self.frame
    }

    pub fn config(&self) -> &VisualConfig {
        &self.config
    }

    pub fn queries(&self, keyword: &str) -> Vec<(String, bool)> {
        let keyword = keyword.trim();
        let mut out = Vec::with_capacity(2);
        if !keyword.is_empty() {
            out.push((format!("{keyword} {}", self.config.qualifiers).trim().to_owned(), false));
        }
        let relaxed = self.config.fallback_keyword.trim();
        if !relaxed.is_empty() {
            out.push((relaxed.to_owned(), true));
        }
        out
    }

    /// Search and fetch footage into `scratch`. Independent of audio, so it can run alongside
    /// synthesis.
    pub fn lookup(&self, keyword: &str, seed: u64, scratch: &Path) -> Option<FetchedClip> {
        for (query, relaxed) in self.queries(keyword) {
            match self.try_query(&query, seed, scratch) {
                Ok(Some((candidate, path, info))) => {
                    tracing::info!(query, candidate = %candidate.id, "footage found");
                    return Some(FetchedClip {
                        candidate,
                        path,
                        info,
                        relaxed,
                    });
                }
                Ok(None) => tracing::warn!(query, "no footage candidates"),
                Err(e) => tracing::warn!(query, error = %e, "footage lookup failed"),
            }
        }
        None
    }

    fn try_query(
        &self,
        query: &str,
        seed: u64,
        scratch: &Path,
    ) -> ReelResult<Option<(Candidate, PathBuf, MediaInfo)>> {
        let candidates = self.provider.search(
            query,
            self.frame.orientation(),
            self.config.candidate_count,
        )?;
        let Some(candidate) = self.policy.select(&candidates, seed) else {
            return Ok(None);
        };
        let path = self.provider.fetch(candidate, scratch)?;
        let info = probe_media(&path).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "probe of fetched clip failed; using provider metadata");
            MediaInfo {
                source_path: path.clone(),
                width: candidate.width,
                height: candidate.height,
                duration_secs: candidate.duration_secs,
                has_audio: false,
            }
        });
        Ok(Some((candidate.clone(), path, info)))
    }

    /// Bind a lookup result (or its absence) to exactly `target_secs` and the target frame.
    pub fn fit(&self, fetched: Option<FetchedClip>, keyword: &str, target_secs: f64) -> VisualAsset {
        let target_secs = target_secs.max(0.0);
        if let Some(clip) = fetched {
            match FrameFit::cover(clip.info.width, clip.info.height, self.frame) {
                Ok(frame_fit) => {
                    let duration_fit = DurationFit::for_durations(clip.info.duration_secs, target_secs);
                    tracing::debug!(?duration_fit, filter = %frame_fit.ffmpeg_filter(), "clip fitted");
                    let origin = if clip.relaxed {
                        VisualOrigin::FallbackKeyword {
                            candidate: clip.candidate.id,
                        }
                    } else {
                        VisualOrigin::Provider {
                            candidate: clip.candidate.id,
                        }
                    };
                    return VisualAsset {
                        source: VisualSource::Clip {
                            path: clip.path,
                            info: clip.info,
                            frame_fit,
                            duration_fit,
                        },
                        frame: self.frame,
                        duration_secs: target_secs,
                        origin,
                    };
                }
                Err(e) => tracing::warn!(error = %e, "clip cannot be fitted; falling back"),
            }
        }

        if self.config.generated_fallback
            && let Some(generator) = &self.generator
        {
            let prompt = if keyword.trim().is_empty() {
                self.config.fallback_keyword.as_str()
            } else {
                keyword
            };
            match generator
                .generate(prompt, self.frame.width, self.frame.height)
                .and_then(|img| fit_still(&img, self.frame))
            {
                Ok(image) => {
                    tracing::warn!(keyword, generator = generator.name(), "using generated still");
                    return VisualAsset {
                        source: VisualSource::Still {
                            image: Arc::new(image),
                            zoom_rate: self.config.zoom_rate,
                        },
                        frame: self.frame,
                        duration_secs: target_secs,
                        origin: VisualOrigin::Generated,
                    };
                }
                Err(e) => tracing::warn!(error = %e, "image generation failed"),
            }
        }

        tracing::warn!(keyword, "using solid color visual");
        VisualAsset::solid(self.config.solid_rgb, self.frame, target_secs)
    }

    pub fn resolve(&self, keyword: &str, target_secs: f64, seed: u64, scratch: &Path) -> VisualAsset {
        let fetched = self.lookup(keyword, seed, scratch);
        self.fit(fetched, keyword, target_secs)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/visual/resolver.rs"]
mod tests;
