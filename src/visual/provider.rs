use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;

use crate::assets::media::{MediaInfo, probe_media};
use crate::foundation::core::Orientation;
use crate::foundation::error::{ReelError, ReelResult};

/// One search hit from an [`AssetProvider`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
    pub id: String,
    /// Provider-specific location (file path, URL, ...).
    pub location: String,
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
}

impl Candidate {
    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Stock footage source.
pub trait AssetProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `count` candidates for `query` whose orientation fits `orientation`.
    fn search(
        &self,
        query: &str,
        orientation: Orientation,
        count: usize,
    ) -> ReelResult<Vec<Candidate>>;

    /// Make `candidate` available as a local file inside `dest_dir`.
    fn fetch(&self, candidate: &Candidate, dest_dir: &Path) -> ReelResult<PathBuf>;
}

/// Provider with nothing in it; every lookup falls through to generated visuals.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProvider;

impl AssetProvider for NoProvider {
    fn name(&self) -> &str {
        "none"
    }

    fn search(&self, _query: &str, _orientation: Orientation, _count: usize) -> ReelResult<Vec<Candidate>> {
        Ok(Vec::new())
    }

    fn fetch(&self, candidate: &Candidate, _dest_dir: &Path) -> ReelResult<PathBuf> {
        Err(ReelError::visual(format!(
            "provider 'none' cannot fetch '{}'",
            candidate.id
        )))
    }
}

const CLIP_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm", "mkv"];

#[derive(Clone, Debug)]
struct LibraryEntry {
    path: PathBuf,
    words: Vec<String>,
}

/// Searches a folder of clips by keyword overlap with their file names.
///
/// `dark_hallway_01.mp4` matches any query containing "dark" or "hallway"; more shared words rank
/// higher.
#[derive(Debug)]
pub struct LocalLibraryProvider {
    root: PathBuf,
    entries: Vec<LibraryEntry>,
    probes: Mutex<HashMap<PathBuf, Option<MediaInfo>>>,
}

impl LocalLibraryProvider {
    pub fn new(root: impl Into<PathBuf>) -> ReelResult<Self> {
        let root = root.into();
        let read = std::fs::read_dir(&root).map_err(|e| {
            ReelError::validation(format!(
                "clip library '{}' is not readable: {e}",
                root.display()
            ))
        })?;

        let mut entries = Vec::new();
        for entry in read.flatten() {
            let path = entry.path();
            let is_clip = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| CLIP_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if !is_clip || !path.is_file() {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            let words = keywords(stem);
            if !words.is_empty() {
                entries.push(LibraryEntry { path, words });
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::info!(root = %root.display(), clips = entries.len(), "clip library indexed");

        Ok(Self {
            root,
            entries,
            probes: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn probe_cached(&self, path: &Path) -> Option<MediaInfo> {
        if let Ok(cache) = self.probes.lock()
            && let Some(hit) = cache.get(path)
        {
            return hit.clone();
        }
        let probed = match probe_media(path) {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "library clip not probeable");
                None
            }
        };
        if let Ok(mut cache) = self.probes.lock() {
            cache.insert(path.to_path_buf(), probed.clone());
        }
        probed
    }
}

impl AssetProvider for LocalLibraryProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn search(
        &self,
        query: &str,
        orientation: Orientation,
        count: usize,
    ) -> ReelResult<Vec<Candidate>> {
        let wanted = keywords(query);
        let mut scored: Vec<(usize, &LibraryEntry)> = self
            .entries
            .iter()
            .map(|e| (e.words.iter().filter(|w| wanted.contains(w)).count(), e))
            .filter(|(score, _)| *score > 0)
            .collect();
        // Stable: equal scores keep path order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let mut out = Vec::new();
        for (_, entry) in scored {
            if out.len() >= count {
                break;
            }
            let Some(info) = self.probe_cached(&entry.path) else {
                continue;
            };
            if !orientation.accepts(Orientation::of(info.width, info.height)) {
                continue;
            }
            out.push(Candidate {
                id: entry
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                location: entry.path.to_string_lossy().into_owned(),
                width: info.width,
                height: info.height,
                duration_secs: info.duration_secs,
            });
        }
        Ok(out)
    }

    fn fetch(&self, candidate: &Candidate, dest_dir: &Path) -> ReelResult<PathBuf> {
        let src = PathBuf::from(&candidate.location);
        let name = src
            .file_name()
            .ok_or_else(|| ReelError::visual(format!("bad library location '{}'", candidate.location)))?;
        std::fs::create_dir_all(dest_dir).map_err(|e| {
            ReelError::visual(format!("failed to create '{}': {e}", dest_dir.display()))
        })?;
        let dest = dest_dir.join(name);
        std::fs::copy(&src, &dest).map_err(|e| {
            ReelError::visual(format!("failed to copy '{}': {e}", src.display()))
        })?;
        Ok(dest)
    }
}

/// Lowercase alphanumeric words of length >= 2.
pub(crate) fn keywords(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 2 && !w.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/visual/provider.rs"]
mod tests;
