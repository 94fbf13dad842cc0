use std::sync::Mutex;

use super::*;
use crate::foundation::core::Orientation;
use crate::visual::generate::ProceduralImageGenerator;
use crate::visual::provider::NoProvider;

/// Answers only queries containing `hit`; records every query.
struct StubProvider {
    hit: &'static str,
    width: u32,
    queries: Mutex<Vec<String>>,
}

impl StubProvider {
    fn new(hit: &'static str, width: u32) -> Self {
        Self {
            hit,
            width,
            queries: Mutex::new(Vec::new()),
        }
    }
}

impl AssetProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn search(&self, query: &str, orientation: Orientation, count: usize) -> ReelResult<Vec<Candidate>> {
        assert_eq!(orientation, Orientation::Portrait);
        assert!(count >= 1);
        self.queries.lock().unwrap().push(query.to_owned());
        if !query.contains(self.hit) {
            return Ok(Vec::new());
        }
        Ok(vec![Candidate {
            id: "clip-1".into(),
            location: "remote://clip-1".into(),
            width: self.width,
            height: 1280,
            duration_secs: 3.0,
        }])
    }

    fn fetch(&self, candidate: &Candidate, dest_dir: &Path) -> ReelResult<PathBuf> {
        let path = dest_dir.join(format!("{}.mp4", candidate.id));
        std::fs::write(&path, b"stub").map_err(|e| ReelError::visual(e.to_string()))?;
        Ok(path)
    }
}

struct FailingProvider;

impl AssetProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn search(&self, _q: &str, _o: Orientation, _c: usize) -> ReelResult<Vec<Candidate>> {
        Err(ReelError::visual("network down"))
    }

    fn fetch(&self, _c: &Candidate, _d: &Path) -> ReelResult<PathBuf> {
        Err(ReelError::visual("network down"))
    }
}

fn frame() -> FrameSize {
    FrameSize::new(36, 64).unwrap()
}

fn resolver(provider: Arc<dyn AssetProvider>, generator: bool) -> VisualResolver {
    let generator: Option<Arc<dyn ImageGenerator>> = if generator {
        Some(Arc::new(ProceduralImageGenerator::default()))
    } else {
        None
    };
    VisualResolver::new(provider, generator, VisualConfig::default(), frame()).unwrap()
}

#[test]
fn zero_candidates_yield_zooming_still_of_exact_size() {
    let dir = tempfile::tempdir().unwrap();
    let r = resolver(Arc::new(NoProvider), true);
    let asset = r.resolve("shadow figure portrait", 2.35, 1, dir.path());
    assert_eq!(asset.origin, VisualOrigin::Generated);
    assert_eq!(asset.frame, frame());
    assert_eq!(asset.duration_secs, 2.35);
    match &asset.source {
        VisualSource::Still { image, zoom_rate } => {
            assert_eq!(image.dimensions(), (36, 64));
            assert!(*zoom_rate > 0.0);
        }
        other => panic!("expected still, got {other:?}"),
    }
}

#[test]
fn without_generator_falls_back_to_solid() {
    let dir = tempfile::tempdir().unwrap();
    let r = resolver(Arc::new(NoProvider), false);
    let asset = r.resolve("anything", 1.0, 1, dir.path());
    assert_eq!(asset.origin, VisualOrigin::Solid);
    assert_eq!(asset.duration_secs, 1.0);
    assert!(matches!(asset.source, VisualSource::Solid { .. }));
}

#[test]
fn provider_errors_degrade_instead_of_failing() {
    let dir = tempfile::tempdir().unwrap();
    let r = resolver(Arc::new(FailingProvider), true);
    let asset = r.resolve("dark hallway", 0.5, 1, dir.path());
    assert_eq!(asset.origin, VisualOrigin::Generated);
}

#[test]
fn keyword_query_carries_mood_qualifiers() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(StubProvider::new("hallway", 720));
    let r = resolver(provider.clone(), true);
    let asset = r.resolve("dark hallway portrait", 4.0, 1, dir.path());
    assert_eq!(
        provider.queries.lock().unwrap().as_slice(),
        ["dark hallway portrait dark cinematic"]
    );
    assert_eq!(
        asset.origin,
        VisualOrigin::Provider {
            candidate: "clip-1".into()
        }
    );
    match asset.source {
        VisualSource::Clip {
            duration_fit,
            frame_fit,
            path,
            ..
        } => {
            assert_eq!(duration_fit, DurationFit::Loop { cycles: 2 });
            assert_eq!(frame_fit.target, frame());
            assert!(path.starts_with(dir.path()));
        }
        other => panic!("expected clip, got {other:?}"),
    }
}

#[test]
fn relaxed_keyword_is_second_tier() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(StubProvider::new("abstract", 720));
    let r = resolver(provider.clone(), true);
    let asset = r.resolve("scared face closeup", 2.0, 1, dir.path());
    assert_eq!(provider.queries.lock().unwrap().len(), 2);
    assert!(matches!(asset.origin, VisualOrigin::FallbackKeyword { .. }));
    assert!(matches!(
        asset.source,
        VisualSource::Clip {
            duration_fit: DurationFit::Trim,
            ..
        }
    ));
}

#[test]
fn unfittable_clip_falls_through() {
    let dir = tempfile::tempdir().unwrap();
    let r = resolver(Arc::new(StubProvider::new("hallway", 0)), false);
    let asset = r.resolve("hallway", 1.0, 1, dir.path());
    assert_eq!(asset.origin, VisualOrigin::Solid);
}

#[test]
fn empty_keyword_goes_straight_to_relaxed_query() {
    let r = resolver(Arc::new(NoProvider), false);
    let q = r.queries("  ");
    assert_eq!(q, vec![("dark abstract background".to_owned(), true)]);
}
