use super::*;

fn fps() -> Fps {
    Fps::new(30, 1).unwrap()
}

fn frame() -> FrameSize {
    FrameSize::new(16, 32).unwrap()
}

fn audio(secs: f64) -> AudioSegment {
    AudioSegment::new(vec![0.2; (secs * 24_000.0).round() as usize], 24_000).unwrap()
}

fn composer() -> SceneComposer {
    SceneComposer::new(fps(), frame(), std::env::temp_dir())
}

#[test]
fn visual_frames_round_up_and_stay_within_one_frame() {
    for secs in [0.01, 1.0, 1.2345, 2.999, 3.0] {
        let a = audio(secs);
        let d = a.duration_secs();
        let scene = composer()
            .compose(0, "x", a, VisualAsset::solid([1, 2, 3], frame(), d))
            .unwrap();
        assert!(scene.visual_duration_secs() >= scene.duration_secs() - 1e-9);
        assert!((scene.visual_duration_secs() - scene.duration_secs()).abs() < 1.0 / 30.0);
    }
}

#[test]
fn exact_frame_multiples_do_not_gain_a_frame() {
    let scene = composer()
        .compose(0, "x", audio(2.0), VisualAsset::solid([0, 0, 0], frame(), 2.0))
        .unwrap();
    assert_eq!(scene.frames(), 60);
}

#[test]
fn mismatched_visual_is_rejected() {
    let err = composer()
        .compose(0, "x", audio(2.0), VisualAsset::solid([0, 0, 0], frame(), 1.0))
        .unwrap_err();
    assert!(matches!(err, ReelError::Composition(_)));

    let other = FrameSize::new(32, 32).unwrap();
    assert!(
        composer()
            .compose(0, "x", audio(1.0), VisualAsset::solid([0, 0, 0], other, 1.0))
            .is_err()
    );
    assert!(
        composer()
            .compose(0, "x", AudioSegment::empty(24_000), VisualAsset::solid([0, 0, 0], frame(), 0.0))
            .is_err()
    );
}

#[test]
fn unreadable_clip_degrades_to_solid() {
    use crate::assets::media::MediaInfo;
    use crate::visual::fit::{DurationFit, FrameFit};

    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("bogus.mp4");
    std::fs::write(&bogus, b"not video").unwrap();
    let visual = VisualAsset {
        source: VisualSource::Clip {
            path: bogus.clone(),
            info: MediaInfo {
                source_path: bogus,
                width: 16,
                height: 32,
                duration_secs: 1.0,
                has_audio: false,
            },
            frame_fit: FrameFit::cover(16, 32, frame()).unwrap(),
            duration_fit: DurationFit::Trim,
        },
        frame: frame(),
        duration_secs: 1.0,
        origin: VisualOrigin::Provider {
            candidate: "bogus".into(),
        },
    };
    let scene = SceneComposer::new(fps(), frame(), dir.path())
        .compose(4, "x", audio(1.0), visual)
        .unwrap();
    assert_eq!(scene.origin(), &VisualOrigin::Solid);
    assert!(matches!(scene.visual(), SceneVisual::Solid { .. }));
    assert_eq!(scene.line_index(), 4);
}

#[test]
fn only_run_edges_fade() {
    assert_eq!(SceneComposer::edge_fades(0, 3, 0.5), (0.5, 0.0));
    assert_eq!(SceneComposer::edge_fades(1, 3, 0.5), (0.0, 0.0));
    assert_eq!(SceneComposer::edge_fades(2, 3, 0.5), (0.0, 0.5));
    assert_eq!(SceneComposer::edge_fades(0, 1, 0.5), (0.5, 0.5));
}
