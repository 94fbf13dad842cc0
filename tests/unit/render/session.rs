use super::*;
use crate::audio::segment::AudioSegment;
use crate::compose::scene::{Scene, SceneComposer};
use crate::compose::timeline::{TimelineAssembler, TimelineConfig, TransitionMode};
use crate::encode::sink::InMemorySink;
use crate::foundation::core::{Fps, FrameSize};
use crate::visual::asset::VisualAsset;

fn fps() -> Fps {
    Fps::new(10, 1).unwrap()
}

fn frame() -> FrameSize {
    FrameSize::new(4, 4).unwrap()
}

fn scene(idx: usize, secs: f64, rgb: [u8; 3]) -> Scene {
    let audio = AudioSegment::new(vec![0.25; (secs * 24_000.0).round() as usize], 24_000).unwrap();
    let d = audio.duration_secs();
    SceneComposer::new(fps(), frame(), std::env::temp_dir())
        .compose(idx, "line", audio, VisualAsset::solid(rgb, frame(), d))
        .unwrap()
}

fn timeline(transition: TransitionMode, edge: f64, scenes: Vec<Scene>) -> Timeline {
    TimelineAssembler::new(
        TimelineConfig {
            transition,
            edge_fade_secs: edge,
            ..TimelineConfig::default()
        },
        fps(),
        frame(),
    )
    .unwrap()
    .assemble(scenes, None)
    .unwrap()
}

fn red(sink: &InMemorySink, k: usize) -> u8 {
    sink.frames()[k].1.pixel(0, 0)[0]
}

#[test]
fn cut_renders_every_frame_in_order_with_audio() {
    let dir = tempfile::tempdir().unwrap();
    let tl = timeline(
        TransitionMode::Cut,
        0.0,
        vec![scene(0, 1.0, [200, 0, 0]), scene(1, 0.5, [100, 0, 0])],
    );
    let mut sink = InMemorySink::new();
    let stats = render_timeline(&tl, &mut sink, &RenderOpts::new(dir.path())).unwrap();

    assert_eq!(stats.frames_total, 15);
    assert_eq!(stats.frames_blended, 0);
    assert_eq!(sink.frames().len(), 15);
    assert!(sink.is_finished());
    assert_eq!(red(&sink, 0), 200);
    assert_eq!(red(&sink, 9), 200);
    assert_eq!(red(&sink, 10), 100);

    let audio = sink.audio().unwrap();
    assert_eq!(audio.len(), 2 * 72_000);
    assert_eq!(stats.audio_samples, 2 * 72_000);
    assert!((audio[2 * 1_000] - 0.25).abs() < 1e-4);
    // Mix file is removed once the sink is done.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn cut_between_fractional_frame_scenes_never_mixes() {
    let dir = tempfile::tempdir().unwrap();
    // 1.03 s rounds up to 11 frames while the next scene starts at frame 10.
    let tl = timeline(
        TransitionMode::Cut,
        0.0,
        vec![scene(0, 1.03, [200, 0, 0]), scene(1, 0.5, [100, 0, 0])],
    );
    assert_eq!(tl.placements()[0].end_frame(), 11);
    assert_eq!(tl.placements()[1].start_frame, 10);

    let mut sink = InMemorySink::new();
    let stats = render_timeline(&tl, &mut sink, &RenderOpts::new(dir.path())).unwrap();

    assert_eq!(stats.frames_blended, 0);
    let reds: Vec<u8> = (0..sink.frames().len()).map(|k| red(&sink, k)).collect();
    assert!(reds.iter().all(|&r| r == 200 || r == 100));
    assert_eq!(reds[9], 200);
    assert_eq!(reds[10], 100);
}

#[test]
fn crossfade_blends_during_overlap() {
    let dir = tempfile::tempdir().unwrap();
    let tl = timeline(
        TransitionMode::Crossfade { secs: 0.4 },
        0.0,
        vec![scene(0, 1.0, [200, 0, 0]), scene(1, 1.0, [0, 0, 0])],
    );
    let mut sink = InMemorySink::new();
    let stats = render_timeline(&tl, &mut sink, &RenderOpts::new(dir.path())).unwrap();

    assert_eq!(stats.frames_total, 16);
    assert_eq!(stats.frames_blended, 4);
    assert_eq!(red(&sink, 5), 200);
    let during: Vec<u8> = (6..10).map(|k| red(&sink, k)).collect();
    assert!(during.windows(2).all(|w| w[1] < w[0]));
    assert!(during.iter().all(|&r| r > 0 && r < 200));
    assert_eq!(red(&sink, 10), 0);
}

#[test]
fn edges_fade_from_and_to_black() {
    let dir = tempfile::tempdir().unwrap();
    let tl = timeline(TransitionMode::Cut, 0.5, vec![scene(0, 2.0, [200, 200, 200])]);
    let mut sink = InMemorySink::new();
    render_timeline(
        &tl,
        &mut sink,
        &RenderOpts {
            enable_audio: false,
            ..RenderOpts::new(dir.path())
        },
    )
    .unwrap();

    assert!(sink.audio().is_none());
    assert!(red(&sink, 0) < 40);
    assert_eq!(red(&sink, 10), 200);
    assert!(red(&sink, 19) < 40);
    assert!(sink.frames().iter().all(|(_, f)| f.pixel(1, 1)[3] == 255));
}

#[test]
fn sink_failure_is_reported() {
    struct Failing;
    impl FrameSink for Failing {
        fn begin(&mut self, _cfg: SinkConfig) -> ReelResult<()> {
            Err(ReelError::media("no encoder"))
        }
        fn push_frame(&mut self, _idx: FrameIndex, _frame: &Frame) -> ReelResult<()> {
            Ok(())
        }
        fn end(&mut self) -> ReelResult<()> {
            Ok(())
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let tl = timeline(TransitionMode::Cut, 0.0, vec![scene(0, 1.0, [1, 1, 1])]);
    let err = render_timeline(&tl, &mut Failing, &RenderOpts::new(dir.path())).unwrap_err();
    assert!(err.to_string().contains("no encoder"));
}
