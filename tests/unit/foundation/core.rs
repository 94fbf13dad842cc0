use super::*;

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(30000, 1001).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(fps.secs_to_frames_floor(secs), 123);
}

#[test]
fn fps_ceil_covers_and_ignores_float_noise() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(1.0), 30);
    assert_eq!(fps.secs_to_frames_ceil(fps.frames_to_secs(45)), 45);
    assert_eq!(fps.secs_to_frames_ceil(1.01), 31);
    assert_eq!(fps.secs_to_frames_ceil(0.0), 0);
}

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn frame_size_requires_even_dimensions() {
    assert!(FrameSize::new(1080, 1920).is_ok());
    assert!(FrameSize::new(1081, 1920).is_err());
    assert!(FrameSize::new(0, 1920).is_err());
    assert_eq!(FrameSize::new(4, 2).unwrap().rgba_len(), 32);
}

#[test]
fn orientation_classification() {
    assert_eq!(Orientation::of(1080, 1920), Orientation::Portrait);
    assert_eq!(Orientation::of(1920, 1080), Orientation::Landscape);
    assert_eq!(Orientation::of(64, 64), Orientation::Square);
    assert!(Orientation::Portrait.accepts(Orientation::Square));
    assert!(!Orientation::Portrait.accepts(Orientation::Landscape));
}
