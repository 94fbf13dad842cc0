use super::*;

fn ramp(n: usize, sample_rate: u32) -> AudioSegment {
    let samples = (0..n).map(|i| i as f32 / n as f32).collect();
    AudioSegment::new(samples, sample_rate).unwrap()
}

#[test]
fn silence_and_duration() {
    let s = AudioSegment::silence(0.5, 24_000);
    assert_eq!(s.len(), 12_000);
    assert!((s.duration_secs() - 0.5).abs() < 1e-9);
    assert!(s.is_silent(1e-6));
}

#[test]
fn append_requires_matching_rate() {
    let mut a = AudioSegment::silence(0.1, 24_000);
    let b = AudioSegment::silence(0.1, 48_000);
    assert!(a.append(&b).is_err());
    a.append_silence(0.1);
    assert_eq!(a.len(), 4_800);
}

#[test]
fn resample_preserves_duration() {
    let a = ramp(22_050, 22_050);
    let b = a.resample(24_000).unwrap();
    assert_eq!(b.sample_rate(), 24_000);
    assert!((a.duration_secs() - b.duration_secs()).abs() < 1e-3);
}

#[test]
fn reinterpret_rate_lengthens_for_lower_factor() {
    let a = ramp(24_000, 24_000);
    let b = a.reinterpret_rate(0.85).unwrap();
    assert_eq!(b.sample_rate(), 24_000);
    let expected = 1.0 / 0.85;
    assert!((b.duration_secs() - expected).abs() < 1e-3);
    assert!(a.reinterpret_rate(0.0).is_err());
}

#[test]
fn overlay_never_extends_and_clamps_at_end() {
    let mut base = AudioSegment::silence(1.0, 100);
    let fx = AudioSegment::new(vec![1.0; 50], 100).unwrap();
    let mixed = base.overlay(&fx, 0.8, 0.5).unwrap();
    assert_eq!(mixed, 20);
    assert_eq!(base.len(), 100);
    assert!((base.samples()[99] - 0.5).abs() < 1e-6);
    assert_eq!(base.samples()[79], 0.0);

    let past = base.overlay(&fx, 2.0, 1.0).unwrap();
    assert_eq!(past, 0);
}

#[test]
fn peak_and_rms() {
    let s = AudioSegment::new(vec![0.5, -1.0, 0.0, 0.0], 4).unwrap();
    assert_eq!(s.peak(), 1.0);
    assert!(s.rms() > 0.5);
}
