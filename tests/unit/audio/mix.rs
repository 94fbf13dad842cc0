use super::*;

fn seg(start: u64, len: u64, source: PcmSource) -> MixSegment {
    MixSegment {
        start,
        len,
        source,
        looped: false,
        gain: 1.0,
        envelope: Envelope::default(),
    }
}

fn stereo(sample_rate: u32, samples: Vec<f32>) -> PcmSource {
    PcmSource {
        sample_rate,
        channels: 2,
        interleaved: Arc::new(samples),
    }
}

fn plan(channels: u16, total_samples: u64, segments: Vec<MixSegment>) -> MixPlan {
    MixPlan {
        sample_rate: 4,
        channels,
        total_samples,
        segments,
    }
}

#[test]
fn secs_to_sample_rounds() {
    assert_eq!(secs_to_sample(1.0, 48_000), 48_000);
    assert_eq!(secs_to_sample(0.5 / 48_000.0 + 1e-12, 48_000), 1);
    assert_eq!(secs_to_sample(-3.0, 48_000), 0);
}

#[test]
fn overlapping_segments_sum_and_fade_in() {
    let a = seg(0, 4, stereo(4, vec![0.25; 8]));
    let b = MixSegment {
        envelope: Envelope {
            fade_in_secs: 0.5,
            fade_out_secs: 0.0,
        },
        ..seg(2, 2, stereo(4, vec![1.0; 4]))
    };
    let out = mix_plan(&plan(2, 4, vec![a, b]));
    assert_eq!(out.len(), 8);
    assert!((out[0] - 0.25).abs() < 1e-6);
    // Second segment starts silent and ramps up.
    assert!((out[4] - 0.25).abs() < 1e-6);
    assert!(out[6] > out[4]);
}

#[test]
fn fade_out_reaches_silence_at_segment_end() {
    let s = MixSegment {
        envelope: Envelope {
            fade_in_secs: 0.0,
            fade_out_secs: 1.0,
        },
        ..seg(0, 4, PcmSource::mono(4, vec![1.0; 4]))
    };
    let out = mix_plan(&plan(1, 4, vec![s]));
    assert!((out[0] - 1.0).abs() < 1e-6);
    assert!(out.windows(2).all(|w| w[1] < w[0]));
}

#[test]
fn mono_source_is_upmixed_and_resampled() {
    // 2 Hz mono source played into a 4 Hz stereo mix.
    let out = mix_plan(&plan(2, 4, vec![seg(0, 4, PcmSource::mono(2, vec![0.0, 1.0]))]));
    assert_eq!(out[0], out[1]);
    assert!((out[2] - 0.5).abs() < 1e-6);
    assert!((out[4] - 1.0).abs() < 1e-6);
}

#[test]
fn looped_segment_wraps_source() {
    let s = MixSegment {
        looped: true,
        ..seg(0, 6, PcmSource::mono(4, vec![0.1, 0.2]))
    };
    let out = mix_plan(&plan(1, 6, vec![s]));
    assert_eq!(out.len(), 6);
    assert!((out[2] - 0.1).abs() < 1e-6);
    assert!((out[5] - 0.2).abs() < 1e-6);
}

#[test]
fn unlooped_segment_stops_at_source_end() {
    let out = mix_plan(&plan(1, 6, vec![seg(0, 6, PcmSource::mono(4, vec![0.1, 0.2]))]));
    assert_eq!(out[3], 0.0);
}

#[test]
fn segment_is_clamped_to_plan_length_and_output_clipped() {
    let loud = MixSegment {
        gain: 4.0,
        ..seg(0, 10, PcmSource::mono(4, vec![0.5; 10]))
    };
    let out = mix_plan(&plan(1, 2, vec![loud]));
    assert_eq!(out, vec![1.0, 1.0]);
}

#[test]
fn f32le_file_holds_samples_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/mix.f32le");
    write_mix_to_f32le_file(&[0.5, -0.25], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(
        crate::assets::media::f32le_to_samples(&bytes).unwrap(),
        vec![0.5, -0.25]
    );
}
