use super::*;
use crate::voice::backend::SpeechBackend;

/// 50 ms of tone per character at `rate`, scaled by speed; fails on text containing "boom".
struct ToneBackend {
    rate: u32,
    blend: bool,
}

impl SpeechBackend for ToneBackend {
    fn name(&self) -> &str {
        "tone"
    }

    fn supports_blend(&self) -> bool {
        self.blend
    }

    fn synthesize(&mut self, request: &SpeechRequest) -> ReelResult<AudioSegment> {
        if request.text.contains("boom") {
            return Err(ReelError::synthesis("boom"));
        }
        let secs = 0.05 * request.text.chars().count() as f64 / f64::from(request.speed);
        let n = (secs * f64::from(self.rate)).round() as usize;
        let samples = (0..n)
            .map(|i| 0.3 * (i as f32 * 0.07).sin())
            .collect();
        AudioSegment::new(samples, self.rate)
    }
}

fn synth(rate: u32) -> VoiceSynthesizer {
    VoiceSynthesizer::new(
        SharedSpeech::new(ToneBackend { rate, blend: false }),
        ProfileTable::default(),
        VOICE_SAMPLE_RATE,
    )
    .unwrap()
}

#[test]
fn punctuation_only_line_is_empty_synthesis() {
    let err = synth(24_000).synthesize("...", StyleTag::Narrator).unwrap_err();
    assert!(matches!(err, ReelError::EmptySynthesis(_)));
    assert!(err.is_line_fatal());
}

#[test]
fn chunks_and_gaps_are_concatenated_in_order() {
    let s = synth(24_000);
    let audio = s.synthesize("Stop scrolling. Now!", StyleTag::Narrator).unwrap();
    let expected = 0.05 * 14.0 + 0.35 + 0.05 * 3.0 / 1.15 + 0.15;
    assert_eq!(audio.sample_rate(), VOICE_SAMPLE_RATE);
    assert!((audio.duration_secs() - expected).abs() < 1e-3);
}

#[test]
fn backend_rate_is_resampled_to_nominal() {
    let audio = synth(16_000).synthesize("Hello", StyleTag::Narrator).unwrap();
    assert_eq!(audio.sample_rate(), VOICE_SAMPLE_RATE);
    assert!((audio.duration_secs() - (0.25 + 0.25)).abs() < 1e-3);
}

#[test]
fn style_scales_speed() {
    let s = synth(24_000);
    let plan_panic = s.plan("Run!", StyleTag::Panic, None);
    let plan_dread = s.plan("Run!", StyleTag::Dread, None);
    assert!(plan_panic.chunks[0].speed > plan_dread.chunks[0].speed);
    assert!((plan_panic.chunks[0].speed - 1.15 * 1.2).abs() < 1e-6);
}

#[test]
fn emotion_overrides_profile_instruction() {
    let s = synth(24_000);
    assert_eq!(s.plan("hi", StyleTag::Narrator, None).instruct, "Speak normally.");
    assert_eq!(
        s.plan("hi", StyleTag::Narrator, Some("Terrified.")).instruct,
        "Terrified."
    );
    assert_eq!(s.plan("hi", StyleTag::Narrator, Some("  ")).instruct, "Speak normally.");
}

#[test]
fn deepen_lengthens_and_keeps_nominal_rate() {
    let s = synth(24_000);
    let plain = s.synthesize("You shouldn't have looked.", StyleTag::Narrator).unwrap();
    let demon = s.synthesize("You shouldn't have looked.", StyleTag::Demon).unwrap();
    assert_eq!(demon.sample_rate(), VOICE_SAMPLE_RATE);
    // Demon speaks at 0.9x, then blend emulation (0.95) and deepen (0.85) stretch it further.
    let plan = s.plan("You shouldn't have looked.", StyleTag::Demon, None);
    assert_eq!(plan.blend_emulation, Some(0.95));
    assert!(demon.duration_secs() > plain.duration_secs() / 0.85);
}

#[test]
fn native_blend_skips_emulation() {
    let s = VoiceSynthesizer::new(
        SharedSpeech::new(ToneBackend {
            rate: 24_000,
            blend: true,
        }),
        ProfileTable::default(),
        VOICE_SAMPLE_RATE,
    )
    .unwrap();
    assert_eq!(s.plan("x", StyleTag::Demon, None).blend_emulation, None);
}

#[test]
fn failing_chunk_is_skipped() {
    let s = synth(24_000);
    let audio = s.synthesize("boom. Still here.", StyleTag::Narrator).unwrap();
    assert!((audio.duration_secs() - (0.05 * 10.0 + 0.35)).abs() < 1e-3);

    let err = s.synthesize("boom, boom!", StyleTag::Narrator).unwrap_err();
    assert!(matches!(err, ReelError::Synthesis(_)));
}

#[test]
fn identical_input_gives_identical_output() {
    let s = synth(22_050);
    let a = s.synthesize("[gasps] Did you hear that?", StyleTag::Victim).unwrap();
    let b = s.synthesize("[gasps] Did you hear that?", StyleTag::Victim).unwrap();
    assert_eq!(a, b);
}

#[test]
fn cue_stripping_is_optional() {
    let keep = synth(24_000);
    let strip = synth(24_000).with_strip_cues(true);
    assert_eq!(
        keep.plan("[gasps] I heard that.", StyleTag::Victim, None).chunks[0].text,
        "[gasps] I heard that"
    );
    assert_eq!(
        strip.plan("[gasps] I heard that.", StyleTag::Victim, None).chunks[0].text,
        "I heard that"
    );
}
