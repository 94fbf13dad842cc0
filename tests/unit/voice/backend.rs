use std::path::Path;

use super::*;

fn request(speaker: SpeakerSelection, speed: f32) -> SpeechRequest {
    SpeechRequest {
        text: "hello".into(),
        speaker,
        instruct: "Whisper.".into(),
        speed,
    }
}

#[test]
fn args_template_substitutes_placeholders() {
    let backend = CommandSpeechBackend::new(
        SpeechCommandConfig {
            program: "tts".into(),
            args: vec![
                "-s={speaker}".into(),
                "{speed}".into(),
                "{length_scale}".into(),
                "{instruct}".into(),
                "{out}".into(),
            ],
            blend_speakers: false,
        },
        24_000,
    )
    .unwrap();
    let args = backend.render_args(
        &request(SpeakerSelection::single("Ryan"), 1.25),
        Path::new("/tmp/x.wav"),
    );
    assert_eq!(args, vec!["-s=Ryan", "1.250", "0.800", "Whisper.", "/tmp/x.wav"]);
}

#[test]
fn blends_pass_through_only_when_enabled() {
    let blend = SpeakerSelection::Blend {
        primary: "Aiden".into(),
        secondary: "Ryan".into(),
        ratio: 0.7,
    };
    let cfg = SpeechCommandConfig {
        args: vec!["{speaker}".into(), "{out}".into()],
        ..SpeechCommandConfig::default()
    };

    let plain = CommandSpeechBackend::new(cfg.clone(), 24_000).unwrap();
    assert!(!plain.supports_blend());
    let args = plain.render_args(&request(blend.clone(), 1.0), Path::new("o.wav"));
    assert_eq!(args[0], "Aiden");

    let blending = CommandSpeechBackend::new(
        SpeechCommandConfig {
            blend_speakers: true,
            ..cfg
        },
        24_000,
    )
    .unwrap();
    assert!(blending.supports_blend());
    let args = blending.render_args(&request(blend, 1.0), Path::new("o.wav"));
    assert_eq!(args[0], "Aiden:0.70,Ryan:0.30");
}

#[test]
fn config_without_output_placeholder_is_rejected() {
    let err = CommandSpeechBackend::new(
        SpeechCommandConfig {
            args: vec!["--fast".into()],
            ..SpeechCommandConfig::default()
        },
        24_000,
    )
    .unwrap_err();
    assert!(err.to_string().contains("{out}"));
}

#[test]
fn missing_program_is_a_synthesis_error() {
    let mut backend = CommandSpeechBackend::new(
        SpeechCommandConfig {
            program: "reelsmith-no-such-tts-program".into(),
            ..SpeechCommandConfig::default()
        },
        24_000,
    )
    .unwrap();
    let err = backend
        .synthesize(&request(SpeakerSelection::single("Ryan"), 1.0))
        .unwrap_err();
    assert!(matches!(err, ReelError::Synthesis(_)));
}

#[cfg(unix)]
#[test]
fn program_that_ignores_stdin_fails_the_chunk() {
    // `true` exits without reading, so a large chunk hits a closed pipe.
    let mut backend = CommandSpeechBackend::new(
        SpeechCommandConfig {
            program: "true".into(),
            args: vec!["{out}".into()],
            ..SpeechCommandConfig::default()
        },
        24_000,
    )
    .unwrap();
    let req = SpeechRequest {
        text: "a".repeat(4 << 20),
        ..request(SpeakerSelection::single("Ryan"), 1.0)
    };
    let err = backend.synthesize(&req).unwrap_err();
    assert!(matches!(err, ReelError::Synthesis(_)));
    assert!(err.to_string().contains("stdin"), "{err}");
}

struct Counting(u32);

impl SpeechBackend for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn synthesize(&mut self, _request: &SpeechRequest) -> ReelResult<AudioSegment> {
        self.0 += 1;
        AudioSegment::new(vec![0.0; self.0 as usize], 8_000)
    }
}

#[test]
fn shared_handle_serializes_a_single_backend() {
    let shared = SharedSpeech::new(Counting(0));
    let other = shared.clone();
    let req = request(SpeakerSelection::single("x"), 1.0);
    assert_eq!(shared.synthesize(&req).unwrap().len(), 1);
    assert_eq!(other.synthesize(&req).unwrap().len(), 2);
    assert_eq!(shared.name(), "counting");
    assert!(!shared.supports_blend());
}
