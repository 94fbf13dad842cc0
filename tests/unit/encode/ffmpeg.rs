use super::*;
use crate::foundation::core::Fps;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps { num: 30, den: 1 },
        audio: None,
    }
}

#[test]
fn begin_rejects_bad_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(dir.path().join("out.mp4")));
    assert!(sink.begin(cfg(0, 10)).is_err());
    assert!(sink.begin(cfg(11, 10)).is_err());
    assert!(
        sink.begin(SinkConfig {
            fps: Fps { num: 0, den: 1 },
            ..cfg(10, 10)
        })
        .is_err()
    );
}

#[test]
fn refuses_to_overwrite_when_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("exists.mp4");
    std::fs::write(&out, b"x").unwrap();
    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        overwrite: false,
        ..FfmpegSinkOpts::new(&out)
    });
    let err = sink.begin(cfg(10, 10)).unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

fn args_of(cfg: &SinkConfig, opts: &FfmpegSinkOpts) -> Vec<String> {
    encoder_args(cfg, opts)
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn silent_encode_has_no_audio_track() {
    let args = args_of(&cfg(16, 8), &FfmpegSinkOpts::new("out.mp4"));
    assert!(args.contains(&"-an".to_string()));
    assert!(!args.contains(&"aac".to_string()));
    let size = args.iter().position(|a| a == "-video_size").unwrap();
    assert_eq!(args[size + 1], "16x8");
    assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
}

#[test]
fn pcm_input_is_muxed_as_aac_and_crf_is_applied() {
    let with_audio = SinkConfig {
        audio: Some(crate::encode::sink::AudioInputConfig {
            path: "mix.f32le".into(),
            sample_rate: 48_000,
            channels: 2,
        }),
        ..cfg(16, 16)
    };
    let opts = FfmpegSinkOpts {
        crf: 16,
        overwrite: false,
        ..FfmpegSinkOpts::new("out.mp4")
    };
    let args = args_of(&with_audio, &opts);
    assert_eq!(args[0], "-n");
    let inputs: Vec<&String> = args
        .iter()
        .zip(args.iter().skip(1))
        .filter(|(flag, _)| *flag == "-i")
        .map(|(_, v)| v)
        .collect();
    assert_eq!(inputs, ["pipe:0", "mix.f32le"]);
    assert!(args.windows(2).any(|w| w[0] == "-crf" && w[1] == "16"));
    assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "aac"));
    assert!(args.contains(&"-shortest".to_string()));
    assert!(!args.contains(&"-an".to_string()));
}

#[test]
fn push_before_begin_fails() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("unused.mp4"));
    let frame = Frame {
        width: 2,
        height: 2,
        data: vec![0; 16],
    };
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
}

#[test]
fn encodes_a_short_clip_when_ffmpeg_is_available() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested/out.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(cfg(16, 16)).unwrap();
    let frame = Frame::black(crate::foundation::core::FrameSize::new(16, 16).unwrap());
    for i in 0..5 {
        sink.push_frame(FrameIndex(i), &frame).unwrap();
    }
    assert!(sink.push_frame(FrameIndex(2), &frame).is_err());
    sink.end().unwrap();
    assert!(out.is_file());
}
