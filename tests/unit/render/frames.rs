use super::*;

fn fps() -> Fps {
    Fps::new(10, 1).unwrap()
}

fn checker(size: FrameSize) -> Arc<RgbaImage> {
    Arc::new(RgbaImage::from_fn(size.width, size.height, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([0, 0, 0, 255])
        }
    }))
}

#[test]
fn solid_fills_every_pixel_opaque() {
    let size = FrameSize::new(4, 2).unwrap();
    let mut out = vec![0u8; size.rgba_len()];
    SolidSource { rgb: [9, 8, 7] }.render_into(3, &mut out).unwrap();
    assert!(out.chunks_exact(4).all(|px| px == [9, 8, 7, 255]));
}

#[test]
fn still_first_frame_is_the_image() {
    let size = FrameSize::new(8, 8).unwrap();
    let img = checker(size);
    let mut src = StillSource::new(img.clone(), 0.05, fps(), size).unwrap();
    let mut out = vec![0u8; size.rgba_len()];
    src.render_into(0, &mut out).unwrap();
    assert_eq!(out.as_slice(), img.as_raw().as_slice());
}

#[test]
fn still_zoom_grows_over_time_and_changes_pixels() {
    let size = FrameSize::new(8, 8).unwrap();
    let img = checker(size);
    let mut src = StillSource::new(img.clone(), 0.5, fps(), size).unwrap();
    assert!((src.scale_at(10) - 1.5).abs() < 1e-9);
    assert!(src.scale_at(20) > src.scale_at(10));

    let mut out = vec![0u8; size.rgba_len()];
    src.render_into(10, &mut out).unwrap();
    assert_ne!(out.as_slice(), img.as_raw().as_slice());
    assert!(out.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn still_rejects_wrong_size() {
    let img = checker(FrameSize::new(8, 8).unwrap());
    assert!(StillSource::new(img, 0.0, fps(), FrameSize::new(8, 10).unwrap()).is_err());
}

#[cfg(feature = "media-ffmpeg")]
#[test]
fn clip_source_reads_and_holds_last_frame() {
    use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
    use crate::encode::sink::{Frame, FrameSink, SinkConfig};
    use crate::foundation::core::FrameIndex;

    if !crate::assets::media::is_ffmpeg_on_path() {
        return;
    }
    let size = FrameSize::new(16, 16).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&path));
    sink.begin(SinkConfig {
        width: 16,
        height: 16,
        fps: fps(),
        audio: None,
    })
    .unwrap();
    for i in 0..3u64 {
        let mut f = Frame::black(size);
        for px in f.data.chunks_exact_mut(4) {
            px[0] = (i * 100) as u8;
        }
        sink.push_frame(FrameIndex(i), &f).unwrap();
    }
    sink.end().unwrap();

    let mut src = ClipSource::open(&path, fps(), size).unwrap();
    let mut out = vec![0u8; size.rgba_len()];
    src.render_into(0, &mut out).unwrap();
    let first_red = out[0];
    src.render_into(2, &mut out).unwrap();
    let last_red = out[0];
    assert!(last_red > first_red);
    src.render_into(6, &mut out).unwrap();
    assert_eq!(out[0], last_red);
}
