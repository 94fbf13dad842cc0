//! External media access through the system `ffmpeg`/`ffprobe` binaries.

/// Probing, audio decode and streaming clip decode.
pub mod media;
