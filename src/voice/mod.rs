//! Line text to speech waveform.

/// Speech engine seam and the command-line engine.
pub mod backend;
/// Punctuation chunking.
pub mod chunk;
/// Style tags and voice profiles.
pub mod profile;
/// Chunked synthesis of a whole line.
pub mod synth;
