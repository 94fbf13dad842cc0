//! Frame production and the streaming render loop.

/// Per-scene frame sources (clip, still with zoom, solid).
pub mod frames;
/// Timeline rendering into a [`crate::encode::sink::FrameSink`].
pub mod session;
