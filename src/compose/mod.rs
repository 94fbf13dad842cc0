//! Binding lines into scenes and scenes into one timeline.

/// Scene composition: one line's audio bound to its fitted visual.
pub mod scene;
/// Ordered timeline assembly with transitions and background music.
pub mod timeline;
