//! Script input: the ordered lines a run turns into scenes.

/// Script and line model with JSON loading.
pub mod model;
