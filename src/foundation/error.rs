/// Result type used across reelsmith.
pub type ReelResult<T> = Result<T, ReelError>;

/// Error taxonomy shared by every pipeline stage.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid script, configuration or caller-supplied value.
    #[error("validation error: {0}")]
    Validation(String),

    /// The speech backend failed for a whole line.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// A line produced no speakable chunks.
    #[error("empty synthesis: {0}")]
    EmptySynthesis(String),

    /// The mastering chain could not process a waveform.
    #[error("mastering error: {0}")]
    Mastering(String),

    /// An ffmpeg process or media file operation failed.
    #[error("media error: {0}")]
    Media(String),

    /// Footage lookup or fitting failed.
    #[error("visual error: {0}")]
    Visual(String),

    /// Audio and visual could not be bound into a scene or timeline.
    #[error("composition error: {0}")]
    Composition(String),

    /// Every line was skipped, so there is nothing to render.
    #[error("no scenes were produced")]
    NoScenes,

    /// Malformed script or configuration JSON.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Synthesis`] value.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Build a [`ReelError::EmptySynthesis`] value.
    pub fn empty_synthesis(msg: impl Into<String>) -> Self {
        Self::EmptySynthesis(msg.into())
    }

    /// Build a [`ReelError::Mastering`] value.
    pub fn mastering(msg: impl Into<String>) -> Self {
        Self::Mastering(msg.into())
    }

    /// Build a [`ReelError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`ReelError::Visual`] value.
    pub fn visual(msg: impl Into<String>) -> Self {
        Self::Visual(msg.into())
    }

    /// Build a [`ReelError::Composition`] value.
    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` when this error ends processing of the current line only.
    ///
    /// `NoScenes` and configuration problems are run-level; everything a single line can produce
    /// is caught at the line boundary and the line is skipped.
    pub fn is_line_fatal(&self) -> bool {
        matches!(
            self,
            Self::Synthesis(_)
                | Self::EmptySynthesis(_)
                | Self::Mastering(_)
                | Self::Media(_)
                | Self::Visual(_)
                | Self::Composition(_)
                | Self::Other(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
