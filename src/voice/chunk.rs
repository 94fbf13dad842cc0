use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.{2,}|…|[.!?,]").expect("static boundary pattern"));

static CUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("static cue pattern"));

/// Punctuation that closed a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    Ellipsis,
    Period,
    Exclamation,
    Question,
    Comma,
    /// Text ran out without closing punctuation.
    End,
}

impl Boundary {
    fn from_token(tok: &str) -> Self {
        match tok {
            "!" => Self::Exclamation,
            "?" => Self::Question,
            "," => Self::Comma,
            "." => Self::Period,
            _ => Self::Ellipsis,
        }
    }

    /// Local speed multiplier contributed by the punctuation.
    pub fn speed_factor(self) -> f32 {
        match self {
            Self::Ellipsis => 0.85,
            Self::Exclamation => 1.15,
            Self::Question => 1.05,
            Self::Period | Self::Comma | Self::End => 1.0,
        }
    }

    /// Silence appended after the chunk, in seconds.
    pub fn gap_secs(self) -> f64 {
        match self {
            Self::Ellipsis => 0.6,
            Self::Period => 0.35,
            Self::Question => 0.3,
            Self::Exclamation | Self::Comma => 0.15,
            Self::End => 0.25,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Chunk {
    pub text: String,
    pub boundary: Boundary,
}

/// Remove bracketed non-lexical cues such as `[gasps]`.
pub fn strip_cues(text: &str) -> String {
    CUE.replace_all(text, " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split `text` at `. ! ? ,` and ellipses. Chunks without any letter or digit are dropped.
pub fn split_chunks(text: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut last = 0;
    for m in BOUNDARY.find_iter(text) {
        push_chunk(&mut chunks, &text[last..m.start()], Boundary::from_token(m.as_str()));
        last = m.end();
    }
    push_chunk(&mut chunks, &text[last..], Boundary::End);
    chunks
}

fn push_chunk(out: &mut Vec<Chunk>, raw: &str, boundary: Boundary) {
    let text = raw.trim();
    if !text.chars().any(char::is_alphanumeric) {
        return;
    }
    out.push(Chunk {
        text: text.to_owned(),
        boundary,
    });
}

#[cfg(test)]
#[path = "../../tests/unit/voice/chunk.rs"]
mod tests;
