use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};
use crate::voice::profile::StyleTag;

/// Search keyword used when a line has none.
pub const DEFAULT_VISUAL_KEYWORD: &str = "dark atmosphere";

/// One spoken line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Spoken content; may contain cues like `[gasps]` and ellipses.
    pub text: String,
    /// Style tag (voice profile name). `role` is accepted as an alias.
    #[serde(default, alias = "role", skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Free-form emotion directive that overrides the profile's instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_keyword: Option<String>,
}

impl Line {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
            emotion: None,
            visual_keyword: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.visual_keyword = Some(keyword.into());
        self
    }

    /// Resolved style tag; missing or unknown tags mean narrator.
    pub fn style_tag(&self) -> StyleTag {
        StyleTag::parse(self.style.as_deref())
    }

    pub fn keyword(&self) -> &str {
        self.visual_keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(DEFAULT_VISUAL_KEYWORD)
    }

    pub fn emotion(&self) -> Option<&str> {
        self.emotion.as_deref()
    }
}

/// A script as produced upstream. Read once per run, never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub lines: Vec<Line>,
}

impl Script {
    /// Parse a script from a JSON reader and validate it.
    pub fn from_reader<R: std::io::Read>(r: R) -> ReelResult<Self> {
        let script: Script = serde_json::from_reader(r)
            .map_err(|e| ReelError::serde(format!("parse script JSON: {e}")))?;
        script.validate()?;
        Ok(script)
    }

    /// Parse a script from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ReelError::validation(format!("open script JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.lines.is_empty() {
            return Err(ReelError::validation("script must contain at least one line"));
        }
        Ok(())
    }

    /// Built-in three-line script used when no script is supplied.
    pub fn fallback() -> Self {
        Self {
            title: "Don't Look Behind You #shorts".to_owned(),
            description: "Something is standing there.".to_owned(),
            tags: vec!["horror".to_owned(), "shorts".to_owned()],
            lines: vec![
                Line::new("Stop scrolling. Now.")
                    .with_style("narrator")
                    .with_keyword("dark hallway portrait"),
                Line::new("[gasps] I heard that.")
                    .with_style("victim")
                    .with_keyword("scared face closeup"),
                Line::new("You shouldn't have looked.")
                    .with_style("demon")
                    .with_keyword("shadow figure portrait"),
            ],
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/model.rs"]
mod tests;
