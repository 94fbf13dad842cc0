use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};

/// Role/emotion tag carried by a script line.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StyleTag {
    #[default]
    Narrator,
    Victim,
    Demon,
    Panic,
    Dread,
    Whisper,
}

impl StyleTag {
    pub const ALL: [StyleTag; 6] = [
        Self::Narrator,
        Self::Victim,
        Self::Demon,
        Self::Panic,
        Self::Dread,
        Self::Whisper,
    ];

    /// Lenient lookup; unknown or missing tags resolve to [`StyleTag::Narrator`].
    pub fn parse(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return Self::Narrator;
        };
        let tag = tag.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .unwrap_or_else(|| {
                tracing::debug!(tag = %tag, "unknown style tag; using narrator");
                Self::Narrator
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Narrator => "narrator",
            Self::Victim => "victim",
            Self::Demon => "demon",
            Self::Panic => "panic",
            Self::Dread => "dread",
            Self::Whisper => "whisper",
        }
    }
}

/// Which base speaker(s) a profile speaks with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeakerSelection {
    Single(String),
    /// Weighted mix of two speakers; `ratio` is the weight of `primary`.
    Blend {
        primary: String,
        secondary: String,
        ratio: f32,
    },
}

impl SpeakerSelection {
    pub fn single(name: impl Into<String>) -> Self {
        Self::Single(name.into())
    }

    pub fn primary(&self) -> &str {
        match self {
            Self::Single(name) => name,
            Self::Blend { primary, .. } => primary,
        }
    }

    /// Backend selector string: `Ryan` or `Aiden:0.70,Ryan:0.30`.
    pub fn selector(&self) -> String {
        match self {
            Self::Single(name) => name.clone(),
            Self::Blend {
                primary,
                secondary,
                ratio,
            } => format!("{primary}:{ratio:.2},{secondary}:{:.2}", 1.0 - ratio),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceProfile {
    pub speaker: SpeakerSelection,
    /// Multiplier applied on top of the per-chunk punctuation speed.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Rate-reinterpretation factor for the "deepen" variant (`< 1` lowers pitch).
    #[serde(default)]
    pub deepen: Option<f32>,
    /// Pitch factor emulating a blend when the backend cannot mix speakers itself.
    #[serde(default)]
    pub blend_pitch: Option<f32>,
    /// Delivery instruction handed to the backend.
    #[serde(default = "default_instruct")]
    pub instruct: String,
}

fn default_speed() -> f32 {
    1.0
}

fn default_instruct() -> String {
    "Speak normally.".to_owned()
}

impl VoiceProfile {
    pub fn new(speaker: SpeakerSelection) -> Self {
        Self {
            speaker,
            speed: default_speed(),
            deepen: None,
            blend_pitch: None,
            instruct: default_instruct(),
        }
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.speaker.primary().trim().is_empty() {
            return Err(ReelError::validation("voice profile speaker must not be empty"));
        }
        if let SpeakerSelection::Blend { ratio, .. } = &self.speaker
            && !(0.0..=1.0).contains(ratio)
        {
            return Err(ReelError::validation("speaker blend ratio must be within [0, 1]"));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(ReelError::validation("voice profile speed must be > 0"));
        }
        for (name, v) in [("deepen", self.deepen), ("blend_pitch", self.blend_pitch)] {
            if let Some(v) = v
                && !(v.is_finite() && v > 0.0)
            {
                return Err(ReelError::validation(format!(
                    "voice profile {name} must be > 0"
                )));
            }
        }
        Ok(())
    }
}

/// Style tag → profile map. Lookups never fail: missing tags use the narrator profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileTable {
    profiles: BTreeMap<StyleTag, VoiceProfile>,
}

impl Default for ProfileTable {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(StyleTag::Narrator, VoiceProfile::new(SpeakerSelection::single("Ryan")));
        profiles.insert(
            StyleTag::Victim,
            VoiceProfile {
                speed: 1.05,
                instruct: "Frightened, breathless.".to_owned(),
                ..VoiceProfile::new(SpeakerSelection::single("Vivian"))
            },
        );
        profiles.insert(
            StyleTag::Demon,
            VoiceProfile {
                speed: 0.9,
                deepen: Some(0.85),
                blend_pitch: Some(0.95),
                instruct: "Low, slow and menacing.".to_owned(),
                ..VoiceProfile::new(SpeakerSelection::Blend {
                    primary: "Aiden".to_owned(),
                    secondary: "Ryan".to_owned(),
                    ratio: 0.7,
                })
            },
        );
        profiles.insert(
            StyleTag::Panic,
            VoiceProfile {
                speed: 1.2,
                instruct: "Panicked and rushed.".to_owned(),
                ..VoiceProfile::new(SpeakerSelection::single("Vivian"))
            },
        );
        profiles.insert(
            StyleTag::Dread,
            VoiceProfile {
                speed: 0.85,
                instruct: "Quiet dread.".to_owned(),
                ..VoiceProfile::new(SpeakerSelection::single("Ryan"))
            },
        );
        profiles.insert(
            StyleTag::Whisper,
            VoiceProfile {
                speed: 0.95,
                blend_pitch: Some(1.04),
                instruct: "Whisper.".to_owned(),
                ..VoiceProfile::new(SpeakerSelection::Blend {
                    primary: "Vivian".to_owned(),
                    secondary: "Ryan".to_owned(),
                    ratio: 0.5,
                })
            },
        );
        Self { profiles }
    }
}

impl ProfileTable {
    pub fn empty() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, tag: StyleTag, profile: VoiceProfile) {
        self.profiles.insert(tag, profile);
    }

    /// Entries of `other` replace entries here.
    pub fn merged(mut self, other: &ProfileTable) -> Self {
        for (tag, p) in &other.profiles {
            self.profiles.insert(*tag, p.clone());
        }
        self
    }

    pub fn resolve(&self, tag: StyleTag) -> VoiceProfile {
        self.profiles
            .get(&tag)
            .or_else(|| self.profiles.get(&StyleTag::Narrator))
            .cloned()
            .unwrap_or_else(|| VoiceProfile::new(SpeakerSelection::single("Ryan")))
    }

    pub fn validate(&self) -> ReelResult<()> {
        for (tag, p) in &self.profiles {
            p.validate()
                .map_err(|e| ReelError::validation(format!("profile '{}': {e}", tag.as_str())))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/voice/profile.rs"]
mod tests;
