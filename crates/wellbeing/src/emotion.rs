//! Coarse emotion categories and the duration-based fatigue override

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse emotional state reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Calm,
    Worried,
    Tired,
}

impl Emotion {
    /// Map a raw classifier label onto a coarse category.
    ///
    /// Unknown or empty labels map to [`Emotion::Calm`].
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "happy" | "surprise" => Emotion::Happy,
            "neutral" => Emotion::Calm,
            "sad" | "fear" | "disgust" | "angry" => Emotion::Worried,
            _ => Emotion::Calm,
        }
    }

    /// Apply the fatigue override: after more than `tired_threshold_minutes`
    /// of uninterrupted work, calm and worried read as tired.
    pub fn resolve(self, work_minutes: f64, tired_threshold_minutes: f64) -> Self {
        match self {
            Emotion::Calm | Emotion::Worried if work_minutes > tired_threshold_minutes => {
                Emotion::Tired
            }
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Calm => "calm",
            Emotion::Worried => "worried",
            Emotion::Tired => "tired",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
