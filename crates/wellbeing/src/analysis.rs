//! Detection cycle results

use serde::{Deserialize, Serialize};

use crate::emotion::Emotion;

/// One classifier's verdict on one face
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionObservation {
    pub emotion: Emotion,
    pub confidence: f64,
    pub source: String,
}

/// Outcome of a successful detection cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Whether a face was detected in this frame
    pub has_face: bool,

    /// Whether the user is judged away over the presence window
    pub is_away: bool,

    /// Minutes since the work session started
    pub work_minutes: f64,

    /// Continuous work time reached the alert interval while present
    pub need_break_alert: bool,

    /// Observations in face order, classifier order within a face
    pub emotions: Vec<EmotionObservation>,
}

/// What the host receives for one `DETECT`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetectionOutcome {
    Sample(Sample),
    Error { error: String },
}

impl DetectionOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        DetectionOutcome::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DetectionOutcome::Error { .. })
    }

    pub fn sample(&self) -> Option<&Sample> {
        match self {
            DetectionOutcome::Sample(sample) => Some(sample),
            DetectionOutcome::Error { .. } => None,
        }
    }
}
