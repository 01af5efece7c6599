//! Wellbeing monitor configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::DetectionError;

/// Emotion classifier model entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Identifier reported as the observation `source`
    pub id: String,
    /// ONNX model path
    pub model_path: PathBuf,
}

/// Wellbeing monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WellbeingConfig {
    /// Presence samples kept in the sliding window
    pub window_capacity: usize,

    /// Minimum present samples in a full window to count as at the desk
    pub away_threshold: usize,

    /// Work minutes after which calm/worried read as tired
    pub tired_threshold_minutes: f64,

    /// Continuous work time before a break alert (seconds)
    pub alert_interval_secs: u64,

    /// Face detection confidence threshold
    pub face_confidence: f32,

    /// Face detection model path
    pub face_model_path: Option<PathBuf>,

    /// Emotion classifiers, queried in order for every face
    pub classifiers: Vec<ClassifierConfig>,
}

impl Default for WellbeingConfig {
    fn default() -> Self {
        Self {
            window_capacity: 50,
            away_threshold: 10,
            tired_threshold_minutes: 30.0,
            alert_interval_secs: 45 * 60,
            face_confidence: 0.7,
            face_model_path: None,
            classifiers: Vec::new(),
        }
    }
}

impl WellbeingConfig {
    /// Reject settings the monitor cannot run with
    pub fn validate(&self) -> Result<(), DetectionError> {
        if self.window_capacity == 0 {
            return Err(DetectionError::Config("window_capacity must be positive".into()));
        }
        if self.away_threshold > self.window_capacity {
            return Err(DetectionError::Config(format!(
                "away_threshold {} exceeds window_capacity {}",
                self.away_threshold, self.window_capacity
            )));
        }
        if self.alert_interval_secs == 0 {
            return Err(DetectionError::Config("alert_interval_secs must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.face_confidence) {
            return Err(DetectionError::Config(format!(
                "face_confidence {} outside [0, 1]",
                self.face_confidence
            )));
        }
        Ok(())
    }
}
