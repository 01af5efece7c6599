//! Workstation Wellbeing Monitor
//!
//! Per-cycle worker state analysis from the desk camera:
//! - Face presence with sliding-window away detection
//! - Work session timing and break alerts
//! - Per-face emotion classification with fatigue override

pub mod analysis;
pub mod config;
pub mod detector;
pub mod emotion;
pub mod onnx;
pub mod presence;
pub mod session;

pub use analysis::{DetectionOutcome, EmotionObservation, Sample};
pub use config::{ClassifierConfig, WellbeingConfig};
pub use detector::{Classification, EmotionClassifier, FaceDetector, FaceRegion};
pub use emotion::Emotion;
pub use onnx::{OnnxEmotionClassifier, OnnxFaceDetector};
pub use presence::PresenceTracker;
pub use session::{Clock, ManualClock, SessionClock, SystemClock};

use std::time::Duration;

use camera_capture::{CameraError, CameraManager, CameraState, VideoFrame};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Detection error types
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Cannot open camera")]
    CameraUnavailable(#[source] CameraError),

    #[error("Cannot read frame")]
    FrameRead(#[source] CameraError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Face detection failed: {0}")]
    FaceDetection(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DetectionError {
    /// Whether the fault came from the camera layer
    pub fn is_camera_fault(&self) -> bool {
        matches!(
            self,
            DetectionError::CameraUnavailable(_) | DetectionError::FrameRead(_) | DetectionError::Camera(_)
        )
    }

    /// Message sent to the host in the `error` field
    pub fn protocol_message(&self) -> String {
        match self {
            DetectionError::CameraUnavailable(_) | DetectionError::FrameRead(_) => self.to_string(),
            other => format!("Detection error: {}", other),
        }
    }
}

/// Detection context: camera, presence window, session clock and models.
///
/// Owned by the command loop; every mutation happens on that single thread.
pub struct WellbeingMonitor {
    config: WellbeingConfig,
    camera: CameraManager,
    face_detector: Box<dyn FaceDetector>,
    classifiers: Vec<Box<dyn EmotionClassifier>>,
    presence: PresenceTracker,
    session: SessionClock,
    clock: Box<dyn Clock>,
}

impl WellbeingMonitor {
    /// Create a monitor with the system clock
    pub fn new(
        config: WellbeingConfig,
        camera: CameraManager,
        face_detector: Box<dyn FaceDetector>,
        classifiers: Vec<Box<dyn EmotionClassifier>>,
    ) -> Result<Self, DetectionError> {
        Self::with_clock(config, camera, face_detector, classifiers, Box::new(SystemClock))
    }

    /// Create a monitor driven by `clock`
    pub fn with_clock(
        config: WellbeingConfig,
        camera: CameraManager,
        face_detector: Box<dyn FaceDetector>,
        classifiers: Vec<Box<dyn EmotionClassifier>>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, DetectionError> {
        config.validate()?;
        if classifiers.is_empty() {
            warn!("No emotion classifiers configured, samples will carry no emotions");
        }
        Ok(Self {
            presence: PresenceTracker::new(config.window_capacity, config.away_threshold),
            session: SessionClock::new(clock.now()),
            config,
            camera,
            face_detector,
            classifiers,
            clock,
        })
    }

    /// Run one detection cycle. Never fails: faults become error outcomes.
    pub fn run_detection_cycle(&mut self) -> DetectionOutcome {
        match self.detect() {
            Ok(sample) => DetectionOutcome::Sample(sample),
            Err(e) => {
                if e.is_camera_fault() {
                    self.camera.release();
                } else {
                    error!("Unexpected error in detection cycle: {}", e);
                }
                DetectionOutcome::error(e.protocol_message())
            }
        }
    }

    fn detect(&mut self) -> Result<Sample, DetectionError> {
        self.camera
            .ensure_open()
            .map_err(DetectionError::CameraUnavailable)?;
        let frame = self.camera.read_frame().map_err(DetectionError::FrameRead)?;

        let faces = self.face_detector.detect(&frame)?;
        let has_face = !faces.is_empty();

        self.presence.observe(has_face);
        let is_away = self.presence.is_away();

        let now = self.clock.now();
        self.session.update(is_away, now);
        let work_minutes = self.session.work_minutes(now);
        let need_break_alert = self.session.work_duration(now)
            >= Duration::from_secs(self.config.alert_interval_secs)
            && !is_away;

        let mut emotions = Vec::new();
        for face in &faces {
            self.classify_face(&frame, face, work_minutes, &mut emotions);
        }

        debug!(
            "Cycle: has_face={} is_away={} work_minutes={:.2} observations={}",
            has_face,
            is_away,
            work_minutes,
            emotions.len()
        );

        Ok(Sample {
            has_face,
            is_away,
            work_minutes,
            need_break_alert,
            emotions,
        })
    }

    /// Query every classifier for one face. Failures are logged and skipped.
    fn classify_face(
        &mut self,
        frame: &VideoFrame,
        face: &FaceRegion,
        work_minutes: f64,
        emotions: &mut Vec<EmotionObservation>,
    ) {
        let Some(crop) = face.crop(frame) else {
            debug!("Face region {:?} lies outside the frame, skipping", face);
            return;
        };

        for classifier in self.classifiers.iter_mut() {
            match classifier.classify(&crop) {
                Ok(result) if !result.confidence.is_finite() => {
                    warn!(
                        "{} returned non-finite confidence for '{}', skipping",
                        classifier.id(),
                        result.label
                    );
                }
                Ok(result) => {
                    let emotion = Emotion::from_label(&result.label)
                        .resolve(work_minutes, self.config.tired_threshold_minutes);
                    emotions.push(EmotionObservation {
                        emotion,
                        confidence: result.confidence.clamp(0.0, 1.0),
                        source: classifier.id().to_string(),
                    });
                }
                Err(e) => {
                    warn!("{} detection error: {}", classifier.id(), e);
                }
            }
        }
    }

    /// Release the camera. Idempotent.
    pub fn release_camera(&mut self) {
        self.camera.release();
    }

    /// Forget presence history and restart the work session
    pub fn reset(&mut self) {
        self.presence.clear();
        self.session.reset(self.clock.now());
    }

    pub fn camera_state(&self) -> CameraState {
        self.camera.state()
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn session(&self) -> &SessionClock {
        &self.session
    }

    pub fn config(&self) -> &WellbeingConfig {
        &self.config
    }
}
