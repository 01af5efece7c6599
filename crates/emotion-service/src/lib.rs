//! Emotion Detection Service
//!
//! Line-oriented request/response service consumed by the host application,
//! plus the host-side client that supervises it.

pub mod client;
pub mod config;
pub mod protocol;
pub mod service;

pub use client::{ClientError, ServiceClient};
pub use config::{LogConfig, LogFormat, ServiceConfig};
pub use protocol::Command;
pub use service::{CommandLoop, LoopExit};

use camera_capture::{CameraManager, SnapshotSource};
use thiserror::Error;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use wellbeing::{
    DetectionError, EmotionClassifier, OnnxEmotionClassifier, OnnxFaceDetector, WellbeingMonitor,
};

/// Service error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Detection(#[from] DetectionError),
}

/// Initialize logging on stderr, the protocol's side channel
pub fn init_logging(config: &LogConfig) -> Result<(), ServiceError> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| ServiceError::Config(format!("invalid log level '{}'", config.level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    };
    result.map_err(|e| ServiceError::Logging(e.to_string()))
}

/// Build the detection context from configuration
pub fn build_monitor(config: &ServiceConfig) -> Result<WellbeingMonitor, ServiceError> {
    let wellbeing = &config.wellbeing;
    let face_model = wellbeing.face_model_path.as_ref().ok_or_else(|| {
        ServiceError::Config("wellbeing.face_model_path must be set".to_string())
    })?;
    let face_detector = OnnxFaceDetector::new(face_model, wellbeing.face_confidence)?;

    let mut classifiers: Vec<Box<dyn EmotionClassifier>> = Vec::new();
    for entry in &wellbeing.classifiers {
        classifiers.push(Box::new(OnnxEmotionClassifier::new(&entry.id, &entry.model_path)?));
        info!("Emotion classifier '{}' ready", entry.id);
    }

    let camera = CameraManager::new(
        Box::new(
            SnapshotSource::new(&config.camera.device)
                .with_max_frame_age(config.camera.max_frame_age()),
        ),
        &config.camera,
    );

    Ok(WellbeingMonitor::new(
        wellbeing.clone(),
        camera,
        Box::new(face_detector),
        classifiers,
    )?)
}
