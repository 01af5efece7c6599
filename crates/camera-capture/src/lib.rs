//! Camera Capture Library for the Emotion Monitor
//!
//! Owns the workstation camera lifecycle:
//! - Pluggable acquisition sources opened per backend
//! - Lazy open with preferred/fallback backend retry
//! - Release and re-acquire on any read or open failure
//! - A pure-Rust snapshot source fed by an external frame grabber

pub mod device;
pub mod frame;
pub mod manager;
pub mod snapshot;

pub use device::{CaptureHandle, CaptureSource};
pub use frame::VideoFrame;
pub use manager::{CameraManager, CameraState};
pub use snapshot::SnapshotSource;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Failed to read frame: {0}")]
    Read(String),

    #[error("Frame decode failed: {0}")]
    Decode(String),

    #[error("Camera not initialized")]
    NotInitialized,
}

/// Acquisition backend requested from a [`CaptureSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackend {
    /// Spool directory continuously written by a capture daemon
    Spool,
    /// Generic still-image access (single file, or newest file of a directory)
    Still,
}

impl fmt::Display for CameraBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraBackend::Spool => write!(f, "spool"),
            CameraBackend::Still => write!(f, "still"),
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device path (spool directory or snapshot file)
    pub device: PathBuf,
    /// Backend tried first on every acquisition
    pub backend: CameraBackend,
    /// Backend tried when the preferred one fails
    pub fallback_backend: CameraBackend,
    /// Frames older than this many seconds are read failures. 0 disables the check.
    pub max_frame_age_secs: u64,
}

impl CameraConfig {
    pub fn max_frame_age(&self) -> Option<Duration> {
        (self.max_frame_age_secs > 0).then(|| Duration::from_secs(self.max_frame_age_secs))
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("frames"),
            backend: CameraBackend::Spool,
            fallback_backend: CameraBackend::Still,
            max_frame_age_secs: 10,
        }
    }
}
