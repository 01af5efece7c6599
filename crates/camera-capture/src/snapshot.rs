//! Snapshot-based capture source
//!
//! Reads frames written to disk by an external grabber (for example
//! `ffmpeg -f v4l2 -i /dev/video0 -update 1 frames/latest.jpg`). The spool
//! backend requires a directory and always serves its newest image; the still
//! backend accepts either a single image file or a directory.
//!
//! A grabber that dies leaves its last image behind, so frames older than the
//! configured maximum age fail the read like a revoked device.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::device::{CaptureHandle, CaptureSource};
use crate::{CameraBackend, CameraError, VideoFrame};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Capture source backed by image files
pub struct SnapshotSource {
    device: PathBuf,
    max_frame_age: Option<Duration>,
}

impl SnapshotSource {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            max_frame_age: None,
        }
    }

    /// Reject frames whose modification time is older than `max_age`
    pub fn with_max_frame_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_frame_age = max_age;
        self
    }
}

impl CaptureSource for SnapshotSource {
    fn open(&mut self, backend: CameraBackend) -> Result<Box<dyn CaptureHandle>, CameraError> {
        let opened = match backend {
            CameraBackend::Spool => self.device.is_dir(),
            CameraBackend::Still => self.device.exists(),
        };
        if !opened {
            return Err(CameraError::Open(format!(
                "{} not available for {} backend",
                self.device.display(),
                backend
            )));
        }

        debug!("Opened snapshot device {} ({})", self.device.display(), backend);
        Ok(Box::new(SnapshotHandle {
            device: self.device.clone(),
            max_frame_age: self.max_frame_age,
            opened: true,
            sequence: 0,
        }))
    }
}

struct SnapshotHandle {
    device: PathBuf,
    max_frame_age: Option<Duration>,
    opened: bool,
    sequence: u32,
}

impl SnapshotHandle {
    fn frame_path(&self) -> Result<PathBuf, CameraError> {
        if self.device.is_dir() {
            newest_image(&self.device)
        } else {
            Ok(self.device.clone())
        }
    }

    fn check_fresh(&self, path: &Path) -> Result<(), CameraError> {
        let Some(max_age) = self.max_frame_age else {
            return Ok(());
        };
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| CameraError::Read(format!("{}: {}", path.display(), e)))?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age > max_age {
            return Err(CameraError::Read(format!(
                "stale frame {} ({}s old)",
                path.display(),
                age.as_secs()
            )));
        }
        Ok(())
    }
}

impl CaptureHandle for SnapshotHandle {
    fn is_opened(&self) -> bool {
        self.opened && self.device.exists()
    }

    fn read(&mut self) -> Result<VideoFrame, CameraError> {
        if !self.opened {
            return Err(CameraError::NotInitialized);
        }
        let path = self.frame_path()?;
        self.check_fresh(&path)?;
        let image = image::open(&path)
            .map_err(|e| CameraError::Read(format!("{}: {}", path.display(), e)))?
            .to_rgb8();

        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        self.sequence = self.sequence.wrapping_add(1);

        Ok(VideoFrame::from_image(image, timestamp_ns, self.sequence))
    }

    fn release(&mut self) {
        self.opened = false;
    }
}

/// Newest image file (by modification time) in `dir`
fn newest_image(dir: &Path) -> Result<PathBuf, CameraError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| CameraError::Read(format!("{}: {}", dir.display(), e)))?;

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .filter_map(|path| {
            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
            Some((modified, path))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, path)| path)
        .ok_or_else(|| CameraError::Read(format!("no frames in {}", dir.display())))
}
