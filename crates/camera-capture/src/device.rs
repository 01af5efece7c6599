//! Acquisition capability exposed by camera drivers

use crate::{CameraBackend, CameraError, VideoFrame};

/// Something that can hand out capture handles for a given backend.
///
/// Mirrors the `open(backend)` call of native capture libraries: an open
/// attempt may fail outright, or return a handle that reports it is not
/// opened. [`crate::CameraManager`] treats both the same way.
pub trait CaptureSource: Send {
    fn open(&mut self, backend: CameraBackend) -> Result<Box<dyn CaptureHandle>, CameraError>;
}

/// An acquired device handle
pub trait CaptureHandle: Send {
    /// Whether the device is still usable
    fn is_opened(&self) -> bool;

    /// Read the next frame (blocking)
    fn read(&mut self) -> Result<VideoFrame, CameraError>;

    /// Give the device back. Called at most once per handle by the manager.
    fn release(&mut self);
}
