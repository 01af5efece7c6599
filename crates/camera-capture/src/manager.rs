//! Camera resource manager
//!
//! Single owner of the capture handle. Every failure path tears the handle
//! down so the next cycle re-acquires the device instead of spinning on a
//! dead one.

use tracing::{debug, info, warn};

use crate::device::{CaptureHandle, CaptureSource};
use crate::{CameraBackend, CameraConfig, CameraError, VideoFrame};

/// Lifecycle state of the managed handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    Open,
    Closed,
}

/// Lazily-opened camera with backend fallback
pub struct CameraManager {
    source: Box<dyn CaptureSource>,
    handle: Option<Box<dyn CaptureHandle>>,
    backend: CameraBackend,
    fallback_backend: CameraBackend,
}

impl CameraManager {
    /// Create a manager in the CLOSED state. Nothing is opened until
    /// [`CameraManager::ensure_open`] is called.
    pub fn new(source: Box<dyn CaptureSource>, config: &CameraConfig) -> Self {
        Self {
            source,
            handle: None,
            backend: config.backend,
            fallback_backend: config.fallback_backend,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> CameraState {
        if self.handle.is_some() {
            CameraState::Open
        } else {
            CameraState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == CameraState::Open
    }

    /// Make sure a healthy handle is held, acquiring one if needed.
    pub fn ensure_open(&mut self) -> Result<(), CameraError> {
        if let Some(handle) = &self.handle {
            if handle.is_opened() {
                return Ok(());
            }
            warn!("Camera handle no longer opened, re-acquiring");
        }
        self.release();

        match self.acquire(self.backend) {
            Ok(handle) => {
                info!("Camera opened with {} backend", self.backend);
                self.handle = Some(handle);
                return Ok(());
            }
            Err(e) => {
                warn!("Camera open failed with {} backend: {}", self.backend, e);
            }
        }

        let handle = self.acquire(self.fallback_backend).map_err(|e| {
            warn!("Camera open failed with {} backend: {}", self.fallback_backend, e);
            e
        })?;
        info!("Camera opened with fallback {} backend", self.fallback_backend);
        self.handle = Some(handle);
        Ok(())
    }

    fn acquire(&mut self, backend: CameraBackend) -> Result<Box<dyn CaptureHandle>, CameraError> {
        let mut handle = self.source.open(backend)?;
        if handle.is_opened() {
            Ok(handle)
        } else {
            handle.release();
            Err(CameraError::Open(format!("{} backend did not open the device", backend)))
        }
    }

    /// Read one frame. On failure the handle is released and the state
    /// forced to CLOSED.
    pub fn read_frame(&mut self) -> Result<VideoFrame, CameraError> {
        let handle = self.handle.as_mut().ok_or(CameraError::NotInitialized)?;
        match handle.read() {
            Ok(frame) => Ok(frame),
            Err(e) => {
                warn!("Camera read failed, releasing device: {}", e);
                self.release();
                Err(e)
            }
        }
    }

    /// Release the handle. Safe to call when already CLOSED.
    pub fn release(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.release();
            info!("Camera released");
        } else {
            debug!("Camera already closed");
        }
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counters {
        opens: AtomicUsize,
        releases: AtomicUsize,
        reads: AtomicUsize,
    }

    /// Source whose behaviour per backend is scripted by the test
    struct ScriptedSource {
        spool_opens: bool,
        still_opens: bool,
        fail_reads: bool,
        counters: Arc<Counters>,
    }

    struct ScriptedHandle {
        opened: bool,
        fail_reads: bool,
        counters: Arc<Counters>,
    }

    impl CaptureSource for ScriptedSource {
        fn open(&mut self, backend: CameraBackend) -> Result<Box<dyn CaptureHandle>, CameraError> {
            self.counters.opens.fetch_add(1, Ordering::SeqCst);
            let opened = match backend {
                CameraBackend::Spool => self.spool_opens,
                CameraBackend::Still => self.still_opens,
            };
            Ok(Box::new(ScriptedHandle {
                opened,
                fail_reads: self.fail_reads,
                counters: self.counters.clone(),
            }))
        }
    }

    impl CaptureHandle for ScriptedHandle {
        fn is_opened(&self) -> bool {
            self.opened
        }

        fn read(&mut self) -> Result<VideoFrame, CameraError> {
            self.counters.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                Err(CameraError::Read("device gone".into()))
            } else {
                Ok(VideoFrame::new(vec![0; 12], 2, 2, 0, 0))
            }
        }

        fn release(&mut self) {
            self.opened = false;
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn manager(spool: bool, still: bool, fail_reads: bool) -> (CameraManager, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let source = ScriptedSource {
            spool_opens: spool,
            still_opens: still,
            fail_reads,
            counters: counters.clone(),
        };
        (CameraManager::new(Box::new(source), &CameraConfig::default()), counters)
    }

    #[test]
    fn test_starts_closed() {
        let (camera, counters) = manager(true, true, false);
        assert_eq!(camera.state(), CameraState::Closed);
        assert_eq!(counters.opens.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_open_is_noop_when_healthy() {
        let (mut camera, counters) = manager(true, true, false);
        camera.ensure_open().unwrap();
        camera.ensure_open().unwrap();
        assert!(camera.is_open());
        assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fallback_backend_used() {
        let (mut camera, counters) = manager(false, true, false);
        camera.ensure_open().unwrap();
        assert!(camera.is_open());
        assert_eq!(counters.opens.load(Ordering::SeqCst), 2);
        // The failed preferred handle was released
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_open_failure_stays_closed() {
        let (mut camera, counters) = manager(false, false, false);
        assert!(matches!(camera.ensure_open(), Err(CameraError::Open(_))));
        assert_eq!(camera.state(), CameraState::Closed);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_read_failure_forces_closed() {
        let (mut camera, counters) = manager(true, true, true);
        camera.ensure_open().unwrap();
        assert!(camera.read_frame().is_err());
        assert_eq!(camera.state(), CameraState::Closed);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);

        // Next cycle re-acquires
        camera.ensure_open().unwrap();
        assert_eq!(counters.opens.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_read_requires_open() {
        let (mut camera, counters) = manager(true, true, false);
        assert!(matches!(camera.read_frame(), Err(CameraError::NotInitialized)));
        assert_eq!(counters.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_release_is_idempotent() {
        let (mut camera, counters) = manager(true, true, false);
        camera.ensure_open().unwrap();
        camera.release();
        camera.release();
        drop(camera);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases_open_handle() {
        let (mut camera, counters) = manager(true, true, false);
        camera.ensure_open().unwrap();
        drop(camera);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    }
}
