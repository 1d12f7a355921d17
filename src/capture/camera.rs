//! Camera contract and single-shot capture sessions.
//!
//! A flow needs exactly one frame per attempt. The device is held only for
//! that read and released on every exit path.

use super::{CaptureConfig, Frame};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Camera failures. All of them are worth a retry by the user.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    #[error("camera not initialized")]
    NotInitialized,
}

/// A frame source.
///
/// Real devices live outside the crate; [`MockCamera`] serves tests and
/// the demo binary.
pub trait Camera {
    /// Acquires the device, applying `config`.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Reads one frame from an open device.
    fn capture(&mut self) -> Result<Frame, CameraError>;

    /// Whether the device is currently held.
    fn is_open(&self) -> bool;

    /// Releases the device. Must be safe to call when already closed.
    fn close(&mut self);
}

impl<C: Camera + ?Sized> Camera for &mut C {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        (**self).open(config)
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        (**self).capture()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// A single scoped use of a camera.
///
/// The device is opened when the session is created, yields at most one
/// frame, and is closed when the session is dropped, whichever path the
/// caller takes out.
pub struct CaptureSession<'a, C: Camera + ?Sized> {
    camera: &'a mut C,
}

impl<'a, C: Camera + ?Sized> CaptureSession<'a, C> {
    /// Opens the camera for a single read, then waits `warmup_ms`.
    ///
    /// A failed open still releases the device.
    pub fn open(camera: &'a mut C, config: &CaptureConfig) -> Result<Self, CameraError> {
        if let Err(e) = camera.open(config) {
            camera.close();
            return Err(e);
        }
        let session = Self { camera };
        if config.warmup_ms > 0 {
            tracing::debug!(warmup_ms = config.warmup_ms, "Waiting for sensor to settle");
            thread::sleep(Duration::from_millis(config.warmup_ms));
        }
        Ok(session)
    }

    /// Reads one frame and releases the device.
    pub fn read(self) -> Result<Frame, CameraError> {
        self.camera.capture()
    }
}

impl<C: Camera + ?Sized> Drop for CaptureSession<'_, C> {
    fn drop(&mut self) {
        self.camera.close();
    }
}

/// Opens, reads one frame, and closes.
pub fn capture_once<C: Camera + ?Sized>(
    camera: &mut C,
    config: &CaptureConfig,
) -> Result<Frame, CameraError> {
    CaptureSession::open(camera, config)?.read()
}

/// Camera producing a fixed gradient image.
///
/// The sequence counter restarts on every `open`, so each capture session
/// sees the same first frame. That makes enrollment and a later
/// verification with the mock agree, which is what the demo binary needs.
#[derive(Debug, Default)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    sequence: u64,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(device_id = config.device_id, "MockCamera opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;

        // Deterministic gradient pattern; stands in for a face image.
        let width = config.width as usize;
        let pixel_count = width * config.height as usize;
        let pixels: Vec<u8> = (0..pixel_count)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                ((x * 7 + y * 13) as u64 ^ self.sequence) as u8
            })
            .collect();

        self.sequence += 1;
        Ok(Frame::new(pixels, config.width, config.height, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("MockCamera closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn no_warmup() -> CaptureConfig {
        CaptureConfig {
            warmup_ms: 0,
            ..Default::default()
        }
    }

    /// Camera whose `open` always fails; counts `close` calls.
    #[derive(Default)]
    struct BrokenCamera {
        closes: usize,
    }

    impl Camera for BrokenCamera {
        fn open(&mut self, _config: &CaptureConfig) -> Result<(), CameraError> {
            Err(CameraError::OpenFailed("device busy".into()))
        }

        fn capture(&mut self) -> Result<Frame, CameraError> {
            Err(CameraError::NotInitialized)
        }

        fn is_open(&self) -> bool {
            false
        }

        fn close(&mut self) {
            self.closes += 1;
        }
    }

    #[test]
    fn test_mock_camera_lifecycle() {
        let mut camera = MockCamera::new();
        let config = no_warmup();

        assert!(!camera.is_open());

        camera.open(&config).unwrap();
        assert!(camera.is_open());

        let frame = camera.capture().unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.sequence(), 1);

        let frame2 = camera.capture().unwrap();
        assert_eq!(frame2.sequence(), 2);

        camera.close();
        assert!(!camera.is_open());
    }

    #[test]
    fn test_capture_without_open() {
        let mut camera = MockCamera::new();
        assert!(matches!(
            camera.capture(),
            Err(CameraError::NotInitialized)
        ));
    }

    #[test]
    fn test_session_closes_after_read() {
        let mut camera = MockCamera::new();
        let frame = capture_once(&mut camera, &no_warmup()).unwrap();
        assert!(frame.is_valid());
        assert!(!camera.is_open());
    }

    #[test]
    fn test_session_closes_when_dropped_unread() {
        let mut camera = MockCamera::new();
        {
            let _session = CaptureSession::open(&mut camera, &no_warmup()).unwrap();
        }
        assert!(!camera.is_open());
    }

    #[test]
    fn test_sessions_see_same_first_frame() {
        let mut camera = MockCamera::new();
        let config = CaptureConfig {
            warmup_ms: 0,
            ..CaptureConfig::with_dimensions(32, 24)
        };
        let a = capture_once(&mut camera, &config).unwrap();
        let b = capture_once(&mut camera, &config).unwrap();
        assert_eq!(a.pixels(), b.pixels());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut camera = MockCamera::new();
        let config = CaptureConfig::with_dimensions(0, 10);
        assert!(matches!(
            capture_once(&mut camera, &config),
            Err(CameraError::ConfigFailed(_))
        ));
    }

    #[test]
    fn test_session_waits_for_warmup() {
        let mut camera = MockCamera::new();
        let config = CaptureConfig {
            warmup_ms: 25,
            ..CaptureConfig::with_dimensions(8, 8)
        };
        let start = Instant::now();
        let session = CaptureSession::open(&mut camera, &config).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(25));
        assert!(session.read().unwrap().is_valid());
    }

    #[test]
    fn test_failed_open_releases_camera() {
        let mut camera = BrokenCamera::default();
        assert!(matches!(
            capture_once(&mut camera, &no_warmup()),
            Err(CameraError::OpenFailed(_))
        ));
        assert_eq!(camera.closes, 1);
    }
}
