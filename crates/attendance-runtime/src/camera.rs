//! Simulated camera device.
//!
//! Nothing is read from hardware. The camera only models acquisition
//! failures and the track lifecycle, so views can hold a stream while a
//! capture or detection loop runs and release it when they stop.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera device found")]
    DeviceNotFound,
}

impl CameraError {
    /// One-shot message shown to the operator.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Unable to access camera. Please allow camera access and try again."
            }
            Self::DeviceNotFound => "No camera found. Connect a camera and try again.",
        }
    }
}

/// How the simulated device responds to acquisition requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraAvailability {
    #[default]
    Available,
    PermissionDenied,
    NoDevice,
}

impl FromStr for CameraAvailability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" | "1" => Ok(Self::Available),
            "denied" => Ok(Self::PermissionDenied),
            "missing" | "none" | "0" => Ok(Self::NoDevice),
            other => Err(format!("unknown camera availability: {other}")),
        }
    }
}

/// Requested video resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaRequest {
    pub width: u32,
    pub height: u32,
}

impl MediaRequest {
    /// Used while capturing registration images.
    pub const REGISTRATION: MediaRequest = MediaRequest {
        width: 640,
        height: 480,
    };
    /// Used while marking attendance.
    pub const RECOGNITION: MediaRequest = MediaRequest {
        width: 720,
        height: 540,
    };
}

pub struct SimulatedCamera {
    availability: CameraAvailability,
    live_tracks: Arc<AtomicUsize>,
}

impl SimulatedCamera {
    pub fn new(availability: CameraAvailability) -> Self {
        Self {
            availability,
            live_tracks: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Acquire a video stream at the requested resolution.
    pub fn acquire(&self, request: MediaRequest) -> Result<CameraStream, CameraError> {
        match self.availability {
            CameraAvailability::PermissionDenied => return Err(CameraError::PermissionDenied),
            CameraAvailability::NoDevice => return Err(CameraError::DeviceNotFound),
            CameraAvailability::Available => {}
        }

        self.live_tracks.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            width = request.width,
            height = request.height,
            "camera stream acquired"
        );

        Ok(CameraStream {
            request,
            live_tracks: Arc::clone(&self.live_tracks),
            stopped: false,
        })
    }

    /// Number of tracks not yet stopped.
    pub fn live_tracks(&self) -> usize {
        self.live_tracks.load(Ordering::SeqCst)
    }
}

/// A live video stream. Dropping it stops its tracks.
pub struct CameraStream {
    pub request: MediaRequest,
    live_tracks: Arc<AtomicUsize>,
    stopped: bool,
}

impl CameraStream {
    pub fn is_live(&self) -> bool {
        !self.stopped
    }

    /// Stop every track. Idempotent.
    pub fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live_tracks.fetch_sub(1, Ordering::SeqCst);
            tracing::info!("camera stream released");
        }
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_stop() {
        let camera = SimulatedCamera::new(CameraAvailability::Available);
        let mut stream = camera.acquire(MediaRequest::REGISTRATION).unwrap();
        assert_eq!(stream.request.width, 640);
        assert_eq!(camera.live_tracks(), 1);

        stream.stop();
        stream.stop();
        assert!(!stream.is_live());
        assert_eq!(camera.live_tracks(), 0);
    }

    #[test]
    fn test_drop_releases_tracks() {
        let camera = SimulatedCamera::new(CameraAvailability::Available);
        {
            let _stream = camera.acquire(MediaRequest::RECOGNITION).unwrap();
            assert_eq!(camera.live_tracks(), 1);
        }
        assert_eq!(camera.live_tracks(), 0);
    }

    #[test]
    fn test_acquire_failures() {
        let denied = SimulatedCamera::new(CameraAvailability::PermissionDenied);
        assert_eq!(
            denied.acquire(MediaRequest::RECOGNITION).err(),
            Some(CameraError::PermissionDenied)
        );

        let missing = SimulatedCamera::new(CameraAvailability::NoDevice);
        assert_eq!(
            missing.acquire(MediaRequest::RECOGNITION).err(),
            Some(CameraError::DeviceNotFound)
        );
        assert_eq!(missing.live_tracks(), 0);
    }

    #[test]
    fn test_availability_from_str() {
        assert_eq!("Denied".parse::<CameraAvailability>(), Ok(CameraAvailability::PermissionDenied));
        assert_eq!("missing".parse::<CameraAvailability>(), Ok(CameraAvailability::NoDevice));
        assert!("maybe".parse::<CameraAvailability>().is_err());
    }
}
