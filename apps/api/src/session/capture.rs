//! Media-capture seam. The capture device is an externally-owned resource:
//! every exit path from recording must leave the stream's tracks stopped.
//!
//! The server does not bind a physical device itself — real capture happens
//! on the client. `NoopCaptureBackend` tracks the stream lifecycle so the
//! controller's resource accounting stays honest, and the traits leave room
//! for a device-backed implementation.

use thiserror::Error;

/// Why a capture stream could not be opened. Surfaced inline to the user,
/// never fatal to the session — answering continues without capture.
#[derive(Debug, Error)]
pub enum MediaAccessError {
    #[error("capture permission denied")]
    PermissionDenied,

    #[error("capture device not found")]
    DeviceNotFound,

    #[error("capture error: {0}")]
    Other(String),
}

impl MediaAccessError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            MediaAccessError::PermissionDenied => "permission-denied",
            MediaAccessError::DeviceNotFound => "device-not-found",
            MediaAccessError::Other(_) => "other",
        }
    }
}

/// An open capture stream. `stop` must be idempotent; the controller calls it
/// on manual stop, forced timeout stop, and teardown.
pub trait CaptureStream: Send + Sync {
    fn stop(&mut self);
    fn is_active(&self) -> bool;
}

/// Opens capture streams. Held in `AppState` as `Arc<dyn CaptureBackend>`.
pub trait CaptureBackend: Send + Sync {
    fn open(&self) -> Result<Box<dyn CaptureStream>, MediaAccessError>;
}

/// Lifecycle-only backend: streams carry no media, just active/stopped state.
pub struct NoopCaptureBackend;

struct NoopCaptureStream {
    active: bool,
}

impl CaptureStream for NoopCaptureStream {
    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl CaptureBackend for NoopCaptureBackend {
    fn open(&self) -> Result<Box<dyn CaptureStream>, MediaAccessError> {
        Ok(Box::new(NoopCaptureStream { active: true }))
    }
}
