use thiserror::Error;

/// Failure category reported by the platform camera API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformErrorKind {
    PermissionDenied,
    NotFound,
    HardwareBusy,
    Overconstrained,
    Other,
}

/// An error raised by the platform while acquiring or driving a stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct PlatformError {
    pub kind: PlatformErrorKind,
    pub message: String,
}

impl PlatformError {
    pub fn new(kind: PlatformErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Errors that can occur while driving a capture session.
///
/// Only acquisition exhaustion, permission denial and recorder construction
/// failures are operator-facing; see [`CaptureError::guidance`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("camera hardware initialization failed: {0}")]
    HardwareInitFailed(PlatformError),

    #[error("an acquisition is already in flight")]
    AcquisitionInProgress,

    #[error("no active camera stream")]
    NoStream,

    #[error("camera stream is not ready")]
    NotReady,

    #[error("camera did not produce frames before the readiness ceiling")]
    ReadinessTimeout,

    #[error("another countdown is already running")]
    CountdownActive,

    #[error("another capture operation is running")]
    Busy,

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid shot count: {0}")]
    InvalidShotCount(u8),

    #[error("burst captured no shots")]
    NoShotsCaptured,

    #[error("recorder unavailable: {0}")]
    RecorderUnavailable(String),

    #[error("recording failed: {0}")]
    RecordingFailed(String),

    #[error("loop recording requires a bound destination")]
    LoopRequiresDestination,

    #[error("no destination bound")]
    NoDestination,

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),
}

/// Upload failures reported by the Media Store.
///
/// Never fatal to the capture flow: the artifact is already cached locally
/// when one of these is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("media store unreachable: {0}")]
    Unreachable(String),
}
