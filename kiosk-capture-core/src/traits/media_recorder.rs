use std::sync::Arc;

use crate::models::error::PlatformError;

/// Events emitted by a platform recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    DataAvailable(Vec<u8>),
    /// Finalize: no more data will follow.
    Stopped,
    Error(String),
}

/// Callback invoked by the recorder for every event.
///
/// May fire from inside `start()`/`stop()`; keep processing minimal.
pub type RecorderCallback = Arc<dyn Fn(RecorderEvent) + Send + Sync + 'static>;

/// A platform video recorder bound to one stream.
pub trait MediaRecorder: Send {
    /// Mime type the recorder settled on, if it reports one.
    fn mime_type(&self) -> Option<String>;

    fn start(&mut self, callback: RecorderCallback) -> Result<(), PlatformError>;

    /// Ask the recorder to flush and finalize. `Stopped` follows.
    fn stop(&mut self);
}
