use std::sync::Arc;

use kiosk_capture_core::{MediaRecorder, PlatformError, RecorderCallback, RecorderEvent};
use parking_lot::Mutex;

/// Counters shared by every recorder a camera creates.
#[derive(Debug, Default)]
pub struct RecorderLog {
    pub created: usize,
    pub started: usize,
    pub stopped: usize,
    /// Mime hint passed to each construction, in order.
    pub hints: Vec<Option<String>>,
}

/// In-memory recorder.
///
/// Emits one chunk on start and one on stop, then `Stopped`, all
/// synchronously from inside the call.
pub struct SimRecorder {
    mime_type: Option<String>,
    callback: Option<RecorderCallback>,
    log: Arc<Mutex<RecorderLog>>,
}

impl SimRecorder {
    pub(crate) fn new(mime_type: Option<String>, log: Arc<Mutex<RecorderLog>>) -> Self {
        Self {
            mime_type,
            callback: None,
            log,
        }
    }

    fn emit(&self, event: RecorderEvent) {
        if let Some(callback) = &self.callback {
            callback(event);
        }
    }
}

impl MediaRecorder for SimRecorder {
    fn mime_type(&self) -> Option<String> {
        self.mime_type.clone()
    }

    fn start(&mut self, callback: RecorderCallback) -> Result<(), PlatformError> {
        self.callback = Some(callback);
        self.log.lock().started += 1;
        self.emit(RecorderEvent::DataAvailable(b"sim-header".to_vec()));
        Ok(())
    }

    fn stop(&mut self) {
        if self.callback.is_none() {
            return;
        }
        self.log.lock().stopped += 1;
        self.emit(RecorderEvent::DataAvailable(b"sim-tail".to_vec()));
        self.emit(RecorderEvent::Stopped);
        self.callback = None;
    }
}
