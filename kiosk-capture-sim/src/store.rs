use std::sync::Arc;
use std::time::Duration;

use kiosk_capture_core::{MediaStore, RemoteObject, UploadError, UploadRequest};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct StoreState {
    uploads: Vec<UploadRequest>,
    failure: Option<UploadError>,
    latency: Duration,
}

/// Media store that keeps uploads in memory.
///
/// Clones share state, so a test can inspect what the controller sent.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every later upload with `error`; `None` restores success.
    pub fn set_failure(&self, error: Option<UploadError>) {
        self.state.lock().failure = error;
    }

    /// Delay every later upload by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Accepted uploads, in order.
    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.state.lock().uploads.clone()
    }

    pub fn upload_count(&self) -> usize {
        self.state.lock().uploads.len()
    }
}

impl MediaStore for MemoryStore {
    async fn upload(&self, request: UploadRequest) -> Result<RemoteObject, UploadError> {
        let latency = self.state.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.state.lock();
        if let Some(error) = &state.failure {
            return Err(error.clone());
        }
        let url = format!("memory://{}/{}", request.destination, request.file_name);
        log::debug!("stored {} ({} bytes)", url, request.bytes.len());
        state.uploads.push(request);
        Ok(RemoteObject { url })
    }
}
