use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use kiosk_capture_core::{
    CameraPlatform, ConstraintCandidate, DeviceInfo, MediaStream, PlatformError, PlatformErrorKind, PlatformHints,
    TrackKind,
};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::recorder::{RecorderLog, SimRecorder};
use crate::stream::SimStream;

/// One request the controller made to the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attempt {
    pub candidate: ConstraintCandidate,
    pub at: Instant,
}

/// How recorder construction behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderSupport {
    /// Any supported hint is honored.
    #[default]
    Full,
    /// Construction with a mime hint fails; the platform default works.
    DefaultOnly,
    /// Construction always fails.
    Unavailable,
}

#[derive(Debug)]
struct CameraState {
    script: VecDeque<Result<(), PlatformErrorKind>>,
    latency: Duration,
    attempts: Vec<Attempt>,
    issued: Vec<SimStream>,
    hints: PlatformHints,
    video_inputs: usize,
    supported_types: Vec<String>,
    recorder_support: RecorderSupport,
    default_recorder_type: Option<String>,
}

/// Camera platform whose acquisition outcomes are scripted by the test.
///
/// Every `acquire` pops the next scripted response; once the script runs
/// out, requests succeed. Clones share state.
#[derive(Debug, Clone)]
pub struct ScriptedCamera {
    state: Arc<Mutex<CameraState>>,
    recorders: Arc<Mutex<RecorderLog>>,
}

impl Default for ScriptedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CameraState {
                script: VecDeque::new(),
                latency: Duration::ZERO,
                attempts: Vec::new(),
                issued: Vec::new(),
                hints: PlatformHints::default(),
                video_inputs: 1,
                supported_types: vec!["video/webm;codecs=vp8,opus".to_string(), "video/webm".to_string()],
                recorder_support: RecorderSupport::Full,
                default_recorder_type: Some("video/webm".to_string()),
            })),
            recorders: Arc::new(Mutex::new(RecorderLog::default())),
        }
    }

    /// Queue responses for the next acquisitions, in order.
    pub fn script(&self, responses: impl IntoIterator<Item = Result<(), PlatformErrorKind>>) {
        self.state.lock().script.extend(responses);
    }

    /// Make the next `times` requests fail with `kind`.
    pub fn fail_times(&self, kind: PlatformErrorKind, times: usize) {
        self.script(std::iter::repeat(Err(kind)).take(times));
    }

    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    pub fn set_mobile_like(&self, mobile: bool) {
        self.state.lock().hints.is_mobile_like = mobile;
    }

    pub fn set_video_inputs(&self, count: usize) {
        self.state.lock().video_inputs = count;
    }

    pub fn set_supported_types(&self, types: &[&str]) {
        self.state.lock().supported_types = types.iter().map(|t| t.to_string()).collect();
    }

    pub fn set_recorder_support(&self, support: RecorderSupport) {
        self.state.lock().recorder_support = support;
    }

    /// Mime type reported by recorders built without a hint.
    pub fn set_default_recorder_type(&self, mime_type: Option<&str>) {
        self.state.lock().default_recorder_type = mime_type.map(str::to_string);
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.state.lock().attempts.clone()
    }

    /// Every stream handed out so far, oldest first.
    pub fn issued_streams(&self) -> Vec<SimStream> {
        self.state.lock().issued.clone()
    }

    pub fn latest_stream(&self) -> Option<SimStream> {
        self.state.lock().issued.last().cloned()
    }

    /// Streams with at least one live track.
    pub fn live_stream_count(&self) -> usize {
        self.state.lock().issued.iter().filter(|s| !s.is_stopped()).count()
    }

    pub fn recorder_log(&self) -> Arc<Mutex<RecorderLog>> {
        Arc::clone(&self.recorders)
    }

    fn respond(&self, candidate: ConstraintCandidate) -> Result<SimStream, PlatformError> {
        let mut state = self.state.lock();
        state.attempts.push(Attempt {
            candidate,
            at: Instant::now(),
        });
        let attempt = state.attempts.len();
        match state.script.pop_front().unwrap_or(Ok(())) {
            Ok(()) => {
                let stream = SimStream::new(candidate.audio);
                state.issued.push(stream.clone());
                log::debug!("attempt {} accepted: stream {}", attempt, stream.id());
                Ok(stream)
            }
            Err(kind) => {
                log::debug!("attempt {} rejected: {:?}", attempt, kind);
                Err(PlatformError::new(kind, format!("scripted failure on attempt {}", attempt)))
            }
        }
    }
}

impl CameraPlatform for ScriptedCamera {
    type Stream = SimStream;
    type Recorder = SimRecorder;

    async fn acquire(&self, candidate: &ConstraintCandidate) -> Result<SimStream, PlatformError> {
        let candidate = *candidate;
        let latency = self.state.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.respond(candidate)
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, PlatformError> {
        let count = self.state.lock().video_inputs;
        Ok((0..count)
            .map(|i| DeviceInfo {
                id: format!("sim-camera-{}", i),
                label: format!("Synthetic Camera {}", i + 1),
                kind: TrackKind::Video,
            })
            .collect())
    }

    fn hints(&self) -> PlatformHints {
        self.state.lock().hints
    }

    fn is_mime_type_supported(&self, mime_type: &str) -> bool {
        self.state.lock().supported_types.iter().any(|t| t == mime_type)
    }

    fn create_recorder(&self, stream: &SimStream, mime_type: Option<&str>) -> Result<SimRecorder, PlatformError> {
        let (support, default_type) = {
            let state = self.state.lock();
            (state.recorder_support, state.default_recorder_type.clone())
        };
        {
            let mut log = self.recorders.lock();
            log.created += 1;
            log.hints.push(mime_type.map(str::to_string));
        }
        if !stream.has_live_video() {
            return Err(PlatformError::new(PlatformErrorKind::Other, "stream has no live video"));
        }
        match (support, mime_type) {
            (RecorderSupport::Unavailable, _) => Err(PlatformError::new(
                PlatformErrorKind::Other,
                "recording is not supported",
            )),
            (RecorderSupport::DefaultOnly, Some(hint)) => Err(PlatformError::new(
                PlatformErrorKind::Other,
                format!("{} cannot be requested", hint),
            )),
            (_, Some(hint)) => Ok(SimRecorder::new(Some(hint.to_string()), self.recorder_log())),
            (_, None) => Ok(SimRecorder::new(default_type, self.recorder_log())),
        }
    }
}
