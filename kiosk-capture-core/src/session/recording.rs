use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use uuid::Uuid;

use crate::models::artifacts::Recording;
use crate::models::error::CaptureError;
use crate::models::state::RecordingPhase;
use crate::processing::mime;
use crate::session::cancel::CancelToken;
use crate::session::clock::SessionClock;
use crate::traits::camera_platform::CameraPlatform;
use crate::traits::media_recorder::{MediaRecorder, RecorderCallback, RecorderEvent};

/// Playback speeds an operator can pick for the preview and the saved clip.
pub const VIDEO_SPEEDS: [f32; 3] = [0.5, 1.0, 2.0];

#[derive(Debug)]
struct RecordingState {
    phase: RecordingPhase,
    loop_enabled: bool,
    pending: Option<Recording>,
    stop: Option<Arc<Notify>>,
    stop_requested: bool,
    speed: f32,
}

/// Phase, loop flag and pending review slot of the video side.
///
/// The async cycle itself lives in [`ActiveRecording`]; this type only holds
/// the state that callers inspect and flip between cycles.
#[derive(Debug)]
pub struct RecordingController {
    state: Mutex<RecordingState>,
}

impl Default for RecordingController {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RecordingState {
                phase: RecordingPhase::Idle,
                loop_enabled: false,
                pending: None,
                stop: None,
                stop_requested: false,
                speed: 1.0,
            }),
        }
    }

    pub fn phase(&self) -> RecordingPhase {
        self.state.lock().phase
    }

    pub fn loop_enabled(&self) -> bool {
        self.state.lock().loop_enabled
    }

    pub fn set_loop_enabled(&self, enabled: bool) {
        self.state.lock().loop_enabled = enabled;
    }

    pub fn speed(&self) -> f32 {
        self.state.lock().speed
    }

    pub fn set_speed(&self, speed: f32) -> Result<(), CaptureError> {
        if !VIDEO_SPEEDS.contains(&speed) {
            return Err(CaptureError::ConfigurationFailed(format!(
                "unsupported video speed {}",
                speed
            )));
        }
        self.state.lock().speed = speed;
        Ok(())
    }

    /// Idle to counting down. `false` if a cycle is already under way.
    pub fn begin_countdown(&self) -> bool {
        let mut state = self.state.lock();
        if state.phase != RecordingPhase::Idle {
            return false;
        }
        state.phase = RecordingPhase::CountingDown;
        true
    }

    /// Counting down to recording. Returns the stop signal of the new cycle.
    pub fn begin_recording(&self) -> Arc<Notify> {
        let mut state = self.state.lock();
        let stop = Arc::new(Notify::new());
        state.phase = RecordingPhase::Recording;
        state.stop = Some(Arc::clone(&stop));
        state.stop_requested = false;
        stop
    }

    /// Ask the running cycle to finalize.
    ///
    /// Only the first request of a cycle has an effect; a request while
    /// idle or counting down is ignored.
    pub fn request_stop(&self) -> bool {
        let mut state = self.state.lock();
        if state.phase != RecordingPhase::Recording || state.stop_requested {
            return false;
        }
        state.stop_requested = true;
        if let Some(stop) = &state.stop {
            stop.notify_one();
        }
        true
    }

    /// Recording straight back to counting down, for a looped cycle.
    ///
    /// The slot stays taken while the finished clip is saved, so neither a
    /// burst nor another start can claim the countdown in between.
    pub fn rearm(&self) {
        let mut state = self.state.lock();
        state.phase = RecordingPhase::CountingDown;
        state.stop = None;
        state.stop_requested = false;
    }

    /// Back to idle after a cycle ends or fails.
    pub fn finish(&self) {
        let mut state = self.state.lock();
        state.phase = RecordingPhase::Idle;
        state.stop = None;
        state.stop_requested = false;
    }

    pub fn pending(&self) -> Option<Recording> {
        self.state.lock().pending.clone()
    }

    pub fn set_pending(&self, recording: Recording) {
        self.state.lock().pending = Some(recording);
    }

    pub fn take_pending(&self) -> Option<Recording> {
        self.state.lock().pending.take()
    }

    pub fn discard_pending(&self) -> bool {
        let discarded = self.state.lock().pending.take();
        if let Some(recording) = &discarded {
            log::debug!("discarding pending recording {}", recording.id);
        }
        discarded.is_some()
    }
}

/// Construct a recorder for `stream`, preferring the best supported type.
///
/// Falls back to the platform default when no preference is supported or
/// the preferred type is refused.
pub fn open_recorder<P: CameraPlatform>(
    platform: &P,
    stream: &P::Stream,
) -> Result<(P::Recorder, Option<&'static str>), CaptureError> {
    let preferred = mime::preferred_recorder_type(|t| platform.is_mime_type_supported(t));
    if let Some(mime_type) = preferred {
        match platform.create_recorder(stream, Some(mime_type)) {
            Ok(recorder) => return Ok((recorder, Some(mime_type))),
            Err(e) => log::warn!("recorder refused {}: {}", mime_type, e),
        }
    }
    platform
        .create_recorder(stream, None)
        .map(|recorder| (recorder, None))
        .map_err(|e| CaptureError::RecorderUnavailable(e.message))
}

/// One recording cycle in progress.
pub struct ActiveRecording<R: MediaRecorder> {
    id: String,
    recorder: R,
    events: mpsc::UnboundedReceiver<RecorderEvent>,
    requested_type: Option<&'static str>,
    started_at: Instant,
    deadline: Instant,
    stop: Arc<Notify>,
    speed: f32,
}

impl<R: MediaRecorder> ActiveRecording<R> {
    /// Start `recorder` and arm the hard stop `max_duration` from now.
    pub fn start(
        mut recorder: R,
        requested_type: Option<&'static str>,
        max_duration: Duration,
        stop: Arc<Notify>,
        speed: f32,
    ) -> Result<Self, CaptureError> {
        let (tx, events) = mpsc::unbounded_channel();
        let callback: RecorderCallback = Arc::new(move |event| {
            let _ = tx.send(event);
        });
        recorder
            .start(callback)
            .map_err(|e| CaptureError::RecorderUnavailable(e.message))?;

        let started_at = Instant::now();
        let id = Uuid::new_v4().to_string();
        log::info!("recording {} started", id);
        Ok(Self {
            id,
            recorder,
            events,
            requested_type,
            started_at,
            deadline: started_at + max_duration,
            stop,
            speed,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for a stop request, the hard stop or a recorder failure, then
    /// finalize.
    ///
    /// Returns `Ok(None)` if the cycle was cancelled; the recorder is
    /// stopped and its data dropped.
    pub async fn finish(
        mut self,
        clock: &SessionClock,
        finalize_timeout: Duration,
        token: &CancelToken,
    ) -> Result<Option<Recording>, CaptureError> {
        let mut chunks: Vec<Vec<u8>> = Vec::new();
        let mut failure = None;
        let mut stopped = false;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    self.recorder.stop();
                    log::info!("recording {} cancelled", self.id);
                    return Ok(None);
                }
                _ = self.stop.notified() => {
                    log::debug!("recording {} stop requested", self.id);
                    break;
                }
                _ = tokio::time::sleep_until(self.deadline) => {
                    log::info!("recording {} reached the duration cap", self.id);
                    break;
                }
                event = self.events.recv() => match event {
                    Some(RecorderEvent::DataAvailable(chunk)) => chunks.push(chunk),
                    Some(RecorderEvent::Stopped) | None => {
                        stopped = true;
                        break;
                    }
                    Some(RecorderEvent::Error(message)) => {
                        log::error!("recording {} failed: {}", self.id, message);
                        failure = Some(message);
                        break;
                    }
                },
            }
        }
        let stopped_at = clock.at(Instant::now().min(self.deadline));

        if !stopped {
            self.recorder.stop();
            let drain = tokio::time::timeout(finalize_timeout, async {
                while let Some(event) = self.events.recv().await {
                    match event {
                        RecorderEvent::DataAvailable(chunk) => chunks.push(chunk),
                        RecorderEvent::Stopped => return,
                        RecorderEvent::Error(message) => log::warn!("recorder error while finalizing: {}", message),
                    }
                }
            })
            .await;
            if drain.is_err() {
                log::warn!("recorder did not finalize within {:?}", finalize_timeout);
            }
        }

        if chunks.is_empty() {
            return Err(CaptureError::RecordingFailed(
                failure.unwrap_or_else(|| "recorder produced no data".to_string()),
            ));
        }

        let mime_type = self
            .recorder
            .mime_type()
            .filter(|m| !m.is_empty())
            .or_else(|| self.requested_type.map(str::to_string))
            .unwrap_or_else(|| mime::DEFAULT_VIDEO.to_string());
        let blob = Bytes::from(chunks.concat());
        let recording = Recording {
            id: self.id,
            started_at: clock.at(self.started_at),
            stopped_at,
            mime_type,
            blob,
            requested_speed: self.speed,
        };
        log::info!(
            "recording {} finalized: {} bytes, {:?}",
            recording.id,
            recording.blob.len(),
            recording.duration()
        );
        Ok(Some(recording))
    }
}
