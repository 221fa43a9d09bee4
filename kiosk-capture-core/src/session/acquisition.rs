use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::artifacts::VideoFrame;
use crate::models::config::AcquisitionDelays;
use crate::models::constraints::ConstraintCandidate;
use crate::models::error::{CaptureError, PlatformError, PlatformErrorKind};
use crate::models::profile::{CaptureMode, DeploymentProfile, DeviceProfile, Facing};
use crate::models::state::FrameDimensions;
use crate::processing::ladder;
use crate::session::cancel::CancelToken;
use crate::traits::camera_platform::{CameraPlatform, MediaStream, TrackKind};
use crate::traits::video_sink::{SinkSignalCallback, VideoSink};

/// Outcome of a successful acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquiredStream {
    /// Profile the ladder was built from.
    pub profile: DeviceProfile,
    /// Candidate the platform accepted.
    pub candidate: ConstraintCandidate,
    /// Number of platform requests made, including the successful one.
    pub attempts: usize,
    /// The stream came from the permissive request after the ladder ran out.
    pub last_resort: bool,
    /// Whether the stream carries a microphone track.
    pub has_audio: bool,
    /// Stream generation; bumps on every acquire and release.
    pub generation: u64,
}

/// Read access to the frames of the current stream.
///
/// Returns `None` whenever the stream or sink cannot answer right now.
pub trait FrameSource {
    fn frame_dimensions(&self) -> Option<FrameDimensions>;

    fn grab_frame(&self) -> Option<VideoFrame>;
}

/// Sole owner of the camera stream.
///
/// At most one stream is held at any time, and a new acquisition always
/// releases the previous stream and waits for the hardware to settle first.
pub struct AcquisitionManager<P: CameraPlatform, K: VideoSink<Stream = P::Stream>> {
    platform: Arc<P>,
    sink: K,
    delays: AcquisitionDelays,
    stream: Mutex<Option<P::Stream>>,
    in_flight: AtomicBool,
    generation: AtomicU64,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Accepted<S> {
    stream: S,
    candidate: ConstraintCandidate,
    attempts: usize,
    last_resort: bool,
}

impl<P, K> AcquisitionManager<P, K>
where
    P: CameraPlatform,
    K: VideoSink<Stream = P::Stream>,
{
    pub fn new(platform: Arc<P>, sink: K, delays: AcquisitionDelays) -> Self {
        Self {
            platform,
            sink,
            delays,
            stream: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn delays(&self) -> AcquisitionDelays {
        self.delays
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn has_stream(&self) -> bool {
        self.stream.lock().is_some()
    }

    /// Run `f` against the current stream, if one is held.
    pub fn with_stream<R>(&self, f: impl FnOnce(&P::Stream) -> R) -> Option<R> {
        self.stream.lock().as_ref().map(f)
    }

    /// Bind the current stream to the sink.
    pub fn attach_sink(&self, on_signal: SinkSignalCallback) -> bool {
        let stream = self.stream.lock();
        match stream.as_ref() {
            Some(stream) => {
                self.sink.attach(stream, on_signal);
                true
            }
            None => false,
        }
    }

    /// Stop every track of the current stream and detach the sink.
    ///
    /// Returns `false` if there was nothing to release.
    pub fn release(&self) -> bool {
        let Some(stream) = self.stream.lock().take() else {
            return false;
        };
        stream.stop_all_tracks();
        self.sink.detach();
        self.generation.fetch_add(1, Ordering::SeqCst);
        log::info!("camera stream released");
        true
    }

    /// Acquire a stream for `mode`, walking the constraint ladder.
    ///
    /// A second call while one is in flight is rejected with
    /// [`CaptureError::AcquisitionInProgress`].
    pub async fn acquire(
        &self,
        mode: CaptureMode,
        deployment: &DeploymentProfile,
        facing: Option<Facing>,
        token: &CancelToken,
    ) -> Result<AcquiredStream, CaptureError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AcquisitionInProgress);
        }
        let _in_flight = InFlight(&self.in_flight);

        self.release();
        token.sleep(self.delays.settle).await?;

        let mut hints = self.platform.hints();
        hints.video_inputs = match self.platform.enumerate_devices().await {
            Ok(devices) => devices.iter().filter(|d| d.kind == TrackKind::Video).count(),
            Err(e) => {
                log::debug!("device enumeration failed: {}", e);
                0
            }
        };
        let profile = DeviceProfile::resolve(&hints, deployment, facing);
        let candidates = ladder::build_ladder(mode, &profile);
        log::info!(
            "acquiring {:?} stream: facing {:?}, {} candidates",
            mode,
            profile.preferred_facing,
            candidates.len()
        );

        let accepted = self.walk(&candidates, token).await?;

        if token.is_cancelled() {
            accepted.stream.stop_all_tracks();
            return Err(CaptureError::Cancelled);
        }

        let has_audio = accepted.stream.has_audio();
        *self.stream.lock() = Some(accepted.stream);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        log::info!(
            "camera stream acquired after {} attempt(s){}",
            accepted.attempts,
            if accepted.last_resort { " (last resort)" } else { "" }
        );

        Ok(AcquiredStream {
            profile,
            candidate: accepted.candidate,
            attempts: accepted.attempts,
            last_resort: accepted.last_resort,
            has_audio,
            generation,
        })
    }

    async fn walk(
        &self,
        candidates: &[ConstraintCandidate],
        token: &CancelToken,
    ) -> Result<Accepted<P::Stream>, CaptureError> {
        let mut attempts = 0;
        let mut index = 0;

        while index < candidates.len() {
            let candidate = candidates[index];
            attempts += 1;
            log::debug!("candidate {}/{}: {:?}", index + 1, candidates.len(), candidate);

            let error = match self.platform.acquire(&candidate).await {
                Ok(stream) => {
                    return Ok(Accepted {
                        stream,
                        candidate,
                        attempts,
                        last_resort: false,
                    });
                }
                Err(error) => error,
            };
            log::warn!("candidate {} rejected: {}", index + 1, error);

            let (next, delay) = match error.kind {
                PlatformErrorKind::PermissionDenied => {
                    let audio_free = candidates[index + 1..].iter().position(|c| !c.audio);
                    match audio_free {
                        Some(offset) if candidate.audio => {
                            log::info!("microphone denied, retrying without audio");
                            (index + 1 + offset, Duration::ZERO)
                        }
                        _ => return Err(CaptureError::PermissionDenied),
                    }
                }
                PlatformErrorKind::HardwareBusy => (index + 1, self.delays.hardware_busy),
                PlatformErrorKind::Overconstrained | PlatformErrorKind::NotFound => (index + 1, Duration::ZERO),
                PlatformErrorKind::Other => (index + 1, self.delays.other),
            };

            if next < candidates.len() && !delay.is_zero() {
                token.sleep(delay).await?;
            }
            index = next;
        }

        self.last_resort(attempts, token).await
    }

    async fn last_resort(&self, attempts: usize, token: &CancelToken) -> Result<Accepted<P::Stream>, CaptureError> {
        log::warn!("constraint ladder exhausted, trying permissive request");
        token.sleep(self.delays.last_resort).await?;

        let candidate = ConstraintCandidate::permissive();
        match self.platform.acquire(&candidate).await {
            Ok(stream) => Ok(Accepted {
                stream,
                candidate,
                attempts: attempts + 1,
                last_resort: true,
            }),
            Err(PlatformError {
                kind: PlatformErrorKind::PermissionDenied,
                ..
            }) => Err(CaptureError::PermissionDenied),
            Err(error) => {
                log::error!("camera acquisition failed: {}", error);
                Err(CaptureError::HardwareInitFailed(error))
            }
        }
    }
}

impl<P, K> FrameSource for AcquisitionManager<P, K>
where
    P: CameraPlatform,
    K: VideoSink<Stream = P::Stream>,
{
    fn frame_dimensions(&self) -> Option<FrameDimensions> {
        let live = self.with_stream(|s| s.has_live_video()).unwrap_or(false);
        if !live || !self.sink.is_attached() {
            return None;
        }
        self.sink.frame_dimensions().filter(FrameDimensions::is_valid)
    }

    fn grab_frame(&self) -> Option<VideoFrame> {
        self.frame_dimensions()?;
        self.sink.grab_frame()
    }
}
