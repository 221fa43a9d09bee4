use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use crate::models::config::CaptureTimings;
use crate::models::state::{FrameDimensions, Readiness};
use crate::session::acquisition::{AcquisitionManager, FrameSource};
use crate::session::cancel::CancelToken;
use crate::traits::camera_platform::{CameraPlatform, MediaStream};
use crate::traits::video_sink::{PlayError, SinkSignal, VideoSink};

/// How a readiness watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    Ready(FrameDimensions),
    /// The stream was replaced, released or ended; nothing to report.
    Abandoned,
    /// No valid frame before the ceiling.
    TimedOut,
}

enum Check {
    Ready(FrameDimensions),
    Pending,
    Abandon,
}

/// Publishes whether the current stream is producing usable frames.
///
/// Sink signals and a periodic poll both feed one readiness check, so the
/// transition to ready happens exactly once per acquisition regardless of
/// which source observes it first.
#[derive(Debug)]
pub struct ReadinessMonitor {
    tx: watch::Sender<Readiness>,
}

impl Default for ReadinessMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessMonitor {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Readiness::NotReady);
        Self { tx }
    }

    pub fn current(&self) -> Readiness {
        *self.tx.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.current().is_ready()
    }

    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.tx.subscribe()
    }

    /// Back to not-ready. Returns `true` if the value changed.
    pub fn reset(&self) -> bool {
        self.tx.send_if_modified(|readiness| {
            let changed = readiness.is_ready();
            *readiness = Readiness::NotReady;
            changed
        })
    }

    fn mark_ready(&self, dimensions: FrameDimensions) -> bool {
        self.tx.send_if_modified(|readiness| {
            if readiness.is_ready() {
                return false;
            }
            *readiness = Readiness::Ready(dimensions);
            true
        })
    }

    /// Watch the stream of `generation` until it produces a valid frame.
    ///
    /// Paused playback is restarted along the way; autoplay refusals and
    /// interrupted play requests are retried after `play_retry`.
    pub async fn watch<P, K>(
        &self,
        source: &AcquisitionManager<P, K>,
        generation: u64,
        mut signals: mpsc::UnboundedReceiver<SinkSignal>,
        timings: &CaptureTimings,
        token: &CancelToken,
    ) -> ReadinessOutcome
    where
        P: CameraPlatform,
        K: VideoSink<Stream = P::Stream>,
    {
        let deadline = Instant::now() + timings.readiness_ceiling();
        let mut poll = tokio::time::interval(timings.readiness_poll());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut signals_open = true;
        let mut play_not_before = Instant::now();

        loop {
            if token.is_cancelled() {
                return ReadinessOutcome::Abandoned;
            }

            let sink = source.sink();
            if Instant::now() >= play_not_before && sink.is_attached() && sink.is_paused() {
                let played = tokio::select! {
                    biased;
                    _ = token.cancelled() => return ReadinessOutcome::Abandoned,
                    _ = tokio::time::sleep_until(deadline) => {
                        log::warn!("preview play still pending after {:?}", timings.readiness_ceiling());
                        return ReadinessOutcome::TimedOut;
                    }
                    played = sink.play() => played,
                };
                match played {
                    Ok(()) => log::debug!("preview playback started"),
                    Err(PlayError::AutoplayBlocked) | Err(PlayError::Aborted) => {
                        log::debug!("preview play deferred, retrying");
                        play_not_before = Instant::now() + timings.play_retry();
                    }
                    Err(PlayError::Other(message)) => {
                        log::warn!("preview play failed: {}", message);
                        play_not_before = Instant::now() + timings.play_retry();
                    }
                }
            }

            match self.check(source, generation) {
                Check::Ready(dimensions) => {
                    if self.mark_ready(dimensions) {
                        log::info!("camera ready at {}x{}", dimensions.width, dimensions.height);
                    }
                    return ReadinessOutcome::Ready(dimensions);
                }
                Check::Abandon => return ReadinessOutcome::Abandoned,
                Check::Pending => {}
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => return ReadinessOutcome::Abandoned,
                _ = tokio::time::sleep_until(deadline) => {
                    log::warn!("no frames after {:?}", timings.readiness_ceiling());
                    return ReadinessOutcome::TimedOut;
                }
                signal = signals.recv(), if signals_open => match signal {
                    Some(SinkSignal::MetadataLoaded) => {
                        log::debug!("sink metadata loaded");
                        play_not_before = Instant::now();
                    }
                    Some(signal) => log::debug!("sink signal: {:?}", signal),
                    None => signals_open = false,
                },
                _ = poll.tick() => {}
            }
        }
    }

    fn check<P, K>(&self, source: &AcquisitionManager<P, K>, generation: u64) -> Check
    where
        P: CameraPlatform,
        K: VideoSink<Stream = P::Stream>,
    {
        if source.generation() != generation {
            return Check::Abandon;
        }
        match source.with_stream(|s| s.has_live_video()) {
            None | Some(false) => return Check::Abandon,
            Some(true) => {}
        }
        // A detached sink or a zero-sized frame is transient.
        match source.frame_dimensions() {
            Some(dimensions) => Check::Ready(dimensions),
            None => Check::Pending,
        }
    }
}
