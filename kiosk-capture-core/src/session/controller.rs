use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::models::artifacts::{Artifact, Burst, CountdownState, Recording, Shot};
use crate::models::config::ControllerConfig;
use crate::models::error::CaptureError;
use crate::models::profile::{CaptureMode, Facing};
use crate::models::state::{ControllerState, FrameDimensions, Readiness, RecordingPhase};
use crate::session::acquisition::{AcquiredStream, AcquisitionManager};
use crate::session::cancel::{CancelScope, CancelToken};
use crate::session::clock::SessionClock;
use crate::session::countdown::CountdownGate;
use crate::session::readiness::{ReadinessMonitor, ReadinessOutcome};
use crate::session::recording::{self, ActiveRecording, RecordingController};
use crate::session::sequencer::{BurstObserver, BurstPlan, CaptureSequencer};
use crate::storage::bridge::{PersistenceBridge, SaveReport};
use crate::storage::local_cache::LocalCache;
use crate::traits::camera_platform::CameraPlatform;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::event_directory::EventDirectory;
use crate::traits::media_store::MediaStore;
use crate::traits::video_sink::{SinkSignalCallback, VideoSink};

/// Internal mutable session state, protected by `parking_lot::Mutex`.
struct SessionState {
    state: ControllerState,
    mode: CaptureMode,
    /// Operator facing choice; `None` until the first toggle.
    facing: Option<Facing>,
    acquired: Option<AcquiredStream>,
    last_error: Option<CaptureError>,
}

#[derive(Default)]
struct Tasks {
    readiness: Option<JoinHandle<()>>,
    recording: Option<JoinHandle<()>>,
}

struct Inner<P, K, M>
where
    P: CameraPlatform,
    K: VideoSink<Stream = P::Stream>,
    M: MediaStore,
{
    config: ControllerConfig,
    platform: Arc<P>,
    acquisition: AcquisitionManager<P, K>,
    readiness: ReadinessMonitor,
    countdown: CountdownGate,
    sequencer: CaptureSequencer,
    recording: RecordingController,
    bridge: PersistenceBridge<M>,
    directory: Arc<dyn EventDirectory>,
    delegate: Mutex<Option<Arc<dyn CaptureDelegate>>>,
    session: Mutex<SessionState>,
    tasks: Mutex<Tasks>,
    activation: AsyncMutex<()>,
    cancel: CancelScope,
    clock: SessionClock,
}

/// Kiosk capture session controller.
///
/// Generic over the camera platform, the preview sink and the media store.
/// Owns one camera stream at a time and drives photo bursts and bounded
/// video recordings against it:
/// ```text
/// [CameraPlatform] → AcquisitionManager → [VideoSink] → ReadinessMonitor
///                                                  ↓
///                          CaptureSequencer / RecordingController
///                                                  ↓
///                       PersistenceBridge → [LocalCache] + [MediaStore]
/// ```
/// Cloning yields another handle to the same session.
pub struct CaptureController<P, K, M>
where
    P: CameraPlatform,
    K: VideoSink<Stream = P::Stream>,
    M: MediaStore,
{
    inner: Arc<Inner<P, K, M>>,
}

impl<P, K, M> Clone for CaptureController<P, K, M>
where
    P: CameraPlatform,
    K: VideoSink<Stream = P::Stream>,
    M: MediaStore,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, K, M> CaptureController<P, K, M>
where
    P: CameraPlatform,
    K: VideoSink<Stream = P::Stream>,
    M: MediaStore,
{
    pub fn new(
        platform: P,
        sink: K,
        store: M,
        directory: Arc<dyn EventDirectory>,
        config: ControllerConfig,
    ) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let platform = Arc::new(platform);
        let acquisition = AcquisitionManager::new(Arc::clone(&platform), sink, config.acquisition_delays());
        let bridge = PersistenceBridge::new(store, LocalCache::new(config.cache_directory.clone()));

        Ok(Self {
            inner: Arc::new(Inner {
                platform,
                acquisition,
                readiness: ReadinessMonitor::new(),
                countdown: CountdownGate::new(),
                sequencer: CaptureSequencer::new(),
                recording: RecordingController::new(),
                bridge,
                directory,
                delegate: Mutex::new(None),
                session: Mutex::new(SessionState {
                    state: ControllerState::Idle,
                    mode: CaptureMode::Photo,
                    facing: None,
                    acquired: None,
                    last_error: None,
                }),
                tasks: Mutex::new(Tasks::default()),
                activation: AsyncMutex::new(()),
                cancel: CancelScope::new(),
                clock: SessionClock::start(),
                config,
            }),
        })
    }

    pub fn set_delegate(&self, delegate: Arc<dyn CaptureDelegate>) {
        *self.inner.delegate.lock() = Some(delegate);
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ControllerState {
        self.inner.session.lock().state.clone()
    }

    pub fn mode(&self) -> CaptureMode {
        self.inner.session.lock().mode
    }

    pub fn last_error(&self) -> Option<CaptureError> {
        self.inner.session.lock().last_error.clone()
    }

    /// Details of the stream currently held, if any.
    pub fn acquired_stream(&self) -> Option<AcquiredStream> {
        self.inner.session.lock().acquired
    }

    pub fn readiness(&self) -> Readiness {
        self.inner.readiness.current()
    }

    /// Receiver that observes every readiness change.
    pub fn subscribe_readiness(&self) -> tokio::sync::watch::Receiver<Readiness> {
        self.inner.readiness.subscribe()
    }

    pub fn countdown(&self) -> Option<CountdownState> {
        self.inner.countdown.current()
    }

    pub fn recording_phase(&self) -> RecordingPhase {
        self.inner.recording.phase()
    }

    pub fn local_cache(&self) -> &LocalCache {
        self.inner.bridge.cache()
    }

    pub fn media_store(&self) -> &M {
        self.inner.bridge.store()
    }

    /// Acquire a stream for `mode`, releasing whatever is held first.
    ///
    /// Every countdown, burst and recording of the previous stream is
    /// cancelled. Returns once the platform accepted a candidate; readiness
    /// follows asynchronously, see [`wait_ready`](Self::wait_ready).
    pub async fn activate(&self, mode: CaptureMode) -> Result<AcquiredStream, CaptureError> {
        let _activation = self
            .inner
            .activation
            .try_lock()
            .map_err(|_| CaptureError::AcquisitionInProgress)?;

        self.inner.shutdown().await;
        let facing = {
            let mut s = self.inner.session.lock();
            s.mode = mode;
            s.facing
        };
        self.inner.acquire(mode, facing).await
    }

    /// Switch between photo and video mode. Same as [`activate`](Self::activate).
    pub async fn switch_mode(&self, mode: CaptureMode) -> Result<AcquiredStream, CaptureError> {
        log::info!("switching to {:?} mode", mode);
        self.activate(mode).await
    }

    /// Flip between the user-facing and environment-facing camera and
    /// re-acquire.
    pub async fn toggle_facing(&self) -> Result<AcquiredStream, CaptureError> {
        let _activation = self
            .inner
            .activation
            .try_lock()
            .map_err(|_| CaptureError::AcquisitionInProgress)?;

        let (mode, facing) = {
            let mut s = self.inner.session.lock();
            let current = s
                .facing
                .or(s.acquired.map(|a| a.profile.preferred_facing))
                .unwrap_or(Facing::User);
            let next = current.toggled();
            s.facing = Some(next);
            (s.mode, next)
        };
        log::info!("toggling camera to {:?}", facing);

        self.inner.shutdown().await;
        self.inner.acquire(mode, Some(facing)).await
    }

    /// Wait until the current stream is ready.
    ///
    /// Fails with `NoStream` if nothing is held or being acquired, and with
    /// `ReadinessTimeout` after the readiness ceiling.
    pub async fn wait_ready(&self) -> Result<FrameDimensions, CaptureError> {
        let inner = &self.inner;
        let mut rx = inner.readiness.subscribe();
        let ceiling = inner.config.timings.readiness_ceiling() + inner.config.timings.readiness_poll();

        let wait = async {
            loop {
                if let Readiness::Ready(dimensions) = *rx.borrow_and_update() {
                    return Ok(dimensions);
                }
                if !inner.acquisition.has_stream() && !inner.acquisition.is_in_flight() {
                    return Err(CaptureError::NoStream);
                }
                if rx.changed().await.is_err() {
                    return Err(CaptureError::NoStream);
                }
            }
        };
        tokio::time::timeout(ceiling, wait)
            .await
            .map_err(|_| CaptureError::ReadinessTimeout)?
    }

    /// Take a burst of `shot_count` stills.
    ///
    /// Returns `Ok(None)` without doing anything if a burst or countdown is
    /// already running. A burst that loses the stream part-way returns the
    /// shots taken so far. Fails with `NotReady` until readiness is reached,
    /// whether or not a stream is held.
    pub async fn capture_burst(&self, shot_count: u8) -> Result<Option<Burst>, CaptureError> {
        let inner = &self.inner;
        if shot_count == 0 || shot_count > inner.config.max_shots {
            return Err(CaptureError::InvalidShotCount(shot_count));
        }
        if !inner.readiness.is_ready() {
            return Err(CaptureError::NotReady);
        }
        if !inner.acquisition.has_stream() {
            return Err(CaptureError::NoStream);
        }
        if inner.countdown.is_active() || inner.recording.phase() != RecordingPhase::Idle {
            log::debug!("burst ignored: a countdown or recording is under way");
            return Ok(None);
        }
        let Some(guard) = inner.sequencer.try_begin() else {
            log::debug!("burst ignored: another burst is running");
            return Ok(None);
        };

        let token = inner.cancel.token();
        let generation = inner.acquisition.generation();
        let plan = BurstPlan::from_config(shot_count, &inner.config);
        inner.set_state(ControllerState::Capturing {
            shot: 0,
            of: shot_count,
        });

        let result = inner
            .sequencer
            .run(&guard, &plan, &inner.acquisition, &inner.countdown, &inner.clock, &**inner, &token)
            .await;
        drop(guard);

        if inner.acquisition.generation() == generation {
            inner.settle_state();
        }
        match result {
            Ok(burst) => Ok(Some(burst)),
            Err(CaptureError::Cancelled) => Err(CaptureError::Cancelled),
            Err(e) => {
                inner.report_error(&e);
                Err(e)
            }
        }
    }

    /// Count down, then start recording.
    ///
    /// Returns once the recorder is running; the cycle then finalizes on
    /// [`stop_recording`](Self::stop_recording) or at the duration cap.
    /// A call while a cycle is already counting down or recording is a no-op.
    /// Dropping the future during the pre-roll abandons the start.
    pub async fn start_recording(&self) -> Result<(), CaptureError> {
        let inner = &self.inner;
        if !inner.acquisition.has_stream() {
            return Err(CaptureError::NoStream);
        }
        if !inner.readiness.is_ready() {
            return Err(CaptureError::NotReady);
        }
        if inner.sequencer.is_running() {
            return Err(CaptureError::Busy);
        }
        if !inner.recording.begin_countdown() {
            log::debug!("recording already under way");
            return Ok(());
        }
        inner.recording.discard_pending();

        let token = inner.cancel.token();
        let mut pre_roll = PreRollGuard {
            inner: &**inner,
            armed: true,
        };
        let opened = inner.open_cycle(&token).await;
        pre_roll.armed = false;
        let active = opened?;
        let handle = tokio::spawn(Arc::clone(inner).run_cycles(active, token));
        inner.tasks.lock().recording = Some(handle);
        Ok(())
    }

    /// Ask the running recording to finalize. Idempotent.
    ///
    /// Returns `true` if this call triggered the stop.
    pub fn stop_recording(&self) -> bool {
        let stopped = self.inner.recording.request_stop();
        if stopped {
            log::info!("recording stop requested");
        }
        stopped
    }

    pub fn loop_enabled(&self) -> bool {
        self.inner.recording.loop_enabled()
    }

    /// Turn loop recording on or off.
    ///
    /// Turning it on requires a bound destination. A running cycle picks
    /// up the new value when it finalizes.
    pub fn set_loop_enabled(&self, enabled: bool) -> Result<(), CaptureError> {
        if enabled && self.inner.directory.current_destination().is_none() {
            return Err(CaptureError::LoopRequiresDestination);
        }
        self.inner.recording.set_loop_enabled(enabled);
        log::info!("loop recording {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    pub fn video_speed(&self) -> f32 {
        self.inner.recording.speed()
    }

    /// Speed tag applied to later recordings (0.5, 1 or 2).
    pub fn set_video_speed(&self, speed: f32) -> Result<(), CaptureError> {
        self.inner.recording.set_speed(speed)
    }

    pub fn pending_recording(&self) -> Option<Recording> {
        self.inner.recording.pending()
    }

    pub fn take_pending_recording(&self) -> Option<Recording> {
        self.inner.recording.take_pending()
    }

    pub fn discard_pending_recording(&self) -> bool {
        self.inner.recording.discard_pending()
    }

    /// Save the recording awaiting review to the bound destination.
    ///
    /// `Ok(None)` if nothing is pending. The recording stays pending if the
    /// local write fails.
    pub async fn save_pending_recording(&self) -> Result<Option<SaveReport>, CaptureError> {
        let destination = self
            .inner
            .directory
            .current_destination()
            .ok_or(CaptureError::NoDestination)?;
        let Some(recording) = self.inner.recording.take_pending() else {
            return Ok(None);
        };
        match self.inner.bridge.save(Artifact::Recording(&recording), &destination).await {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                if self.inner.recording.pending().is_none() {
                    self.inner.recording.set_pending(recording);
                }
                Err(e)
            }
        }
    }

    /// Save the shots of a burst to the bound destination, in order.
    pub async fn save_shots(&self, shots: &[Shot]) -> Result<Vec<SaveReport>, CaptureError> {
        let destination = self
            .inner
            .directory
            .current_destination()
            .ok_or(CaptureError::NoDestination)?;
        let mut reports = Vec::with_capacity(shots.len());
        for shot in shots {
            reports.push(self.inner.bridge.save(Artifact::Shot(shot), &destination).await?);
        }
        Ok(reports)
    }

    /// Save any artifact to the bound destination.
    pub async fn save(&self, artifact: Artifact<'_>) -> Result<SaveReport, CaptureError> {
        let destination = self
            .inner
            .directory
            .current_destination()
            .ok_or(CaptureError::NoDestination)?;
        self.inner.bridge.save(artifact, &destination).await
    }

    /// Stop every timer and task, stop all tracks and detach the sink.
    pub async fn release(&self) {
        self.inner.shutdown().await;
    }
}

impl<P, K, M> Inner<P, K, M>
where
    P: CameraPlatform,
    K: VideoSink<Stream = P::Stream>,
    M: MediaStore,
{
    fn delegate(&self) -> Option<Arc<dyn CaptureDelegate>> {
        self.delegate.lock().clone()
    }

    fn set_state(&self, new_state: ControllerState) {
        {
            let mut s = self.session.lock();
            if s.state == new_state {
                return;
            }
            if let ControllerState::Error(e) = &new_state {
                s.last_error = Some(e.clone());
            }
            s.state = new_state.clone();
        }
        log::debug!("state: {:?}", new_state);
        if let Some(delegate) = self.delegate() {
            delegate.on_state_changed(&new_state);
        }
    }

    /// Derive the resting state from what the session holds.
    fn settle_state(&self) {
        let next = if !self.acquisition.has_stream() {
            ControllerState::Idle
        } else if self.readiness.is_ready() {
            ControllerState::Ready
        } else {
            ControllerState::AwaitingFrames
        };
        self.set_state(next);
    }

    fn report_error(&self, error: &CaptureError) {
        self.session.lock().last_error = Some(error.clone());
        if let Some(delegate) = self.delegate() {
            delegate.on_error(error);
        }
    }

    fn fail(&self, error: CaptureError) {
        log::error!("capture session failed: {}", error);
        self.set_state(ControllerState::Error(error.clone()));
        self.report_error(&error);
    }

    fn notify_countdown(&self, countdown: &CountdownState) {
        if let Some(delegate) = self.delegate() {
            delegate.on_countdown_tick(countdown);
        }
    }

    async fn shutdown(&self) {
        self.cancel.cancel_all();
        let (readiness, recording) = {
            let mut tasks = self.tasks.lock();
            (tasks.readiness.take(), tasks.recording.take())
        };
        if let Some(handle) = readiness {
            handle.abort();
        }
        if let Some(handle) = recording {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    log::error!("recording task panicked");
                }
            }
        }

        self.recording.finish();
        self.recording.discard_pending();
        self.acquisition.release();
        self.session.lock().acquired = None;
        if self.readiness.reset() {
            if let Some(delegate) = self.delegate() {
                delegate.on_readiness_changed(&Readiness::NotReady);
            }
        }
        self.set_state(ControllerState::Idle);
    }

    async fn acquire(self: &Arc<Self>, mode: CaptureMode, facing: Option<Facing>) -> Result<AcquiredStream, CaptureError> {
        let token = self.cancel.token();
        self.set_state(ControllerState::Acquiring);

        match self
            .acquisition
            .acquire(mode, &self.config.deployment, facing, &token)
            .await
        {
            Ok(acquired) => {
                self.session.lock().acquired = Some(acquired);
                self.set_state(ControllerState::AwaitingFrames);
                self.watch_readiness(acquired.generation, token);
                Ok(acquired)
            }
            Err(CaptureError::Cancelled) => {
                self.settle_state();
                Err(CaptureError::Cancelled)
            }
            Err(e) => {
                self.fail(e.clone());
                Err(e)
            }
        }
    }

    fn watch_readiness(self: &Arc<Self>, generation: u64, token: CancelToken) {
        let (tx, rx) = mpsc::unbounded_channel();
        let on_signal: SinkSignalCallback = Arc::new(move |signal| {
            let _ = tx.send(signal);
        });
        if !self.acquisition.attach_sink(on_signal) {
            return;
        }

        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let outcome = inner
                .readiness
                .watch(&inner.acquisition, generation, rx, &inner.config.timings, &token)
                .await;
            inner.readiness_settled(generation, outcome);
        });
        if let Some(previous) = self.tasks.lock().readiness.replace(handle) {
            previous.abort();
        }
    }

    fn readiness_settled(&self, generation: u64, outcome: ReadinessOutcome) {
        if self.acquisition.generation() != generation {
            return;
        }
        match outcome {
            ReadinessOutcome::Ready(dimensions) => {
                if let Some(delegate) = self.delegate() {
                    delegate.on_readiness_changed(&Readiness::Ready(dimensions));
                }
                if self.session.lock().state == ControllerState::AwaitingFrames {
                    self.set_state(ControllerState::Ready);
                }
            }
            ReadinessOutcome::TimedOut => self.fail(CaptureError::ReadinessTimeout),
            ReadinessOutcome::Abandoned => log::debug!("readiness watch abandoned"),
        }
    }

    /// Pre-roll countdown, then open and start a recorder.
    ///
    /// Expects the recording phase to be counting down already.
    async fn open_cycle(self: &Arc<Self>, token: &CancelToken) -> Result<ActiveRecording<P::Recorder>, CaptureError> {
        self.set_state(ControllerState::CountingDown);
        let result = self.start_recorder(token).await;
        match &result {
            Ok(_) => self.set_state(ControllerState::Recording),
            Err(e) => {
                self.recording.finish();
                if *e != CaptureError::Cancelled {
                    log::error!("recording could not start: {}", e);
                    self.report_error(e);
                }
                if !token.is_cancelled() {
                    self.settle_state();
                }
            }
        }
        result
    }

    async fn start_recorder(&self, token: &CancelToken) -> Result<ActiveRecording<P::Recorder>, CaptureError> {
        self.countdown
            .run(self.config.timings.pre_roll(), token, |c| self.notify_countdown(c))
            .await?;

        let (recorder, requested_type) = self
            .acquisition
            .with_stream(|stream| recording::open_recorder(self.platform.as_ref(), stream))
            .ok_or(CaptureError::NoStream)??;
        let stop = self.recording.begin_recording();
        ActiveRecording::start(
            recorder,
            requested_type,
            self.config.timings.max_recording(),
            stop,
            self.recording.speed(),
        )
    }

    /// Finalize cycles until loop mode is off, the session is released or
    /// something fails.
    ///
    /// Between looped cycles the recording phase stays counting down, so the
    /// countdown is still ours when the next pre-roll starts.
    async fn run_cycles(self: Arc<Self>, mut active: ActiveRecording<P::Recorder>, token: CancelToken) {
        loop {
            let finished = active
                .finish(&self.clock, self.config.timings.recorder_finalize_timeout(), &token)
                .await;

            let recording = match finished {
                Ok(Some(recording)) => recording,
                Ok(None) => {
                    self.recording.finish();
                    return;
                }
                Err(e) => {
                    self.recording.finish();
                    self.report_error(&e);
                    self.settle_state();
                    return;
                }
            };
            let looping = self.recording.loop_enabled();
            if looping {
                self.recording.rearm();
            } else {
                self.recording.finish();
            }
            self.settle_state();
            if let Some(delegate) = self.delegate() {
                delegate.on_recording_finished(&recording);
            }

            if !looping {
                self.recording.set_pending(recording);
                return;
            }
            let Some(destination) = self.directory.current_destination() else {
                log::warn!("destination unbound, loop recording stopped");
                self.end_loop();
                self.recording.set_pending(recording);
                self.report_error(&CaptureError::NoDestination);
                return;
            };
            match self.bridge.save(Artifact::Recording(&recording), &destination).await {
                Ok(report) => {
                    if let Some(delegate) = self.delegate() {
                        delegate.on_artifact_saved(&report);
                    }
                }
                Err(e) => {
                    log::error!("loop recording could not be saved: {}", e);
                    self.end_loop();
                    self.recording.set_pending(recording);
                    self.report_error(&e);
                    return;
                }
            }

            if token.is_cancelled() {
                self.recording.finish();
                return;
            }
            if !self.recording.loop_enabled() {
                log::debug!("loop mode turned off during save");
                self.recording.finish();
                self.settle_state();
                return;
            }
            active = match self.open_cycle(&token).await {
                Ok(next) => next,
                Err(_) => return,
            };
        }
    }

    fn end_loop(&self) {
        self.recording.set_loop_enabled(false);
        self.recording.finish();
        self.settle_state();
    }
}

impl<P, K, M> BurstObserver for Inner<P, K, M>
where
    P: CameraPlatform,
    K: VideoSink<Stream = P::Stream>,
    M: MediaStore,
{
    fn countdown_tick(&self, countdown: &CountdownState) {
        self.notify_countdown(countdown);
    }

    fn shot_started(&self, index: u8, of: u8) {
        self.set_state(ControllerState::Capturing { shot: index, of });
    }

    fn shot_captured(&self, shot: &Shot) {
        if let Some(delegate) = self.delegate() {
            delegate.on_shot_captured(shot);
        }
    }
}

/// Frees the recording slot when a `start_recording` call is dropped
/// during its pre-roll.
struct PreRollGuard<'a, P, K, M>
where
    P: CameraPlatform,
    K: VideoSink<Stream = P::Stream>,
    M: MediaStore,
{
    inner: &'a Inner<P, K, M>,
    armed: bool,
}

impl<P, K, M> Drop for PreRollGuard<'_, P, K, M>
where
    P: CameraPlatform,
    K: VideoSink<Stream = P::Stream>,
    M: MediaStore,
{
    fn drop(&mut self) {
        if self.armed {
            log::debug!("recording start abandoned during pre-roll");
            self.inner.recording.finish();
            self.inner.settle_state();
        }
    }
}

impl<P, K, M> Drop for Inner<P, K, M>
where
    P: CameraPlatform,
    K: VideoSink<Stream = P::Stream>,
    M: MediaStore,
{
    fn drop(&mut self) {
        self.cancel.cancel_all();
        self.acquisition.release();
    }
}
