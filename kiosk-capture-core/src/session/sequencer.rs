use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use uuid::Uuid;

use crate::models::artifacts::{Burst, CountdownState, Shot};
use crate::models::config::ControllerConfig;
use crate::models::error::CaptureError;
use crate::models::profile::Orientation;
use crate::processing::still;
use crate::session::acquisition::FrameSource;
use crate::session::cancel::CancelToken;
use crate::session::clock::SessionClock;
use crate::session::countdown::CountdownGate;

/// Timing and rendering parameters of one burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstPlan {
    pub shot_count: u8,
    pub pre_roll: Duration,
    pub inter_shot_pause: Duration,
    pub shot_countdown: Duration,
    pub target_orientation: Option<Orientation>,
    pub jpeg_quality: u8,
}

impl BurstPlan {
    pub fn from_config(shot_count: u8, config: &ControllerConfig) -> Self {
        Self {
            shot_count,
            pre_roll: config.timings.pre_roll(),
            inter_shot_pause: config.timings.inter_shot_pause(),
            shot_countdown: config.timings.shot_countdown(),
            target_orientation: config.deployment.target_orientation,
            jpeg_quality: config.jpeg_quality,
        }
    }
}

/// Progress callbacks raised while a burst runs.
pub trait BurstObserver {
    fn countdown_tick(&self, countdown: &CountdownState);

    /// Shot `index` of `of` is about to be grabbed.
    fn shot_started(&self, index: u8, of: u8);

    fn shot_captured(&self, shot: &Shot);
}

/// Runs multi-shot bursts, one at a time.
#[derive(Debug, Default)]
pub struct CaptureSequencer {
    running: AtomicBool,
}

/// Marks a burst as running until dropped.
pub struct BurstGuard<'a>(&'a AtomicBool);

impl Drop for BurstGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl CaptureSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Claim the sequencer. `None` if a burst is already running.
    pub fn try_begin(&self) -> Option<BurstGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BurstGuard(&self.running))
    }

    /// Run `plan` against `source`.
    ///
    /// The pre-roll countdown precedes the first shot; every later shot gets
    /// a pause and its own countdown. Losing valid frames mid-burst ends the
    /// burst early and keeps the shots taken so far. Cancellation discards
    /// everything.
    pub async fn run<S, O>(
        &self,
        _guard: &BurstGuard<'_>,
        plan: &BurstPlan,
        source: &S,
        countdown: &CountdownGate,
        clock: &SessionClock,
        observer: &O,
        token: &CancelToken,
    ) -> Result<Burst, CaptureError>
    where
        S: FrameSource,
        O: BurstObserver,
    {
        log::info!("burst of {} starting", plan.shot_count);
        countdown
            .run(plan.pre_roll, token, |c| observer.countdown_tick(c))
            .await?;

        let mut shots = Vec::with_capacity(plan.shot_count as usize);
        for index in 1..=plan.shot_count {
            if index > 1 {
                token.sleep(plan.inter_shot_pause).await?;
                countdown
                    .run(plan.shot_countdown, token, |c| observer.countdown_tick(c))
                    .await?;
            }
            observer.shot_started(index, plan.shot_count);

            match capture_shot(index, plan, source, clock) {
                Ok(Some(shot)) => {
                    log::debug!("shot {}/{} captured ({}x{})", index, plan.shot_count, shot.width, shot.height);
                    observer.shot_captured(&shot);
                    shots.push(shot);
                }
                Ok(None) => {
                    log::warn!("stream lost before shot {}/{}, ending burst", index, plan.shot_count);
                    break;
                }
                Err(e) => {
                    log::error!("shot {}/{} failed: {}", index, plan.shot_count, e);
                    break;
                }
            }
        }

        if shots.is_empty() {
            return Err(CaptureError::NoShotsCaptured);
        }
        log::info!("burst finished with {}/{} shots", shots.len(), plan.shot_count);
        Ok(Burst {
            shots,
            requested: plan.shot_count,
        })
    }
}

fn capture_shot<S: FrameSource>(
    index: u8,
    plan: &BurstPlan,
    source: &S,
    clock: &SessionClock,
) -> Result<Option<Shot>, CaptureError> {
    // Re-verify right before grabbing; the stream may have died during the countdown.
    if source.frame_dimensions().is_none() {
        return Ok(None);
    }
    let Some(frame) = source.grab_frame() else {
        return Ok(None);
    };
    let captured_at = clock.now();
    let encoded = still::render_still(frame, plan.target_orientation, plan.jpeg_quality)?;

    Ok(Some(Shot {
        id: Uuid::new_v4().to_string(),
        sequence_index: index,
        captured_at,
        jpeg: Bytes::from(encoded.jpeg),
        width: encoded.width,
        height: encoded.height,
    }))
}
