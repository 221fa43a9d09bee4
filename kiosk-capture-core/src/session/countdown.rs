use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::models::artifacts::CountdownState;
use crate::models::error::CaptureError;
use crate::session::cancel::CancelToken;

/// The single countdown of a controller.
///
/// Shared by bursts and recordings; at most one countdown runs at a time.
#[derive(Debug, Default)]
pub struct CountdownGate {
    active: Mutex<Option<CountdownState>>,
}

struct ActiveCountdown<'a>(&'a CountdownGate);

impl Drop for ActiveCountdown<'_> {
    fn drop(&mut self) {
        *self.0.active.lock() = None;
    }
}

impl CountdownGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<CountdownState> {
        *self.active.lock()
    }

    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Count down whole seconds, calling `on_tick` at the start of each one.
    ///
    /// A 5 second countdown ticks 5, 4, 3, 2, 1 and returns exactly five
    /// seconds after it started.
    pub async fn run<F>(&self, total: Duration, token: &CancelToken, on_tick: F) -> Result<(), CaptureError>
    where
        F: Fn(&CountdownState),
    {
        let total_seconds = total.as_secs() as u32;
        {
            let mut active = self.active.lock();
            if active.is_some() {
                return Err(CaptureError::CountdownActive);
            }
            *active = Some(CountdownState {
                total_seconds,
                remaining_seconds: total_seconds,
            });
        }
        let _active = ActiveCountdown(self);

        let start = Instant::now();
        for elapsed in 0..total_seconds {
            let state = CountdownState {
                total_seconds,
                remaining_seconds: total_seconds - elapsed,
            };
            *self.active.lock() = Some(state);
            on_tick(&state);
            token
                .sleep_until(start + Duration::from_secs(u64::from(elapsed) + 1))
                .await?;
        }
        log::debug!("countdown of {}s complete", total_seconds);
        Ok(())
    }
}
