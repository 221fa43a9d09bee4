use crate::models::artifacts::{CountdownState, Recording, Shot};
use crate::models::error::CaptureError;
use crate::models::state::{ControllerState, Readiness};
use crate::storage::bridge::SaveReport;

/// Event delegate for capture controller notifications.
///
/// Methods are called from the controller's tasks. Implementations should
/// hand off to the UI rather than block.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the controller state changes.
    fn on_state_changed(&self, state: &ControllerState);

    /// Called when the stream becomes ready or is reset.
    fn on_readiness_changed(&self, readiness: &Readiness);

    /// Called once per second while a countdown runs.
    fn on_countdown_tick(&self, countdown: &CountdownState);

    /// Called after each still is encoded.
    fn on_shot_captured(&self, shot: &Shot);

    /// Called when a recording is finalized.
    fn on_recording_finished(&self, recording: &Recording);

    /// Called after the controller persisted an artifact on its own (loop mode).
    fn on_artifact_saved(&self, report: &SaveReport);

    /// Called when an error occurs outside a direct call's return value.
    fn on_error(&self, error: &CaptureError);
}
