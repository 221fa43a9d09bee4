use kiosk_capture_core::{
    CaptureDelegate, CaptureError, ControllerState, CountdownState, Readiness, Recording, SaveReport, Shot,
};
use parking_lot::Mutex;

/// One delegate callback, as observed.
#[derive(Debug, Clone, PartialEq)]
pub enum DelegateEvent {
    State(ControllerState),
    Readiness(Readiness),
    Countdown(CountdownState),
    Shot { index: u8 },
    RecordingFinished { id: String },
    Saved(SaveReport),
    Error(CaptureError),
}

/// Delegate that records every callback for later assertions.
#[derive(Debug, Default)]
pub struct CollectingDelegate {
    events: Mutex<Vec<DelegateEvent>>,
}

impl CollectingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DelegateEvent> {
        self.events.lock().clone()
    }

    pub fn errors(&self) -> Vec<CaptureError> {
        self.filter(|e| match e {
            DelegateEvent::Error(error) => Some(error.clone()),
            _ => None,
        })
    }

    pub fn saved(&self) -> Vec<SaveReport> {
        self.filter(|e| match e {
            DelegateEvent::Saved(report) => Some(report.clone()),
            _ => None,
        })
    }

    pub fn finished_recordings(&self) -> Vec<String> {
        self.filter(|e| match e {
            DelegateEvent::RecordingFinished { id } => Some(id.clone()),
            _ => None,
        })
    }

    pub fn readiness_changes(&self) -> Vec<Readiness> {
        self.filter(|e| match e {
            DelegateEvent::Readiness(readiness) => Some(*readiness),
            _ => None,
        })
    }

    pub fn states(&self) -> Vec<ControllerState> {
        self.filter(|e| match e {
            DelegateEvent::State(state) => Some(state.clone()),
            _ => None,
        })
    }

    fn filter<T>(&self, f: impl Fn(&DelegateEvent) -> Option<T>) -> Vec<T> {
        self.events.lock().iter().filter_map(f).collect()
    }

    fn push(&self, event: DelegateEvent) {
        self.events.lock().push(event);
    }
}

impl CaptureDelegate for CollectingDelegate {
    fn on_state_changed(&self, state: &ControllerState) {
        self.push(DelegateEvent::State(state.clone()));
    }

    fn on_readiness_changed(&self, readiness: &Readiness) {
        self.push(DelegateEvent::Readiness(*readiness));
    }

    fn on_countdown_tick(&self, countdown: &CountdownState) {
        self.push(DelegateEvent::Countdown(*countdown));
    }

    fn on_shot_captured(&self, shot: &Shot) {
        self.push(DelegateEvent::Shot {
            index: shot.sequence_index,
        });
    }

    fn on_recording_finished(&self, recording: &Recording) {
        self.push(DelegateEvent::RecordingFinished {
            id: recording.id.clone(),
        });
    }

    fn on_artifact_saved(&self, report: &SaveReport) {
        self.push(DelegateEvent::Saved(report.clone()));
    }

    fn on_error(&self, error: &CaptureError) {
        self.push(DelegateEvent::Error(error.clone()));
    }
}
