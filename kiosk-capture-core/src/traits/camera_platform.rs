use std::future::Future;

use crate::models::constraints::ConstraintCandidate;
use crate::models::error::PlatformError;
use crate::models::profile::PlatformHints;
use crate::traits::media_recorder::MediaRecorder;

/// Kind of media track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Lifecycle state of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackState {
    Live,
    Ended,
}

/// Snapshot of one track of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackInfo {
    pub kind: TrackKind,
    pub state: TrackState,
}

/// A camera device reported by enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub label: String,
    pub kind: TrackKind,
}

/// A live camera/microphone stream.
pub trait MediaStream: Send + Sync {
    fn tracks(&self) -> Vec<TrackInfo>;

    /// Stop every track. Hardware release continues asynchronously.
    fn stop_all_tracks(&self);

    fn has_live_video(&self) -> bool {
        self.tracks()
            .iter()
            .any(|t| t.kind == TrackKind::Video && t.state == TrackState::Live)
    }

    fn has_audio(&self) -> bool {
        self.tracks().iter().any(|t| t.kind == TrackKind::Audio)
    }
}

/// Interface to the platform camera and recorder APIs.
///
/// Implemented by:
/// - `ScriptedCamera` (kiosk-capture-sim)
pub trait CameraPlatform: Send + Sync + 'static {
    type Stream: MediaStream + 'static;
    type Recorder: MediaRecorder + 'static;

    /// Request a stream matching `candidate`.
    fn acquire(
        &self,
        candidate: &ConstraintCandidate,
    ) -> impl Future<Output = Result<Self::Stream, PlatformError>> + Send;

    fn enumerate_devices(&self) -> impl Future<Output = Result<Vec<DeviceInfo>, PlatformError>> + Send;

    /// Static hints about the host (mobile-like user agent, touch points).
    fn hints(&self) -> PlatformHints;

    fn is_mime_type_supported(&self, mime_type: &str) -> bool;

    /// Construct a recorder for `stream`, optionally pinned to `mime_type`.
    fn create_recorder(
        &self,
        stream: &Self::Stream,
        mime_type: Option<&str>,
    ) -> Result<Self::Recorder, PlatformError>;
}
