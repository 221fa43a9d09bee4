use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use kiosk_capture_core::{MediaStream, TrackInfo, TrackKind, TrackState};
use parking_lot::Mutex;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
struct StreamShared {
    id: u64,
    tracks: Mutex<Vec<TrackInfo>>,
}

/// A synthetic camera stream.
///
/// Clones share the same tracks, so a test can keep a handle and end the
/// video track while the controller owns the stream.
#[derive(Debug, Clone)]
pub struct SimStream {
    shared: Arc<StreamShared>,
}

impl SimStream {
    pub fn new(with_audio: bool) -> Self {
        let mut tracks = vec![TrackInfo {
            kind: TrackKind::Video,
            state: TrackState::Live,
        }];
        if with_audio {
            tracks.push(TrackInfo {
                kind: TrackKind::Audio,
                state: TrackState::Live,
            });
        }
        Self {
            shared: Arc::new(StreamShared {
                id: NEXT_STREAM_ID.fetch_add(1, Ordering::SeqCst),
                tracks: Mutex::new(tracks),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Simulate the camera going away (unplugged, revoked).
    pub fn end_video(&self) {
        for track in self.shared.tracks.lock().iter_mut() {
            if track.kind == TrackKind::Video {
                track.state = TrackState::Ended;
            }
        }
    }

    /// Every track has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.shared.tracks.lock().iter().all(|t| t.state == TrackState::Ended)
    }
}

impl MediaStream for SimStream {
    fn tracks(&self) -> Vec<TrackInfo> {
        self.shared.tracks.lock().clone()
    }

    fn stop_all_tracks(&self) {
        for track in self.shared.tracks.lock().iter_mut() {
            track.state = TrackState::Ended;
        }
        log::debug!("sim stream {} stopped", self.shared.id);
    }
}
