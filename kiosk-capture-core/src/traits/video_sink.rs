use std::future::Future;
use std::sync::Arc;

use crate::models::artifacts::VideoFrame;
use crate::models::state::FrameDimensions;
use crate::traits::camera_platform::MediaStream;

/// Signals a rendering sink raises while a stream warms up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkSignal {
    MetadataLoaded,
    FirstFrame,
    Playing,
    Resized,
}

/// Callback invoked by the sink for every signal.
pub type SinkSignalCallback = Arc<dyn Fn(SinkSignal) + Send + Sync + 'static>;

/// Why `play()` did not start playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    /// Autoplay policy refused playback without a user gesture.
    AutoplayBlocked,
    /// The request was interrupted, usually by a sink handoff.
    Aborted,
    Other(String),
}

/// The element a stream is rendered into (a preview surface).
///
/// The sink may be detached and reattached by the UI at any time; readers
/// must treat a detached sink as "no information", never as an error.
pub trait VideoSink: Send + Sync + 'static {
    type Stream: MediaStream;

    fn attach(&self, stream: &Self::Stream, on_signal: SinkSignalCallback);

    fn detach(&self);

    fn is_attached(&self) -> bool;

    fn is_paused(&self) -> bool;

    fn play(&self) -> impl Future<Output = Result<(), PlayError>> + Send;

    /// Dimensions of the current decoded frame, if any.
    fn frame_dimensions(&self) -> Option<FrameDimensions>;

    /// Copy the current frame at its source dimensions.
    fn grab_frame(&self) -> Option<VideoFrame>;
}
