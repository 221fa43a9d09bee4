use std::sync::Arc;

use kiosk_capture_core::{
    FrameDimensions, MediaStream, PlayError, SinkSignal, SinkSignalCallback, VideoFrame, VideoSink,
};
use parking_lot::Mutex;

use crate::stream::SimStream;

/// Which warm-up signals the sink raises when playback starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalMode {
    /// Metadata, first frame and playing, in that order.
    #[default]
    All,
    /// No signals at all; only polling can observe readiness.
    Silent,
}

struct SinkState {
    stream: Option<SimStream>,
    on_signal: Option<SinkSignalCallback>,
    attached: bool,
    paused: bool,
    frame: Option<FrameDimensions>,
    signal_mode: SignalMode,
    autoplay_blocks: u32,
    stall_play: bool,
    play_calls: u32,
    attach_count: u32,
}

/// Preview sink producing generated gradient frames.
///
/// Reports frames only while attached, playing and bound to a stream with
/// a live video track. Clones share state.
#[derive(Clone)]
pub struct SyntheticSink {
    state: Arc<Mutex<SinkState>>,
}

impl Default for SyntheticSink {
    fn default() -> Self {
        Self::new(FrameDimensions::new(1280, 720))
    }
}

impl SyntheticSink {
    pub fn new(frame: FrameDimensions) -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState {
                stream: None,
                on_signal: None,
                attached: false,
                paused: true,
                frame: Some(frame),
                signal_mode: SignalMode::All,
                autoplay_blocks: 0,
                stall_play: false,
                play_calls: 0,
                attach_count: 0,
            })),
        }
    }

    /// Frame size the camera delivers; `None` means no frames decode.
    pub fn set_frame(&self, frame: Option<FrameDimensions>) {
        self.state.lock().frame = frame;
    }

    pub fn set_signal_mode(&self, mode: SignalMode) {
        self.state.lock().signal_mode = mode;
    }

    /// Refuse the next `count` play requests as autoplay-blocked.
    pub fn block_autoplay(&self, count: u32) {
        self.state.lock().autoplay_blocks = count;
    }

    /// Make play requests never resolve, like a wedged media element.
    pub fn stall_play(&self, stall: bool) {
        self.state.lock().stall_play = stall;
    }

    /// Simulate a UI handoff: the element goes away but keeps its stream.
    pub fn set_attached(&self, attached: bool) {
        let mut state = self.state.lock();
        if state.stream.is_some() {
            state.attached = attached;
        }
    }

    pub fn play_calls(&self) -> u32 {
        self.state.lock().play_calls
    }

    pub fn attach_count(&self) -> u32 {
        self.state.lock().attach_count
    }

    pub fn attached_stream_id(&self) -> Option<u64> {
        let state = self.state.lock();
        state.stream.as_ref().filter(|_| state.attached).map(SimStream::id)
    }

    /// Raise `signal` as if the platform had fired it.
    pub fn raise(&self, signal: SinkSignal) {
        let callback = self.state.lock().on_signal.clone();
        if let Some(callback) = callback {
            callback(signal);
        }
    }

    fn current_frame(&self) -> Option<FrameDimensions> {
        let state = self.state.lock();
        let live = state.stream.as_ref().is_some_and(|s| s.has_live_video());
        if !state.attached || state.paused || !live {
            return None;
        }
        state.frame
    }
}

impl VideoSink for SyntheticSink {
    type Stream = SimStream;

    fn attach(&self, stream: &SimStream, on_signal: SinkSignalCallback) {
        let mut state = self.state.lock();
        state.stream = Some(stream.clone());
        state.on_signal = Some(on_signal);
        state.attached = true;
        state.paused = true;
        state.attach_count += 1;
    }

    fn detach(&self) {
        let mut state = self.state.lock();
        state.stream = None;
        state.on_signal = None;
        state.attached = false;
        state.paused = true;
    }

    fn is_attached(&self) -> bool {
        self.state.lock().attached
    }

    fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    async fn play(&self) -> Result<(), PlayError> {
        let stalled = {
            let mut state = self.state.lock();
            state.play_calls += 1;
            state.stall_play
        };
        if stalled {
            std::future::pending::<()>().await;
        }
        let signals = {
            let mut state = self.state.lock();
            if !state.attached {
                return Err(PlayError::Aborted);
            }
            if state.autoplay_blocks > 0 {
                state.autoplay_blocks -= 1;
                return Err(PlayError::AutoplayBlocked);
            }
            state.paused = false;
            match (state.signal_mode, state.on_signal.clone()) {
                (SignalMode::All, Some(callback)) => Some(callback),
                _ => None,
            }
        };
        if let Some(callback) = signals {
            callback(SinkSignal::MetadataLoaded);
            callback(SinkSignal::FirstFrame);
            callback(SinkSignal::Playing);
        }
        Ok(())
    }

    fn frame_dimensions(&self) -> Option<FrameDimensions> {
        self.current_frame()
    }

    fn grab_frame(&self) -> Option<VideoFrame> {
        let dims = self.current_frame().filter(FrameDimensions::is_valid)?;
        Some(gradient(dims))
    }
}

/// Horizontal red ramp, vertical green ramp, opaque.
pub fn gradient(dims: FrameDimensions) -> VideoFrame {
    let (width, height) = (dims.width, dims.height);
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                96,
                255,
            ]);
        }
    }
    VideoFrame { width, height, pixels }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_only_after_play() {
        let sink = SyntheticSink::new(FrameDimensions::new(4, 2));
        let stream = SimStream::new(false);
        sink.attach(&stream, Arc::new(|_: SinkSignal| {}));

        assert_eq!(sink.frame_dimensions(), None);
        sink.play().await.unwrap();
        assert_eq!(sink.frame_dimensions(), Some(FrameDimensions::new(4, 2)));

        let frame = sink.grab_frame().unwrap();
        assert_eq!(frame.pixels.len(), 4 * 2 * 4);

        stream.end_video();
        assert_eq!(sink.frame_dimensions(), None);
    }

    #[tokio::test]
    async fn autoplay_block_is_counted_down() {
        let sink = SyntheticSink::default();
        sink.attach(&SimStream::new(false), Arc::new(|_: SinkSignal| {}));
        sink.block_autoplay(1);

        assert_eq!(sink.play().await, Err(PlayError::AutoplayBlocked));
        assert_eq!(sink.play().await, Ok(()));
        assert_eq!(sink.play_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_play_never_resolves() {
        let sink = SyntheticSink::default();
        sink.attach(&SimStream::new(false), Arc::new(|_: SinkSignal| {}));
        sink.stall_play(true);

        let result = tokio::time::timeout(std::time::Duration::from_secs(30), sink.play()).await;
        assert!(result.is_err());
        assert!(sink.is_paused());
        assert_eq!(sink.play_calls(), 1);
    }

    #[tokio::test]
    async fn signals_fire_on_play() {
        let sink = SyntheticSink::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        sink.attach(&SimStream::new(false), Arc::new(move |s: SinkSignal| log.lock().push(s)));

        sink.play().await.unwrap();
        assert_eq!(
            *seen.lock(),
            vec![SinkSignal::MetadataLoaded, SinkSignal::FirstFrame, SinkSignal::Playing]
        );
    }
}
