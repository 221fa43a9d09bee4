use super::error::CaptureError;
use super::profile::Orientation;

/// Pixel dimensions of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameDimensions {
    pub width: u32,
    pub height: u32,
}

impl FrameDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions known and non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    pub fn orientation(&self) -> Orientation {
        if self.is_landscape() {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

/// Whether the acquired stream yields decodable frames yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    NotReady,
    Ready(FrameDimensions),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn dimensions(&self) -> Option<FrameDimensions> {
        match self {
            Self::Ready(dims) => Some(*dims),
            Self::NotReady => None,
        }
    }
}

/// Capture controller state machine.
///
/// State transitions:
/// ```text
/// idle → acquiring → awaiting_frames → ready ⇄ capturing
///          ↓                            ⇅
///        error               counting_down → recording → ready
/// ```
/// Any state returns to `idle` on release, mode switch or teardown.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerState {
    Idle,
    Acquiring,
    AwaitingFrames,
    Ready,
    Capturing { shot: u8, of: u8 },
    CountingDown,
    Recording,
    Error(CaptureError),
}

impl ControllerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Acquiring | Self::Capturing { .. } | Self::CountingDown | Self::Recording
        )
    }

    pub fn has_stream(&self) -> bool {
        !matches!(self, Self::Idle | Self::Acquiring | Self::Error(_))
    }
}

/// Recording controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingPhase {
    #[default]
    Idle,
    CountingDown,
    Recording,
}
