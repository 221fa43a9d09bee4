use super::profile::Facing;

/// Desired value for one stream dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DimensionRange {
    pub ideal: u32,
    pub max: Option<u32>,
}

impl DimensionRange {
    pub const fn ideal(ideal: u32) -> Self {
        Self { ideal, max: None }
    }

    pub const fn ideal_with_max(ideal: u32, max: u32) -> Self {
        Self { ideal, max: Some(max) }
    }
}

/// Specific video requirements for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoConstraints {
    pub facing: Facing,
    pub width: Option<DimensionRange>,
    pub height: Option<DimensionRange>,
    pub frame_rate: Option<u32>,
}

/// The video half of a capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoRequest {
    /// Any camera in any format (`video: true`).
    Any,
    Constrained(VideoConstraints),
}

/// One rung of the constraint ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintCandidate {
    pub video: VideoRequest,
    pub audio: bool,
}

impl ConstraintCandidate {
    /// The most permissive request: any camera, no microphone.
    pub const fn permissive() -> Self {
        Self {
            video: VideoRequest::Any,
            audio: false,
        }
    }

    pub fn is_permissive(&self) -> bool {
        *self == Self::permissive()
    }

    pub fn with_audio(self, audio: bool) -> Self {
        Self { audio, ..self }
    }
}
