//! Constraint ladder construction.
//!
//! The ladder is an ordered list of capture requests, most specific first,
//! that acquisition walks until the platform accepts one.

use crate::models::constraints::{ConstraintCandidate, DimensionRange, VideoConstraints, VideoRequest};
use crate::models::profile::{CaptureMode, DeviceProfile};

/// Frame rate requested for video-mode candidates.
pub const VIDEO_FRAME_RATE: u32 = 30;

const DESKTOP_RESOLUTIONS: [(DimensionRange, DimensionRange); 3] = [
    (DimensionRange::ideal(1920), DimensionRange::ideal(1080)),
    (DimensionRange::ideal(1280), DimensionRange::ideal(720)),
    (DimensionRange::ideal(640), DimensionRange::ideal(480)),
];

// Mobile hardware starts lower for performance but may still go up to 1080p.
const MOBILE_RESOLUTIONS: [(DimensionRange, DimensionRange); 2] = [
    (DimensionRange::ideal_with_max(1280, 1920), DimensionRange::ideal_with_max(720, 1080)),
    (DimensionRange::ideal(640), DimensionRange::ideal(480)),
];

/// Build the fallback ladder for `mode` on the device described by `profile`.
///
/// Guarantees:
/// - the last candidate is [`ConstraintCandidate::permissive`];
/// - every candidate that requests audio is followed later by the same
///   video request without audio.
pub fn build_ladder(mode: CaptureMode, profile: &DeviceProfile) -> Vec<ConstraintCandidate> {
    let facing = profile.preferred_facing;
    let resolutions: &[(DimensionRange, DimensionRange)] = if profile.is_mobile_like {
        &MOBILE_RESOLUTIONS
    } else {
        &DESKTOP_RESOLUTIONS
    };

    let constrained = |res: Option<&(DimensionRange, DimensionRange)>, frame_rate: Option<u32>| ConstraintCandidate {
        video: VideoRequest::Constrained(VideoConstraints {
            facing,
            width: res.map(|r| r.0),
            height: res.map(|r| r.1),
            frame_rate,
        }),
        audio: false,
    };

    let mut video_only = Vec::with_capacity(resolutions.len() + 3);
    match mode {
        CaptureMode::Video => {
            for res in resolutions {
                video_only.push(constrained(Some(res), Some(VIDEO_FRAME_RATE)));
            }
            // Give up the frame rate before giving up on resolution entirely.
            video_only.push(constrained(resolutions.last(), None));
        }
        CaptureMode::Photo => {
            for res in resolutions {
                video_only.push(constrained(Some(res), None));
            }
        }
    }
    video_only.push(constrained(None, None));
    video_only.push(ConstraintCandidate::permissive());

    if !profile.request_audio {
        return video_only;
    }

    video_only
        .iter()
        .map(|c| c.with_audio(true))
        .chain(video_only.iter().copied())
        .collect()
}
