//! Operator-facing remediation text for capture failures.

use super::error::{CaptureError, PlatformErrorKind};

/// A human-readable explanation of a failure plus the steps an operator can
/// take to recover from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorGuidance {
    pub title: String,
    pub message: String,
    pub steps: Vec<String>,
}

impl ErrorGuidance {
    fn new(title: &str, message: &str, steps: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CaptureError {
    /// Remediation guidance for errors that reach the operator.
    ///
    /// Returns `None` for local precondition failures (`NotReady`,
    /// `CountdownActive`, ...) which the caller handles by waiting.
    pub fn guidance(&self) -> Option<ErrorGuidance> {
        match self {
            CaptureError::PermissionDenied => Some(permission_denied()),
            CaptureError::HardwareInitFailed(last) => Some(match last.kind {
                PlatformErrorKind::PermissionDenied => permission_denied(),
                PlatformErrorKind::NotFound => ErrorGuidance::new(
                    "No Camera Found",
                    "No camera device was detected on this kiosk.",
                    &[
                        "Make sure a camera is connected to the device",
                        "Check whether another application is holding the camera",
                        "Disconnect and reconnect the camera",
                    ],
                ),
                PlatformErrorKind::Overconstrained => ErrorGuidance::new(
                    "Camera Settings Not Supported",
                    "The camera rejected every requested resolution and facing.",
                    &[
                        "Switch between the front and back camera",
                        "Reload the capture screen",
                        "Use a camera that supports at least 640x480",
                    ],
                ),
                PlatformErrorKind::HardwareBusy | PlatformErrorKind::Other => hardware_init_failed(),
            }),
            CaptureError::RecorderUnavailable(_) => Some(ErrorGuidance::new(
                "Video Recording Unsupported",
                "This platform cannot record video from the camera stream.",
                &[
                    "Use photo mode instead",
                    "Update the kiosk browser or runtime to a version with recording support",
                ],
            )),
            CaptureError::ReadinessTimeout => Some(ErrorGuidance::new(
                "Camera Not Producing Frames",
                "The camera stream opened but no frames arrived.",
                &[
                    "Reload the capture screen",
                    "Close other applications that might be using the camera",
                    "Reconnect the camera",
                ],
            )),
            _ => None,
        }
    }
}

fn permission_denied() -> ErrorGuidance {
    ErrorGuidance::new(
        "Camera Permission Denied",
        "Camera access was refused for this kiosk.",
        &[
            "Grant camera access for this site in the browser's site settings",
            "If a permission prompt appears, choose Allow",
            "Reload the capture screen and try again",
        ],
    )
}

fn hardware_init_failed() -> ErrorGuidance {
    ErrorGuidance::new(
        "Camera Cannot Start",
        "The camera could not be started after trying every fallback setting. It is usually in use or the driver is stuck.",
        &[
            "Close other applications and tabs that may be using the camera",
            "Restart the browser",
            "Check the operating system's camera privacy settings",
            "Unplug and reconnect an external camera, or try another USB port",
            "Restart the device if the problem persists",
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::error::PlatformError;

    #[test]
    fn operator_errors_carry_guidance() {
        let busy = CaptureError::HardwareInitFailed(PlatformError::new(
            PlatformErrorKind::HardwareBusy,
            "Could not start video source",
        ));
        let guidance = busy.guidance().unwrap();
        assert_eq!(guidance.title, "Camera Cannot Start");
        assert!(!guidance.steps.is_empty());

        assert_eq!(
            CaptureError::PermissionDenied.guidance().unwrap().title,
            "Camera Permission Denied"
        );
    }

    #[test]
    fn exhausted_ladder_reports_last_error_kind() {
        let missing = CaptureError::HardwareInitFailed(PlatformError::new(PlatformErrorKind::NotFound, "none"));
        assert_eq!(missing.guidance().unwrap().title, "No Camera Found");
    }

    #[test]
    fn local_preconditions_have_no_guidance() {
        assert!(CaptureError::NotReady.guidance().is_none());
        assert!(CaptureError::CountdownActive.guidance().is_none());
        assert!(CaptureError::NoShotsCaptured.guidance().is_none());
    }
}
