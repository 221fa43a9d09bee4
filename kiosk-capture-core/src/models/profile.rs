use serde::{Deserialize, Serialize};

/// What the session is capturing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    Photo,
    Video,
}

/// Which physical camera is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    User,
    Environment,
}

impl Facing {
    pub fn toggled(self) -> Self {
        match self {
            Self::User => Self::Environment,
            Self::Environment => Self::User,
        }
    }
}

/// Frame orientation, derived from width versus height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
}

/// Deployment override for the device class; `Auto` trusts platform hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    #[default]
    Auto,
    Mobile,
    Desktop,
}

/// Declarative per-deployment device description.
///
/// Replaces hard-coded per-kiosk facing and rotation: a deployment states
/// what it wants and the controller stays device-agnostic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentProfile {
    pub device_class: DeviceClass,

    /// Forced camera facing; `None` picks by device class.
    pub facing: Option<Facing>,

    /// Desired output orientation; `None` keeps the source orientation.
    pub target_orientation: Option<Orientation>,

    /// Request a microphone track alongside video.
    pub request_audio: bool,
}

/// Raw hints gathered from the platform at acquisition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformHints {
    pub is_mobile_like: bool,
    pub video_inputs: usize,
}

/// Immutable device description used for one acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    pub preferred_facing: Facing,
    pub is_mobile_like: bool,
    pub supports_multiple_cameras: bool,
    pub request_audio: bool,
}

impl DeviceProfile {
    /// Combine platform hints with the deployment profile.
    ///
    /// `facing` is the operator's current choice (after a toggle) and wins
    /// over both the deployment override and the device-class default.
    pub fn resolve(hints: &PlatformHints, deployment: &DeploymentProfile, facing: Option<Facing>) -> Self {
        let is_mobile_like = match deployment.device_class {
            DeviceClass::Mobile => true,
            DeviceClass::Desktop => false,
            DeviceClass::Auto => hints.is_mobile_like,
        };
        let default_facing = if is_mobile_like {
            Facing::Environment
        } else {
            Facing::User
        };
        Self {
            preferred_facing: facing.or(deployment.facing).unwrap_or(default_facing),
            is_mobile_like,
            supports_multiple_cameras: hints.video_inputs > 1,
            request_audio: deployment.request_audio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_defaults_to_environment_camera() {
        let hints = PlatformHints {
            is_mobile_like: true,
            video_inputs: 2,
        };
        let profile = DeviceProfile::resolve(&hints, &DeploymentProfile::default(), None);
        assert_eq!(profile.preferred_facing, Facing::Environment);
        assert!(profile.supports_multiple_cameras);
        assert!(!profile.request_audio);
    }

    #[test]
    fn deployment_class_overrides_hints() {
        let hints = PlatformHints {
            is_mobile_like: true,
            video_inputs: 1,
        };
        let deployment = DeploymentProfile {
            device_class: DeviceClass::Desktop,
            ..Default::default()
        };
        let profile = DeviceProfile::resolve(&hints, &deployment, None);
        assert!(!profile.is_mobile_like);
        assert_eq!(profile.preferred_facing, Facing::User);
        assert!(!profile.supports_multiple_cameras);
    }

    #[test]
    fn operator_facing_wins() {
        let deployment = DeploymentProfile {
            facing: Some(Facing::Environment),
            ..Default::default()
        };
        let profile = DeviceProfile::resolve(&PlatformHints::default(), &deployment, Some(Facing::User));
        assert_eq!(profile.preferred_facing, Facing::User);
    }
}
