use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use super::profile::DeploymentProfile;

/// Where the kiosk runs. Deployed hardware releases cameras more slowly,
/// so every acquisition delay is longer there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    Development,
    #[default]
    Deployed,
}

/// Delays used while walking the constraint ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionDelays {
    /// Wait after releasing a stream before the first request.
    pub settle: Duration,
    /// Wait before the next candidate after a hardware-busy failure.
    pub hardware_busy: Duration,
    /// Wait before the next candidate after an unclassified failure.
    pub other: Duration,
    /// Wait before the single permissive attempt after the ladder is exhausted.
    pub last_resort: Duration,
}

impl AcquisitionDelays {
    pub fn for_environment(environment: RuntimeEnvironment) -> Self {
        match environment {
            RuntimeEnvironment::Development => Self {
                settle: Duration::from_millis(100),
                hardware_busy: Duration::from_millis(200),
                other: Duration::from_millis(100),
                last_resort: Duration::from_millis(1000),
            },
            RuntimeEnvironment::Deployed => Self {
                settle: Duration::from_millis(500),
                hardware_busy: Duration::from_millis(500),
                other: Duration::from_millis(300),
                last_resort: Duration::from_millis(2000),
            },
        }
    }
}

/// Countdown, recording and readiness timings, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureTimings {
    pub pre_roll_ms: u64,
    pub inter_shot_pause_ms: u64,
    pub shot_countdown_ms: u64,
    pub max_recording_ms: u64,
    pub readiness_poll_ms: u64,
    pub readiness_ceiling_ms: u64,
    pub play_retry_ms: u64,
    pub recorder_finalize_timeout_ms: u64,
}

impl CaptureTimings {
    pub fn pre_roll(&self) -> Duration {
        Duration::from_millis(self.pre_roll_ms)
    }

    pub fn inter_shot_pause(&self) -> Duration {
        Duration::from_millis(self.inter_shot_pause_ms)
    }

    pub fn shot_countdown(&self) -> Duration {
        Duration::from_millis(self.shot_countdown_ms)
    }

    pub fn max_recording(&self) -> Duration {
        Duration::from_millis(self.max_recording_ms)
    }

    pub fn readiness_poll(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_ms)
    }

    pub fn readiness_ceiling(&self) -> Duration {
        Duration::from_millis(self.readiness_ceiling_ms)
    }

    pub fn play_retry(&self) -> Duration {
        Duration::from_millis(self.play_retry_ms)
    }

    pub fn recorder_finalize_timeout(&self) -> Duration {
        Duration::from_millis(self.recorder_finalize_timeout_ms)
    }
}

impl Default for CaptureTimings {
    fn default() -> Self {
        Self {
            pre_roll_ms: 5_000,
            inter_shot_pause_ms: 2_000,
            shot_countdown_ms: 3_000,
            max_recording_ms: 24_000,
            readiness_poll_ms: 100,
            readiness_ceiling_ms: 10_000,
            play_retry_ms: 500,
            recorder_finalize_timeout_ms: 2_000,
        }
    }
}

/// Configuration for a capture controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub environment: RuntimeEnvironment,

    pub deployment: DeploymentProfile,

    pub timings: CaptureTimings,

    /// JPEG quality factor for stills, 1-100 (default: 95).
    pub jpeg_quality: u8,

    /// Largest burst an operator may request (default: 4).
    pub max_shots: u8,

    /// Directory holding the local copy of every saved artifact.
    pub cache_directory: PathBuf,
}

impl ControllerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("invalid config: {}", e)))?;
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CaptureError> {
        let json = fs::read_to_string(path)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("failed to read config: {}", e)))?;
        Self::from_json_str(&json)
    }

    pub fn acquisition_delays(&self) -> AcquisitionDelays {
        AcquisitionDelays::for_environment(self.environment)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!("jpeg quality out of range: {}", self.jpeg_quality));
        }
        if self.max_shots == 0 {
            return Err("max shots must be at least 1".into());
        }
        let t = &self.timings;
        if t.max_recording_ms == 0 {
            return Err("max recording duration must be positive".into());
        }
        if t.readiness_poll_ms == 0 || t.readiness_poll_ms > t.readiness_ceiling_ms {
            return Err(format!(
                "readiness poll interval {}ms must be positive and within the {}ms ceiling",
                t.readiness_poll_ms, t.readiness_ceiling_ms
            ));
        }
        if t.pre_roll_ms % 1000 != 0 || t.shot_countdown_ms % 1000 != 0 {
            return Err("countdowns must be whole seconds".into());
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            environment: RuntimeEnvironment::default(),
            deployment: DeploymentProfile::default(),
            timings: CaptureTimings::default(),
            jpeg_quality: 95,
            max_shots: 4,
            cache_directory: PathBuf::from("capture-cache"),
        }
    }
}
