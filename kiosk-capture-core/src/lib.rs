//! # kiosk-capture-core
//!
//! Platform-agnostic capture session controller for photo/video kiosks.
//!
//! Walks a constraint ladder to acquire a camera stream, waits until the
//! stream produces real frames, then drives timed photo bursts and bounded
//! video recordings. Finished artifacts go to a local cache and a remote
//! Media Store. Platform backends implement `CameraPlatform`, `VideoSink`
//! and `MediaStore` and plug into the generic `CaptureController`.
//!
//! ## Architecture
//!
//! ```text
//! kiosk-capture-core (this crate)
//! ├── traits/       ← CameraPlatform, VideoSink, MediaRecorder, MediaStore, EventDirectory, CaptureDelegate
//! ├── models/       ← CaptureError, ControllerState, ControllerConfig, DeviceProfile, Shot, Recording, etc.
//! ├── processing/   ← constraint ladder, recorder mime selection, still rendering and JPEG encoding
//! ├── session/      ← CaptureController (generic orchestrator), acquisition, readiness, bursts, recording
//! └── storage/      ← PersistenceBridge, LocalCache, metadata sidecars
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::artifacts::{Artifact, ArtifactKind, Burst, CountdownState, DestinationId, Recording, Shot, VideoFrame};
pub use models::config::{AcquisitionDelays, CaptureTimings, ControllerConfig, RuntimeEnvironment};
pub use models::constraints::{ConstraintCandidate, DimensionRange, VideoConstraints, VideoRequest};
pub use models::error::{CaptureError, PlatformError, PlatformErrorKind, UploadError};
pub use models::guidance::ErrorGuidance;
pub use models::profile::{CaptureMode, DeploymentProfile, DeviceClass, DeviceProfile, Facing, Orientation, PlatformHints};
pub use models::state::{ControllerState, FrameDimensions, Readiness, RecordingPhase};
pub use processing::ladder::build_ladder;
pub use session::acquisition::{AcquiredStream, AcquisitionManager};
pub use session::controller::CaptureController;
pub use storage::bridge::{PersistenceBridge, SaveReport};
pub use storage::local_cache::LocalCache;
pub use storage::metadata::ArtifactMetadata;
pub use traits::camera_platform::{CameraPlatform, DeviceInfo, MediaStream, TrackInfo, TrackKind, TrackState};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::event_directory::EventDirectory;
pub use traits::media_recorder::{MediaRecorder, RecorderCallback, RecorderEvent};
pub use traits::media_store::{MediaStore, RemoteObject, UploadRequest};
pub use traits::video_sink::{PlayError, SinkSignal, SinkSignalCallback, VideoSink};
