//! # kiosk-capture-sim
//!
//! Synthetic backend for kiosk-capture-core.
//!
//! Provides:
//! - `ScriptedCamera`: camera platform with scripted acquisition outcomes
//! - `SyntheticSink`: preview sink generating gradient frames
//! - `SimRecorder`: in-memory recorder
//! - `MemoryStore` / `MemoryDirectory`: in-memory Media Store and Event Directory
//! - `CollectingDelegate`: delegate that records every callback
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use kiosk_capture_core::{CaptureMode, ControllerConfig};
//! use kiosk_capture_sim::{MemoryDirectory, MemoryStore, ScriptedCamera, SimController, SyntheticSink};
//!
//! let controller = SimController::new(
//!     ScriptedCamera::new(),
//!     SyntheticSink::default(),
//!     MemoryStore::new(),
//!     Arc::new(MemoryDirectory::bound("event-1")),
//!     ControllerConfig::default(),
//! )?;
//! controller.activate(CaptureMode::Photo).await?;
//! controller.wait_ready().await?;
//! let burst = controller.capture_burst(4).await?;
//! ```

pub mod camera;
pub mod delegate;
pub mod directory;
pub mod recorder;
pub mod sink;
pub mod store;
pub mod stream;

pub use camera::{Attempt, RecorderSupport, ScriptedCamera};
pub use delegate::{CollectingDelegate, DelegateEvent};
pub use directory::MemoryDirectory;
pub use recorder::{RecorderLog, SimRecorder};
pub use sink::{SignalMode, SyntheticSink};
pub use store::MemoryStore;
pub use stream::SimStream;

/// A controller wired to the synthetic backend.
pub type SimController = kiosk_capture_core::CaptureController<ScriptedCamera, SyntheticSink, MemoryStore>;
