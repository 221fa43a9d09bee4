#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use kiosk_capture_core::{ControllerConfig, FrameDimensions, RuntimeEnvironment};
use kiosk_capture_sim::{CollectingDelegate, MemoryDirectory, MemoryStore, ScriptedCamera, SimController, SyntheticSink};

/// A controller on the synthetic backend, with handles to every fake.
pub struct Rig {
    pub controller: SimController,
    pub camera: ScriptedCamera,
    pub sink: SyntheticSink,
    pub store: MemoryStore,
    pub directory: Arc<MemoryDirectory>,
    pub delegate: Arc<CollectingDelegate>,
}

impl Rig {
    pub fn new(name: &str) -> Self {
        Self::with_config(test_config(name))
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        Self::build(config, MemoryDirectory::bound("event-1"))
    }

    pub fn unbound(name: &str) -> Self {
        Self::build(test_config(name), MemoryDirectory::unbound())
    }

    fn build(config: ControllerConfig, directory: MemoryDirectory) -> Self {
        let camera = ScriptedCamera::new();
        let sink = SyntheticSink::new(FrameDimensions::new(320, 240));
        let store = MemoryStore::new();
        let directory = Arc::new(directory);
        let delegate = Arc::new(CollectingDelegate::new());

        let controller = SimController::new(
            camera.clone(),
            sink.clone(),
            store.clone(),
            directory.clone(),
            config,
        )
        .unwrap();
        controller.set_delegate(delegate.clone());

        Self {
            controller,
            camera,
            sink,
            store,
            directory,
            delegate,
        }
    }

    pub fn cleanup(&self) {
        std::fs::remove_dir_all(self.controller.local_cache().root()).ok();
    }
}

/// Development delays and a cache directory private to the test.
pub fn test_config(name: &str) -> ControllerConfig {
    ControllerConfig {
        environment: RuntimeEnvironment::Development,
        cache_directory: cache_dir(name),
        ..Default::default()
    }
}

fn cache_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("kiosk_sim_{}_{}", name, std::process::id()))
}
