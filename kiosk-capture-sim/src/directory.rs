use kiosk_capture_core::{DestinationId, EventDirectory};
use parking_lot::Mutex;

/// Event directory whose binding the test flips at will.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    destination: Mutex<Option<DestinationId>>,
}

impl MemoryDirectory {
    pub fn bound(destination: impl Into<String>) -> Self {
        Self {
            destination: Mutex::new(Some(DestinationId::new(destination))),
        }
    }

    pub fn unbound() -> Self {
        Self::default()
    }

    pub fn bind(&self, destination: impl Into<String>) {
        *self.destination.lock() = Some(DestinationId::new(destination));
    }

    pub fn unbind(&self) {
        *self.destination.lock() = None;
    }
}

impl EventDirectory for MemoryDirectory {
    fn current_destination(&self) -> Option<DestinationId> {
        self.destination.lock().clone()
    }
}
