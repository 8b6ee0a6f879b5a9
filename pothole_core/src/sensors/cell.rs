// pothole_core/src/sensors/cell.rs

use parking_lot::RwLock;
use std::sync::Arc;

/// A single-slot "latest value" cell shared between a producer and the
/// synchronizer. Readers copy the value out, so the lock is only ever held
/// for the duration of a `Copy`.
#[derive(Debug)]
pub struct LatestCell<T: Copy> {
    slot: RwLock<Option<T>>,
}

impl<T: Copy> Default for LatestCell<T> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<T: Copy> LatestCell<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn publish(&self, value: T) {
        *self.slot.write() = Some(value);
    }

    pub fn load(&self) -> Option<T> {
        *self.slot.read()
    }

    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.read().is_none()
    }
}
