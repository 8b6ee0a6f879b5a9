// pothole_core/src/sensors/location.rs

use super::cell::LatestCell;
use crate::messages::LocationFix;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Ingestion point for device location fixes. A feed that never delivers
/// is a valid steady state; the synchronizer then zero-fills location fields.
#[derive(Debug, Default)]
pub struct LocationChannel {
    latest: Arc<LatestCell<LocationFix>>,
    // Held across the check and the publish so `stop_listening` cannot
    // interleave with an in-flight push.
    listening: Mutex<bool>,
    received: AtomicU64,
}

impl LocationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a fix. Returns `false` if the channel is not listening or the
    /// coordinates are not finite.
    pub fn push(&self, fix: LocationFix) -> bool {
        let listening = self.listening.lock();
        if !*listening {
            return false;
        }
        if !fix.latitude.is_finite() || !fix.longitude.is_finite() || !fix.speed.is_finite() {
            tracing::debug!(?fix, "Dropping location fix with non-finite fields");
            return false;
        }
        self.latest.publish(fix);
        self.received.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn latest(&self) -> Option<LocationFix> {
        self.latest.load()
    }

    pub(crate) fn cell(&self) -> Arc<LatestCell<LocationFix>> {
        Arc::clone(&self.latest)
    }

    pub fn fixes_received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn is_listening(&self) -> bool {
        *self.listening.lock()
    }

    pub(crate) fn start_listening(&self) {
        *self.listening.lock() = true;
    }

    pub(crate) fn stop_listening(&self) {
        let mut listening = self.listening.lock();
        *listening = false;
        self.latest.clear();
    }
}
