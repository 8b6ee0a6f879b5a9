// pothole_core/src/sensors/motion.rs

use super::cell::LatestCell;
use crate::error::CoreError;
use crate::filters::AxisFilter;
use crate::messages::{FilteredAxisSample, RawAxisSample};
use crate::types::{MotionSource, STANDARD_GRAVITY};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// The unit an accelerometer feed delivers. The core works in g, so
/// m/s^2 feeds are normalized before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccelUnit {
    #[default]
    StandardGravity,
    MetersPerSecondSquared,
}

impl AccelUnit {
    fn scale(&self) -> f32 {
        match self {
            AccelUnit::StandardGravity => 1.0,
            AccelUnit::MetersPerSecondSquared => 1.0 / STANDARD_GRAVITY,
        }
    }
}

/// Ingestion point for one motion sensor (accelerometer or gyroscope).
///
/// The platform callback calls [`MotionChannel::push`]; the channel filters the
/// reading and publishes the result into its latest-value cell, which is the
/// only state the synchronizer ever reads.
#[derive(Debug)]
pub struct MotionChannel {
    source: MotionSource,
    scale: f32,
    filter: Mutex<AxisFilter>,
    latest: Arc<LatestCell<FilteredAxisSample>>,
    listening: AtomicBool,
    received: AtomicU64,
}

impl MotionChannel {
    pub fn accelerometer(alpha: f32, unit: AccelUnit) -> Result<Self, CoreError> {
        Self::new(MotionSource::Accelerometer, alpha, unit.scale())
    }

    pub fn gyroscope(alpha: f32) -> Result<Self, CoreError> {
        Self::new(MotionSource::Gyroscope, alpha, 1.0)
    }

    fn new(source: MotionSource, alpha: f32, scale: f32) -> Result<Self, CoreError> {
        Ok(Self {
            source,
            scale,
            filter: Mutex::new(AxisFilter::new(alpha)?),
            latest: LatestCell::shared(),
            listening: AtomicBool::new(false),
            received: AtomicU64::new(0),
        })
    }

    pub fn source(&self) -> MotionSource {
        self.source
    }

    /// Feeds one raw reading. Returns the filtered value that was published,
    /// or `None` when the channel is not listening or the reading is unusable.
    ///
    /// The filter lock is held from the listening check through the publish,
    /// so a push racing [`MotionChannel::stop_listening`] either lands before
    /// the cell is cleared or not at all.
    pub fn push(&self, raw: RawAxisSample) -> Option<FilteredAxisSample> {
        let mut filter = self.filter.lock();
        if !self.listening.load(Ordering::Acquire) {
            return None;
        }
        if !raw.is_finite() {
            tracing::debug!(
                source = self.source.as_str(),
                ?raw,
                "Dropping non-finite sensor reading"
            );
            return None;
        }

        let normalized = RawAxisSample {
            values: raw.values * self.scale,
            timestamp_ns: raw.timestamp_ns,
        };
        let filtered = filter.update(&normalized);
        self.latest.publish(filtered);
        self.received.fetch_add(1, Ordering::Relaxed);
        Some(filtered)
    }

    pub fn set_filter_coefficient(&self, alpha: f32) -> Result<(), CoreError> {
        self.filter.lock().set_coefficient(alpha)
    }

    pub fn filter_coefficient(&self) -> f32 {
        self.filter.lock().coefficient()
    }

    pub fn latest(&self) -> Option<FilteredAxisSample> {
        self.latest.load()
    }

    pub(crate) fn cell(&self) -> Arc<LatestCell<FilteredAxisSample>> {
        Arc::clone(&self.latest)
    }

    pub fn samples_received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }

    pub(crate) fn start_listening(&self) {
        let _filter = self.filter.lock();
        self.listening.store(true, Ordering::Release);
    }

    /// Stops accepting readings and forgets the published value so a later
    /// restart does not synthesize samples from stale data. Filter state is kept.
    pub(crate) fn stop_listening(&self) {
        let _filter = self.filter.lock();
        self.listening.store(false, Ordering::Release);
        self.latest.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ignores_samples_until_listening() {
        let channel = MotionChannel::gyroscope(1.0).unwrap();
        assert!(channel.push(RawAxisSample::new(1.0, 2.0, 3.0, 0)).is_none());
        assert!(channel.latest().is_none());

        channel.start_listening();
        let out = channel.push(RawAxisSample::new(1.0, 2.0, 3.0, 0)).unwrap();
        assert_eq!(out.values, crate::types::Axis3::new(1.0, 2.0, 3.0));
        assert_eq!(channel.latest(), Some(out));
        assert_eq!(channel.samples_received(), 1);
    }

    #[test]
    fn metric_accelerometer_is_normalized_to_g() {
        let channel =
            MotionChannel::accelerometer(1.0, AccelUnit::MetersPerSecondSquared).unwrap();
        channel.start_listening();
        let out = channel
            .push(RawAxisSample::new(0.0, 0.0, STANDARD_GRAVITY, 5))
            .unwrap();
        assert_abs_diff_eq!(out.values.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn non_finite_readings_leave_filter_untouched() {
        let channel = MotionChannel::accelerometer(0.5, AccelUnit::StandardGravity).unwrap();
        channel.start_listening();
        channel.push(RawAxisSample::new(2.0, 2.0, 2.0, 0));
        assert!(channel
            .push(RawAxisSample::new(f32::NAN, 0.0, 0.0, 1))
            .is_none());
        let out = channel.push(RawAxisSample::new(2.0, 2.0, 2.0, 2)).unwrap();
        assert_abs_diff_eq!(out.values.x, 1.5);
    }

    #[test]
    fn stop_listening_clears_latest_value() {
        let channel = MotionChannel::gyroscope(0.8).unwrap();
        channel.start_listening();
        channel.push(RawAxisSample::new(0.1, 0.1, 0.1, 0));
        channel.stop_listening();
        assert!(channel.latest().is_none());
        assert!(!channel.is_listening());
    }

    #[test]
    fn concurrent_push_never_survives_stop_listening() {
        use std::thread;

        for _ in 0..200 {
            let channel = Arc::new(MotionChannel::gyroscope(0.8).unwrap());
            channel.start_listening();
            let done = Arc::new(AtomicBool::new(false));
            let pusher = {
                let channel = Arc::clone(&channel);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    while !done.load(Ordering::Acquire) {
                        channel.push(RawAxisSample::new(0.1, 0.2, 0.3, 0));
                    }
                })
            };
            while channel.latest().is_none() {
                thread::yield_now();
            }

            channel.stop_listening();
            assert!(channel.latest().is_none());
            done.store(true, Ordering::Release);
            pusher.join().unwrap();
            assert!(channel.latest().is_none());
        }
    }

    #[test]
    fn rejects_bad_coefficient() {
        let channel = MotionChannel::gyroscope(0.8).unwrap();
        assert!(channel.set_filter_coefficient(-1.0).is_err());
        assert_eq!(channel.filter_coefficient(), 0.8);
        channel.set_filter_coefficient(0.25).unwrap();
        assert_eq!(channel.filter_coefficient(), 0.25);
    }
}
