// pothole_core/src/synchronizer.rs

use crate::error::CoreError;
use crate::messages::{CombinedSample, FilteredAxisSample, LocationFix};
use crate::sensors::LatestCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_SAMPLING_RATE_HZ: u32 = 50;
/// Highest rate that still yields a whole-millisecond tick period.
pub const MAX_SAMPLING_RATE_HZ: u32 = 1000;

/// Converts a sampling rate into a tick period in whole milliseconds.
pub fn period_for_rate(hz: u32) -> Result<Duration, CoreError> {
    if hz == 0 || hz > MAX_SAMPLING_RATE_HZ {
        return Err(CoreError::invalid(
            "hz",
            format!("sampling rate must be within 1..={MAX_SAMPLING_RATE_HZ} Hz, got {hz}"),
        ));
    }
    Ok(Duration::from_millis(u64::from(1000 / hz)))
}

/// Polls the latest value of each source on a fixed period and merges them into
/// a [`CombinedSample`]. The combined-sample rate is decoupled from the arrival
/// rate of the sources: a tick only ever sees the most recent reading of each.
#[derive(Debug)]
pub struct SampleSynchronizer {
    accel: Arc<LatestCell<FilteredAxisSample>>,
    gyro: Arc<LatestCell<FilteredAxisSample>>,
    location: Arc<LatestCell<LocationFix>>,
    latest: LatestCell<CombinedSample>,
    period_ms: AtomicU64,
}

impl SampleSynchronizer {
    pub fn new(
        accel: Arc<LatestCell<FilteredAxisSample>>,
        gyro: Arc<LatestCell<FilteredAxisSample>>,
        location: Arc<LatestCell<LocationFix>>,
    ) -> Self {
        let default_period = 1000 / u64::from(DEFAULT_SAMPLING_RATE_HZ);
        Self {
            accel,
            gyro,
            location,
            latest: LatestCell::new(),
            period_ms: AtomicU64::new(default_period),
        }
    }

    pub fn set_sampling_rate(&self, hz: u32) -> Result<Duration, CoreError> {
        let period = period_for_rate(hz)?;
        self.period_ms
            .store(period.as_millis() as u64, Ordering::Relaxed);
        Ok(period)
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms.load(Ordering::Relaxed))
    }

    /// One synchronization step. Produces a sample only when both motion
    /// sensors have published; a missing location fix is zero-filled.
    pub fn tick(&self, now_ms: i64) -> Option<CombinedSample> {
        let accel = self.accel.load()?;
        let gyro = self.gyro.load()?;
        let location = self.location.load();

        let sample = CombinedSample::new(&accel, &gyro, location.as_ref(), now_ms);
        self.latest.publish(sample);
        Some(sample)
    }

    pub fn latest(&self) -> Option<CombinedSample> {
        self.latest.load()
    }

    pub(crate) fn clear(&self) {
        self.latest.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::RawAxisSample;

    struct Cells {
        accel: Arc<LatestCell<FilteredAxisSample>>,
        gyro: Arc<LatestCell<FilteredAxisSample>>,
        location: Arc<LatestCell<LocationFix>>,
    }

    fn synchronizer() -> (SampleSynchronizer, Cells) {
        let cells = Cells {
            accel: LatestCell::shared(),
            gyro: LatestCell::shared(),
            location: LatestCell::shared(),
        };
        let sync = SampleSynchronizer::new(
            Arc::clone(&cells.accel),
            Arc::clone(&cells.gyro),
            Arc::clone(&cells.location),
        );
        (sync, cells)
    }

    #[test]
    fn default_period_is_twenty_millis() {
        let (sync, _) = synchronizer();
        assert_eq!(sync.period(), Duration::from_millis(20));
    }

    #[test]
    fn sampling_rate_converts_to_period() {
        let (sync, _) = synchronizer();
        assert_eq!(sync.set_sampling_rate(100).unwrap(), Duration::from_millis(10));
        assert_eq!(sync.period(), Duration::from_millis(10));
        // Integer division, as in 1000 / 3.
        assert_eq!(sync.set_sampling_rate(3).unwrap(), Duration::from_millis(333));

        assert!(sync.set_sampling_rate(0).is_err());
        assert!(sync.set_sampling_rate(5_000).is_err());
        assert_eq!(sync.period(), Duration::from_millis(333));
    }

    #[test]
    fn tick_needs_both_motion_sources() {
        let (sync, cells) = synchronizer();
        assert!(sync.tick(1).is_none());

        cells.accel.publish(RawAxisSample::new(0.0, 0.0, 1.0, 0));
        assert!(sync.tick(2).is_none());
        assert!(sync.latest().is_none());

        cells.gyro.publish(RawAxisSample::new(0.0, 0.0, 0.0, 0));
        let sample = sync.tick(3).unwrap();
        assert_eq!(sample.timestamp_ms, 3);
        assert_eq!(sync.latest(), Some(sample));
    }

    #[test]
    fn tick_zero_fills_missing_location_and_uses_latest_fix() {
        let (sync, cells) = synchronizer();
        cells.accel.publish(RawAxisSample::new(0.0, 0.0, 1.0, 0));
        cells.gyro.publish(RawAxisSample::new(0.0, 0.0, 0.0, 0));

        let sample = sync.tick(10).unwrap();
        assert_eq!((sample.latitude, sample.longitude, sample.speed), (0.0, 0.0, 0.0));

        for speed in [3.0, 7.0] {
            cells.location.publish(LocationFix {
                latitude: 1.0,
                longitude: 2.0,
                speed,
                ..Default::default()
            });
        }
        let sample = sync.tick(30).unwrap();
        assert_eq!(sample.speed, 7.0);
        assert_eq!(sample.latitude, 1.0);
    }
}
