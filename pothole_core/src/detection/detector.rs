// pothole_core/src/detection/detector.rs

use super::policy::{DetectionPolicy, SeverityTiers};
use crate::classifier::{Classification, ClassifierChain, ClassifierKind};
use crate::config::{DetectorConfig, TickerMode};
use crate::error::CoreError;
use crate::features::FeatureVector;
use crate::filters::validate_coefficient;
use crate::messages::{CombinedSample, PotholeEvent};
use crate::sensors::{LatestCell, LocationChannel, MotionChannel};
use crate::synchronizer::SampleSynchronizer;
use crate::types::now_millis;
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Upper bound on a single sleep of the tick thread, so `stop` never waits
/// a full (possibly long) period for the loop to notice.
const MAX_SLEEP_SLICE: Duration = Duration::from_millis(5);

/// Everything one synchronizer tick produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub sample: CombinedSample,
    pub features: FeatureVector,
    pub classification: Classification,
    pub event: Option<PotholeEvent>,
}

/// Counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetectorStats {
    /// Synchronizer ticks, including those that produced no sample.
    pub ticks: u64,
    pub samples: u64,
    pub events: u64,
    /// Events not delivered because a subscriber's buffer was full.
    pub dropped_events: u64,
    pub classified_by_model: u64,
    pub classified_by_threshold: u64,
    pub classified_by_fixed_rule: u64,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    samples: AtomicU64,
    events: AtomicU64,
    dropped_events: AtomicU64,
    by_model: AtomicU64,
    by_threshold: AtomicU64,
    by_fixed_rule: AtomicU64,
}

impl Counters {
    fn record_classification(&self, kind: ClassifierKind) {
        let counter = match kind {
            ClassifierKind::LearnedModel => &self.by_model,
            ClassifierKind::ThresholdConfig => &self.by_threshold,
            ClassifierKind::FixedRule => &self.by_fixed_rule,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DetectorStats {
        DetectorStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            samples: self.samples.load(Ordering::Relaxed),
            events: self.events.load(Ordering::Relaxed),
            dropped_events: self.dropped_events.load(Ordering::Relaxed),
            classified_by_model: self.by_model.load(Ordering::Relaxed),
            classified_by_threshold: self.by_threshold.load(Ordering::Relaxed),
            classified_by_fixed_rule: self.by_fixed_rule.load(Ordering::Relaxed),
        }
    }
}

/// State shared between the caller-facing handle and the tick thread.
#[derive(Debug)]
struct Shared {
    accel: Arc<MotionChannel>,
    gyro: Arc<MotionChannel>,
    location: Arc<LocationChannel>,
    synchronizer: SampleSynchronizer,
    classifier: ClassifierChain,
    policy: RwLock<DetectionPolicy>,
    ticker: TickerMode,
    running: AtomicBool,
    subscribers: Mutex<Vec<Sender<PotholeEvent>>>,
    subscriber_capacity: usize,
    latest_event: LatestCell<PotholeEvent>,
    counters: Counters,
}

impl Shared {
    fn process_tick(&self, now_ms: i64) -> Option<Tick> {
        self.counters.ticks.fetch_add(1, Ordering::Relaxed);
        let sample = self.synchronizer.tick(now_ms)?;
        self.counters.samples.fetch_add(1, Ordering::Relaxed);

        let features = FeatureVector::from_sample(&sample);
        let classification = self.classifier.evaluate(&features);
        self.counters.record_classification(classification.kind);

        let event = self.policy.read().evaluate(&sample, classification.confidence);
        if let Some(event) = &event {
            self.counters.events.fetch_add(1, Ordering::Relaxed);
            self.latest_event.publish(*event);
            tracing::debug!(
                severity = %event.severity,
                confidence = event.confidence,
                classifier = classification.kind.as_str(),
                latitude = event.latitude,
                longitude = event.longitude,
                "Pothole detected"
            );
            self.dispatch(event);
        }

        Some(Tick {
            sample,
            features,
            classification,
            event,
        })
    }

    fn dispatch(&self, event: &PotholeEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| match tx.try_send(*event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.counters.dropped_events.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    /// The tick loop. Checks the running flag before every tick, so a tick
    /// in flight when `stop` is called always completes.
    fn run(&self) {
        tracing::debug!("Synchronizer loop started");
        let mut next_tick = Instant::now();
        while self.running.load(Ordering::Acquire) {
            let now = Instant::now();
            if now < next_tick {
                thread::sleep((next_tick - now).min(MAX_SLEEP_SLICE));
                continue;
            }

            self.process_tick(now_millis());

            let period = self.synchronizer.period();
            next_tick += period;
            let after = Instant::now();
            if next_tick < after {
                // Overran: skip the missed ticks instead of bursting to catch up.
                tracing::trace!(?period, "Synchronizer tick overran its period");
                next_tick = after + period;
            }
        }
        tracing::debug!("Synchronizer loop stopped");
    }
}

/// The detection pipeline: sensor channels, synchronizer, classifier chain and
/// detection policy behind an Idle/Active state machine.
///
/// `start` and `stop` are idempotent. While active, every combined sample is
/// classified and at most one [`PotholeEvent`] is emitted per sample, both to
/// subscribers and to the latest-event cell.
#[derive(Debug)]
pub struct Detector {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Detector {
    /// Builds a detector, loading classifier artifacts from the configured paths.
    pub fn new(config: &DetectorConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let classifier = ClassifierChain::from_config(&config.classifier);
        Self::with_classifier(config, classifier)
    }

    /// Builds a detector around an already assembled classifier chain.
    pub fn with_classifier(
        config: &DetectorConfig,
        classifier: ClassifierChain,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let accel = Arc::new(MotionChannel::accelerometer(
            config.filter_coefficient,
            config.accel_unit,
        )?);
        let gyro = Arc::new(MotionChannel::gyroscope(config.filter_coefficient)?);
        let location = Arc::new(LocationChannel::new());

        let synchronizer = SampleSynchronizer::new(accel.cell(), gyro.cell(), location.cell());
        synchronizer.set_sampling_rate(config.sampling_rate_hz)?;

        let policy = DetectionPolicy::new(config.sensitivity_threshold, config.severity)?;

        tracing::info!(
            classifiers = ?classifier.kinds().iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            sampling_rate_hz = config.sampling_rate_hz,
            sensitivity = config.sensitivity_threshold,
            "Detector configured"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                accel,
                gyro,
                location,
                synchronizer,
                classifier,
                policy: RwLock::new(policy),
                ticker: config.ticker,
                running: AtomicBool::new(false),
                subscribers: Mutex::new(Vec::new()),
                subscriber_capacity: config.subscriber_capacity,
                latest_event: LatestCell::new(),
                counters: Counters::default(),
            }),
            worker: Mutex::new(None),
        })
    }

    // --- Sensor feeds ---

    pub fn accelerometer(&self) -> Arc<MotionChannel> {
        Arc::clone(&self.shared.accel)
    }

    pub fn gyroscope(&self) -> Arc<MotionChannel> {
        Arc::clone(&self.shared.gyro)
    }

    pub fn location(&self) -> Arc<LocationChannel> {
        Arc::clone(&self.shared.location)
    }

    // --- Lifecycle ---

    /// Idle -> Active. Starting an active detector does nothing.
    pub fn start(&self) -> Result<(), CoreError> {
        let mut worker = self.worker.lock();
        if self.shared.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.shared.accel.start_listening();
        self.shared.gyro.start_listening();
        self.shared.location.start_listening();

        if self.shared.ticker == TickerMode::Thread {
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name("pothole-synchronizer".into())
                .spawn(move || shared.run());
            match spawned {
                Ok(handle) => *worker = Some(handle),
                Err(e) => {
                    self.shared.running.store(false, Ordering::Release);
                    self.release_sensors();
                    return Err(CoreError::WorkerSpawn(e.to_string()));
                }
            }
        }

        tracing::info!(period = ?self.shared.synchronizer.period(), "Detection started");
        Ok(())
    }

    /// Active -> Idle. Waits for an in-flight tick to finish. Stopping an idle
    /// detector does nothing.
    pub fn stop(&self) {
        let mut worker = self.worker.lock();
        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return;
        }

        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                tracing::error!("Synchronizer thread panicked");
            }
        }
        self.release_sensors();
        tracing::info!(stats = ?self.stats(), "Detection stopped");
    }

    fn release_sensors(&self) {
        self.shared.accel.stop_listening();
        self.shared.gyro.stop_listening();
        self.shared.location.stop_listening();
        self.shared.synchronizer.clear();
    }

    pub fn is_active(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Runs one synchronizer tick on the caller's thread. Only
    /// [`TickerMode::Manual`] detectors step; returns `None` otherwise, while
    /// idle, or when either motion sensor has not published yet.
    pub fn step(&self, now_ms: i64) -> Option<Tick> {
        if self.shared.ticker != TickerMode::Manual || !self.is_active() {
            return None;
        }
        self.shared.process_tick(now_ms)
    }

    // --- Runtime configuration ---

    /// Applies a new coefficient to both motion filters. Rejected values
    /// leave both filters untouched.
    pub fn set_filter_coefficient(&self, alpha: f32) -> Result<(), CoreError> {
        validate_coefficient(alpha)?;
        self.shared.accel.set_filter_coefficient(alpha)?;
        self.shared.gyro.set_filter_coefficient(alpha)
    }

    pub fn set_sampling_rate(&self, hz: u32) -> Result<Duration, CoreError> {
        self.shared.synchronizer.set_sampling_rate(hz)
    }

    pub fn sampling_period(&self) -> Duration {
        self.shared.synchronizer.period()
    }

    pub fn set_sensitivity_threshold(&self, value: f32) -> Result<(), CoreError> {
        self.shared.policy.write().set_sensitivity_threshold(value)
    }

    pub fn sensitivity_threshold(&self) -> f32 {
        self.shared.policy.read().sensitivity_threshold()
    }

    pub fn set_severity_tiers(&self, tiers: SeverityTiers) -> Result<(), CoreError> {
        self.shared.policy.write().set_tiers(tiers)
    }

    pub fn severity_tiers(&self) -> SeverityTiers {
        self.shared.policy.read().tiers()
    }

    pub fn classifier_kinds(&self) -> Vec<ClassifierKind> {
        self.shared.classifier.kinds()
    }

    // --- Outputs ---

    /// Registers a new event stream. Each subscriber gets its own bounded
    /// buffer; dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<PotholeEvent> {
        let (tx, rx) = bounded(self.shared.subscriber_capacity);
        self.shared.subscribers.lock().push(tx);
        rx
    }

    pub fn latest_event(&self) -> Option<PotholeEvent> {
        self.shared.latest_event.load()
    }

    pub fn latest_sample(&self) -> Option<CombinedSample> {
        self.shared.synchronizer.latest()
    }

    pub fn stats(&self) -> DetectorStats {
        self.shared.counters.snapshot()
    }
}

impl Drop for Detector {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{LocationFix, RawAxisSample, Severity};

    fn manual_config() -> DetectorConfig {
        DetectorConfig {
            filter_coefficient: 1.0,
            ticker: TickerMode::Manual,
            subscriber_capacity: 2,
            ..Default::default()
        }
    }

    fn feed_bump(detector: &Detector) {
        detector
            .accelerometer()
            .push(RawAxisSample::new(0.0, 0.0, 11.8, 0));
        detector
            .gyroscope()
            .push(RawAxisSample::new(0.0, 0.0, 0.0, 0));
        detector.location().push(LocationFix {
            latitude: 19.4326,
            longitude: -99.1332,
            speed: 8.0,
            ..Default::default()
        });
    }

    #[test]
    fn idle_detector_ignores_input_and_ticks() {
        let detector = Detector::new(&manual_config()).unwrap();
        feed_bump(&detector);
        assert!(detector.step(1).is_none());
        assert!(detector.accelerometer().latest().is_none());
        assert_eq!(detector.stats(), DetectorStats::default());
    }

    #[test]
    fn manual_step_classifies_and_emits() {
        let detector = Detector::new(&manual_config()).unwrap();
        let events = detector.subscribe();
        detector.start().unwrap();
        feed_bump(&detector);

        let tick = detector.step(42).unwrap();
        assert_eq!(tick.classification.kind, ClassifierKind::FixedRule);
        let event = tick.event.unwrap();
        assert_eq!(event.severity, Severity::Low);
        assert_eq!(event.timestamp_ms, 42);
        assert_eq!(events.try_recv().unwrap(), event);
        assert_eq!(detector.latest_event(), Some(event));
        assert_eq!(detector.latest_sample(), Some(tick.sample));

        let stats = detector.stats();
        assert_eq!((stats.ticks, stats.samples, stats.events), (1, 1, 1));
        assert_eq!(stats.classified_by_fixed_rule, 1);
    }

    #[test]
    fn full_subscribers_drop_events_and_closed_ones_are_pruned() {
        let detector = Detector::new(&manual_config()).unwrap();
        let slow = detector.subscribe();
        let closed = detector.subscribe();
        drop(closed);
        detector.start().unwrap();
        feed_bump(&detector);

        for t in 0..3 {
            detector.step(t);
        }
        assert_eq!(slow.len(), 2);
        assert_eq!(detector.stats().dropped_events, 1);
        assert_eq!(detector.shared.subscribers.lock().len(), 1);
    }

    #[test]
    fn stop_clears_sensor_state() {
        let detector = Detector::new(&manual_config()).unwrap();
        detector.start().unwrap();
        feed_bump(&detector);
        assert!(detector.step(1).is_some());

        detector.stop();
        detector.stop();
        assert!(!detector.is_active());
        assert!(detector.latest_sample().is_none());

        detector.start().unwrap();
        assert!(detector.step(2).is_none());
    }

    #[test]
    fn pushes_racing_stop_leave_no_stale_readings() {
        for _ in 0..100 {
            let detector = Detector::new(&manual_config()).unwrap();
            detector.start().unwrap();
            let (accel, gyro) = (detector.accelerometer(), detector.gyroscope());
            let pusher = thread::spawn(move || {
                while accel.push(RawAxisSample::new(0.0, 0.0, 11.8, 0)).is_some() {
                    gyro.push(RawAxisSample::new(0.0, 0.0, 0.0, 0));
                }
            });
            while detector.accelerometer().latest().is_none() {
                thread::yield_now();
            }

            detector.stop();
            pusher.join().unwrap();
            assert!(detector.accelerometer().latest().is_none());
            assert!(detector.gyroscope().latest().is_none());

            detector.start().unwrap();
            assert!(detector.step(1).is_none());
        }
    }

    #[test]
    fn step_is_a_no_op_for_threaded_detectors() {
        let detector = Detector::new(&DetectorConfig::default()).unwrap();
        detector.start().unwrap();
        feed_bump(&detector);
        assert!(detector.step(1).is_none());
        detector.stop();
    }

    #[test]
    fn second_start_keeps_the_same_worker() {
        let detector = Detector::new(&DetectorConfig::default()).unwrap();
        detector.stop();
        detector.start().unwrap();
        let first = detector.worker.lock().as_ref().map(|h| h.thread().id());
        detector.start().unwrap();
        let second = detector.worker.lock().as_ref().map(|h| h.thread().id());
        assert!(first.is_some());
        assert_eq!(first, second);

        detector.stop();
        assert!(detector.worker.lock().is_none());
    }

    #[test]
    fn rejected_coefficient_changes_neither_filter() {
        let detector = Detector::new(&DetectorConfig::default()).unwrap();
        assert!(detector.set_filter_coefficient(1.5).is_err());
        assert_eq!(detector.accelerometer().filter_coefficient(), 0.8);
        assert_eq!(detector.gyroscope().filter_coefficient(), 0.8);

        detector.set_filter_coefficient(0.3).unwrap();
        assert_eq!(detector.gyroscope().filter_coefficient(), 0.3);
    }
}
