// pothole_sim/src/simulation/runner.rs

use pothole_core::config::TickerMode;
use pothole_core::detection::{Detector, DetectorStats};
use pothole_core::messages::{PotholeEvent, Severity};
use pothole_core::types::now_millis;
use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};

use crate::simulation::config::{Pothole, ScenarioConfig};
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::sensors::{GpsSimulator, ImuSimulator};

/// Wall-clock origin of the virtual clock in stepped mode, so event
/// timestamps look like real ones and runs stay reproducible.
pub const SIM_EPOCH_MS: i64 = 1_700_000_000_000;

/// Longest single sleep of the realtime feeder loop.
const FEEDER_SLEEP_SLICE: Duration = Duration::from_millis(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Virtual clock; the runner ticks the detector itself. Deterministic for a given seed.
    Stepped,
    /// Wall clock; the detector's own thread ticks while the runner feeds sensors.
    Realtime,
}

// =========================================================================
// == Run Report ==
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub mode: RunMode,
    pub duration_seconds: f32,
    pub events: Vec<PotholeEvent>,
    pub events_by_severity: BTreeMap<Severity, usize>,
    pub potholes: usize,
    /// Potholes with at least one event inside their match window.
    pub detected_potholes: usize,
    /// Events not inside any pothole's match window.
    pub unmatched_events: usize,
    pub stats: DetectorStats,
}

impl RunReport {
    fn new(
        mode: RunMode,
        scenario: &ScenarioConfig,
        origin_ms: i64,
        events: Vec<PotholeEvent>,
        stats: DetectorStats,
    ) -> Self {
        let window = scenario.simulation.match_window_ms;
        let potholes = &scenario.road.potholes;
        let matches = |event: &PotholeEvent, pothole: &Pothole| {
            let start = origin_ms + pothole.start_ms();
            let end = origin_ms + pothole.end_ms() + window;
            (start..=end).contains(&event.timestamp_ms)
        };

        let detected_potholes = potholes
            .iter()
            .filter(|p| events.iter().any(|e| matches(e, p)))
            .count();
        let unmatched_events = events
            .iter()
            .filter(|e| !potholes.iter().any(|p| matches(e, p)))
            .count();

        let mut events_by_severity = BTreeMap::new();
        for event in &events {
            *events_by_severity.entry(event.severity).or_insert(0) += 1;
        }

        Self {
            mode,
            duration_seconds: scenario.simulation.duration_seconds,
            events,
            events_by_severity,
            potholes: potholes.len(),
            detected_potholes,
            unmatched_events,
            stats,
        }
    }

    pub fn missed_potholes(&self) -> usize {
        self.potholes - self.detected_potholes
    }

    pub fn log_summary(&self) {
        tracing::info!(
            "Run finished ({:?}, {:.1} s): {} event(s), {}/{} pothole(s) detected, {} unmatched event(s)",
            self.mode,
            self.duration_seconds,
            self.events.len(),
            self.detected_potholes,
            self.potholes,
            self.unmatched_events
        );
        for (severity, count) in &self.events_by_severity {
            tracing::info!("  {severity:<6} {count}");
        }
        tracing::info!(
            "  ticks={} samples={} dropped={} by_model={} by_threshold={} by_fixed_rule={}",
            self.stats.ticks,
            self.stats.samples,
            self.stats.dropped_events,
            self.stats.classified_by_model,
            self.stats.classified_by_threshold,
            self.stats.classified_by_fixed_rule
        );
        if self.missed_potholes() > 0 {
            tracing::warn!("{} pothole(s) were not detected", self.missed_potholes());
        }
    }
}

// =========================================================================
// == Runner ==
// =========================================================================

/// Drives a [`Detector`] with synthetic sensor data for one scenario.
pub struct SimulationRunner {
    scenario: ScenarioConfig,
    rng: SimulationRng,
    imu: ImuSimulator,
    gps: GpsSimulator,
}

impl SimulationRunner {
    pub fn new(scenario: ScenarioConfig) -> anyhow::Result<Self> {
        let rng = SimulationRng::new(scenario.simulation.seed);
        let imu = ImuSimulator::new(&scenario.sensors.imu, &scenario.road)?;
        let gps = GpsSimulator::new(&scenario.sensors.gps, &scenario.vehicle)?;
        Ok(Self {
            scenario,
            rng,
            imu,
            gps,
        })
    }

    pub fn run(&mut self, mode: RunMode) -> anyhow::Result<RunReport> {
        match mode {
            RunMode::Stepped => self.run_stepped(),
            RunMode::Realtime => self.run_realtime(),
        }
    }

    fn first_gps_ms(&self) -> f64 {
        f64::from(self.scenario.sensors.gps.start_after_seconds) * 1000.0
    }

    /// Advances a virtual millisecond clock, feeding each sensor at its own
    /// rate and ticking the detector at its sampling period.
    fn run_stepped(&mut self) -> anyhow::Result<RunReport> {
        let mut config = self.scenario.detector.clone();
        config.ticker = TickerMode::Manual;
        let detector = Detector::new(&config)?;
        let (accel, gyro, location) = (
            detector.accelerometer(),
            detector.gyroscope(),
            detector.location(),
        );

        let duration_ms = (self.scenario.simulation.duration_seconds * 1000.0).round() as i64;
        let imu_period_ms = self.imu.period().as_secs_f64() * 1000.0;
        let gps_period_ms = self.gps.period().as_secs_f64() * 1000.0;
        let tick_ms = (detector.sampling_period().as_millis() as i64).max(1);

        let mut next_imu_ms = 0.0;
        let mut next_gps_ms = self.first_gps_ms();
        let mut next_tick_ms = tick_ms;
        let mut events = Vec::new();

        detector.start()?;
        for t_ms in 0..=duration_ms {
            let now = t_ms as f64;
            while next_imu_ms <= now {
                let (a, g) = self.imu.sample(next_imu_ms / 1000.0, &mut self.rng);
                accel.push(a);
                gyro.push(g);
                next_imu_ms += imu_period_ms;
            }
            while self.gps.is_enabled() && next_gps_ms <= now {
                if let Some(mut fix) = self.gps.fix(next_gps_ms / 1000.0, &mut self.rng) {
                    fix.timestamp_ms += SIM_EPOCH_MS;
                    location.push(fix);
                }
                next_gps_ms += gps_period_ms;
            }
            if t_ms >= next_tick_ms {
                if let Some(event) = detector.step(SIM_EPOCH_MS + t_ms).and_then(|t| t.event) {
                    events.push(event);
                }
                next_tick_ms += tick_ms;
            }
        }
        detector.stop();

        Ok(RunReport::new(
            RunMode::Stepped,
            &self.scenario,
            SIM_EPOCH_MS,
            events,
            detector.stats(),
        ))
    }

    /// Feeds sensors in wall-clock time while the detector ticks on its own
    /// thread, collecting events from a subscription.
    fn run_realtime(&mut self) -> anyhow::Result<RunReport> {
        let mut config = self.scenario.detector.clone();
        config.ticker = TickerMode::Thread;
        let detector = Detector::new(&config)?;
        let (accel, gyro, location) = (
            detector.accelerometer(),
            detector.gyroscope(),
            detector.location(),
        );
        let subscription = detector.subscribe();

        let duration = Duration::from_secs_f32(self.scenario.simulation.duration_seconds);
        let imu_period = self.imu.period();
        let gps_period = self.gps.period();
        let mut next_imu = Duration::ZERO;
        let mut next_gps = Duration::from_secs_f64(self.first_gps_ms() / 1000.0);
        let mut events = Vec::new();

        detector.start()?;
        let origin = Instant::now();
        let origin_ms = now_millis();

        loop {
            let elapsed = origin.elapsed();
            if elapsed >= duration {
                break;
            }
            while next_imu <= elapsed {
                let (a, g) = self.imu.sample(next_imu.as_secs_f64(), &mut self.rng);
                accel.push(a);
                gyro.push(g);
                next_imu += imu_period;
            }
            while self.gps.is_enabled() && next_gps <= elapsed {
                if let Some(mut fix) = self.gps.fix(next_gps.as_secs_f64(), &mut self.rng) {
                    fix.timestamp_ms += origin_ms;
                    location.push(fix);
                }
                next_gps += gps_period;
            }
            events.extend(subscription.try_iter());

            let next_due = if self.gps.is_enabled() {
                next_imu.min(next_gps)
            } else {
                next_imu
            };
            let wait = next_due.saturating_sub(origin.elapsed());
            if !wait.is_zero() {
                thread::sleep(wait.min(FEEDER_SLEEP_SLICE));
            }
        }

        detector.stop();
        events.extend(subscription.try_iter());

        Ok(RunReport::new(
            RunMode::Realtime,
            &self.scenario,
            origin_ms,
            events,
            detector.stats(),
        ))
    }
}
