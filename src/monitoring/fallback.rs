//! Sensor fallback chain
//!
//! Produces a labelled temperature list by trying progressively cheaper
//! sources. Latency-sensitive callers get a bounded wait: if a blocking
//! stage does not answer in time, the chain returns the neutral CPU/GPU
//! pair immediately instead of stalling the caller.

use crate::control::lock_handle;
use crate::domain::{MonitoringSample, TemperatureReading};
use crate::monitoring::bios::bios_temperatures;
use crate::monitoring::collector::{SensorCollector, DEFAULT_CACHE_WINDOW};
use crate::monitoring::traits::{BiosReader, CancelToken, SampleSource};

use log::{debug, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// How long a caller is willing to wait on a blocking stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitBudget {
    Bounded(Duration),
    Unbounded,
}

impl WaitBudget {
    pub const LATENCY_SENSITIVE: Duration = Duration::from_millis(250);

    /// Budget for UI-facing callers
    pub fn latency_sensitive() -> Self {
        WaitBudget::Bounded(Self::LATENCY_SENSITIVE)
    }

    /// Budget for background callers that may block
    pub fn background() -> Self {
        WaitBudget::Unbounded
    }
}

/// Result of one stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Readings(Vec<TemperatureReading>),
    /// Stage has nothing; try the next one
    Unavailable,
    /// Stage did not answer within the budget
    TimedOut,
}

/// One link of the fallback chain
pub trait TemperatureStage: Send + Sync {
    fn name(&self) -> &str;

    fn read(&self, budget: WaitBudget) -> StageOutcome;
}

enum Slot<T> {
    Idle,
    Running,
    Done { value: T, at: Instant },
}

enum Fetch<T> {
    Ready(T),
    Failed,
    TimedOut,
}

/// One background read shared by every caller of a stage
///
/// At most one worker runs at a time. Callers wait on it for at most their
/// budget; a worker that outlives the budget keeps running and its result
/// serves later callers while it is younger than `freshness`.
struct SharedRead<T> {
    thread_name: &'static str,
    freshness: Duration,
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T: Clone + Send + 'static> SharedRead<T> {
    fn new(thread_name: &'static str, freshness: Duration) -> Arc<Self> {
        Arc::new(Self {
            thread_name,
            freshness,
            slot: Mutex::new(Slot::Idle),
            ready: Condvar::new(),
        })
    }

    fn fetch<F>(self: &Arc<Self>, budget: WaitBudget, read: F) -> Fetch<T>
    where
        F: FnOnce() -> Option<T> + Send + 'static,
    {
        let mut slot = lock_handle(&self.slot);

        if let Slot::Done { at, .. } = &*slot {
            if at.elapsed() > self.freshness {
                debug!("{} result is {:?} old, reading again", self.thread_name, at.elapsed());
                *slot = Slot::Idle;
            }
        }

        match &*slot {
            Slot::Done { value, .. } => return Fetch::Ready(value.clone()),
            Slot::Running => {}
            Slot::Idle => {
                if !self.start(read) {
                    return Fetch::Failed;
                }
                *slot = Slot::Running;
            }
        }

        let running = |s: &mut Slot<T>| matches!(s, Slot::Running);
        let slot = match budget {
            WaitBudget::Bounded(limit) => {
                let (slot, wait) = self
                    .ready
                    .wait_timeout_while(slot, limit, running)
                    .unwrap_or_else(PoisonError::into_inner);
                if wait.timed_out() {
                    return Fetch::TimedOut;
                }
                slot
            }
            WaitBudget::Unbounded => self
                .ready
                .wait_while(slot, running)
                .unwrap_or_else(PoisonError::into_inner),
        };

        match &*slot {
            Slot::Done { value, .. } => Fetch::Ready(value.clone()),
            _ => Fetch::Failed,
        }
    }

    fn start<F>(self: &Arc<Self>, read: F) -> bool
    where
        F: FnOnce() -> Option<T> + Send + 'static,
    {
        let shared = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(self.thread_name.into())
            .spawn(move || {
                let value = panic::catch_unwind(AssertUnwindSafe(read)).unwrap_or_else(|_| {
                    warn!("{} worker panicked", shared.thread_name);
                    None
                });
                *lock_handle(&shared.slot) = match value {
                    Some(value) => Slot::Done {
                        value,
                        at: Instant::now(),
                    },
                    None => Slot::Idle,
                };
                shared.ready.notify_all();
            });
        match spawned {
            Ok(_) => true,
            Err(e) => {
                warn!("could not start {} worker: {e}", self.thread_name);
                false
            }
        }
    }
}

/// Direct reads from the rich sensor backend
///
/// The read runs on a worker because it contends with full collection
/// passes for the collector lock.
pub struct DirectStage {
    collector: Arc<SensorCollector>,
    pending: Arc<SharedRead<Vec<TemperatureReading>>>,
}

impl DirectStage {
    pub fn new(collector: Arc<SensorCollector>) -> Self {
        let freshness = collector.cache_window();
        Self {
            collector,
            pending: SharedRead::new("ectune-direct", freshness),
        }
    }
}

impl TemperatureStage for DirectStage {
    fn name(&self) -> &str {
        "direct"
    }

    fn read(&self, budget: WaitBudget) -> StageOutcome {
        let collector = Arc::clone(&self.collector);
        match self.pending.fetch(budget, move || collector.direct_temperatures()) {
            Fetch::Ready(temps) => StageOutcome::Readings(temps),
            Fetch::Failed => StageOutcome::Unavailable,
            Fetch::TimedOut => StageOutcome::TimedOut,
        }
    }
}

/// Sample read on a worker thread so the caller can stop waiting
pub struct AsyncSampleStage {
    source: Arc<dyn SampleSource>,
    pending: Arc<SharedRead<Arc<MonitoringSample>>>,
}

impl AsyncSampleStage {
    pub fn new(source: Arc<dyn SampleSource>) -> Self {
        Self {
            source,
            pending: SharedRead::new("ectune-sample", DEFAULT_CACHE_WINDOW),
        }
    }

    /// Builder: how long a finished read may serve later calls
    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.pending = SharedRead::new("ectune-sample", freshness);
        self
    }
}

impl TemperatureStage for AsyncSampleStage {
    fn name(&self) -> &str {
        "sample"
    }

    fn read(&self, budget: WaitBudget) -> StageOutcome {
        let source = Arc::clone(&self.source);
        let read = move || match source.read_sample(&CancelToken::new()) {
            Ok(sample) => Some(sample),
            Err(e) => {
                debug!("{} sample failed: {e}", source.name());
                None
            }
        };
        match self.pending.fetch(budget, read) {
            Fetch::Ready(sample) => StageOutcome::Readings(sample.temperature_readings()),
            Fetch::Failed => StageOutcome::Unavailable,
            Fetch::TimedOut => StageOutcome::TimedOut,
        }
    }
}

/// Firmware-reported temperatures
pub struct BiosStage {
    reader: Arc<dyn BiosReader>,
}

impl BiosStage {
    pub fn new(reader: Arc<dyn BiosReader>) -> Self {
        Self { reader }
    }
}

impl TemperatureStage for BiosStage {
    fn name(&self) -> &str {
        "bios"
    }

    fn read(&self, _budget: WaitBudget) -> StageOutcome {
        match bios_temperatures(self.reader.as_ref()) {
            Ok(temps) => StageOutcome::Readings(temps),
            Err(e) => {
                debug!("BIOS stage failed: {e}");
                StageOutcome::Unavailable
            }
        }
    }
}

/// Ordered temperature stages
pub struct SensorFallbackChain {
    stages: Vec<Box<dyn TemperatureStage>>,
}

impl SensorFallbackChain {
    pub fn new(stages: Vec<Box<dyn TemperatureStage>>) -> Self {
        Self { stages }
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// First stage that reports a present temperature wins
    ///
    /// Never fails. When every stage comes up empty, or a blocking stage
    /// exceeds the budget, the result is the neutral `CPU: 0, GPU: 0` pair.
    pub fn read_temperatures(&self, budget: WaitBudget) -> Vec<TemperatureReading> {
        for stage in &self.stages {
            match stage.read(budget) {
                StageOutcome::Readings(temps) => {
                    let present: Vec<TemperatureReading> =
                        temps.into_iter().filter(TemperatureReading::is_present).collect();
                    if !present.is_empty() {
                        debug!("temperatures from {} stage", stage.name());
                        return present;
                    }
                }
                StageOutcome::Unavailable => {}
                StageOutcome::TimedOut => {
                    debug!("{} stage exceeded {budget:?}, returning neutral readings", stage.name());
                    break;
                }
            }
        }
        TemperatureReading::neutral_pair()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBios, MockCounters, MockSensors, StallingSource};
    use crate::monitoring::traits::{BiosReadings, SensorReadings};
    use std::sync::Barrier;

    fn bios(cpu: f32, gpu: f32) -> Arc<dyn BiosReader> {
        Arc::new(MockBios::new(BiosReadings {
            cpu_temp: cpu,
            gpu_temp: gpu,
            fan_rpm: 0,
        }))
    }

    #[test]
    fn test_direct_stage_wins() {
        let collector = Arc::new(SensorCollector::new(
            Some(Box::new(MockSensors::new(SensorReadings {
                cpu_temp: Some(81.0),
                gpu_temp: Some(66.0),
                ..SensorReadings::default()
            }))),
            Box::new(MockCounters::new()),
        ));
        let chain = SensorFallbackChain::new(vec![
            Box::new(DirectStage::new(collector)),
            Box::new(BiosStage::new(bios(40.0, 40.0))),
        ]);

        let temps = chain.read_temperatures(WaitBudget::latency_sensitive());
        assert_eq!(temps, vec![TemperatureReading::cpu(81.0), TemperatureReading::gpu(66.0)]);
    }

    #[test]
    fn test_empty_stages_fall_through_to_bios() {
        let stalled = Arc::new(StallingSource::new(Duration::ZERO, MonitoringSample::empty()));
        let chain = SensorFallbackChain::new(vec![
            Box::new(AsyncSampleStage::new(stalled)),
            Box::new(BiosStage::new(bios(47.0, 0.0))),
        ]);

        let temps = chain.read_temperatures(WaitBudget::background());
        assert_eq!(temps, vec![TemperatureReading::cpu(47.0)]);
    }

    #[test]
    fn test_everything_empty_yields_neutral_pair() {
        let failing = MockBios::new(BiosReadings::default());
        failing.fail_io(true);
        let chain = SensorFallbackChain::new(vec![Box::new(BiosStage::new(Arc::new(failing)))]);

        let temps = chain.read_temperatures(WaitBudget::background());
        assert_eq!(temps, TemperatureReading::neutral_pair());
        assert!(SensorFallbackChain::new(Vec::new())
            .read_temperatures(WaitBudget::latency_sensitive())
            .iter()
            .all(|t| t.celsius == 0.0));
    }

    #[test]
    fn test_stalled_source_respects_latency_budget() {
        let mut sample = MonitoringSample::empty();
        sample.cpu_temp = 70.0;
        let stalled = Arc::new(StallingSource::new(Duration::from_secs(2), sample));
        let chain = SensorFallbackChain::new(vec![
            Box::new(AsyncSampleStage::new(stalled)),
            Box::new(BiosStage::new(bios(50.0, 50.0))),
        ]);

        let start = Instant::now();
        let temps = chain.read_temperatures(WaitBudget::latency_sensitive());
        let elapsed = start.elapsed();

        assert_eq!(temps, TemperatureReading::neutral_pair());
        assert!(elapsed >= Duration::from_millis(200), "returned after {elapsed:?}");
        assert!(elapsed < Duration::from_secs(1), "returned after {elapsed:?}");
    }

    #[test]
    fn test_late_result_is_picked_up_next_call() {
        let mut sample = MonitoringSample::empty();
        sample.cpu_temp = 73.0;
        sample.gpu_temp = 64.0;
        let source = Arc::new(StallingSource::new(Duration::from_millis(300), sample));
        let calls = Arc::clone(&source);
        let stage = AsyncSampleStage::new(source).with_freshness(Duration::from_secs(5));

        assert_eq!(stage.read(WaitBudget::Bounded(Duration::from_millis(50))), StageOutcome::TimedOut);
        thread::sleep(Duration::from_millis(400));

        match stage.read(WaitBudget::Bounded(Duration::from_millis(50))) {
            StageOutcome::Readings(temps) => {
                assert_eq!(temps[0], TemperatureReading::cpu(73.0));
                assert_eq!(temps[1], TemperatureReading::gpu(64.0));
            }
            other => panic!("expected readings, got {other:?}"),
        }
        assert_eq!(calls.calls(), 1);
    }

    #[test]
    fn test_stale_late_result_triggers_fresh_read() {
        let source = Arc::new(StallingSource::new(
            Duration::from_millis(150),
            MonitoringSample::empty(),
        ));
        let calls = Arc::clone(&source);
        let stage = AsyncSampleStage::new(source);

        let short = WaitBudget::Bounded(Duration::from_millis(20));
        assert_eq!(stage.read(short), StageOutcome::TimedOut);
        // Worker finishes at ~150 ms; its result is past the window by 450 ms
        thread::sleep(Duration::from_millis(450));

        assert_eq!(stage.read(short), StageOutcome::TimedOut);
        assert_eq!(calls.calls(), 2);
    }

    #[test]
    fn test_concurrent_callers_share_one_worker() {
        let mut sample = MonitoringSample::empty();
        sample.cpu_temp = 58.0;
        let source = Arc::new(StallingSource::new(Duration::from_millis(200), sample));
        let calls = Arc::clone(&source);
        let stage = Arc::new(AsyncSampleStage::new(source));
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stage = Arc::clone(&stage);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    stage.read(WaitBudget::background())
                })
            })
            .collect();

        for handle in handles {
            match handle.join().unwrap() {
                StageOutcome::Readings(temps) => {
                    assert_eq!(temps[0], TemperatureReading::cpu(58.0));
                }
                other => panic!("expected readings, got {other:?}"),
            }
        }
        assert_eq!(calls.calls(), 1);
    }

    #[test]
    fn test_direct_stage_respects_budget_during_collection() {
        let sensors = MockSensors::new(SensorReadings {
            cpu_temp: Some(80.0),
            ..SensorReadings::default()
        })
        .with_delay(Duration::from_millis(1500));
        let collector = Arc::new(SensorCollector::new(
            Some(Box::new(sensors)),
            Box::new(MockCounters::new()),
        ));
        let chain = SensorFallbackChain::new(vec![
            Box::new(DirectStage::new(Arc::clone(&collector))),
            Box::new(AsyncSampleStage::new(Arc::clone(&collector) as Arc<dyn SampleSource>)),
        ]);

        let background = Arc::clone(&collector);
        let pass = thread::spawn(move || background.read_sample(&CancelToken::new()));
        thread::sleep(Duration::from_millis(50));

        let start = Instant::now();
        let temps = chain.read_temperatures(WaitBudget::latency_sensitive());
        let elapsed = start.elapsed();

        assert_eq!(temps, TemperatureReading::neutral_pair());
        assert!(elapsed < Duration::from_millis(450), "blocked {elapsed:?}");
        assert!(pass.join().unwrap().is_ok());
    }

    #[test]
    fn test_direct_stage_failure_is_unavailable() {
        let sensors = MockSensors::new(SensorReadings::default());
        sensors.fail_io(true);
        let collector = Arc::new(SensorCollector::new(
            Some(Box::new(sensors)),
            Box::new(MockCounters::new()),
        ));
        let stage = DirectStage::new(collector);
        assert_eq!(stage.read(WaitBudget::latency_sensitive()), StageOutcome::Unavailable);
    }

    #[test]
    fn test_background_budget_waits() {
        let mut sample = MonitoringSample::empty();
        sample.cpu_temp = 77.0;
        let stalled = Arc::new(StallingSource::new(Duration::from_millis(300), sample));
        let chain = SensorFallbackChain::new(vec![Box::new(AsyncSampleStage::new(stalled))]);

        let temps = chain.read_temperatures(WaitBudget::background());
        assert_eq!(temps, vec![TemperatureReading::cpu(77.0)]);
    }
}
