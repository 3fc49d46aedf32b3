//! Cached sensor collector
//!
//! Wraps a rich sensor backend and OS counters behind one short-lived
//! cache. All refreshes run inside a single critical section so concurrent
//! callers never drive the hardware at the same time.

use crate::control::lock_handle;
use crate::domain::thermal::SSD_LABEL;
use crate::domain::{MonitoringSample, TemperatureReading};
use crate::error::MonitorError;
use crate::monitoring::counters::cpu_zone_temperature;
use crate::monitoring::traits::{
    CancelToken, OsCounters, SampleSource, SensorBackend, SensorReadings,
};

use log::{debug, warn};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

/// Default freshness window for cached samples
pub const DEFAULT_CACHE_WINDOW: Duration = Duration::from_millis(100);

struct CollectorState {
    rich: Option<Box<dyn SensorBackend>>,
    os: Box<dyn OsCounters>,
    last: Arc<MonitoringSample>,
    refreshed_at: Option<Instant>,
}

impl CollectorState {
    fn rich_backend(&mut self) -> Option<&mut Box<dyn SensorBackend>> {
        self.rich.as_mut().filter(|backend| backend.is_available())
    }

    fn rich_available(&self) -> bool {
        self.rich.as_ref().is_some_and(|backend| backend.is_available())
    }

    fn read_rich(&mut self) -> SensorReadings {
        let Some(backend) = self.rich_backend() else {
            return SensorReadings::default();
        };
        match backend.read() {
            Ok(readings) => readings,
            Err(e) => {
                warn!("{} read failed, using OS counters: {e}", backend.name());
                SensorReadings::default()
            }
        }
    }

    /// One full collection pass; channels that fail keep their prior value
    fn collect(&mut self) -> MonitoringSample {
        let mut next = MonitoringSample {
            timestamp: SystemTime::now(),
            ..(*self.last).clone()
        };

        let rich = self.read_rich();
        self.os.refresh();

        if let Some(t) = rich
            .cpu_temp
            .filter(|t| *t > 0.0)
            .or_else(|| cpu_zone_temperature(&self.os.thermal_zones()))
        {
            next.cpu_temp = t;
        }
        if let Some(load) = rich.cpu_load.or_else(|| self.os.cpu_load()) {
            next.cpu_load = load;
        }
        if let Some(clocks) = self.os.core_clocks_mhz() {
            next.core_clocks_mhz = clocks;
        }
        if let Some(t) = rich.gpu_temp {
            next.gpu_temp = t;
        }
        if let Some(load) = rich.gpu_load {
            next.gpu_load = load;
        }
        if let Some(vram) = rich.vram_used_mb {
            next.vram_used_mb = vram;
        }
        if let Some((used, total)) = self.os.memory_mb() {
            next.ram_used_mb = used;
            next.ram_total_mb = total;
        }
        if let Some(rpm) = rich.fan_rpm {
            next.fan_rpm = rpm;
        }
        if let Some(t) = rich.ssd_temp {
            next.ssd_temp = t;
        }
        if let Some(usage) = self.os.disk_usage() {
            next.disk_usage = usage;
        }

        next
    }
}

/// Rich/cached `SampleSource`
pub struct SensorCollector {
    state: Mutex<CollectorState>,
    cache_window: Duration,
}

impl SensorCollector {
    pub fn new(rich: Option<Box<dyn SensorBackend>>, os: Box<dyn OsCounters>) -> Self {
        Self {
            state: Mutex::new(CollectorState {
                rich,
                os,
                last: Arc::new(MonitoringSample::empty()),
                refreshed_at: None,
            }),
            cache_window: DEFAULT_CACHE_WINDOW,
        }
    }

    pub fn with_cache_window(mut self, window: Duration) -> Self {
        self.cache_window = window;
        self
    }

    /// How long a collected sample is served from cache
    pub fn cache_window(&self) -> Duration {
        self.cache_window
    }

    /// Whether a rich backend is present and found hardware
    pub fn has_rich_backend(&self) -> bool {
        lock_handle(&self.state).rich_available()
    }

    /// Whether either the rich backend or the OS counters can produce data
    pub fn is_available(&self) -> bool {
        let state = lock_handle(&self.state);
        state.rich_available() || state.os.is_available()
    }

    /// Read CPU/GPU/SSD temperatures straight from the rich backend
    ///
    /// `None` when the backend is absent, failed, or reported nothing.
    pub fn direct_temperatures(&self) -> Option<Vec<TemperatureReading>> {
        let mut state = lock_handle(&self.state);
        let backend = state.rich_backend()?;
        let readings = match backend.read() {
            Ok(r) => r,
            Err(e) => {
                debug!("direct temperature read failed: {e}");
                return None;
            }
        };

        let temps: Vec<TemperatureReading> = [
            readings.cpu_temp.map(TemperatureReading::cpu),
            readings.gpu_temp.map(TemperatureReading::gpu),
            readings.ssd_temp.map(|t| TemperatureReading::new(SSD_LABEL, t)),
        ]
        .into_iter()
        .flatten()
        .filter(TemperatureReading::is_present)
        .collect();

        (!temps.is_empty()).then_some(temps)
    }
}

impl SampleSource for SensorCollector {
    fn name(&self) -> &str {
        "collector"
    }

    fn read_sample(&self, cancel: &CancelToken) -> Result<Arc<MonitoringSample>, MonitorError> {
        cancel.check()?;
        let mut state = lock_handle(&self.state);

        if let Some(at) = state.refreshed_at {
            if at.elapsed() < self.cache_window {
                return Ok(Arc::clone(&state.last));
            }
        }

        // Last chance to back out before touching hardware
        cancel.check()?;

        let sample = Arc::new(state.collect());
        state.last = Arc::clone(&sample);
        state.refreshed_at = Some(Instant::now());
        Ok(sample)
    }

    fn try_restart(&self) -> bool {
        let mut state = lock_handle(&self.state);
        state.refreshed_at = None;
        match state.rich.as_mut() {
            Some(backend) => {
                let ok = backend.restart();
                debug!("{} restart: {}", backend.name(), if ok { "ok" } else { "failed" });
                ok
            }
            None => state.os.is_available(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCounters, MockSensors};
    use std::thread;

    fn rich_readings() -> SensorReadings {
        SensorReadings {
            cpu_temp: Some(70.0),
            cpu_load: Some(40.0),
            gpu_temp: Some(60.0),
            gpu_load: Some(25.0),
            vram_used_mb: Some(2048),
            fan_rpm: Some(3000),
            ssd_temp: Some(42.0),
        }
    }

    #[test]
    fn test_rich_backend_channels() {
        let sensors = MockSensors::new(rich_readings());
        let collector = SensorCollector::new(Some(Box::new(sensors)), Box::new(MockCounters::new()));

        let s = collector.read_sample(&CancelToken::new()).unwrap();
        assert_eq!(s.cpu_temp, 70.0);
        assert_eq!(s.gpu_temp, 60.0);
        assert_eq!(s.vram_used_mb, 2048);
        assert_eq!(s.fan_rpm, 3000);
        assert_eq!(s.ram_total_mb, 16384);
    }

    #[test]
    fn test_falls_back_to_os_counters() {
        let counters = MockCounters::new().with_zones(vec![("x86_pkg_temp".into(), 66.0)]);
        let collector = SensorCollector::new(None, Box::new(counters));

        let s = collector.read_sample(&CancelToken::new()).unwrap();
        assert_eq!(s.cpu_temp, 66.0);
        assert_eq!(s.cpu_load, 12.5);
        assert_eq!(s.gpu_temp, 0.0);
        assert!(!collector.has_rich_backend());
        assert!(collector.direct_temperatures().is_none());
    }

    #[test]
    fn test_unavailable_rich_backend_uses_fallback() {
        let sensors = MockSensors::new(rich_readings());
        sensors.set_available(false);
        let counters = MockCounters::new().with_zones(vec![("acpitz".into(), 55.0)]);
        let collector = SensorCollector::new(Some(Box::new(sensors)), Box::new(counters));

        let s = collector.read_sample(&CancelToken::new()).unwrap();
        assert_eq!(s.cpu_temp, 55.0);
        assert_eq!(s.fan_rpm, 0);
    }

    #[test]
    fn test_cache_window_reuses_sample() {
        let sensors = MockSensors::new(rich_readings());
        let probe = sensors.clone();
        let collector = SensorCollector::new(Some(Box::new(sensors)), Box::new(MockCounters::new()))
            .with_cache_window(Duration::from_secs(60));

        let cancel = CancelToken::new();
        let a = collector.read_sample(&cancel).unwrap();
        let b = collector.read_sample(&cancel).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(probe.read_count(), 1);
    }

    #[test]
    fn test_expired_cache_refreshes() {
        let sensors = MockSensors::new(rich_readings());
        let probe = sensors.clone();
        let collector = SensorCollector::new(Some(Box::new(sensors)), Box::new(MockCounters::new()))
            .with_cache_window(Duration::ZERO);

        let cancel = CancelToken::new();
        collector.read_sample(&cancel).unwrap();
        collector.read_sample(&cancel).unwrap();
        assert_eq!(probe.read_count(), 2);
    }

    #[test]
    fn test_failed_channel_keeps_prior_value() {
        let sensors = MockSensors::new(rich_readings());
        let probe = sensors.clone();
        let collector = SensorCollector::new(Some(Box::new(sensors)), Box::new(MockCounters::new()))
            .with_cache_window(Duration::ZERO);
        let cancel = CancelToken::new();
        collector.read_sample(&cancel).unwrap();

        probe.set_readings(SensorReadings {
            gpu_temp: None,
            cpu_temp: Some(75.0),
            ..rich_readings()
        });
        let s = collector.read_sample(&cancel).unwrap();
        assert_eq!(s.cpu_temp, 75.0);
        assert_eq!(s.gpu_temp, 60.0);
    }

    #[test]
    fn test_backend_error_keeps_os_channels() {
        let sensors = MockSensors::new(rich_readings());
        sensors.fail_io(true);
        let counters = MockCounters::new().with_zones(vec![("cpu".into(), 58.0)]);
        let collector = SensorCollector::new(Some(Box::new(sensors)), Box::new(counters));

        let s = collector.read_sample(&CancelToken::new()).unwrap();
        assert_eq!(s.cpu_temp, 58.0);
        assert_eq!(s.ram_used_mb, 4096);
    }

    #[test]
    fn test_cancel_before_io() {
        let sensors = MockSensors::new(rich_readings());
        let probe = sensors.clone();
        let collector = SensorCollector::new(Some(Box::new(sensors)), Box::new(MockCounters::new()));

        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(collector.read_sample(&cancel).unwrap_err(), MonitorError::Cancelled);
        assert_eq!(probe.read_count(), 0);
    }

    #[test]
    fn test_concurrent_readers_do_not_overlap() {
        let sensors = MockSensors::new(rich_readings()).with_delay(Duration::from_millis(20));
        let probe = sensors.clone();
        let collector = Arc::new(
            SensorCollector::new(Some(Box::new(sensors)), Box::new(MockCounters::new()))
                .with_cache_window(Duration::ZERO),
        );

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&collector);
                thread::spawn(move || c.read_sample(&CancelToken::new()).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(probe.max_concurrent_reads(), 1);
        assert_eq!(probe.read_count(), 4);
    }

    #[test]
    fn test_direct_temperatures_filters_absent() {
        let sensors = MockSensors::new(SensorReadings {
            cpu_temp: Some(65.0),
            gpu_temp: Some(0.0),
            ..SensorReadings::default()
        });
        let collector = SensorCollector::new(Some(Box::new(sensors)), Box::new(MockCounters::new()));

        let temps = collector.direct_temperatures().unwrap();
        assert_eq!(temps, vec![TemperatureReading::cpu(65.0)]);
    }

    #[test]
    fn test_restart_delegates_to_backend() {
        let sensors = MockSensors::new(rich_readings());
        sensors.set_available(false);
        let probe = sensors.clone();
        let collector = SensorCollector::new(Some(Box::new(sensors)), Box::new(MockCounters::new()));

        assert!(!collector.try_restart());
        probe.set_available(true);
        assert!(collector.try_restart());
    }
}
