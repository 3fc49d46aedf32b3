//! Source selection
//!
//! Builds the sample source and fallback chain for the current machine.

use crate::config::MonitorConfig;
use crate::monitoring::bios::{BiosEnhancedSource, BiosOnlySource, PlatformBios};
use crate::monitoring::collector::SensorCollector;
use crate::monitoring::counters::SystemCounters;
use crate::monitoring::fallback::{
    AsyncSampleStage, BiosStage, DirectStage, SensorFallbackChain, TemperatureStage,
};
use crate::monitoring::hwmon::HwmonBackend;
use crate::monitoring::synthetic::SyntheticSource;
use crate::monitoring::traits::{BiosReader, SampleSource, SensorBackend};

use log::{info, warn};
use std::sync::Arc;

/// The selected sample source and the temperature chain built on it
pub struct MonitorStack {
    pub source: Arc<dyn SampleSource>,
    pub chain: SensorFallbackChain,
}

/// Select sources from configuration
///
/// Preference: synthetic when requested, then the cached collector (rich
/// backend or OS counters, enhanced with BIOS temperatures when a platform
/// chip exists), then BIOS-only, then synthetic as the last resort.
pub fn from_config(config: &MonitorConfig) -> MonitorStack {
    if config.synthetic {
        info!("monitoring: synthetic source");
        return synthetic_stack();
    }

    let rich = HwmonBackend::new(&config.hwmon_root);
    let rich: Option<Box<dyn SensorBackend>> = if rich.is_available() {
        Some(Box::new(rich))
    } else {
        None
    };
    let counters = SystemCounters::new(&config.thermal_root);
    let collector =
        SensorCollector::new(rich, Box::new(counters)).with_cache_window(config.cache_window());
    let bios = PlatformBios::discover(&config.hwmon_root, &config.bios_chips)
        .map(|b| Arc::new(b) as Arc<dyn BiosReader>);

    from_parts(collector, bios)
}

/// Assemble a stack from an already-built collector and optional BIOS reader
pub fn from_parts(collector: SensorCollector, bios: Option<Arc<dyn BiosReader>>) -> MonitorStack {
    if !collector.is_available() {
        return match bios {
            Some(reader) => {
                info!("monitoring: BIOS-only source");
                // The firmware is the only source, so one BIOS stage covers it
                let stages: Vec<Box<dyn TemperatureStage>> =
                    vec![Box::new(BiosStage::new(Arc::clone(&reader)))];
                MonitorStack {
                    source: Arc::new(BiosOnlySource::new(reader)),
                    chain: SensorFallbackChain::new(stages),
                }
            }
            None => {
                warn!("monitoring: no hardware sensors found, using synthetic data");
                synthetic_stack()
            }
        };
    }

    let has_rich = collector.has_rich_backend();
    let cache_window = collector.cache_window();
    let collector = Arc::new(collector);
    let mut stages: Vec<Box<dyn TemperatureStage>> = Vec::new();
    if has_rich {
        stages.push(Box::new(DirectStage::new(Arc::clone(&collector))));
    }

    let source: Arc<dyn SampleSource> = match &bios {
        Some(reader) => Arc::new(BiosEnhancedSource::new(collector, Arc::clone(reader))),
        None => collector,
    };
    stages.push(Box::new(
        AsyncSampleStage::new(Arc::clone(&source)).with_freshness(cache_window),
    ));
    if let Some(reader) = bios {
        stages.push(Box::new(BiosStage::new(reader)));
    }

    info!(
        "monitoring: {} source ({})",
        source.name(),
        if has_rich { "rich backend" } else { "OS counters" }
    );
    MonitorStack {
        source,
        chain: SensorFallbackChain::new(stages),
    }
}

fn synthetic_stack() -> MonitorStack {
    let source: Arc<dyn SampleSource> = Arc::new(SyntheticSource::new());
    MonitorStack {
        chain: SensorFallbackChain::new(vec![Box::new(AsyncSampleStage::new(Arc::clone(&source)))]),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TemperatureReading;
    use crate::mock::{MockBios, MockCounters, MockSensors};
    use crate::monitoring::fallback::WaitBudget;
    use crate::monitoring::traits::{BiosReadings, CancelToken, SensorReadings};
    use std::thread;
    use std::time::{Duration, Instant};

    fn bios() -> Arc<dyn BiosReader> {
        Arc::new(MockBios::new(BiosReadings {
            cpu_temp: 44.0,
            gpu_temp: 41.0,
            fan_rpm: 1500,
        }))
    }

    #[test]
    fn test_synthetic_requested() {
        let config = MonitorConfig {
            synthetic: true,
            ..MonitorConfig::default()
        };
        let stack = from_config(&config);
        assert_eq!(stack.source.name(), "synthetic");
        assert_eq!(stack.chain.stage_names(), vec!["sample"]);
    }

    #[test]
    fn test_rich_collector_with_bios() {
        let collector = SensorCollector::new(
            Some(Box::new(MockSensors::new(SensorReadings::default()))),
            Box::new(MockCounters::new()),
        );
        let stack = from_parts(collector, Some(bios()));
        assert_eq!(stack.source.name(), "bios-enhanced");
        assert_eq!(stack.chain.stage_names(), vec!["direct", "sample", "bios"]);
    }

    #[test]
    fn test_rich_stack_stays_within_latency_budget() {
        let sensors = MockSensors::new(SensorReadings {
            cpu_temp: Some(75.0),
            ..SensorReadings::default()
        })
        .with_delay(Duration::from_millis(1500));
        let collector = SensorCollector::new(Some(Box::new(sensors)), Box::new(MockCounters::new()));
        let stack = from_parts(collector, None);
        assert_eq!(stack.chain.stage_names(), vec!["direct", "sample"]);

        let source = Arc::clone(&stack.source);
        let pass = thread::spawn(move || source.read_sample(&CancelToken::new()));
        thread::sleep(Duration::from_millis(50));

        let start = Instant::now();
        let temps = stack.chain.read_temperatures(WaitBudget::latency_sensitive());
        let elapsed = start.elapsed();

        assert_eq!(temps, TemperatureReading::neutral_pair());
        assert!(elapsed < Duration::from_millis(450), "blocked {elapsed:?}");
        assert!(pass.join().unwrap().is_ok());
    }

    #[test]
    fn test_os_counters_only() {
        let collector = SensorCollector::new(None, Box::new(MockCounters::new()));
        let stack = from_parts(collector, None);
        assert_eq!(stack.source.name(), "collector");
        assert_eq!(stack.chain.stage_names(), vec!["sample"]);
    }

    #[test]
    fn test_bios_only_when_nothing_richer() {
        let collector = SensorCollector::new(None, Box::new(MockCounters::unavailable()));
        let stack = from_parts(collector, Some(bios()));
        assert_eq!(stack.source.name(), "bios");
        assert_eq!(stack.chain.stage_names(), vec!["bios"]);
        assert_eq!(
            stack.chain.read_temperatures(WaitBudget::latency_sensitive()),
            vec![TemperatureReading::cpu(44.0), TemperatureReading::gpu(41.0)]
        );
    }

    #[test]
    fn test_synthetic_last_resort() {
        let collector = SensorCollector::new(None, Box::new(MockCounters::unavailable()));
        let stack = from_parts(collector, None);
        assert_eq!(stack.source.name(), "synthetic");
    }
}
