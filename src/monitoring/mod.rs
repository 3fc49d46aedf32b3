//! Monitoring sample sources
//!
//! Three interchangeable `SampleSource` implementations (synthetic, cached
//! collector, BIOS-only) plus the temperature fallback chain used by
//! latency-sensitive callers.

pub mod bios;
pub mod collector;
pub mod counters;
pub mod fallback;
pub mod hwmon;
pub mod sources;
pub mod synthetic;
pub(crate) mod sysfs;
pub mod traits;

pub use bios::{BiosEnhancedSource, BiosOnlySource, PlatformBios};
pub use collector::SensorCollector;
pub use counters::SystemCounters;
pub use fallback::{SensorFallbackChain, StageOutcome, TemperatureStage, WaitBudget};
pub use hwmon::HwmonBackend;
pub use sources::{from_config, MonitorStack};
pub use synthetic::SyntheticSource;
pub use traits::{
    BiosReader, BiosReadings, CancelToken, OsCounters, SampleSource, SensorBackend, SensorReadings,
};
