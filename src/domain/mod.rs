//! Domain models for ectune
//!
//! This module contains all domain types with validation.
//! Types are validated on construction (fail-fast pattern).

pub mod power;
pub mod register;
pub mod sample;
pub mod thermal;
pub mod voltage;

pub use power::{EncodedLimits, ModeByte, PerformanceMode, PowerLimits};
pub use register::{parse_address, parse_byte, parse_ec_address};
pub use sample::MonitoringSample;
pub use thermal::TemperatureReading;
pub use voltage::{decode_tjmax, TccOffset, VoltageOffset, DEFAULT_TJMAX};
