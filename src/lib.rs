//! ectune - gaming-laptop EC and MSR tuning library
//!
//! This library provides allowlisted embedded-controller access, MSR
//! voltage and thermal control, power-limit application, CPU family
//! resolution, and layered temperature monitoring.
//!
//! # Modules
//!
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`control`]: EC register channel, MSR access, power limits
//! - [`cpu`]: CPU identity, family table, SMU addresses
//! - [`domain`]: Domain models with validation
//! - [`driver`]: Privileged device transports
//! - [`error`]: Error types
//! - [`monitoring`]: Sample sources and the sensor fallback chain

pub mod cli;
pub mod commands;
pub mod config;
pub mod control;
pub mod cpu;
pub mod domain;
pub mod driver;
pub mod error;
pub mod monitoring;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
