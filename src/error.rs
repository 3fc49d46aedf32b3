//! Unified error types for ectune
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from EC/MSR hardware operations
    #[error("Hardware error: {0}")]
    Hw(#[from] HwError),

    /// Error from a monitoring source
    #[error("Monitoring error: {0}")]
    Monitor(#[from] MonitorError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from domain type validation
    #[error("Domain validation error: {0}")]
    Domain(#[from] DomainError),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of hardware failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Privileged handle is absent
    NotReady,
    /// Write address is not on the allowlist
    SafetyViolation,
    /// Transport or driver failure
    Device,
    /// Value outside physically safe bounds
    InvalidArgument,
}

/// Errors from EC and MSR access
#[derive(Error, Debug)]
pub enum HwError {
    /// The privileged device handle has not been opened
    #[error("Hardware channel not ready: the privileged device is not open")]
    NotReady,

    /// Write rejected by the register allowlist before any I/O was issued
    #[error(
        "Write to EC register 0x{address:02X} blocked: the address is not on the verified allowlist. \
         Enabling it requires out-of-band hardware verification and an allowlist update"
    )]
    SafetyViolation { address: u16 },

    /// A higher-level write that was stopped by the allowlist
    #[error("Cannot apply {what}: {source}")]
    BlockedWrite {
        what: String,
        #[source]
        source: Box<HwError>,
    },

    /// Transport failure reported by the driver
    #[error("Device error during {operation}: {source}")]
    Device {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid argument for a hardware write
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl HwError {
    /// Wrap an IO error with the operation that failed
    pub fn device(operation: impl Into<String>, source: std::io::Error) -> Self {
        HwError::Device {
            operation: operation.into(),
            source,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            HwError::NotReady => ErrorKind::NotReady,
            HwError::SafetyViolation { .. } | HwError::BlockedWrite { .. } => {
                ErrorKind::SafetyViolation
            }
            HwError::Device { .. } => ErrorKind::Device,
            HwError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Address rejected by the allowlist, if this is a safety rejection
    pub fn rejected_address(&self) -> Option<u16> {
        match self {
            HwError::SafetyViolation { address } => Some(*address),
            HwError::BlockedWrite { source, .. } => source.rejected_address(),
            _ => None,
        }
    }
}

/// Errors from monitoring sources
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// Caller cancelled before collection started
    #[error("Sample collection cancelled")]
    Cancelled,

    /// Source could not produce a sample
    #[error("Monitoring source unavailable: {0}")]
    Unavailable(String),
}

/// Errors from domain type validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Voltage offset outside [-250, 0] mV
    #[error("Invalid voltage offset: {0}mV (valid range: -250-0mV)")]
    InvalidVoltageOffset(i32),

    /// TCC offset outside [0, 63] degrees
    #[error("Invalid TCC offset: {0} (valid range: 0-63)")]
    InvalidTccOffset(i32),

    /// Register address could not be parsed
    #[error("Invalid register address: {0}")]
    InvalidAddress(String),

    /// Invalid value provided
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl From<DomainError> for HwError {
    fn from(err: DomainError) -> Self {
        HwError::InvalidArgument(err.to_string())
    }
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
