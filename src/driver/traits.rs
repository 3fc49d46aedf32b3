//! Trait definitions for privileged register transports
//!
//! These traits abstract over the driver to enable testing with mocks.

use serde::{Deserialize, Serialize};
use std::io;

/// Byte-wide access to the embedded controller address space
///
/// Implementations perform raw I/O only. Allowlisting, serialization and
/// settle delays are the caller's responsibility.
pub trait EcTransport: Send {
    /// Read one byte from an EC register
    fn read(&mut self, address: u16) -> io::Result<u8>;

    /// Write one byte to an EC register
    fn write(&mut self, address: u16, value: u8) -> io::Result<()>;
}

/// 64-bit access to model-specific registers
pub trait MsrTransport: Send {
    /// Read a 64-bit MSR
    fn read(&mut self, address: u32) -> io::Result<u64>;

    /// Write a 64-bit MSR
    fn write(&mut self, address: u32, value: u64) -> io::Result<()>;
}

/// How the device path is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Vendor driver taking fixed-layout ioctl requests
    #[default]
    Ioctl,
    /// File offset is the register address (ec_sys `io`, `/dev/cpu/N/msr`)
    Positional,
}
