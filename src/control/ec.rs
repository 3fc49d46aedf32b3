//! Embedded controller register channel
//!
//! Owns the EC handle and enforces the write allowlist. The allowlist is a
//! compile-time constant: there is no per-call or configuration override.

use crate::control::lock_handle;
use crate::driver::{self, DriverKind, EcTransport};
use crate::error::HwError;

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// EC register addresses.
///
/// Per-model data that has not been validated against every board. Adding an
/// address here requires hardware verification first.
pub mod registers {
    pub const CPU_FAN_DUTY: u16 = 0x37;
    pub const GPU_FAN_DUTY: u16 = 0x3A;
    pub const FAN_MODE: u16 = 0x22;
    pub const CPU_FAN_TACH_LO: u16 = 0x13;
    pub const CPU_FAN_TACH_HI: u16 = 0x14;
    pub const GPU_FAN_TACH_LO: u16 = 0x15;
    pub const GPU_FAN_TACH_HI: u16 = 0x16;
    pub const KEYBOARD_BACKLIGHT: u16 = 0x81;
    pub const PERFORMANCE_MODE: u16 = 0x2C;
    pub const PL1_LO: u16 = 0xC0;
    pub const PL1_HI: u16 = 0xC1;
    pub const PL2_LO: u16 = 0xC2;
    pub const PL2_HI: u16 = 0xC3;
    pub const TGP_LO: u16 = 0xC4;
    pub const TGP_HI: u16 = 0xC5;
}

/// Every EC address that may be written
pub const WRITE_ALLOWLIST: &[u16] = &[
    registers::CPU_FAN_DUTY,
    registers::GPU_FAN_DUTY,
    registers::FAN_MODE,
    registers::CPU_FAN_TACH_LO,
    registers::CPU_FAN_TACH_HI,
    registers::GPU_FAN_TACH_LO,
    registers::GPU_FAN_TACH_HI,
    registers::KEYBOARD_BACKLIGHT,
    registers::PERFORMANCE_MODE,
    registers::PL1_LO,
    registers::PL1_HI,
    registers::PL2_LO,
    registers::PL2_HI,
    registers::TGP_LO,
    registers::TGP_HI,
];

/// Shortest settle delay after an EC write
pub const MIN_SETTLE: Duration = Duration::from_millis(1);

/// Serialized, allowlist-gated access to the embedded controller
pub struct RegisterChannel {
    transport: Mutex<Option<Box<dyn EcTransport>>>,
    kind: DriverKind,
    settle: Duration,
}

impl RegisterChannel {
    /// Create a channel with no open handle
    pub fn new(kind: DriverKind) -> Self {
        Self {
            transport: Mutex::new(None),
            kind,
            settle: MIN_SETTLE,
        }
    }

    /// Builder: set the post-write settle delay (never below 1 ms)
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle.max(MIN_SETTLE);
        self
    }

    /// Open the device at `path`, replacing any prior handle
    pub fn initialize(&self, path: &Path) -> bool {
        let mut slot = lock_handle(&self.transport);
        *slot = None;
        match driver::open_ec(self.kind, path) {
            Ok(transport) => {
                *slot = Some(transport);
                true
            }
            Err(e) => {
                log::warn!("EC device {} unavailable: {}", path.display(), e);
                false
            }
        }
    }

    /// Install an already-open transport, replacing any prior handle
    pub fn attach(&self, transport: Box<dyn EcTransport>) -> bool {
        *lock_handle(&self.transport) = Some(transport);
        true
    }

    /// Release the handle
    pub fn close(&self) {
        if lock_handle(&self.transport).take().is_some() {
            log::info!("EC handle released");
        }
    }

    /// Whether a handle is open
    pub fn is_available(&self) -> bool {
        lock_handle(&self.transport).is_some()
    }

    /// Whether `address` is on the write allowlist
    pub fn is_writable(address: u16) -> bool {
        WRITE_ALLOWLIST.contains(&address)
    }

    /// Every writable address
    pub fn allowlist() -> &'static [u16] {
        WRITE_ALLOWLIST
    }

    /// Post-write settle delay
    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Read one EC byte. Reads are not allowlisted.
    pub fn read_byte(&self, address: u16) -> Result<u8, HwError> {
        let mut slot = lock_handle(&self.transport);
        let transport = slot.as_mut().ok_or(HwError::NotReady)?;
        let value = transport
            .read(address)
            .map_err(|e| HwError::device(format!("EC read 0x{:02X}", address), e))?;
        log::debug!("EC read 0x{:02X} -> 0x{:02X}", address, value);
        Ok(value)
    }

    /// Write one EC byte.
    ///
    /// The allowlist is checked before the handle is touched. A successful
    /// write holds the channel for the settle delay before returning.
    pub fn write_byte(&self, address: u16, value: u8) -> Result<(), HwError> {
        if !Self::is_writable(address) {
            log::warn!("Blocked EC write to non-allowlisted register 0x{:02X}", address);
            return Err(HwError::SafetyViolation { address });
        }

        let mut slot = lock_handle(&self.transport);
        let transport = slot.as_mut().ok_or(HwError::NotReady)?;
        transport
            .write(address, value)
            .map_err(|e| HwError::device(format!("EC write 0x{:02X}", address), e))?;
        log::debug!("EC write 0x{:02X} <- 0x{:02X}", address, value);

        std::thread::sleep(self.settle);
        Ok(())
    }
}

impl Default for RegisterChannel {
    fn default() -> Self {
        Self::new(DriverKind::default())
    }
}

impl Drop for RegisterChannel {
    fn drop(&mut self) {
        self.close();
    }
}
