//! Voltage and thermal-target register fields
//!
//! Bit layouts of the voltage-offset and temperature-target MSR words.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Voltage offset field: 11-bit two's complement in bits 21-31
const VOLTAGE_SHIFT: u32 = 21;
const VOLTAGE_MASK: u64 = 0x7FF;
const VOLTAGE_SIGN: u64 = 0x400;

/// TCC offset field: bits 24-29 of the temperature target register
const TCC_SHIFT: u32 = 24;
const TCC_MASK: u64 = 0x3F;

/// TjMax field: bits 16-23 of the temperature target register
const TJMAX_SHIFT: u32 = 16;
const TJMAX_MASK: u64 = 0xFF;

/// TjMax assumed when the register is unreadable or reports zero
pub const DEFAULT_TJMAX: u8 = 100;

/// Undervolt offset in millivolts, bounded to [-250, 0]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoltageOffset(i32);

impl VoltageOffset {
    pub const MIN_MV: i32 = -250;
    pub const MAX_MV: i32 = 0;

    /// Create a validated offset
    pub fn new(millivolts: i32) -> Result<Self, DomainError> {
        if !(Self::MIN_MV..=Self::MAX_MV).contains(&millivolts) {
            return Err(DomainError::InvalidVoltageOffset(millivolts));
        }
        Ok(Self(millivolts))
    }

    #[inline]
    pub const fn as_millivolts(&self) -> i32 {
        self.0
    }

    /// Offset in 1/1.024 mV register units, truncated toward zero
    pub const fn to_units(&self) -> i32 {
        self.0 * 1000 / 1024
    }

    /// Pack into an otherwise-zero register word
    pub const fn encode(&self) -> u64 {
        ((self.to_units() as u32 as u64) & VOLTAGE_MASK) << VOLTAGE_SHIFT
    }

    /// Extract the offset in millivolts from a register word
    pub fn decode_millivolts(word: u64) -> i32 {
        let raw = (word >> VOLTAGE_SHIFT) & VOLTAGE_MASK;
        let units = if raw & VOLTAGE_SIGN != 0 {
            raw as i64 - (VOLTAGE_MASK as i64 + 1)
        } else {
            raw as i64
        };
        (units as f64 * 1.024).round() as i32
    }
}

impl fmt::Display for VoltageOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mV", self.0)
    }
}

/// Thermal control circuit offset in degrees, bounded to [0, 63]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TccOffset(u8);

impl TccOffset {
    pub const MAX: i32 = 63;

    /// Create a validated offset
    pub fn new(degrees: i32) -> Result<Self, DomainError> {
        if !(0..=Self::MAX).contains(&degrees) {
            return Err(DomainError::InvalidTccOffset(degrees));
        }
        Ok(Self(degrees as u8))
    }

    #[inline]
    pub const fn as_degrees(&self) -> u8 {
        self.0
    }

    /// Replace bits 24-29 of `word`, keeping every other bit
    pub const fn apply(&self, word: u64) -> u64 {
        (word & !(TCC_MASK << TCC_SHIFT)) | ((self.0 as u64) << TCC_SHIFT)
    }

    /// Extract the offset from a temperature target word
    pub const fn decode(word: u64) -> u8 {
        ((word >> TCC_SHIFT) & TCC_MASK) as u8
    }
}

impl fmt::Display for TccOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°C", self.0)
    }
}

/// TjMax from a temperature target word, defaulting when zero
pub const fn decode_tjmax(word: u64) -> u8 {
    match ((word >> TJMAX_SHIFT) & TJMAX_MASK) as u8 {
        0 => DEFAULT_TJMAX,
        v => v,
    }
}
