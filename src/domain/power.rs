//! Power domain types
//!
//! Performance modes and the eighth-watt encoding used by the EC
//! power-limit registers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EC power-limit registers count in eighth-watt units
pub const UNITS_PER_WATT: u32 = 8;

/// PL1 bounds in eighth-watt units (10-150W)
pub const PL1_MIN_UNITS: u16 = 80;
pub const PL1_MAX_UNITS: u16 = 1200;

/// PL2 bounds in eighth-watt units (10-200W)
pub const PL2_MIN_UNITS: u16 = 80;
pub const PL2_MAX_UNITS: u16 = 1600;

/// TGP bounds in eighth-watt units (30-200W)
pub const TGP_MIN_UNITS: u16 = 240;
pub const TGP_MAX_UNITS: u16 = 1600;

/// Abstract performance mode selected by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceMode {
    /// Mode name ("eco", "balanced", "performance", "turbo", ...)
    pub name: String,
    /// Sustained CPU power limit in watts
    pub cpu_watts: u32,
    /// GPU total graphics power in watts
    pub gpu_watts: u32,
}

impl PerformanceMode {
    /// Create a new performance mode
    pub fn new(name: impl Into<String>, cpu_watts: u32, gpu_watts: u32) -> Self {
        Self {
            name: name.into(),
            cpu_watts,
            gpu_watts,
        }
    }

    /// Built-in presets by (case-insensitive) name
    pub fn preset(name: &str) -> Option<Self> {
        let (cpu, gpu) = match name.to_ascii_lowercase().as_str() {
            "eco" | "quiet" => (15, 30),
            "balanced" => (45, 80),
            "performance" | "gaming" => (65, 115),
            "turbo" => (90, 140),
            _ => return None,
        };
        Some(Self::new(name, cpu, gpu))
    }

    /// Mode byte for EC firmware that only exposes a mode selector
    pub fn mode_byte(&self) -> ModeByte {
        ModeByte::from_name(&self.name)
    }
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (CPU {}W, GPU {}W)",
            self.name, self.cpu_watts, self.gpu_watts
        )
    }
}

/// Mode selector values understood by simplified EC firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ModeByte {
    Eco = 0,
    Balanced = 1,
    Performance = 2,
    Turbo = 3,
}

impl ModeByte {
    /// Case-insensitive name lookup; unknown names map to Balanced
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "eco" | "quiet" => ModeByte::Eco,
            "performance" | "gaming" => ModeByte::Performance,
            "turbo" => ModeByte::Turbo,
            _ => ModeByte::Balanced,
        }
    }

    /// Decode a byte read back from the EC
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(ModeByte::Eco),
            1 => Some(ModeByte::Balanced),
            2 => Some(ModeByte::Performance),
            3 => Some(ModeByte::Turbo),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ModeByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModeByte::Eco => "eco",
            ModeByte::Balanced => "balanced",
            ModeByte::Performance => "performance",
            ModeByte::Turbo => "turbo",
        };
        write!(f, "{}", name)
    }
}

/// Power limits already clamped and converted to eighth-watt units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedLimits {
    pub pl1: u16,
    pub pl2: u16,
    pub tgp: u16,
}

impl EncodedLimits {
    /// Derive register values from a mode.
    ///
    /// PL1 = W x 8, PL2 = W x 1.5 x 8, TGP = W x 8, each clamped into the
    /// manufacturer-safe window regardless of input.
    pub fn from_mode(mode: &PerformanceMode) -> Self {
        let pl1 = mode.cpu_watts.saturating_mul(UNITS_PER_WATT);
        let pl2 = mode.cpu_watts.saturating_mul(UNITS_PER_WATT * 3) / 2;
        let tgp = mode.gpu_watts.saturating_mul(UNITS_PER_WATT);

        Self {
            pl1: clamp_units(pl1, PL1_MIN_UNITS, PL1_MAX_UNITS),
            pl2: clamp_units(pl2, PL2_MIN_UNITS, PL2_MAX_UNITS),
            tgp: clamp_units(tgp, TGP_MIN_UNITS, TGP_MAX_UNITS),
        }
    }

    /// Convert back to watts
    pub fn to_limits(self) -> PowerLimits {
        let w = |units: u16| units as f32 / UNITS_PER_WATT as f32;
        PowerLimits {
            pl1_watts: w(self.pl1),
            pl2_watts: w(self.pl2),
            tgp_watts: w(self.tgp),
        }
    }
}

fn clamp_units(units: u32, min: u16, max: u16) -> u16 {
    units.clamp(min as u32, max as u32) as u16
}

/// Power limits as read back from the EC
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLimits {
    pub pl1_watts: f32,
    pub pl2_watts: f32,
    pub tgp_watts: f32,
}

impl fmt::Display for PowerLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PL1 {:.1}W, PL2 {:.1}W, TGP {:.1}W",
            self.pl1_watts, self.pl2_watts, self.tgp_watts
        )
    }
}
