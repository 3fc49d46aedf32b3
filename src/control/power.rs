//! Power limit controller
//!
//! Translates a performance mode into EC writes, either as a single mode
//! selector byte or as PL1/PL2/TGP limits in eighth-watt units.

use crate::control::ec::{registers, RegisterChannel};
use crate::domain::{EncodedLimits, ModeByte, PerformanceMode, PowerLimits};
use crate::error::HwError;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// EC registers driven by the controller.
///
/// The detailed-mode map and its encoding are unverified per-model data. It
/// may be pointed at other addresses, but every write still goes through the
/// channel allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerRegisterMap {
    /// Mode selector byte
    pub mode: u16,
    /// PL1 (low, high)
    pub pl1: [u16; 2],
    /// PL2 (low, high)
    pub pl2: [u16; 2],
    /// TGP (low, high)
    pub tgp: [u16; 2],
}

impl Default for PowerRegisterMap {
    fn default() -> Self {
        Self {
            mode: registers::PERFORMANCE_MODE,
            pl1: [registers::PL1_LO, registers::PL1_HI],
            pl2: [registers::PL2_LO, registers::PL2_HI],
            tgp: [registers::TGP_LO, registers::TGP_HI],
        }
    }
}

impl PowerRegisterMap {
    fn limit_writes(&self, limits: EncodedLimits) -> [(u16, u8); 6] {
        let [pl1_lo, pl1_hi] = limits.pl1.to_le_bytes();
        let [pl2_lo, pl2_hi] = limits.pl2.to_le_bytes();
        let [tgp_lo, tgp_hi] = limits.tgp.to_le_bytes();
        [
            (self.pl1[0], pl1_lo),
            (self.pl1[1], pl1_hi),
            (self.pl2[0], pl2_lo),
            (self.pl2[1], pl2_hi),
            (self.tgp[0], tgp_lo),
            (self.tgp[1], tgp_hi),
        ]
    }
}

/// How a mode is expressed to the EC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerStrategy {
    /// One mode selector byte
    #[default]
    Simplified,
    /// PL1/PL2/TGP wattage registers
    Detailed,
}

/// Result of applying a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AppliedPower {
    Mode(ModeByte),
    Limits(EncodedLimits),
}

impl fmt::Display for AppliedPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppliedPower::Mode(mode) => write!(f, "mode {} (0x{:02X})", mode, mode.as_byte()),
            AppliedPower::Limits(limits) => write!(f, "{}", limits.to_limits()),
        }
    }
}

/// Applies performance modes through the register channel
pub struct PowerLimitController {
    channel: Arc<RegisterChannel>,
    strategy: PowerStrategy,
    registers: PowerRegisterMap,
}

impl PowerLimitController {
    /// Create a controller
    pub fn new(channel: Arc<RegisterChannel>, strategy: PowerStrategy) -> Self {
        Self {
            channel,
            strategy,
            registers: PowerRegisterMap::default(),
        }
    }

    /// Builder: override the register map
    pub fn with_registers(mut self, registers: PowerRegisterMap) -> Self {
        self.registers = registers;
        self
    }

    /// Configured strategy
    pub fn strategy(&self) -> PowerStrategy {
        self.strategy
    }

    /// What `apply_performance_limits` would write for `mode`
    pub fn plan(&self, mode: &PerformanceMode) -> AppliedPower {
        match self.strategy {
            PowerStrategy::Simplified => AppliedPower::Mode(mode.mode_byte()),
            PowerStrategy::Detailed => AppliedPower::Limits(EncodedLimits::from_mode(mode)),
        }
    }

    /// Apply a performance mode
    pub fn apply_performance_limits(&self, mode: &PerformanceMode) -> Result<AppliedPower, HwError> {
        if !self.channel.is_available() {
            return Err(HwError::NotReady);
        }

        let applied = self.plan(mode);
        match applied {
            AppliedPower::Mode(byte) => {
                self.channel
                    .write_byte(self.registers.mode, byte.as_byte())
                    .map_err(|e| blocked("performance mode", e))?;
            }
            AppliedPower::Limits(limits) => {
                let writes = self.registers.limit_writes(limits);

                // All-or-nothing: a rejected address must not leave a
                // partially-applied limit set behind.
                if let Some(&(address, _)) = writes
                    .iter()
                    .find(|(address, _)| !RegisterChannel::is_writable(*address))
                {
                    return Err(blocked(
                        "power limits",
                        HwError::SafetyViolation { address },
                    ));
                }

                for (address, value) in writes {
                    self.channel
                        .write_byte(address, value)
                        .map_err(|e| blocked("power limits", e))?;
                }
            }
        }

        log::info!("Applied {} as {}", mode, applied);
        Ok(applied)
    }

    /// Limits currently programmed in the EC.
    ///
    /// Only meaningful with the detailed strategy; `None` in simplified mode,
    /// without a handle, or when a read fails.
    pub fn read_current_power_limits(&self) -> Option<PowerLimits> {
        if self.strategy != PowerStrategy::Detailed || !self.channel.is_available() {
            return None;
        }

        let read_pair = |pair: [u16; 2]| -> Option<u16> {
            let lo = self.channel.read_byte(pair[0]).ok()?;
            let hi = self.channel.read_byte(pair[1]).ok()?;
            Some(u16::from_le_bytes([lo, hi]))
        };

        let limits = EncodedLimits {
            pl1: read_pair(self.registers.pl1)?,
            pl2: read_pair(self.registers.pl2)?,
            tgp: read_pair(self.registers.tgp)?,
        };
        Some(limits.to_limits())
    }

    /// Raw mode selector byte, `None` when unreadable
    pub fn read_current_performance_mode(&self) -> Option<u8> {
        self.channel
            .read_byte(self.registers.mode)
            .map_err(|e| log::debug!("Performance mode unreadable: {}", e))
            .ok()
    }
}

fn blocked(what: &str, err: HwError) -> HwError {
    match err {
        HwError::SafetyViolation { .. } => {
            log::warn!("{} write blocked by allowlist: {}", what, err);
            HwError::BlockedWrite {
                what: what.to_string(),
                source: Box::new(err),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mock::{EcOp, MockEc};

    fn controller(mock: &MockEc, strategy: PowerStrategy) -> PowerLimitController {
        let channel = Arc::new(RegisterChannel::default());
        channel.attach(Box::new(mock.clone()));
        PowerLimitController::new(channel, strategy)
    }

    #[test]
    fn test_simplified_turbo_writes_mode_three() {
        let mock = MockEc::new();
        let ctl = controller(&mock, PowerStrategy::Simplified);

        ctl.apply_performance_limits(&PerformanceMode::new("turbo", 0, 0))
            .unwrap();
        assert_eq!(
            mock.writes(),
            vec![(registers::PERFORMANCE_MODE, 0x03)]
        );
    }

    #[test]
    fn test_simplified_unknown_defaults_to_balanced() {
        let mock = MockEc::new();
        let ctl = controller(&mock, PowerStrategy::Simplified);

        let applied = ctl
            .apply_performance_limits(&PerformanceMode::new("extreme", 0, 0))
            .unwrap();
        assert_eq!(applied, AppliedPower::Mode(ModeByte::Balanced));
        assert_eq!(mock.get(registers::PERFORMANCE_MODE), 0x01);
    }

    #[test]
    fn test_detailed_clamps_to_floor_and_ceiling() {
        let mock = MockEc::new();
        let ctl = controller(&mock, PowerStrategy::Detailed);

        ctl.apply_performance_limits(&PerformanceMode::new("low", 5, 5))
            .unwrap();
        let pl1 = u16::from_le_bytes([mock.get(registers::PL1_LO), mock.get(registers::PL1_HI)]);
        assert_eq!(pl1, 80);

        ctl.apply_performance_limits(&PerformanceMode::new("high", 300, 300))
            .unwrap();
        let pl1 = u16::from_le_bytes([mock.get(registers::PL1_LO), mock.get(registers::PL1_HI)]);
        assert_eq!(pl1, 1200);
    }

    #[test]
    fn test_detailed_write_order_and_values() {
        let mock = MockEc::new();
        let ctl = controller(&mock, PowerStrategy::Detailed);

        ctl.apply_performance_limits(&PerformanceMode::new("balanced", 45, 80))
            .unwrap();
        // PL1 360 = 0x0168, PL2 540 = 0x021C, TGP 640 = 0x0280
        assert_eq!(
            mock.writes(),
            vec![
                (registers::PL1_LO, 0x68),
                (registers::PL1_HI, 0x01),
                (registers::PL2_LO, 0x1C),
                (registers::PL2_HI, 0x02),
                (registers::TGP_LO, 0x80),
                (registers::TGP_HI, 0x02),
            ]
        );
    }

    #[test]
    fn test_detailed_rejected_address_writes_nothing() {
        let mock = MockEc::new();
        let mut map = PowerRegisterMap::default();
        map.tgp = [0xD0, 0xD1];
        let ctl = controller(&mock, PowerStrategy::Detailed).with_registers(map);

        let err = ctl
            .apply_performance_limits(&PerformanceMode::new("x", 45, 80))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SafetyViolation);
        assert_eq!(err.rejected_address(), Some(0xD0));
        assert!(err.to_string().contains("out-of-band hardware verification"));
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_simplified_rejected_mode_register() {
        let mock = MockEc::new();
        let map = PowerRegisterMap {
            mode: 0x99,
            ..PowerRegisterMap::default()
        };
        let ctl = controller(&mock, PowerStrategy::Simplified).with_registers(map);

        let err = ctl
            .apply_performance_limits(&PerformanceMode::new("eco", 0, 0))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SafetyViolation);
        assert!(mock.ops().is_empty());
    }

    #[test]
    fn test_not_ready_writes_nothing() {
        let ctl = PowerLimitController::new(
            Arc::new(RegisterChannel::default()),
            PowerStrategy::Detailed,
        );
        let err = ctl
            .apply_performance_limits(&PerformanceMode::new("turbo", 90, 140))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotReady);
    }

    #[test]
    fn test_read_current_power_limits() {
        let mock = MockEc::new();
        let ctl = controller(&mock, PowerStrategy::Detailed);
        ctl.apply_performance_limits(&PerformanceMode::new("balanced", 45, 80))
            .unwrap();

        let limits = ctl.read_current_power_limits().unwrap();
        assert_eq!(limits.pl1_watts, 45.0);
        assert_eq!(limits.pl2_watts, 67.5);
        assert_eq!(limits.tgp_watts, 80.0);
    }

    #[test]
    fn test_read_limits_none_in_simplified_or_failure() {
        let mock = MockEc::new();
        let ctl = controller(&mock, PowerStrategy::Simplified);
        assert!(ctl.read_current_power_limits().is_none());

        let ctl = controller(&mock, PowerStrategy::Detailed);
        mock.fail_io(true);
        assert!(ctl.read_current_power_limits().is_none());
        assert!(ctl.read_current_performance_mode().is_none());
    }

    #[test]
    fn test_read_current_performance_mode() {
        let mock = MockEc::new();
        mock.set(registers::PERFORMANCE_MODE, 2);
        let ctl = controller(&mock, PowerStrategy::Simplified);
        assert_eq!(ctl.read_current_performance_mode(), Some(2));
        assert!(mock.ops().contains(&EcOp::Read(registers::PERFORMANCE_MODE)));
    }
}
