//! Voltage and thermal register access
//!
//! Owns the MSR handle. Every operation holds the handle lock for its full
//! duration, so a read-modify-write cannot interleave with another call on
//! the same object.

use crate::control::lock_handle;
use crate::domain::{decode_tjmax, TccOffset, VoltageOffset, DEFAULT_TJMAX};
use crate::driver::{self, DriverKind, MsrTransport};
use crate::error::HwError;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

/// Register numbers used for undervolt and thermal-target access.
///
/// The voltage planes are driver-side register numbers; like the EC map they
/// are unverified per-platform data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsrAddressMap {
    /// Core voltage plane
    pub core_voltage_plane: u32,
    /// Cache (ring) voltage plane
    pub cache_voltage_plane: u32,
    /// IA32_TEMPERATURE_TARGET
    pub temperature_target: u32,
}

impl Default for MsrAddressMap {
    fn default() -> Self {
        Self {
            core_voltage_plane: 0x150,
            cache_voltage_plane: 0x151,
            temperature_target: 0x1A2,
        }
    }
}

/// Which voltage plane an offset applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoltagePlane {
    Core,
    Cache,
}

impl std::fmt::Display for VoltagePlane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoltagePlane::Core => write!(f, "core"),
            VoltagePlane::Cache => write!(f, "cache"),
        }
    }
}

/// Serialized access to model-specific registers
pub struct MsrAccess {
    transport: Mutex<Option<Box<dyn MsrTransport>>>,
    kind: DriverKind,
    addresses: MsrAddressMap,
}

impl MsrAccess {
    /// Create an access object with no open handle
    pub fn new(kind: DriverKind, addresses: MsrAddressMap) -> Self {
        Self {
            transport: Mutex::new(None),
            kind,
            addresses,
        }
    }

    /// Open the device at `path`, replacing any prior handle
    pub fn initialize(&self, path: &Path) -> bool {
        let mut slot = lock_handle(&self.transport);
        *slot = None;
        match driver::open_msr(self.kind, path) {
            Ok(transport) => {
                *slot = Some(transport);
                true
            }
            Err(e) => {
                log::warn!("MSR device {} unavailable: {}", path.display(), e);
                false
            }
        }
    }

    /// Install an already-open transport, replacing any prior handle
    pub fn attach(&self, transport: Box<dyn MsrTransport>) -> bool {
        *lock_handle(&self.transport) = Some(transport);
        true
    }

    /// Release the handle
    pub fn close(&self) {
        if lock_handle(&self.transport).take().is_some() {
            log::info!("MSR handle released");
        }
    }

    /// Whether a handle is open
    pub fn is_available(&self) -> bool {
        lock_handle(&self.transport).is_some()
    }

    /// Register map in use
    pub fn addresses(&self) -> &MsrAddressMap {
        &self.addresses
    }

    fn with_transport<T>(
        &self,
        f: impl FnOnce(&mut dyn MsrTransport) -> Result<T, HwError>,
    ) -> Result<T, HwError> {
        let mut slot = lock_handle(&self.transport);
        let transport = slot.as_mut().ok_or(HwError::NotReady)?;
        f(transport.as_mut())
    }

    /// Raw 64-bit read
    pub fn read_register(&self, address: u32) -> Result<u64, HwError> {
        self.with_transport(|t| read_raw(t, address))
    }

    /// Raw 64-bit write
    pub fn write_register(&self, address: u32, value: u64) -> Result<(), HwError> {
        self.with_transport(|t| write_raw(t, address, value))
    }

    fn plane_address(&self, plane: VoltagePlane) -> u32 {
        match plane {
            VoltagePlane::Core => self.addresses.core_voltage_plane,
            VoltagePlane::Cache => self.addresses.cache_voltage_plane,
        }
    }

    /// Write a voltage offset to a plane.
    ///
    /// The register is overwritten with a word holding only the offset field.
    pub fn apply_voltage_offset(&self, plane: VoltagePlane, millivolts: i32) -> Result<(), HwError> {
        let offset = VoltageOffset::new(millivolts)?;
        let address = self.plane_address(plane);
        self.with_transport(|t| write_raw(t, address, offset.encode()))?;
        log::info!("Applied {} voltage offset {}", plane, offset);
        Ok(())
    }

    pub fn apply_core_voltage_offset(&self, millivolts: i32) -> Result<(), HwError> {
        self.apply_voltage_offset(VoltagePlane::Core, millivolts)
    }

    pub fn apply_cache_voltage_offset(&self, millivolts: i32) -> Result<(), HwError> {
        self.apply_voltage_offset(VoltagePlane::Cache, millivolts)
    }

    /// Current offset of a plane in millivolts, 0 when unreadable
    pub fn read_voltage_offset(&self, plane: VoltagePlane) -> i32 {
        match self.read_register(self.plane_address(plane)) {
            Ok(word) => VoltageOffset::decode_millivolts(word),
            Err(e) => {
                log::debug!("Reading {} voltage offset failed, reporting 0: {}", plane, e);
                0
            }
        }
    }

    pub fn read_core_voltage_offset(&self) -> i32 {
        self.read_voltage_offset(VoltagePlane::Core)
    }

    pub fn read_cache_voltage_offset(&self) -> i32 {
        self.read_voltage_offset(VoltagePlane::Cache)
    }

    /// Set the TCC offset, preserving every other bit of the target register
    pub fn set_tcc_offset(&self, degrees: i32) -> Result<(), HwError> {
        let offset = TccOffset::new(degrees)?;
        let address = self.addresses.temperature_target;
        self.with_transport(|t| {
            let current = read_raw(t, address)?;
            write_raw(t, address, offset.apply(current))
        })?;
        log::info!("Applied TCC offset {}", offset);
        Ok(())
    }

    /// Current TCC offset, 0 when unreadable
    pub fn read_tcc_offset(&self) -> u8 {
        self.read_temperature_target()
            .map(TccOffset::decode)
            .unwrap_or(0)
    }

    /// TjMax, 100 when unreadable or zero
    pub fn read_tjmax(&self) -> u8 {
        self.read_temperature_target()
            .map(decode_tjmax)
            .unwrap_or(DEFAULT_TJMAX)
    }

    /// Effective throttle temperature: TjMax minus the TCC offset
    pub fn effective_temp_limit(&self) -> u8 {
        match self.read_temperature_target() {
            Some(word) => decode_tjmax(word).saturating_sub(TccOffset::decode(word)),
            None => DEFAULT_TJMAX,
        }
    }

    fn read_temperature_target(&self) -> Option<u64> {
        self.read_register(self.addresses.temperature_target)
            .map_err(|e| log::debug!("Temperature target unreadable: {}", e))
            .ok()
    }
}

impl Drop for MsrAccess {
    fn drop(&mut self) {
        self.close();
    }
}

fn read_raw(t: &mut dyn MsrTransport, address: u32) -> Result<u64, HwError> {
    let value = t
        .read(address)
        .map_err(|e| HwError::device(format!("MSR read 0x{:X}", address), e))?;
    log::debug!("MSR read 0x{:X} -> 0x{:016X}", address, value);
    Ok(value)
}

fn write_raw(t: &mut dyn MsrTransport, address: u32, value: u64) -> Result<(), HwError> {
    t.write(address, value)
        .map_err(|e| HwError::device(format!("MSR write 0x{:X}", address), e))?;
    log::debug!("MSR write 0x{:X} <- 0x{:016X}", address, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mock::MockMsr;

    fn access_with(mock: &MockMsr) -> MsrAccess {
        let access = MsrAccess::new(DriverKind::Ioctl, MsrAddressMap::default());
        access.attach(Box::new(mock.clone()));
        access
    }

    #[test]
    fn test_raw_register_access() {
        let mock = MockMsr::new();
        let access = access_with(&mock);

        access.write_register(0x610, 0x00DD_8000_0014_8118).unwrap();
        assert_eq!(access.read_register(0x610).unwrap(), 0x00DD_8000_0014_8118);
        assert_eq!(mock.write_count(), 1);

        access.close();
        assert!(matches!(access.write_register(0x610, 0), Err(HwError::NotReady)));
    }

    #[test]
    fn test_voltage_roundtrip() {
        let mock = MockMsr::new();
        let access = access_with(&mock);

        for mv in [0, -1, -50, -128, -250] {
            access.apply_core_voltage_offset(mv).unwrap();
            access.apply_cache_voltage_offset(mv).unwrap();
            assert!((access.read_core_voltage_offset() - mv).abs() <= 1);
            assert!((access.read_cache_voltage_offset() - mv).abs() <= 1);
        }
    }

    #[test]
    fn test_voltage_out_of_range_writes_nothing() {
        let mock = MockMsr::new();
        let access = access_with(&mock);

        for mv in [1, -251] {
            let err = access.apply_core_voltage_offset(mv).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
            let err = access.apply_cache_voltage_offset(mv).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(mock.write_count(), 0);
    }

    #[test]
    fn test_voltage_write_is_full_overwrite() {
        let mock = MockMsr::new();
        mock.set(0x150, 0xFFFF_FFFF_FFFF_FFFF);
        let access = access_with(&mock);

        access.apply_core_voltage_offset(-128).unwrap();
        assert_eq!(mock.get(0x150), 0x783 << 21);
    }

    #[test]
    fn test_planes_are_independent() {
        let mock = MockMsr::new();
        let access = access_with(&mock);

        access.apply_core_voltage_offset(-100).unwrap();
        access.apply_cache_voltage_offset(-20).unwrap();
        assert!((access.read_core_voltage_offset() + 100).abs() <= 1);
        assert!((access.read_cache_voltage_offset() + 20).abs() <= 1);
    }

    #[test]
    fn test_tcc_roundtrip() {
        let mock = MockMsr::new();
        mock.set(0x1A2, 0x0064_0000);
        let access = access_with(&mock);

        for n in [0, 15, 63] {
            access.set_tcc_offset(n).unwrap();
            assert_eq!(access.read_tcc_offset() as i32, n);
        }
        assert_eq!(access.read_tjmax(), 100);
    }

    #[test]
    fn test_tcc_out_of_range() {
        let mock = MockMsr::new();
        let access = access_with(&mock);

        for n in [64, -1] {
            let err = access.set_tcc_offset(n).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(mock.write_count(), 0);
    }

    #[test]
    fn test_tcc_preserves_other_bits() {
        let mock = MockMsr::new();
        mock.set(0x1A2, 0x8000_0000_C05F_ABCD);
        let access = access_with(&mock);

        access.set_tcc_offset(10).unwrap();
        let word = mock.get(0x1A2);
        assert_eq!(word & !(0x3F << 24), 0x8000_0000_C05F_ABCD & !(0x3F << 24));
        assert_eq!(access.read_tcc_offset(), 10);
        assert_eq!(access.read_tjmax(), 0x5F);
        assert_eq!(access.effective_temp_limit(), 0x5F - 10);
    }

    #[test]
    fn test_graceful_defaults_when_unavailable() {
        let access = MsrAccess::new(DriverKind::Ioctl, MsrAddressMap::default());
        assert_eq!(access.read_core_voltage_offset(), 0);
        assert_eq!(access.read_cache_voltage_offset(), 0);
        assert_eq!(access.read_tcc_offset(), 0);
        assert_eq!(access.read_tjmax(), 100);
        assert_eq!(access.effective_temp_limit(), 100);
        assert!(matches!(
            access.apply_core_voltage_offset(-10),
            Err(HwError::NotReady)
        ));
        assert!(matches!(access.set_tcc_offset(5), Err(HwError::NotReady)));
    }

    #[test]
    fn test_graceful_defaults_on_device_error() {
        let mock = MockMsr::new();
        mock.fail_io(true);
        let access = access_with(&mock);
        assert_eq!(access.read_tjmax(), 100);
        assert_eq!(access.read_core_voltage_offset(), 0);
        let err = access.apply_core_voltage_offset(-10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Device);
    }
}
