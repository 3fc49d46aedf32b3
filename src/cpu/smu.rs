//! SMU mailbox addresses per CPU family
//!
//! The system management unit is reached through an index/data register
//! pair on the host bridge. Each family exposes two mailboxes (MP1 and
//! either RSMU or PSMU), each a message/response/argument triple.

use crate::cpu::family::CpuFamily;
use crate::cpu::identity::SystemIdentity;

use serde::Serialize;

/// Message/response/argument register triple
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SmuMailbox {
    pub msg: u32,
    pub rsp: u32,
    pub arg: u32,
}

impl SmuMailbox {
    pub const fn new(msg: u32, rsp: u32, arg: u32) -> Self {
        Self { msg, rsp, arg }
    }
}

/// Active SMU addressing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SmuAddressTable {
    /// `false` means the family is unsupported
    pub enabled: bool,
    /// Host bridge PCI address (bus 0, device 0, function 0)
    pub pci_address: u32,
    /// Index register offset in host bridge config space
    pub offset_addr: u32,
    /// Data register offset in host bridge config space
    pub offset_data: u32,
    pub mp1: SmuMailbox,
    /// RSMU on desktop parts, PSMU on mobile parts
    pub rsmu: SmuMailbox,
}

pub const HOST_BRIDGE_PCI_ADDRESS: u32 = 0x0000_0000;
pub const SMU_OFFSET_ADDR: u32 = 0xB8;
pub const SMU_OFFSET_DATA: u32 = 0xBC;

const PSMU: SmuMailbox = SmuMailbox::new(0x3B1_0A20, 0x3B1_0A80, 0x3B1_0A88);

const fn enabled(mp1: SmuMailbox, rsmu: SmuMailbox) -> SmuAddressTable {
    SmuAddressTable {
        enabled: true,
        pci_address: HOST_BRIDGE_PCI_ADDRESS,
        offset_addr: SMU_OFFSET_ADDR,
        offset_data: SMU_OFFSET_DATA,
        mp1,
        rsmu,
    }
}

const RAVEN: SmuAddressTable = enabled(SmuMailbox::new(0x3B1_0528, 0x3B1_0564, 0x3B1_0998), PSMU);
const RENOIR: SmuAddressTable = enabled(SmuMailbox::new(0x3B1_0528, 0x3B1_0578, 0x3B1_0998), PSMU);
const STRIX: SmuAddressTable = enabled(SmuMailbox::new(0x3B1_0928, 0x3B1_0978, 0x3B1_0998), PSMU);
const SUMMIT: SmuAddressTable = enabled(
    SmuMailbox::new(0x3B1_0528, 0x3B1_0564, 0x3B1_0598),
    SmuMailbox::new(0x3B1_051C, 0x3B1_0568, 0x3B1_0590),
);
const MATISSE: SmuAddressTable = enabled(
    SmuMailbox::new(0x3B1_0530, 0x3B1_057C, 0x3B1_09C4),
    SmuMailbox::new(0x3B1_0524, 0x3B1_0570, 0x3B1_0A40),
);

impl SmuAddressTable {
    /// All-zero, explicitly disabled table
    pub const fn disabled() -> Self {
        SmuAddressTable {
            enabled: false,
            pci_address: 0,
            offset_addr: 0,
            offset_data: 0,
            mp1: SmuMailbox::new(0, 0, 0),
            rsmu: SmuMailbox::new(0, 0, 0),
        }
    }

    /// Fixed table for `family`
    pub const fn for_family(family: CpuFamily) -> Self {
        use CpuFamily::*;
        match family {
            RavenRidge | Picasso | Dali => RAVEN,
            Renoir | Lucienne | CezanneBarcelo | Rembrandt | Phoenix | HawkPoint | Mendocino
            | VanGogh => RENOIR,
            StrixPoint | KrackanPoint | StrixHalo => STRIX,
            SummitRidge | PinnacleRidge => SUMMIT,
            Matisse | Vermeer | Raphael | DragonRange | GraniteRidge | FireRange => MATISSE,
            Unknown => Self::disabled(),
        }
    }
}

/// What a consumer holding an optional table can do with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmuStatus {
    /// No table has been configured yet
    Uninitialized,
    /// Configured, but the family has no known addresses
    Unsupported,
    Ready,
}

impl SmuStatus {
    pub fn of(table: Option<&SmuAddressTable>) -> Self {
        match table {
            None => SmuStatus::Uninitialized,
            Some(t) if !t.enabled => SmuStatus::Unsupported,
            Some(_) => SmuStatus::Ready,
        }
    }
}

impl SystemIdentity {
    /// Write the table for this CPU's family into `target`
    pub fn configure_smu_addresses(&self, target: &mut SmuAddressTable) -> CpuFamily {
        let family = self.family();
        *target = SmuAddressTable::for_family(family);
        log::debug!("SMU addresses for {family}: enabled={}", target.enabled);
        family
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cezanne_addresses() {
        let identity = SystemIdentity::new(
            "AMD Ryzen 7 5800H with Radeon Graphics",
            "AMD64 Family 25 Model 80 Stepping 0",
        );
        let mut table = SmuAddressTable::disabled();
        assert_eq!(identity.configure_smu_addresses(&mut table), CpuFamily::CezanneBarcelo);

        assert!(table.enabled);
        assert_eq!(table.offset_addr, 0xB8);
        assert_eq!(table.offset_data, 0xBC);
        assert_eq!(table.mp1, SmuMailbox::new(0x3B10528, 0x3B10578, 0x3B10998));
        assert_eq!(table.rsmu, SmuMailbox::new(0x3B10A20, 0x3B10A80, 0x3B10A88));
        assert_eq!(SmuStatus::of(Some(&table)), SmuStatus::Ready);
    }

    #[test]
    fn test_unknown_family_is_all_zero() {
        let identity = SystemIdentity::new("Some CPU", "Intel64 Family 6 Model 158 Stepping 10");
        let mut table = SmuAddressTable::for_family(CpuFamily::Renoir);
        assert_eq!(identity.configure_smu_addresses(&mut table), CpuFamily::Unknown);

        assert_eq!(table, SmuAddressTable::disabled());
        assert_eq!(table, SmuAddressTable::default());
        assert_eq!(SmuStatus::of(Some(&table)), SmuStatus::Unsupported);
    }

    #[test]
    fn test_uninitialized_distinct_from_unsupported() {
        assert_eq!(SmuStatus::of(None), SmuStatus::Uninitialized);
        assert_ne!(SmuStatus::of(None), SmuStatus::of(Some(&SmuAddressTable::disabled())));
    }

    #[test]
    fn test_desktop_families_use_rsmu() {
        let table = SmuAddressTable::for_family(CpuFamily::Vermeer);
        assert_eq!(table.rsmu.msg, 0x3B10524);
        assert_eq!(table.mp1.arg, 0x3B109C4);

        let table = SmuAddressTable::for_family(CpuFamily::SummitRidge);
        assert_eq!(table.rsmu, SmuMailbox::new(0x3B1051C, 0x3B10568, 0x3B10590));
    }

    #[test]
    fn test_strix_mp1() {
        let table = SmuAddressTable::for_family(CpuFamily::StrixHalo);
        assert_eq!(table.mp1.msg, 0x3B10928);
        assert_eq!(table.mp1.rsp, 0x3B10978);
    }
}
