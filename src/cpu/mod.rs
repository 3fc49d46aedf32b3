//! CPU identification and family resolution
//!
//! Identifies the processor once, classifies it into a microarchitecture
//! family, and selects the SMU mailbox addresses for that family.

pub mod family;
pub mod identity;
pub mod smu;

pub use family::{classify, CpuFamily};
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use identity::CpuidSource;
pub use identity::{CpuSignature, IdentitySource, ProcCpuinfoSource, StaticIdentity, SystemIdentity};
pub use smu::{SmuAddressTable, SmuMailbox, SmuStatus};
