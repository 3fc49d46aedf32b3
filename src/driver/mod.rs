//! Privileged driver abstraction layer
//!
//! Provides trait-based abstractions over the EC/MSR driver for testability,
//! the fixed-layout request structures, and the real device-file transports.

#[cfg(unix)]
pub mod device;
pub mod traits;
pub mod wire;

#[cfg(unix)]
pub use device::{IoctlDevice, PositionalDevice};
pub use traits::{DriverKind, EcTransport, MsrTransport};
pub use wire::{EcRequest, MsrReadRequest, MsrWriteRequest};

use std::io;
use std::path::Path;

/// Open an EC transport of the requested kind
pub fn open_ec(kind: DriverKind, path: &Path) -> io::Result<Box<dyn EcTransport>> {
    #[cfg(unix)]
    {
        Ok(match kind {
            DriverKind::Ioctl => Box::new(IoctlDevice::open(path)?),
            DriverKind::Positional => Box::new(PositionalDevice::open(path)?),
        })
    }
    #[cfg(not(unix))]
    {
        let _ = (kind, path);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "EC access is only implemented for unix device files",
        ))
    }
}

/// Open an MSR transport of the requested kind
pub fn open_msr(kind: DriverKind, path: &Path) -> io::Result<Box<dyn MsrTransport>> {
    #[cfg(unix)]
    {
        Ok(match kind {
            DriverKind::Ioctl => Box::new(IoctlDevice::open(path)?),
            DriverKind::Positional => Box::new(PositionalDevice::open(path)?),
        })
    }
    #[cfg(not(unix))]
    {
        let _ = (kind, path);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "MSR access is only implemented for unix device files",
        ))
    }
}
