//! Device-file transports
//!
//! Real implementations of the transport traits on top of a privileged
//! device path.

use crate::driver::traits::{EcTransport, MsrTransport};
use crate::driver::wire::{
    EcRequest, MsrReadRequest, MsrWriteRequest, IOCTL_EC_READ, IOCTL_EC_WRITE, IOCTL_MSR_READ,
    IOCTL_MSR_WRITE,
};

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

fn open_shared(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

/// Vendor driver speaking buffered ioctls
#[derive(Debug)]
pub struct IoctlDevice {
    file: File,
    path: PathBuf,
}

impl IoctlDevice {
    /// Open the device for read+write
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = open_shared(path)?;
        log::info!("Opened driver device {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Device path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ioctl(&self, request: u64, buf: &mut [u8]) -> io::Result<()> {
        // SAFETY: `buf` is a live, exclusively borrowed buffer sized for the
        // request code's encoded length; the driver reads and writes within it.
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), request as _, buf.as_mut_ptr()) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl EcTransport for IoctlDevice {
    fn read(&mut self, address: u16) -> io::Result<u8> {
        let mut buf = EcRequest::read(address).to_bytes();
        self.ioctl(IOCTL_EC_READ, &mut buf)?;
        Ok(EcRequest::from_bytes(buf).value)
    }

    fn write(&mut self, address: u16, value: u8) -> io::Result<()> {
        let mut buf = EcRequest::write(address, value).to_bytes();
        self.ioctl(IOCTL_EC_WRITE, &mut buf)
    }
}

impl MsrTransport for IoctlDevice {
    fn read(&mut self, address: u32) -> io::Result<u64> {
        let mut buf = MsrReadRequest { address }.to_buffer();
        self.ioctl(IOCTL_MSR_READ, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn write(&mut self, address: u32, value: u64) -> io::Result<()> {
        let mut buf = MsrWriteRequest { address, value }.to_bytes();
        self.ioctl(IOCTL_MSR_WRITE, &mut buf)
    }
}

/// Device file where the offset selects the register
///
/// Matches the `ec_sys` debugfs `io` file (loaded with `write_support=1`)
/// and the `msr` module's `/dev/cpu/N/msr`.
#[derive(Debug)]
pub struct PositionalDevice {
    file: File,
}

impl PositionalDevice {
    /// Open the device for read+write
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = open_shared(path)?;
        log::info!("Opened register file {}", path.display());
        Ok(Self { file })
    }
}

impl EcTransport for PositionalDevice {
    fn read(&mut self, address: u16) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.file.read_exact_at(&mut buf, address as u64)?;
        Ok(buf[0])
    }

    fn write(&mut self, address: u16, value: u8) -> io::Result<()> {
        self.file.write_all_at(&[value], address as u64)
    }
}

impl MsrTransport for PositionalDevice {
    fn read(&mut self, address: u32) -> io::Result<u64> {
        let mut buf = [0u8; 8];
        self.file.read_exact_at(&mut buf, address as u64)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn write(&mut self, address: u32, value: u64) -> io::Result<()> {
        self.file.write_all_at(&value.to_le_bytes(), address as u64)
    }
}
