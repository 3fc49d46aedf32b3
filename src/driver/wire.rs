//! Fixed-layout driver request structures
//!
//! The driver expects these exact byte layouts. There is no version field or
//! negotiation; all fields are little-endian and tightly packed.

/// Linux `_IOWR` request number
const fn iowr(ty: u8, nr: u8, size: usize) -> u64 {
    const IOC_READ_WRITE: u64 = 3;
    (IOC_READ_WRITE << 30) | ((size as u64) << 16) | ((ty as u64) << 8) | nr as u64
}

const DRIVER_MAGIC: u8 = b'E';

pub const IOCTL_EC_READ: u64 = iowr(DRIVER_MAGIC, 0x01, EcRequest::SIZE);
pub const IOCTL_EC_WRITE: u64 = iowr(DRIVER_MAGIC, 0x02, EcRequest::SIZE);
pub const IOCTL_MSR_READ: u64 = iowr(DRIVER_MAGIC, 0x10, MsrReadRequest::BUFFER_SIZE);
pub const IOCTL_MSR_WRITE: u64 = iowr(DRIVER_MAGIC, 0x11, MsrWriteRequest::SIZE);

/// EC request `{ address: u16, value: u8 }`, used for both read and write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcRequest {
    pub address: u16,
    pub value: u8,
}

impl EcRequest {
    pub const SIZE: usize = 3;

    pub fn read(address: u16) -> Self {
        Self { address, value: 0 }
    }

    pub fn write(address: u16, value: u8) -> Self {
        Self { address, value }
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let [lo, hi] = self.address.to_le_bytes();
        [lo, hi, self.value]
    }

    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self {
            address: u16::from_le_bytes([bytes[0], bytes[1]]),
            value: bytes[2],
        }
    }
}

/// MSR read request `{ address: u32 }`
///
/// The driver answers in the same buffer, so the buffer is sized for the
/// 64-bit response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsrReadRequest {
    pub address: u32,
}

impl MsrReadRequest {
    pub const SIZE: usize = 4;
    pub const BUFFER_SIZE: usize = 8;

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        self.address.to_le_bytes()
    }

    /// In/out buffer with the request in the leading bytes
    pub fn to_buffer(self) -> [u8; Self::BUFFER_SIZE] {
        let mut buf = [0u8; Self::BUFFER_SIZE];
        buf[..Self::SIZE].copy_from_slice(&self.to_bytes());
        buf
    }
}

/// MSR write request `{ address: u32, value: u64 }`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsrWriteRequest {
    pub address: u32,
    pub value: u64,
}

impl MsrWriteRequest {
    pub const SIZE: usize = 12;

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[..4].copy_from_slice(&self.address.to_le_bytes());
        buf[4..].copy_from_slice(&self.value.to_le_bytes());
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ec_request_layout() {
        let bytes = EcRequest::write(0x01A2, 0x7F).to_bytes();
        assert_eq!(bytes, [0xA2, 0x01, 0x7F]);
        assert_eq!(EcRequest::from_bytes(bytes), EcRequest::write(0x01A2, 0x7F));
    }

    #[test]
    fn test_msr_read_buffer() {
        let buf = MsrReadRequest { address: 0x1A2 }.to_buffer();
        assert_eq!(buf, [0xA2, 0x01, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_msr_write_layout() {
        let bytes = MsrWriteRequest {
            address: 0x150,
            value: 0x8000_0011_F000_0000,
        }
        .to_bytes();
        assert_eq!(&bytes[..4], &[0x50, 0x01, 0, 0]);
        assert_eq!(&bytes[4..], &0x8000_0011_F000_0000u64.to_le_bytes());
    }

    #[test]
    fn test_ioctl_codes_encode_sizes() {
        assert_eq!((IOCTL_EC_READ >> 16) & 0x3FFF, 3);
        assert_eq!((IOCTL_MSR_READ >> 16) & 0x3FFF, 8);
        assert_eq!((IOCTL_MSR_WRITE >> 16) & 0x3FFF, 12);
        assert_ne!(IOCTL_EC_READ, IOCTL_EC_WRITE);
    }
}
