//! Register address parsing

use crate::error::DomainError;

/// Parse a register address written as `0x1A2`, `1A2h` or decimal
pub fn parse_address(text: &str) -> Result<u32, DomainError> {
    let trimmed = text.trim();
    let parsed = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)
    } else if let Some(hex) = trimmed.strip_suffix('h').or_else(|| trimmed.strip_suffix('H')) {
        u32::from_str_radix(hex, 16)
    } else {
        trimmed.parse::<u32>()
    };
    parsed.map_err(|_| DomainError::InvalidAddress(text.to_string()))
}

/// Parse an 8-bit EC address
pub fn parse_ec_address(text: &str) -> Result<u16, DomainError> {
    let value = parse_address(text)?;
    u16::try_from(value)
        .ok()
        .filter(|v| *v <= 0xFF)
        .ok_or_else(|| DomainError::InvalidAddress(format!("{} (EC space is 0x00-0xFF)", text)))
}

/// Parse a byte value using the same notation as addresses
pub fn parse_byte(text: &str) -> Result<u8, DomainError> {
    let value = parse_address(text).map_err(|_| DomainError::InvalidValue(text.to_string()))?;
    u8::try_from(value).map_err(|_| DomainError::InvalidValue(format!("{} (must fit in one byte)", text)))
}
