//! Memory address wrapper type with hex parsing and checked arithmetic

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An address in the target process's address space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub usize);

impl Address {
    /// Creates a new address from a usize value
    pub const fn new(value: usize) -> Self {
        Address(value)
    }

    /// Creates a null address (0x0)
    pub const fn null() -> Self {
        Address(0)
    }

    /// Checks if the address is null
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Aligns the address down to the specified power-of-two boundary
    pub const fn align_down(&self, alignment: usize) -> Self {
        if alignment == 0 {
            return *self;
        }
        Address(self.0 & !(alignment - 1))
    }

    /// Adds a byte count, returning `None` past the top of the address space
    pub const fn checked_add(&self, bytes: usize) -> Option<Self> {
        match self.0.checked_add(bytes) {
            Some(value) => Some(Address(value)),
            None => None,
        }
    }

    /// Adds a byte count, clamping at the top of the address space
    pub const fn saturating_add(&self, bytes: usize) -> Self {
        Address(self.0.saturating_add(bytes))
    }

    /// Subtracts a byte count, clamping at zero
    pub const fn saturating_sub(&self, bytes: usize) -> Self {
        Address(self.0.saturating_sub(bytes))
    }

    /// Number of bytes from `self` up to `other` (zero when `other` is lower)
    pub const fn distance_to(&self, other: Address) -> usize {
        other.0.saturating_sub(self.0)
    }

    /// Returns the raw usize value
    pub const fn as_usize(&self) -> usize {
        self.0
    }
}

impl FromStr for Address {
    type Err = MemoryError;

    fn from_str(s: &str) -> MemoryResult<Self> {
        let s = s.trim();

        let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            usize::from_str_radix(hex, 16)
        } else if s.chars().any(|c| c.is_ascii_alphabetic()) {
            // Assume hex if contains letters
            usize::from_str_radix(s, 16)
        } else {
            s.parse::<usize>()
        };

        value
            .map(Address::new)
            .map_err(|_| MemoryError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<usize> for Address {
    fn from(value: usize) -> Self {
        Address::new(value)
    }
}

impl From<Address> for usize {
    fn from(address: Address) -> Self {
        address.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parsing() {
        assert_eq!(Address::from_str("0x1000").unwrap(), Address::new(0x1000));
        assert_eq!(Address::from_str("0X1000").unwrap(), Address::new(0x1000));
        assert_eq!(
            Address::from_str("7fffDEADBEEF").unwrap(),
            Address::new(0x7fff_dead_beef)
        );
        assert_eq!(Address::from_str(" 4096 ").unwrap(), Address::new(4096));
        assert!(Address::from_str("0xnothex").is_err());
        assert!(Address::from_str("").is_err());
    }

    #[test]
    fn test_address_arithmetic() {
        let addr = Address::new(0x1005);
        assert_eq!(addr.align_down(0x1000), Address::new(0x1000));
        assert_eq!(addr.checked_add(0x10), Some(Address::new(0x1015)));
        assert_eq!(Address::new(usize::MAX).checked_add(1), None);
        assert_eq!(Address::new(usize::MAX).saturating_add(1), Address::new(usize::MAX));
        assert_eq!(Address::new(4).saturating_sub(8), Address::null());
        assert_eq!(Address::new(0x1000).distance_to(Address::new(0x1800)), 0x800);
        assert_eq!(Address::new(0x1800).distance_to(Address::new(0x1000)), 0);
    }

    #[test]
    fn test_address_display() {
        let addr = Address::new(0xDEADBEEF);
        assert_eq!(format!("{}", addr), "0x00000000DEADBEEF");
        assert_eq!(format!("{:x}", addr), "0x00000000deadbeef");
        assert_eq!(format!("{:X}", addr), "0x00000000DEADBEEF");
    }
}
