use std::fmt;

use serde::{Deserialize, Serialize};

/// An absolute address inside the target process.
///
/// Addresses are opaque integers, never native pointers. Arithmetic wraps modulo 2^64 so
/// that pointer-chain walks and relative-address decoding behave the same way the target's
/// CPU would.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Address(u64);

impl Address {
    pub const NULL: Address = Address(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Move by a signed byte count.
    pub const fn offset(self, delta: i64) -> Self {
        Self(self.0.wrapping_add_signed(delta))
    }

    /// Move forward by an unsigned byte count.
    pub const fn add(self, len: u64) -> Self {
        Self(self.0.wrapping_add(len))
    }

    /// Signed distance `self - origin`, wrapping.
    pub const fn distance_from(self, origin: Address) -> i64 {
        self.0.wrapping_sub(origin.0) as i64
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Address> for u64 {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_wraps_both_directions() {
        assert_eq!(Address::new(0x1000).offset(-0x10), Address::new(0xFF0));
        assert_eq!(Address::new(0).offset(-1), Address::new(u64::MAX));
        assert_eq!(Address::new(u64::MAX).add(2), Address::new(1));
    }

    #[test]
    fn test_distance_from() {
        let a = Address::new(0x2000);
        let b = Address::new(0x1000);
        assert_eq!(a.distance_from(b), 0x1000);
        assert_eq!(b.distance_from(a), -0x1000);
    }

    #[test]
    fn test_formatting() {
        let addr = Address::new(0x14000ABCD);
        assert_eq!(addr.to_string(), "0x14000abcd");
        assert_eq!(format!("{:X}", addr), "14000ABCD");
        assert_eq!(format!("0x{:x}", addr), "0x14000abcd");
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&Address::new(4096)).unwrap();
        assert_eq!(json, "4096");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Address::new(4096));
    }
}
