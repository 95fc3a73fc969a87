//! Pointer chains into the target process
//!
//! A [`Pointer`] is a base address plus a list of offsets. Every offset except the last
//! is followed by one dereference; the last one selects the field:
//!
//! ```text
//! [0x1400A0000]+0x20+0x8  =>  read_ptr(read_ptr(0x1400A0000 + 0x20) ... ) + 0x8
//! ```

pub(crate) mod resolver;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::memory::Address;

pub use resolver::{Locate, resolve_pointer};

/// Immutable pointer-chain description. Every transform returns a new value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer {
    base_address: Address,
    #[serde(default)]
    offsets: Vec<i32>,
}

impl Pointer {
    pub fn new(base_address: impl Into<Address>, offsets: impl Into<Vec<i32>>) -> Self {
        Self {
            base_address: base_address.into(),
            offsets: offsets.into(),
        }
    }

    /// A chain with no offsets; resolves to the base address itself
    pub fn at(base_address: impl Into<Address>) -> Self {
        Self::new(base_address, Vec::new())
    }

    pub fn base_address(&self) -> Address {
        self.base_address
    }

    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    /// Move the final offset by `delta`.
    ///
    /// Only the last step changes, so intermediate dereferences are unaffected.
    pub fn adjust(&self, delta: i32) -> Result<Pointer> {
        let Some((last, rest)) = self.offsets.split_last() else {
            return Err(Error::InvalidOffsetChain(format!(
                "cannot adjust pointer {} with no offsets",
                self
            )));
        };
        let mut offsets = rest.to_vec();
        offsets.push(last.wrapping_add(delta));
        Ok(Pointer::new(self.base_address, offsets))
    }

    /// Append offsets to the end of the chain
    pub fn add_offsets(&self, more: &[i32]) -> Pointer {
        let mut offsets = Vec::with_capacity(self.offsets.len() + more.len());
        offsets.extend_from_slice(&self.offsets);
        offsets.extend_from_slice(more);
        Pointer::new(self.base_address, offsets)
    }

    /// Drop the last `count` offsets; removing more than exist leaves an empty chain
    pub fn remove_offsets(&self, count: usize) -> Pointer {
        let keep = self.offsets.len().saturating_sub(count);
        Pointer::new(self.base_address, &self.offsets[..keep])
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.base_address)?;
        for offset in &self.offsets {
            if *offset >= 0 {
                write!(f, "+{:#x}", offset)?;
            } else {
                write!(f, "-{:#x}", offset.unsigned_abs())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_changes_only_last_offset() {
        let ptr = Pointer::new(0x1000u64, [0x10, 0x20, 0x30]);
        let adjusted = ptr.adjust(-8).unwrap();
        assert_eq!(adjusted.offsets(), &[0x10, 0x20, 0x28]);
        assert_eq!(adjusted.base_address(), ptr.base_address());
        // receiver untouched
        assert_eq!(ptr.offsets(), &[0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_adjust_without_offsets_fails() {
        let err = Pointer::at(0x1000u64).adjust(4).unwrap_err();
        assert!(matches!(err, Error::InvalidOffsetChain(_)));
    }

    #[test]
    fn test_add_and_remove_offsets() {
        let ptr = Pointer::new(0x1000u64, [0x10]);
        let longer = ptr.add_offsets(&[0x20, 0x30]);
        assert_eq!(longer.offsets(), &[0x10, 0x20, 0x30]);
        assert_eq!(ptr.offsets(), &[0x10]);

        assert_eq!(longer.remove_offsets(1).offsets(), &[0x10, 0x20]);
        assert!(longer.remove_offsets(3).offsets().is_empty());
        assert!(longer.remove_offsets(10).offsets().is_empty());
        assert_eq!(longer.remove_offsets(0), longer);
    }

    #[test]
    fn test_clone_is_equal_and_independent() {
        let ptr = Pointer::new(0x1000u64, [0x10, 0x20]);
        let copy = ptr.clone();
        assert_eq!(copy, ptr);
        assert_eq!(copy.add_offsets(&[1]).offsets().len(), 3);
        assert_eq!(ptr.offsets().len(), 2);
    }

    #[test]
    fn test_display() {
        let ptr = Pointer::new(0x1400A0000u64, [0x20, -0x8]);
        assert_eq!(ptr.to_string(), "[0x1400a0000]+0x20-0x8");
    }

    #[test]
    fn test_serde_roundtrip() {
        let ptr = Pointer::new(0x1000u64, [0x10, -4]);
        let json = serde_json::to_string(&ptr).unwrap();
        assert_eq!(json, r#"{"base_address":4096,"offsets":[16,-4]}"#);
        let back: Pointer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ptr);

        let bare: Pointer = serde_json::from_str(r#"{"base_address":4096}"#).unwrap();
        assert!(bare.offsets().is_empty());
    }
}
