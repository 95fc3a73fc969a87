use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{Error, Result};
use crate::memory::Address;
use crate::memory::layout::pointer;

/// Address width of the target process, fixed for the lifetime of a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Bitness {
    X86,
    X64,
}

impl Bitness {
    pub fn from_is_64_bit(is_64_bit: bool) -> Self {
        if is_64_bit { Self::X64 } else { Self::X86 }
    }

    pub fn is_64_bit(self) -> bool {
        self == Self::X64
    }

    /// Width in bytes of a native pointer in the target
    pub fn pointer_width(self) -> usize {
        match self {
            Self::X86 => pointer::WIDTH_32,
            Self::X64 => pointer::WIDTH_64,
        }
    }

    /// Reject transfer sizes the target cannot address in one call.
    pub fn check_len(self, len: usize) -> Result<()> {
        if self == Self::X86 && len as u64 > u64::from(u32::MAX) {
            return Err(Error::LengthTooLarge { len });
        }
        Ok(())
    }
}

/// Raw byte access to another process.
///
/// This is the only seam through which the crate touches the target. Implementations
/// must either transfer the whole span or fail; no partial data is ever returned.
pub trait RawMemory {
    /// Read exactly `len` bytes starting at `address`
    fn read_bytes(&self, address: Address, len: usize) -> Result<Vec<u8>>;

    /// Write all of `data` starting at `address`
    fn write_bytes(&self, address: Address, data: &[u8]) -> Result<()>;

    /// Allocate `len` bytes of read/write/execute memory, optionally at a preferred address
    fn allocate(&self, len: usize, preferred: Option<Address>) -> Result<Address>;

    fn bitness(&self) -> Bitness;

    fn is_64_bit(&self) -> bool {
        self.bitness().is_64_bit()
    }

    fn pointer_width(&self) -> usize {
        self.bitness().pointer_width()
    }
}

impl<M: RawMemory + ?Sized> RawMemory for &M {
    fn read_bytes(&self, address: Address, len: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, len)
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> Result<()> {
        (**self).write_bytes(address, data)
    }

    fn allocate(&self, len: usize, preferred: Option<Address>) -> Result<Address> {
        (**self).allocate(len, preferred)
    }

    fn bitness(&self) -> Bitness {
        (**self).bitness()
    }
}
