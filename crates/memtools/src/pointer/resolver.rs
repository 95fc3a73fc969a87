use tracing::trace;

use crate::error::{Error, Result};
use crate::memory::{Address, Bitness, RawMemory};

use super::Pointer;

/// Something that names a location in the target: either an already-resolved
/// [`Address`] or a [`Pointer`] chain that must be walked first.
pub trait Locate {
    fn locate<M: RawMemory + ?Sized>(&self, memory: &M) -> Result<Address>;
}

impl Locate for Address {
    fn locate<M: RawMemory + ?Sized>(&self, _memory: &M) -> Result<Address> {
        Ok(*self)
    }
}

impl Locate for Pointer {
    fn locate<M: RawMemory + ?Sized>(&self, memory: &M) -> Result<Address> {
        resolve_pointer(memory, self)
    }
}

impl<T: Locate + ?Sized> Locate for &T {
    fn locate<M: RawMemory + ?Sized>(&self, memory: &M) -> Result<Address> {
        (**self).locate(memory)
    }
}

/// Walk a pointer chain to its final address.
///
/// Every offset but the last is added and then dereferenced with the target's pointer
/// width; the last offset is added without dereferencing. An empty chain resolves to the
/// base address. The first failed read aborts the walk.
pub fn resolve_pointer<M: RawMemory + ?Sized>(memory: &M, pointer: &Pointer) -> Result<Address> {
    let base = pointer.base_address();
    let Some((last, walk)) = pointer.offsets().split_last() else {
        return Ok(base);
    };

    let mut current = base;
    for (level, &offset) in walk.iter().enumerate() {
        let slot = current.offset(i64::from(offset));
        current = read_pointer_value(memory, slot)?;
        trace!("{}: level {} [{}] -> {}", pointer, level, slot, current);
    }

    Ok(current.offset(i64::from(*last)))
}

/// Read one pointer-sized value, zero-extending 32-bit pointers.
pub(crate) fn read_pointer_value<M: RawMemory + ?Sized>(
    memory: &M,
    address: Address,
) -> Result<Address> {
    let width = memory.pointer_width();
    let bytes = memory.read_bytes(address, width)?;
    decode_pointer(memory.bitness(), address, &bytes)
}

pub(crate) fn decode_pointer(bitness: Bitness, address: Address, bytes: &[u8]) -> Result<Address> {
    let short = || Error::PartialCopy {
        address: address.as_u64(),
        requested: bitness.pointer_width(),
        copied: bytes.len(),
    };
    let value = match bitness {
        Bitness::X86 => u64::from(u32::from_le_bytes(bytes.try_into().map_err(|_| short())?)),
        Bitness::X64 => u64::from_le_bytes(bytes.try_into().map_err(|_| short())?),
    };
    Ok(Address::new(value))
}
