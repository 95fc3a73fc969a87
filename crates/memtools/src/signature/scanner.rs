use tracing::debug;

use crate::error::Result;
use crate::io::MemoryIo;
use crate::memory::{Address, Bitness, RawMemory};
use crate::pointer::Locate;

use super::{Signature, SignatureEntry};

/// Searches a range of target memory for a [`Signature`].
///
/// Each scan fetches the whole range with a single raw read and matches locally.
pub struct SignatureScanner<'a, M: RawMemory + ?Sized> {
    memory: &'a M,
}

impl<'a, M: RawMemory + ?Sized> SignatureScanner<'a, M> {
    pub fn new(memory: &'a M) -> Self {
        Self { memory }
    }

    /// Address of the first match in `[start, start + len)`, plus `offset`.
    ///
    /// `Ok(None)` means the range was read but nothing matched.
    pub fn scan(
        &self,
        start: impl Locate,
        len: usize,
        offset: i64,
        signature: &Signature,
    ) -> Result<Option<Address>> {
        let start = start.locate(self.memory)?;
        let buffer = self.memory.read_bytes(start, len)?;

        let found = signature
            .find_in(&buffer)
            .map(|index| start.add(index as u64).offset(offset));

        match found {
            Some(address) => debug!(
                "Signature {} found at {} (scanned {} bytes from {})",
                signature, address, buffer.len(), start
            ),
            None => debug!(
                "Signature {} not found in {} bytes from {}",
                signature,
                buffer.len(),
                start
            ),
        }
        Ok(found)
    }

    /// Compile hex fragments and scan. A malformed pattern fails before any read.
    pub fn scan_str<S: AsRef<str>>(
        &self,
        start: impl Locate,
        len: usize,
        offset: i64,
        fragments: &[S],
    ) -> Result<Option<Address>> {
        let signature = Signature::parse(fragments)?;
        self.scan(start, len, offset, &signature)
    }

    /// Scan for explicit bytes and mask. Mismatched lengths fail before any read.
    pub fn scan_masked(
        &self,
        start: impl Locate,
        len: usize,
        offset: i64,
        bytes: &[u8],
        mask: &[bool],
    ) -> Result<Option<Address>> {
        let signature = Signature::from_parts(bytes.to_vec(), mask.to_vec())?;
        self.scan(start, len, offset, &signature)
    }

    /// Scan for a named entry, following its displacement when the entry asks for it.
    ///
    /// The displacement is the `disp32` of a RIP-relative operand at the adjusted match.
    /// It is four bytes wide on every target and relative to the end of the field.
    pub fn scan_entry(
        &self,
        start: impl Locate,
        len: usize,
        entry: &SignatureEntry,
    ) -> Result<Option<Address>> {
        let signature = entry.signature()?;
        let Some(hit) = self.scan(start, len, entry.offset, &signature)? else {
            debug!("Signature entry '{}' not found", entry.name);
            return Ok(None);
        };

        if !entry.displacement {
            return Ok(Some(hit));
        }
        let target = MemoryIo::new(self.memory)
            .read_displacement_with(hit, Bitness::X86)?;
        debug!(
            "Signature entry '{}' at {} resolves to {}",
            entry.name, hit, target
        );
        Ok(Some(target))
    }
}
