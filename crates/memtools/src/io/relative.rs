//! Position-relative addresses embedded in x86 machine code.
//!
//! A *displacement* is a pointer-width signed value relative to the address just past the
//! field (RIP-relative addressing). A *relative offset* is the `rel32` operand of a near
//! `call`/`jmp`, relative to the address just past its four bytes; it only exists for
//! 32-bit targets here.

use crate::error::{Error, Result};
use crate::memory::layout::operand::REL32;
use crate::memory::{Address, Bitness, RawMemory};
use crate::pointer::Locate;

use super::MemoryIo;

impl<'a, M: RawMemory + ?Sized> MemoryIo<'a, M> {
    /// Decode the displacement stored at `at` using the target's pointer width
    pub fn read_displacement(&self, at: impl Locate) -> Result<Address> {
        self.read_displacement_with(at, self.bitness())
    }

    /// Decode a displacement with an explicit field width
    pub fn read_displacement_with(&self, at: impl Locate, bitness: Bitness) -> Result<Address> {
        let address = self.locate(at)?;
        let delta = match bitness {
            Bitness::X86 => i64::from(self.read::<i32>(address)?),
            Bitness::X64 => self.read::<i64>(address)?,
        };
        Ok(address
            .add(bitness.pointer_width() as u64)
            .offset(delta))
    }

    /// Encode `target` as a displacement at `at` using the target's pointer width
    pub fn write_displacement(&self, at: impl Locate, target: Address) -> Result<()> {
        self.write_displacement_with(at, target, self.bitness())
    }

    /// Encode a displacement with an explicit field width.
    ///
    /// A 32-bit field keeps the low 32 bits of `target - (at + 4)`; out-of-range targets
    /// wrap instead of failing.
    pub fn write_displacement_with(
        &self,
        at: impl Locate,
        target: Address,
        bitness: Bitness,
    ) -> Result<()> {
        let address = self.locate(at)?;
        let next = address.add(bitness.pointer_width() as u64);
        let delta = target.distance_from(next);
        match bitness {
            Bitness::X86 => self.write::<i32>(address, delta as i32),
            Bitness::X64 => self.write::<i64>(address, delta),
        }
    }

    /// Decode the `rel32` operand of a near call/jump. Fails on 64-bit targets.
    pub fn read_relative_offset(&self, at: impl Locate) -> Result<Address> {
        self.ensure_rel32_supported()?;
        let address = self.locate(at)?;
        let delta = self.read::<i32>(address)?;
        Ok(address.add(REL32 as u64).offset(i64::from(delta)))
    }

    /// Encode `target` as the `rel32` operand at `at`. Fails on 64-bit targets.
    pub fn write_relative_offset(&self, at: impl Locate, target: Address) -> Result<()> {
        self.ensure_rel32_supported()?;
        let address = self.locate(at)?;
        let delta = target.distance_from(address.add(REL32 as u64));
        self.write::<i32>(address, delta as i32)
    }

    /// Resolve a `disp32` operand inside an instruction whose end is not the end of the
    /// operand, e.g. `cmp byte ptr [rip+disp32], imm8`.
    ///
    /// `instruction` is the first byte of the instruction, `disp_offset` the position of the
    /// displacement inside it and `instruction_len` its total length.
    pub fn read_rip_relative(
        &self,
        instruction: impl Locate,
        disp_offset: usize,
        instruction_len: usize,
    ) -> Result<Address> {
        let instruction = self.locate(instruction)?;
        let delta = self.read::<i32>(instruction.add(disp_offset as u64))?;
        Ok(instruction
            .add(instruction_len as u64)
            .offset(i64::from(delta)))
    }

    fn ensure_rel32_supported(&self) -> Result<()> {
        if self.bitness().is_64_bit() {
            return Err(Error::UnsupportedOperation(
                "relative call/jump offsets are not supported on 64-bit targets",
            ));
        }
        Ok(())
    }
}
