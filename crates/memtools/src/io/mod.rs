//! Typed reads and writes against a target process.
//!
//! Every operation accepts anything implementing [`Locate`]: a resolved [`Address`], or a
//! [`Pointer`](crate::Pointer) which is walked first. Fixed-width values cost exactly one
//! raw read or write.

mod relative;
mod scalar;
mod string;

use crate::config::MemoryConfig;
use crate::error::{Error, Result};
use crate::memory::{Address, Bitness, RawMemory};
use crate::pointer::resolver::decode_pointer;
use crate::pointer::{Locate, Pointer, resolve_pointer};

pub use scalar::{Scalar, Value, ValueKind};

pub struct MemoryIo<'a, M: RawMemory + ?Sized> {
    memory: &'a M,
    config: MemoryConfig,
}

macro_rules! named_scalar_ops {
    ($($ty:ty => $read:ident, $write:ident;)*) => {
        $(
            pub fn $read(&self, at: impl Locate) -> Result<$ty> {
                self.read::<$ty>(at)
            }

            pub fn $write(&self, at: impl Locate, value: $ty) -> Result<()> {
                self.write::<$ty>(at, value)
            }
        )*
    };
}

impl<'a, M: RawMemory + ?Sized> MemoryIo<'a, M> {
    pub fn new(memory: &'a M) -> Self {
        Self::with_config(memory, MemoryConfig::default())
    }

    pub fn with_config(memory: &'a M, config: MemoryConfig) -> Self {
        Self { memory, config }
    }

    pub fn memory(&self) -> &'a M {
        self.memory
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn bitness(&self) -> Bitness {
        self.memory.bitness()
    }

    /// Walk a pointer chain to its final address
    pub fn resolve(&self, pointer: &Pointer) -> Result<Address> {
        resolve_pointer(self.memory, pointer)
    }

    pub fn locate(&self, at: impl Locate) -> Result<Address> {
        at.locate(self.memory)
    }

    pub fn read_bytes(&self, at: impl Locate, len: usize) -> Result<Vec<u8>> {
        let address = self.locate(at)?;
        self.read_exact(address, len)
    }

    pub fn write_bytes(&self, at: impl Locate, data: &[u8]) -> Result<()> {
        let address = self.locate(at)?;
        self.memory.write_bytes(address, data)
    }

    /// Allocate memory in the target, optionally at a preferred address
    pub fn allocate(&self, len: usize, preferred: Option<Address>) -> Result<Address> {
        self.memory.allocate(len, preferred)
    }

    pub fn read<T: Scalar>(&self, at: impl Locate) -> Result<T> {
        let address = self.locate(at)?;
        let bytes = self.read_exact(address, T::SIZE)?;
        Ok(T::decode(&bytes))
    }

    pub fn write<T: Scalar>(&self, at: impl Locate, value: T) -> Result<()> {
        let address = self.locate(at)?;
        self.memory.write_bytes(address, &value.encode())
    }

    named_scalar_ops! {
        u8 => read_u8, write_u8;
        i8 => read_i8, write_i8;
        u16 => read_u16, write_u16;
        i16 => read_i16, write_i16;
        u32 => read_u32, write_u32;
        i32 => read_i32, write_i32;
        u64 => read_u64, write_u64;
        i64 => read_i64, write_i64;
        f32 => read_f32, write_f32;
        f64 => read_f64, write_f64;
    }

    /// Read a pointer-sized value (4 bytes on x86, 8 on x64)
    pub fn read_pointer(&self, at: impl Locate) -> Result<Address> {
        let address = self.locate(at)?;
        let bytes = self.read_exact(address, self.memory.pointer_width())?;
        decode_pointer(self.bitness(), address, &bytes)
    }

    /// Write a pointer-sized value. On x86 only the low 32 bits are stored.
    pub fn write_pointer(&self, at: impl Locate, value: Address) -> Result<()> {
        self.write_value(at, Value::Pointer(value))
    }

    /// Read a value whose kind is chosen at runtime
    pub fn read_value(&self, at: impl Locate, kind: ValueKind) -> Result<Value> {
        let address = self.locate(at)?;
        let bitness = self.bitness();
        let bytes = self.read_exact(address, kind.size(bitness))?;
        Ok(kind.decode(bitness, &bytes))
    }

    pub fn write_value(&self, at: impl Locate, value: Value) -> Result<()> {
        let address = self.locate(at)?;
        self.memory
            .write_bytes(address, &value.encode(self.bitness()))
    }

    /// One raw read that must return exactly `len` bytes
    fn read_exact(&self, address: Address, len: usize) -> Result<Vec<u8>> {
        let bytes = self.memory.read_bytes(address, len)?;
        if bytes.len() != len {
            return Err(Error::PartialCopy {
                address: address.as_u64(),
                requested: len,
                copied: bytes.len(),
            });
        }
        Ok(bytes)
    }
}
