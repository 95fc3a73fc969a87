//! Fixed-width value marshaling.
//!
//! All values are little-endian in both directions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::memory::{Address, Bitness};

/// A fixed-width value that can be copied to and from target memory.
///
/// The width is the declared `SIZE`, not whatever Rust chooses for the type's layout.
/// Implement this for a `#[repr(u16)]` enum by delegating to `u16`.
pub trait Scalar: Copy {
    const SIZE: usize;

    /// Decode from exactly `SIZE` bytes
    fn decode(bytes: &[u8]) -> Self;

    fn encode(self) -> Vec<u8>;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn decode(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(buf)
                }

                fn encode(self) -> Vec<u8> {
                    self.to_le_bytes().to_vec()
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// The closed set of shapes that can be read or written by kind at runtime
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    /// Pointer-sized integer; width depends on the target
    Pointer,
}

impl ValueKind {
    /// Byte width of this kind in a target of the given bitness
    pub fn size(self, bitness: Bitness) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::Pointer => bitness.pointer_width(),
        }
    }

    /// Decode `bytes`, which must be exactly `self.size(bitness)` long
    pub(crate) fn decode(self, bitness: Bitness, bytes: &[u8]) -> Value {
        match self {
            Self::U8 => Value::U8(u8::decode(bytes)),
            Self::I8 => Value::I8(i8::decode(bytes)),
            Self::U16 => Value::U16(u16::decode(bytes)),
            Self::I16 => Value::I16(i16::decode(bytes)),
            Self::U32 => Value::U32(u32::decode(bytes)),
            Self::I32 => Value::I32(i32::decode(bytes)),
            Self::U64 => Value::U64(u64::decode(bytes)),
            Self::I64 => Value::I64(i64::decode(bytes)),
            Self::F32 => Value::F32(f32::decode(bytes)),
            Self::F64 => Value::F64(f64::decode(bytes)),
            Self::Pointer => Value::Pointer(match bitness {
                Bitness::X86 => Address::new(u64::from(u32::decode(bytes))),
                Bitness::X64 => Address::new(u64::decode(bytes)),
            }),
        }
    }
}

/// A value tagged with its kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Pointer(Address),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::U8(_) => ValueKind::U8,
            Self::I8(_) => ValueKind::I8,
            Self::U16(_) => ValueKind::U16,
            Self::I16(_) => ValueKind::I16,
            Self::U32(_) => ValueKind::U32,
            Self::I32(_) => ValueKind::I32,
            Self::U64(_) => ValueKind::U64,
            Self::I64(_) => ValueKind::I64,
            Self::F32(_) => ValueKind::F32,
            Self::F64(_) => ValueKind::F64,
            Self::Pointer(_) => ValueKind::Pointer,
        }
    }

    /// Encode for a target of the given bitness. 32-bit pointers keep the low 32 bits.
    pub(crate) fn encode(self, bitness: Bitness) -> Vec<u8> {
        match self {
            Self::U8(v) => v.encode(),
            Self::I8(v) => v.encode(),
            Self::U16(v) => v.encode(),
            Self::I16(v) => v.encode(),
            Self::U32(v) => v.encode(),
            Self::I32(v) => v.encode(),
            Self::U64(v) => v.encode(),
            Self::I64(v) => v.encode(),
            Self::F32(v) => v.encode(),
            Self::F64(v) => v.encode(),
            Self::Pointer(addr) => encode_pointer(bitness, addr),
        }
    }
}

pub(crate) fn encode_pointer(bitness: Bitness, address: Address) -> Vec<u8> {
    match bitness {
        Bitness::X86 => (address.as_u64() as u32).encode(),
        Bitness::X64 => address.as_u64().encode(),
    }
}
