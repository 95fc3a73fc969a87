//! # memtools
//!
//! Reading and writing the memory of another process.
//!
//! This crate provides:
//! - Process access behind the [`RawMemory`] trait (Windows implementation in [`ProcessHandle`])
//! - Pointer chains that are walked before every access ([`Pointer`])
//! - Typed scalar, pointer and string I/O ([`MemoryIo`])
//! - RIP-relative displacement and `rel32` decoding
//! - Byte-signature scanning with wildcards ([`SignatureScanner`])
//!
//! ```no_run
//! use memtools::{MemoryIo, Pointer, ProcessHandle};
//!
//! # fn main() -> memtools::Result<()> {
//! let process = ProcessHandle::open(4242)?;
//! let io = MemoryIo::new(&process);
//! let score = io.read_u32(Pointer::new(0x1_4000_0000u64, [0x20, 0x10]))?;
//! # let _ = score;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod memory;
pub mod pointer;
pub mod signature;

pub use config::{MemoryConfig, MemoryConfigBuilder};
pub use error::{Error, Result};
pub use io::{MemoryIo, Scalar, Value, ValueKind};
pub use memory::{Address, Bitness, ProcessHandle, RawMemory};
pub use pointer::{Locate, Pointer, resolve_pointer};
pub use signature::{
    Signature, SignatureEntry, SignatureScanner, SignatureSet, load_signatures, save_signatures,
};
