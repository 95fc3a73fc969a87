//! Memory layout constants shared by the marshaling and scanning code
//!
//! Constants are organized by the kind of data they describe.

/// Native pointer widths of the target process
pub mod pointer {
    /// Pointer width of a 32-bit (x86) target
    pub const WIDTH_32: usize = 4;
    /// Pointer width of a 64-bit (x64) target
    pub const WIDTH_64: usize = 8;
}

/// x86 relative operand encodings
pub mod operand {
    /// Width of a near call/jump operand (`rel32`)
    pub const REL32: usize = 4;
}

/// Null-terminated string reads
pub mod string {
    /// Bytes fetched per raw read while looking for the terminator
    pub const DEFAULT_CHUNK_SIZE: usize = 256;

    pub const TERMINATOR: u8 = 0;
}
