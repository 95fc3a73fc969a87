use encoding_rs::{Encoding, UTF_8};
use memchr::memchr;
use tracing::warn;

use crate::error::Result;
use crate::memory::RawMemory;
use crate::memory::layout::string::TERMINATOR;
use crate::pointer::Locate;

use super::MemoryIo;

impl<'a, M: RawMemory + ?Sized> MemoryIo<'a, M> {
    /// Read a null-terminated string using the configured chunk size.
    ///
    /// `encoding` must terminate strings with a single zero byte (ASCII, windows-1252,
    /// UTF-8, Shift_JIS, ...).
    pub fn read_string(&self, at: impl Locate, encoding: &'static Encoding) -> Result<String> {
        self.read_string_chunked(at, encoding, self.config.string_chunk_size)
    }

    /// Read a null-terminated string, fetching `chunk_size` bytes per raw read.
    ///
    /// The string may span any number of chunks; bytes are accumulated until a chunk
    /// contains the terminator and only then decoded, so multi-byte characters split across
    /// a chunk boundary decode correctly.
    pub fn read_string_chunked(
        &self,
        at: impl Locate,
        encoding: &'static Encoding,
        chunk_size: usize,
    ) -> Result<String> {
        let chunk_size = chunk_size.max(1);
        let start = self.locate(at)?;
        let mut address = start;
        let mut bytes = Vec::new();

        loop {
            let chunk = self.read_exact(address, chunk_size)?;
            if let Some(end) = memchr(TERMINATOR, &chunk) {
                bytes.extend_from_slice(&chunk[..end]);
                break;
            }
            bytes.extend_from_slice(&chunk);
            address = address.add(chunk_size as u64);
        }

        let (decoded, had_errors) = encoding.decode_without_bom_handling(&bytes);
        if had_errors {
            warn!(
                "String at {} is not valid {}; malformed bytes replaced",
                start,
                encoding.name()
            );
        }
        Ok(decoded.into_owned())
    }

    pub fn read_string_utf8(&self, at: impl Locate) -> Result<String> {
        self.read_string(at, UTF_8)
    }

    /// Encode `value`, append one zero byte and write it in a single raw write.
    pub fn write_string(
        &self,
        at: impl Locate,
        value: &str,
        encoding: &'static Encoding,
    ) -> Result<()> {
        let (encoded, used, had_errors) = encoding.encode(value);
        if had_errors {
            warn!(
                "String {:?} is not representable in {}; unmappable characters replaced",
                value,
                used.name()
            );
        }

        let mut bytes = Vec::with_capacity(encoded.len() + 1);
        bytes.extend_from_slice(&encoded);
        bytes.push(TERMINATOR);
        self.write_bytes(at, &bytes)
    }

    pub fn write_string_utf8(&self, at: impl Locate, value: &str) -> Result<()> {
        self.write_string(at, value, UTF_8)
    }
}
