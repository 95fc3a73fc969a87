use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process unavailable: {0}")]
    ProcessUnavailable(String),

    #[error("Cannot attach to a 64-bit process from a 32-bit host")]
    BitnessMismatch,

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to write process memory at address {address:#x}: {message}")]
    MemoryWriteFailed { address: u64, message: String },

    #[error("Partial copy at address {address:#x}: {copied} of {requested} bytes")]
    PartialCopy {
        address: u64,
        requested: usize,
        copied: usize,
    },

    #[error("Failed to allocate {len} bytes in target process: {message}")]
    AllocationFailed { len: usize, message: String },

    #[error("Length {len} is not representable for the target's address width")]
    LengthTooLarge { len: usize },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    #[error("Malformed pattern: {0}")]
    MalformedPattern(String),

    #[error("Invalid offset chain: {0}")]
    InvalidOffsetChain(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Check if the target process is gone (handle closed or process exited)
    pub fn is_process_gone(&self) -> bool {
        matches!(self, Error::ProcessUnavailable(_))
    }
}
