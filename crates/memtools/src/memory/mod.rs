mod address;
pub mod layout;
mod process;
mod raw;

#[cfg(test)]
pub mod mock;

pub use address::Address;
pub use process::ProcessHandle;
pub use raw::{Bitness, RawMemory};

#[cfg(test)]
pub use mock::{MockMemory, MockMemoryBuilder};
