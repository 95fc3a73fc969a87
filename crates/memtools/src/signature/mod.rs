//! Byte-pattern search over target memory

mod pattern;
mod scanner;
mod set;

pub use pattern::Signature;
pub use scanner::SignatureScanner;
pub use set::{SignatureEntry, SignatureSet, load_signatures, save_signatures};
