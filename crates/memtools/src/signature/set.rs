use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

use super::Signature;

/// A named, serializable signature with its post-match handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureEntry {
    pub name: String,
    pub pattern: String,
    /// Added to the match address
    #[serde(default)]
    pub offset: i64,
    /// Decode the RIP-relative `disp32` at the adjusted match instead of returning it directly
    #[serde(default)]
    pub displacement: bool,
}

impl SignatureEntry {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            offset: 0,
            displacement: false,
        }
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_displacement(mut self) -> Self {
        self.displacement = true;
        self
    }

    pub fn signature(&self) -> Result<Signature> {
        self.pattern.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureSet {
    pub version: String,
    pub entries: Vec<SignatureEntry>,
}

impl SignatureSet {
    pub fn entry(&self, name: &str) -> Option<&SignatureEntry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Check that every pattern compiles
    pub fn validate(&self) -> Result<()> {
        for entry in &self.entries {
            entry.signature()?;
        }
        Ok(())
    }
}

/// Load a signature set from JSON; fails if any pattern is malformed
pub fn load_signatures<P: AsRef<Path>>(path: P) -> Result<SignatureSet> {
    let content = fs::read_to_string(&path)?;
    let set: SignatureSet = serde_json::from_str(&content)?;
    set.validate()?;
    Ok(set)
}

pub fn save_signatures<P: AsRef<Path>>(path: P, signatures: &SignatureSet) -> Result<()> {
    let content = serde_json::to_string_pretty(signatures)?;
    fs::write(path, content)?;
    Ok(())
}
