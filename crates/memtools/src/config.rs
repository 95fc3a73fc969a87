//! Tunables for typed memory access.
//!
//! ```ignore
//! use memtools::MemoryConfig;
//!
//! let config = MemoryConfig::builder().string_chunk_size(64).build()?;
//! let config = MemoryConfig::load("memtools.json")?;
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::layout::string;

/// Configuration for [`MemoryIo`](crate::MemoryIo)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Bytes fetched per raw read when looking for a string terminator
    pub string_chunk_size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            string_chunk_size: string::DEFAULT_CHUNK_SIZE,
        }
    }
}

impl MemoryConfig {
    /// Create a new configuration builder
    pub fn builder() -> MemoryConfigBuilder {
        MemoryConfigBuilder::default()
    }

    /// Load and validate a JSON config file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        debug!("Loaded memory config from {:?}", path.as_ref());
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.string_chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "string_chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for MemoryConfig
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigBuilder {
    string_chunk_size: Option<usize>,
}

impl MemoryConfigBuilder {
    /// Set the chunk size used by string reads
    pub fn string_chunk_size(mut self, size: usize) -> Self {
        self.string_chunk_size = Some(size);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<MemoryConfig> {
        let default = MemoryConfig::default();
        let config = MemoryConfig {
            string_chunk_size: self.string_chunk_size.unwrap_or(default.string_chunk_size),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_chunk_size() {
        assert_eq!(MemoryConfig::default().string_chunk_size, 256);
        assert_eq!(MemoryConfig::builder().build().unwrap(), MemoryConfig::default());
    }

    #[test]
    fn test_builder_rejects_zero_chunk() {
        let err = MemoryConfig::builder().string_chunk_size(0).build().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memtools.json");

        let config = MemoryConfig::builder().string_chunk_size(64).build().unwrap();
        config.save(&path).unwrap();
        assert_eq!(MemoryConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memtools.json");
        fs::write(&path, "{}").unwrap();
        assert_eq!(MemoryConfig::load(&path).unwrap(), MemoryConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = MemoryConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memtools.json");
        fs::write(&path, r#"{"string_chunk_size":0}"#).unwrap();
        assert!(matches!(
            MemoryConfig::load(&path),
            Err(Error::InvalidConfig(_))
        ));
    }
}
