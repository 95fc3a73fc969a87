use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A compiled byte pattern with a per-byte mask. Masked-out bytes match anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    bytes: Vec<u8>,
    mask: Vec<bool>,
}

impl Signature {
    /// Compile one or more hex fragments.
    ///
    /// Fragments are concatenated and all whitespace is removed. The remaining text must
    /// have an even number of characters; each two-character group is a hex byte, and any
    /// group that is not valid hex (canonically `??`) is a wildcard.
    pub fn parse<S: AsRef<str>>(fragments: &[S]) -> Result<Self> {
        let chars: Vec<char> = fragments
            .iter()
            .flat_map(|fragment| fragment.as_ref().chars())
            .filter(|c| !c.is_whitespace())
            .collect();

        if chars.len() % 2 != 0 {
            return Err(Error::MalformedPattern(format!(
                "hex pattern has an odd number of characters ({})",
                chars.len()
            )));
        }

        let (bytes, mask) = chars
            .chunks_exact(2)
            .map(|pair| match (pair[0].to_digit(16), pair[1].to_digit(16)) {
                (Some(hi), Some(lo)) => ((hi * 16 + lo) as u8, true),
                _ => (0, false),
            })
            .unzip();

        Self::from_parts(bytes, mask)
    }

    /// Build from explicit bytes and mask, which must be the same non-zero length
    pub fn from_parts(bytes: Vec<u8>, mask: Vec<bool>) -> Result<Self> {
        if bytes.len() != mask.len() {
            return Err(Error::MalformedPattern(format!(
                "pattern has {} bytes but mask has {} entries",
                bytes.len(),
                mask.len()
            )));
        }
        if bytes.is_empty() {
            return Err(Error::MalformedPattern("pattern is empty".to_string()));
        }
        Ok(Self { bytes, mask })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the pattern matches `data` starting at `pos`
    pub fn matches_at(&self, data: &[u8], pos: usize) -> bool {
        let Some(end) = pos.checked_add(self.len()) else {
            return false;
        };
        let Some(window) = data.get(pos..end) else {
            return false;
        };
        self.bytes
            .iter()
            .zip(&self.mask)
            .zip(window)
            .all(|((&byte, &significant), &actual)| !significant || byte == actual)
    }

    /// Index of the first match in `data`.
    ///
    /// Naive O(n*m) scan over every start position; ranges are module-sized and scans are
    /// interactive, not hot-path.
    pub fn find_in(&self, data: &[u8]) -> Option<usize> {
        let last = data.len().checked_sub(self.len())?;
        (0..=last).find(|&pos| self.matches_at(data, pos))
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(&[s])
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (byte, significant)) in self.bytes.iter().zip(&self.mask).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if *significant {
                write!(f, "{:02X}", byte)?;
            } else {
                f.write_str("??")?;
            }
        }
        Ok(())
    }
}
