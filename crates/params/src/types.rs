//! Types for the staking parameters.

use std::{fmt, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::errors::MagicBytesError;

/// Size of the magic bytes in bytes.
pub const MAGIC_BYTES_LEN: usize = 4;

/// Wrapper around the 4-byte tag (magic bytes) used to identify staking transactions on bitcoin.
///
/// It is serialized as a hex string. When parsing from a string, both the hex form (8 characters)
/// and the raw form (4 characters, e.g. `"bbte"`) are accepted.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct MagicBytes([u8; MAGIC_BYTES_LEN]);

impl MagicBytes {
    /// Creates new magic bytes from a byte array.
    pub const fn new(bytes: [u8; MAGIC_BYTES_LEN]) -> Self {
        MagicBytes(bytes)
    }

    /// Returns the magic bytes as a byte slice.
    pub const fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for MagicBytes {
    type Error = MagicBytesError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; MAGIC_BYTES_LEN] = bytes
            .try_into()
            .map_err(|_| MagicBytesError::InvalidSize(bytes.len()))?;

        Ok(MagicBytes(array))
    }
}

impl FromStr for MagicBytes {
    type Err = MagicBytesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.len() {
            MAGIC_BYTES_LEN => s.as_bytes().try_into(),
            len if len == MAGIC_BYTES_LEN * 2 => {
                let bytes = hex::decode(s).map_err(|_| MagicBytesError::InvalidHex)?;
                bytes.as_slice().try_into()
            }
            len => Err(MagicBytesError::InvalidSize(len)),
        }
    }
}

impl fmt::Display for MagicBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
