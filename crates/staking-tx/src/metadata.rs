//! The staking metadata record carried in the `OP_RETURN` output of a staking transaction.
//!
//! Layout (71 bytes):
//!
//! | Field                    | Size | Encoding            |
//! |--------------------------|------|---------------------|
//! | magic bytes              | 4    | raw                 |
//! | version                  | 1    | `0`                 |
//! | staker public key        | 32   | BIP-340 x-only      |
//! | finality provider key    | 32   | BIP-340 x-only      |
//! | staking time             | 2    | big-endian `u16`    |

use bitcoin::{opcodes::all::OP_RETURN, Amount, Script, ScriptBuf, TxOut, XOnlyPublicKey};
use btc_staking_params::prelude::{MagicBytes, MAGIC_BYTES_LEN};
use btc_staking_primitives::scripts::general::op_return_script;
use serde::{Deserialize, Serialize};

use crate::errors::{StakingTxError, StakingTxResult};

/// Size of the serialized [`StakingMetadata`].
pub const STAKING_METADATA_LEN: usize = MAGIC_BYTES_LEN + 1 + 32 + 32 + 2;

/// The only metadata version currently defined.
pub const STAKING_METADATA_VERSION: u8 = 0;

/// `OP_PUSHBYTES_71`
const OP_PUSHBYTES_METADATA: u8 = STAKING_METADATA_LEN as u8;

const VERSION_OFFSET: usize = MAGIC_BYTES_LEN;
const STAKER_PK_OFFSET: usize = VERSION_OFFSET + 1;
const FP_PK_OFFSET: usize = STAKER_PK_OFFSET + 32;
const STAKING_TIME_OFFSET: usize = FP_PK_OFFSET + 32;

/// Identifies the staker, the finality provider and the staking time of a staking transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StakingMetadata {
    /// The tag that identifies staking transactions.
    pub magic_bytes: MagicBytes,

    /// The format version.
    pub version: u8,

    /// The staker's key.
    pub staker_pk: XOnlyPublicKey,

    /// The key of the finality provider the stake is delegated to.
    pub finality_provider_pk: XOnlyPublicKey,

    /// The staking timelock in blocks.
    pub staking_time: u16,
}

impl StakingMetadata {
    /// Creates a metadata record with the current version.
    pub const fn new(
        magic_bytes: MagicBytes,
        staker_pk: XOnlyPublicKey,
        finality_provider_pk: XOnlyPublicKey,
        staking_time: u16,
    ) -> Self {
        Self {
            magic_bytes,
            version: STAKING_METADATA_VERSION,
            staker_pk,
            finality_provider_pk,
            staking_time,
        }
    }

    /// Serializes the record into its fixed 71-byte layout.
    pub fn to_bytes(&self) -> [u8; STAKING_METADATA_LEN] {
        let mut bytes = [0u8; STAKING_METADATA_LEN];

        bytes[..VERSION_OFFSET].copy_from_slice(self.magic_bytes.as_bytes());
        bytes[VERSION_OFFSET] = self.version;
        bytes[STAKER_PK_OFFSET..FP_PK_OFFSET].copy_from_slice(&self.staker_pk.serialize());
        bytes[FP_PK_OFFSET..STAKING_TIME_OFFSET]
            .copy_from_slice(&self.finality_provider_pk.serialize());
        bytes[STAKING_TIME_OFFSET..].copy_from_slice(&self.staking_time.to_be_bytes());

        bytes
    }

    /// Decodes a record from its 71-byte layout.
    ///
    /// # Errors
    ///
    /// If the length is not exactly 71 bytes, the version is unknown, a key is not a valid x-only
    /// key or the staking time is zero.
    pub fn from_bytes(bytes: &[u8]) -> StakingTxResult<Self> {
        if bytes.len() != STAKING_METADATA_LEN {
            return Err(StakingTxError::InvalidMetadataLength {
                expected: STAKING_METADATA_LEN,
                actual: bytes.len(),
            });
        }

        let version = bytes[VERSION_OFFSET];
        if version != STAKING_METADATA_VERSION {
            return Err(StakingTxError::UnsupportedVersion(version));
        }

        let magic_bytes = MagicBytes::new(
            bytes[..VERSION_OFFSET]
                .try_into()
                .expect("slice has the size of the magic bytes"),
        );
        let staker_pk = XOnlyPublicKey::from_slice(&bytes[STAKER_PK_OFFSET..FP_PK_OFFSET])?;
        let finality_provider_pk =
            XOnlyPublicKey::from_slice(&bytes[FP_PK_OFFSET..STAKING_TIME_OFFSET])?;
        let staking_time = u16::from_be_bytes([
            bytes[STAKING_TIME_OFFSET],
            bytes[STAKING_TIME_OFFSET + 1],
        ]);

        if staking_time == 0 {
            return Err(StakingTxError::ZeroStakingTime);
        }

        Ok(Self {
            magic_bytes,
            version,
            staker_pk,
            finality_provider_pk,
            staking_time,
        })
    }

    /// Returns `OP_RETURN <71-byte push>`.
    pub fn op_return_script(&self) -> ScriptBuf {
        op_return_script(&self.to_bytes()).expect("71 bytes fit in a single push")
    }

    /// Returns the zero-valued `OP_RETURN` output that carries this record.
    pub fn op_return_output(&self) -> TxOut {
        TxOut {
            value: Amount::ZERO,
            script_pubkey: self.op_return_script(),
        }
    }
}

/// Returns the payload of `script` if it is exactly `OP_RETURN OP_PUSHBYTES_71 <71 bytes>`.
pub fn op_return_payload(script: &Script) -> Option<&[u8]> {
    match script.as_bytes() {
        [op_return, push, payload @ ..]
            if *op_return == OP_RETURN.to_u8()
                && *push == OP_PUSHBYTES_METADATA
                && payload.len() == STAKING_METADATA_LEN =>
        {
            Some(payload)
        }
        _ => None,
    }
}

/// Returns `true` if `script` carries a payload that starts with the given magic bytes.
///
/// No other field is decoded, not even the version.
pub fn is_staking_metadata_script(script: &Script, magic_bytes: &MagicBytes) -> bool {
    op_return_payload(script)
        .is_some_and(|payload| payload[..VERSION_OFFSET] == *magic_bytes.as_bytes())
}

#[cfg(test)]
mod tests {
    use btc_staking_test_utils::prelude::generate_xonly_pubkey;

    use super::*;

    fn metadata() -> StakingMetadata {
        StakingMetadata::new(
            MagicBytes::new(*b"bbte"),
            generate_xonly_pubkey(),
            generate_xonly_pubkey(),
            144,
        )
    }

    #[test]
    fn layout() {
        let metadata = metadata();
        let bytes = metadata.to_bytes();

        assert_eq!(bytes.len(), 71);
        assert_eq!(&bytes[..4], b"bbte");
        assert_eq!(bytes[4], 0);
        assert_eq!(&bytes[5..37], &metadata.staker_pk.serialize());
        assert_eq!(&bytes[37..69], &metadata.finality_provider_pk.serialize());
        assert_eq!(&bytes[69..], &[0x00u8, 0x90]);

        assert_eq!(StakingMetadata::from_bytes(&bytes).unwrap(), metadata);
    }

    #[test]
    fn op_return_script_layout() {
        let metadata = metadata();
        let script = metadata.op_return_script();

        assert_eq!(script.len(), 73);
        assert_eq!(script.as_bytes()[0], 0x6a);
        assert_eq!(script.as_bytes()[1], 0x47);
        assert_eq!(op_return_payload(&script), Some(&metadata.to_bytes()[..]));
        assert!(is_staking_metadata_script(&script, &metadata.magic_bytes));
        assert!(!is_staking_metadata_script(
            &script,
            &MagicBytes::new(*b"xxxx")
        ));
        assert_eq!(metadata.op_return_output().value, Amount::ZERO);
    }

    #[test]
    fn rejects_malformed_records() {
        let bytes = metadata().to_bytes();

        assert!(matches!(
            StakingMetadata::from_bytes(&bytes[..70]),
            Err(StakingTxError::InvalidMetadataLength {
                expected: 71,
                actual: 70
            })
        ));

        let mut wrong_version = bytes;
        wrong_version[4] = 1;
        assert!(matches!(
            StakingMetadata::from_bytes(&wrong_version),
            Err(StakingTxError::UnsupportedVersion(1))
        ));
        assert!(is_staking_metadata_script(
            &op_return_script(&wrong_version).unwrap(),
            &MagicBytes::new(*b"bbte")
        ));

        let mut zero_time = bytes;
        zero_time[69..].copy_from_slice(&[0, 0]);
        assert!(matches!(
            StakingMetadata::from_bytes(&zero_time),
            Err(StakingTxError::ZeroStakingTime)
        ));

        // larger than the field size, so not an x coordinate
        let mut invalid_key = bytes;
        invalid_key[5..37].copy_from_slice(&[0xff; 32]);
        assert!(matches!(
            StakingMetadata::from_bytes(&invalid_key),
            Err(StakingTxError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn payload_requires_exact_push() {
        let bytes = metadata().to_bytes();

        // a 72-byte payload is not metadata even if it starts with a valid record
        let mut longer = bytes.to_vec();
        longer.push(0);
        assert!(op_return_payload(&op_return_script(&longer).unwrap()).is_none());

        // same payload but pushed with OP_PUSHDATA1
        let mut pushdata = vec![0x6a, 0x4c, 71];
        pushdata.extend_from_slice(&bytes);
        assert!(op_return_payload(&ScriptBuf::from_bytes(pushdata)).is_none());
    }
}
