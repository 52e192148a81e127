//! Wrappers around the raw pre-signed transactions that spend a staking output.
//!
//! Both wrappers keep the consensus-encoded bytes as received and decode them on use, so a
//! malformed transaction is only ever rejected, never silently fixed up.

use std::{fmt, str::FromStr};

use bitcoin::{consensus, Amount, ScriptBuf, Sequence, Transaction, TxOut, Txid, XOnlyPublicKey};
use btc_staking_primitives::{
    adaptor::{AdaptorSignature, EncryptionKey},
    secp::{sign_schnorr, verify_schnorr},
};
use secp256k1::{schnorr, Message, SecretKey};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use tracing::trace;

use crate::{
    errors::{StakingTxError, StakingTxResult},
    sighash::{script_spend_sighash, script_spend_sighash_strict},
};

/// Creates a newtype wrapper around consensus-encoded transaction bytes.
///
/// The generated type exposes the encoding helpers as well as plain and adaptor signing and
/// verification over the script-path sighash of its single input.
macro_rules! impl_spend_tx {
    (
        $(#[$struct_attr:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$struct_attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
        pub struct $name(Vec<u8>);

        impl $name {
            /// Wraps the given consensus-encoded bytes without decoding them.
            pub const fn from_bytes(bytes: Vec<u8>) -> Self {
                Self(bytes)
            }

            /// Encodes a transaction.
            pub fn from_tx(tx: &Transaction) -> Self {
                Self(consensus::serialize(tx))
            }

            /// Decodes a hex string.
            pub fn from_hex(s: &str) -> StakingTxResult<Self> {
                Ok(Self(hex::decode(s)?))
            }

            /// Returns the hex encoding.
            pub fn to_hex(&self) -> String {
                hex::encode(&self.0)
            }

            /// Returns the consensus-encoded bytes.
            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            /// Decodes the transaction.
            pub fn to_tx(&self) -> StakingTxResult<Transaction> {
                Ok(consensus::deserialize(&self.0)?)
            }

            /// Returns the txid of the decoded transaction.
            pub fn txid(&self) -> StakingTxResult<Txid> {
                Ok(self.to_tx()?.compute_txid())
            }

            /// Computes the sighash of the single input, spending `funding_output` through
            /// `leaf_script`.
            pub fn sighash(
                &self,
                funding_output: &TxOut,
                leaf_script: &ScriptBuf,
            ) -> StakingTxResult<Message> {
                script_spend_sighash(&self.to_tx()?, funding_output, leaf_script)
            }

            /// Signs the single input, which must spend output `funding_output_idx` of
            /// `funding_tx`, through `leaf_script`.
            pub fn sign(
                &self,
                funding_tx: &Transaction,
                funding_output_idx: u32,
                leaf_script: &ScriptBuf,
                sk: &SecretKey,
            ) -> StakingTxResult<schnorr::Signature> {
                let tx = self.to_tx()?;
                let sighash =
                    script_spend_sighash_strict(&tx, funding_tx, funding_output_idx, leaf_script)?;

                Ok(sign_schnorr(sk, &sighash))
            }

            /// Produces an adaptor signature over the single input, encrypted under `enc_key`.
            pub fn enc_sign(
                &self,
                funding_tx: &Transaction,
                funding_output_idx: u32,
                leaf_script: &ScriptBuf,
                sk: &SecretKey,
                enc_key: &EncryptionKey,
            ) -> StakingTxResult<AdaptorSignature> {
                let tx = self.to_tx()?;
                let sighash =
                    script_spend_sighash_strict(&tx, funding_tx, funding_output_idx, leaf_script)?;

                Ok(AdaptorSignature::enc_sign(sk, enc_key, &sighash)?)
            }

            /// Verifies a signature of `pk` over the single input spending `funding_output`
            /// through `leaf_script`.
            ///
            /// `funding_output` is trusted as given: unlike [`Self::sign`], the input's outpoint
            /// is not checked against a funding transaction.
            pub fn verify_signature(
                &self,
                funding_output: &TxOut,
                leaf_script: &ScriptBuf,
                pk: &XOnlyPublicKey,
                sig: &schnorr::Signature,
            ) -> StakingTxResult<()> {
                let sighash = self.sighash(funding_output, leaf_script)?;

                verify_schnorr(pk, &sighash, sig).inspect_err(|_| {
                    trace!(%pk, tx = stringify!($name), "signature verification failed");
                })?;

                Ok(())
            }

            /// Verifies an adaptor signature of `pk`, encrypted under `enc_key`, over the single
            /// input spending `funding_output` through `leaf_script`.
            ///
            /// `funding_output` is trusted as given: unlike [`Self::enc_sign`], the input's
            /// outpoint is not checked against a funding transaction.
            pub fn enc_verify_adaptor_signature(
                &self,
                funding_output: &TxOut,
                leaf_script: &ScriptBuf,
                pk: &XOnlyPublicKey,
                enc_key: &EncryptionKey,
                sig: &AdaptorSignature,
            ) -> StakingTxResult<()> {
                let sighash = self.sighash(funding_output, leaf_script)?;

                sig.enc_verify(pk, enc_key, &sighash).inspect_err(|_| {
                    trace!(
                        %pk,
                        %enc_key,
                        tx = stringify!($name),
                        "adaptor signature verification failed"
                    );
                })?;

                Ok(())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = StakingTxError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl From<&Transaction> for $name {
            fn from(tx: &Transaction) -> Self {
                Self::from_tx(tx)
            }
        }
    };
}

impl_spend_tx! {
    /// A slashing transaction.
    ///
    /// It spends the slashing path of a staking or unbonding output, paying the slashed share to
    /// the slashing address and the remainder back to the staker.
    pub struct SlashingTx;
}

impl_spend_tx! {
    /// An unbonding transaction.
    ///
    /// It spends the unbonding path of a staking output into an unbonding output.
    pub struct UnbondingTx;
}

/// Checks that `tx` has one final input and no absolute locktime.
pub(crate) fn check_single_final_input(tx: &Transaction) -> StakingTxResult<()> {
    if tx.input.len() != 1 {
        return Err(StakingTxError::InvalidInputCount {
            expected: 1,
            actual: tx.input.len(),
        });
    }

    if tx.input[0].sequence != Sequence::MAX {
        return Err(StakingTxError::Replaceable);
    }

    if tx.lock_time.to_consensus_u32() != 0 {
        return Err(StakingTxError::NonZeroLockTime);
    }

    Ok(())
}

/// Checks that no output of `tx` is dust.
pub(crate) fn check_no_dust(tx: &Transaction) -> StakingTxResult<()> {
    tx.output.iter().enumerate().try_for_each(|(index, out)| {
        let min = out.script_pubkey.minimal_non_dust();

        match out.value < min {
            true => Err(StakingTxError::DustOutput {
                index,
                value: out.value,
                min,
            }),
            false => Ok(()),
        }
    })
}

/// Returns the fee paid by `tx` when it spends `input_value`, after checking it is at least
/// `min_fee`.
pub(crate) fn check_fee(
    tx: &Transaction,
    input_value: Amount,
    min_fee: Amount,
) -> StakingTxResult<Amount> {
    let outputs = tx
        .output
        .iter()
        .try_fold(Amount::ZERO, |sum, out| sum.checked_add(out.value))
        .unwrap_or(Amount::MAX);

    let fee = input_value
        .checked_sub(outputs)
        .ok_or(StakingTxError::OutputsExceedInput {
            input: input_value,
            outputs,
        })?;

    if fee < min_fee {
        return Err(StakingTxError::FeeTooLow { fee, min: min_fee });
    }

    Ok(fee)
}
