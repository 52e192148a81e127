//! Sighashes of single-input transactions that spend a staking or unbonding output through one of
//! its leaves.
//!
//! Every pre-signed transaction in the protocol spends exactly one output. The sighash commits to
//! that output and to the exact leaf being exercised, so a signature for one path cannot be
//! replayed on another.

use std::slice;

use bitcoin::{
    sighash::{Prevouts, SighashCache},
    OutPoint, ScriptBuf, TapSighashType, Transaction, TxOut,
};
use btc_staking_primitives::scripts::taproot::create_script_spend_hash;
use secp256k1::Message;

use crate::errors::{StakingTxError, StakingTxResult};

/// Computes the `SIGHASH_DEFAULT` script-path sighash of the only input of `tx`, which spends
/// `funding_output` through `leaf_script`.
///
/// # Errors
///
/// If `tx` does not have exactly one input.
pub fn script_spend_sighash(
    tx: &Transaction,
    funding_output: &TxOut,
    leaf_script: &ScriptBuf,
) -> StakingTxResult<Message> {
    ensure_single_input(tx)?;

    let mut cache = SighashCache::new(tx);
    let message = create_script_spend_hash(
        &mut cache,
        leaf_script,
        Prevouts::All(slice::from_ref(funding_output)),
        TapSighashType::Default,
        0,
    )?;

    Ok(message)
}

/// Like [`script_spend_sighash`], but also checks that the input of `tx` spends output
/// `funding_output_idx` of `funding_tx`.
pub fn script_spend_sighash_strict(
    tx: &Transaction,
    funding_tx: &Transaction,
    funding_output_idx: u32,
    leaf_script: &ScriptBuf,
) -> StakingTxResult<Message> {
    let funding_output = funding_output(tx, funding_tx, funding_output_idx)?;

    script_spend_sighash(tx, funding_output, leaf_script)
}

/// Returns output `funding_output_idx` of `funding_tx` after checking that it is the one and only
/// output spent by `tx`.
pub fn funding_output<'tx>(
    tx: &Transaction,
    funding_tx: &'tx Transaction,
    funding_output_idx: u32,
) -> StakingTxResult<&'tx TxOut> {
    ensure_single_input(tx)?;

    let funding_output = funding_tx
        .output
        .get(funding_output_idx as usize)
        .ok_or(StakingTxError::FundingOutputIndexOutOfRange(funding_output_idx))?;

    let expected = OutPoint::new(funding_tx.compute_txid(), funding_output_idx);
    let actual = tx.input[0].previous_output;
    if actual != expected {
        return Err(StakingTxError::WrongFundingOutput { expected, actual });
    }

    Ok(funding_output)
}

fn ensure_single_input(tx: &Transaction) -> StakingTxResult<()> {
    match tx.input.len() {
        1 => Ok(()),
        actual => Err(StakingTxError::InvalidInputCount {
            expected: 1,
            actual,
        }),
    }
}
