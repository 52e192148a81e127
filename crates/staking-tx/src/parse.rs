//! Recognition and parsing of staking transactions found on bitcoin.

use bitcoin::{Network, Transaction, TxOut, XOnlyPublicKey};
use btc_staking_params::prelude::{MagicBytes, StakingParams};
use btc_staking_primitives::scripts::taproot::create_taproot_addr;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    errors::{StakingTxError, StakingTxResult},
    metadata::{is_staking_metadata_script, op_return_payload, StakingMetadata},
    scripts::StakingScripts,
};

/// A staking transaction located and decoded by [`parse_staking_tx`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedStakingTransaction {
    /// The output that locks the stake.
    pub staking_output: TxOut,

    /// The index of [`Self::staking_output`] in the transaction.
    pub staking_output_idx: u32,

    /// The output that carries the metadata.
    pub op_return_output: TxOut,

    /// The index of [`Self::op_return_output`] in the transaction.
    pub op_return_output_idx: u32,

    /// The decoded metadata.
    pub metadata: StakingMetadata,
}

/// Cheap pre-filter for staking transactions.
///
/// Returns `true` iff exactly one output is `OP_RETURN <71 bytes>` starting with `magic_bytes`.
/// The version, keys and scripts are not checked.
pub fn is_possible_staking_tx(tx: &Transaction, magic_bytes: &MagicBytes) -> bool {
    tx.output
        .iter()
        .filter(|out| is_staking_metadata_script(&out.script_pubkey, magic_bytes))
        .take(2)
        .count()
        == 1
}

/// Locates and decodes the staking output and the metadata output of `tx`.
///
/// The staking output is found by rebuilding the staking scripts from the metadata, the covenant
/// committee and the quorum, and matching the resulting locking script against every output.
///
/// # Errors
///
/// * [`StakingTxError::NoOpReturnOutput`] / [`StakingTxError::MultipleOpReturnOutputs`] if not
///   exactly one output carries metadata with `magic_bytes`.
/// * Any metadata decoding error.
/// * [`StakingTxError::NoStakingOutput`] / [`StakingTxError::MultipleStakingOutputs`] if not
///   exactly one output pays to the expected staking script.
pub fn parse_staking_tx(
    tx: &Transaction,
    magic_bytes: &MagicBytes,
    covenant_pks: &[XOnlyPublicKey],
    covenant_quorum: u32,
    network: Network,
) -> StakingTxResult<ParsedStakingTransaction> {
    let (op_return_output_idx, op_return_output) =
        find_unique(tx, |out| is_staking_metadata_script(&out.script_pubkey, magic_bytes))
            .map_err(|count| match count {
                0 => StakingTxError::NoOpReturnOutput,
                _ => StakingTxError::MultipleOpReturnOutputs,
            })?;

    let payload = op_return_payload(&op_return_output.script_pubkey)
        .ok_or(StakingTxError::NoOpReturnOutput)?;
    let metadata = StakingMetadata::from_bytes(payload)?;
    trace!(?metadata, %op_return_output_idx, "decoded staking metadata");

    let scripts = StakingScripts::new(
        &metadata.staker_pk,
        &[metadata.finality_provider_pk],
        covenant_pks,
        covenant_quorum,
        metadata.staking_time,
    )?;
    let (address, _) = create_taproot_addr(network, &scripts.leaf_scripts())?;
    let expected_script = address.script_pubkey();

    let (staking_output_idx, staking_output) =
        find_unique(tx, |out| out.script_pubkey == expected_script).map_err(
            |count| match count {
                0 => StakingTxError::NoStakingOutput,
                _ => StakingTxError::MultipleStakingOutputs,
            },
        )?;

    debug!(
        txid = %tx.compute_txid(),
        %staking_output_idx,
        %op_return_output_idx,
        staker_pk = %metadata.staker_pk,
        finality_provider_pk = %metadata.finality_provider_pk,
        "parsed staking transaction"
    );

    Ok(ParsedStakingTransaction {
        staking_output: staking_output.clone(),
        staking_output_idx,
        op_return_output: op_return_output.clone(),
        op_return_output_idx,
        metadata,
    })
}

/// Like [`parse_staking_tx`], with the magic bytes, covenant committee and network of `params`.
pub fn parse_staking_tx_with_params(
    tx: &Transaction,
    params: &StakingParams,
) -> StakingTxResult<ParsedStakingTransaction> {
    parse_staking_tx(
        tx,
        &params.magic_bytes,
        &params.covenant_pks,
        params.covenant_quorum,
        params.network,
    )
}

/// Returns the only output matching `predicate`, or the number of matches (0 or 2) otherwise.
fn find_unique(
    tx: &Transaction,
    predicate: impl Fn(&TxOut) -> bool,
) -> Result<(u32, &TxOut), usize> {
    let mut matches = tx
        .output
        .iter()
        .enumerate()
        .filter(|(_, out)| predicate(out));

    match (matches.next(), matches.next()) {
        // output count is bounded by the block size
        (Some((idx, out)), None) => Ok((idx as u32, out)),
        (None, _) => Err(0),
        (Some(_), Some(_)) => Err(2),
    }
}
