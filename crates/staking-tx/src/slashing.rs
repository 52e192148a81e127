//! Economic and structural validation of slashing transactions.

use bitcoin::{Amount, Network, Transaction};
use btc_staking_params::prelude::{SlashingRate, StakingParams};
use btc_staking_primitives::bitcoin::BitcoinAddress;
use tracing::{debug, warn};

use crate::{
    errors::{StakingTxError, StakingTxResult},
    sighash::funding_output,
    spend_tx::{check_fee, check_no_dust, check_single_final_input, SlashingTx},
};

/// Number of outputs of a slashing transaction: the slashed share and the staker's change.
pub const SLASHING_TX_OUTPUTS: usize = 2;

impl SlashingTx {
    /// Checks that the transaction is a valid slashing transaction for a funding output holding
    /// `staking_output_value`.
    ///
    /// The transaction must have a single final input and no locktime, exactly two outputs with the
    /// first one paying to `slashing_address`, no dust output, a slashed amount of at least
    /// `staking_output_value * slashing_rate` and a fee of at least `min_fee`.
    ///
    /// # Errors
    ///
    /// If the transaction or the address cannot be decoded or any of the checks above fails.
    pub fn validate(
        &self,
        network: Network,
        slashing_address: &str,
        slashing_rate: &SlashingRate,
        min_fee: Amount,
        staking_output_value: Amount,
    ) -> StakingTxResult<()> {
        let tx = self.to_tx()?;
        let slashing_address = BitcoinAddress::parse(slashing_address, network)?;

        validate_slashing_tx(
            &tx,
            &slashing_address,
            slashing_rate,
            min_fee,
            staking_output_value,
        )
        .inspect_err(|e| warn!(txid = %tx.compute_txid(), %e, "invalid slashing transaction"))
    }

    /// Like [`Self::validate`], with the network, slashing address, slashing rate and minimum
    /// fee of `params`.
    pub fn validate_with_params(
        &self,
        params: &StakingParams,
        staking_output_value: Amount,
    ) -> StakingTxResult<()> {
        self.validate(
            params.network,
            &params.slashing_address,
            &params.slashing_rate,
            params.min_slashing_tx_fee,
            staking_output_value,
        )
    }
}

fn validate_slashing_tx(
    tx: &Transaction,
    slashing_address: &BitcoinAddress,
    slashing_rate: &SlashingRate,
    min_fee: Amount,
    staking_output_value: Amount,
) -> StakingTxResult<()> {
    check_single_final_input(tx)?;

    if tx.output.len() != SLASHING_TX_OUTPUTS {
        return Err(StakingTxError::InvalidOutputCount {
            expected: SLASHING_TX_OUTPUTS,
            actual: tx.output.len(),
        });
    }

    let slashed = &tx.output[0];
    if slashed.script_pubkey != slashing_address.script_pubkey() {
        return Err(StakingTxError::SlashingAddressMismatch);
    }

    check_no_dust(tx)?;

    let required = slashing_rate.min_slashing_amount(staking_output_value);
    if slashed.value < required {
        return Err(StakingTxError::InsufficientSlashingAmount {
            required,
            actual: slashed.value,
        });
    }

    let fee = check_fee(tx, staking_output_value, min_fee)?;

    debug!(
        txid = %tx.compute_txid(),
        slashed = %slashed.value,
        %required,
        %fee,
        "validated slashing transaction"
    );

    Ok(())
}

/// Checks that `slashing_tx` spends output `staking_output_idx` of `staking_tx` and is a valid
/// slashing transaction for it under `params`.
///
/// # Errors
///
/// If either transaction cannot be decoded, the slashing transaction spends anything else than
/// the staking output, or [`SlashingTx::validate`] fails.
pub fn check_transactions(
    slashing_tx: &SlashingTx,
    staking_tx: &Transaction,
    staking_output_idx: u32,
    params: &StakingParams,
) -> StakingTxResult<()> {
    let tx = slashing_tx.to_tx()?;
    let staking_output = funding_output(&tx, staking_tx, staking_output_idx)?;

    slashing_tx.validate_with_params(params, staking_output.value)
}
