//! Validation of unbonding transactions.

use bitcoin::{Amount, Script, Transaction};
use btc_staking_params::prelude::StakingParams;
use tracing::{debug, warn};

use crate::{
    errors::{StakingTxError, StakingTxResult},
    sighash::funding_output,
    spend_tx::{check_fee, check_no_dust, check_single_final_input, UnbondingTx},
};

impl UnbondingTx {
    /// Checks that the transaction moves a staking output holding `staking_output_value` into a
    /// single output locked by `unbonding_script_pubkey`, paying at least `min_fee`.
    ///
    /// # Errors
    ///
    /// If the transaction cannot be decoded, does not have a single final input and a single
    /// output, pays to another script, creates dust or pays too little fee.
    pub fn validate(
        &self,
        unbonding_script_pubkey: &Script,
        min_fee: Amount,
        staking_output_value: Amount,
    ) -> StakingTxResult<()> {
        let tx = self.to_tx()?;

        validate_unbonding_tx(&tx, unbonding_script_pubkey, min_fee, staking_output_value)
            .inspect_err(|e| warn!(txid = %tx.compute_txid(), %e, "invalid unbonding transaction"))
    }
}

fn validate_unbonding_tx(
    tx: &Transaction,
    unbonding_script_pubkey: &Script,
    min_fee: Amount,
    staking_output_value: Amount,
) -> StakingTxResult<()> {
    check_single_final_input(tx)?;

    if tx.output.len() != 1 {
        return Err(StakingTxError::InvalidOutputCount {
            expected: 1,
            actual: tx.output.len(),
        });
    }

    if tx.output[0].script_pubkey.as_script() != unbonding_script_pubkey {
        return Err(StakingTxError::UnbondingOutputMismatch);
    }

    check_no_dust(tx)?;
    let fee = check_fee(tx, staking_output_value, min_fee)?;

    debug!(txid = %tx.compute_txid(), %fee, "validated unbonding transaction");

    Ok(())
}

/// Checks that `unbonding_tx` spends output `staking_output_idx` of `staking_tx` into an output
/// locked by `unbonding_script_pubkey`, paying at least the minimum unbonding fee of `params`.
pub fn check_unbonding_transactions(
    unbonding_tx: &UnbondingTx,
    staking_tx: &Transaction,
    staking_output_idx: u32,
    unbonding_script_pubkey: &Script,
    params: &StakingParams,
) -> StakingTxResult<()> {
    let tx = unbonding_tx.to_tx()?;
    let staking_output = funding_output(&tx, staking_tx, staking_output_idx)?;

    unbonding_tx.validate(
        unbonding_script_pubkey,
        params.min_unbonding_tx_fee,
        staking_output.value,
    )
}

#[cfg(test)]
mod tests {
    use bitcoin::{Network, OutPoint, ScriptBuf};
    use btc_staking_params::prelude::MagicBytes;
    use btc_staking_primitives::scripts::general::{create_tx, create_tx_ins, create_tx_outs};
    use btc_staking_test_utils::prelude::{generate_keypairs, generate_signature, generate_tx};

    use super::*;
    use crate::staking::{StakingInfo, StakingPath, UnbondingInfo};

    const STAKE: Amount = Amount::from_sat(100_000);
    const MIN_FEE: Amount = Amount::from_sat(1_000);

    struct Fixture {
        staking_tx: Transaction,
        staking_info: StakingInfo,
        unbonding_info: UnbondingInfo,
    }

    fn fixture() -> Fixture {
        let (pks, _) = generate_keypairs(5);
        let staking_info = StakingInfo::build(
            MagicBytes::new(*b"bbte"),
            pks[0],
            pks[1],
            &pks[2..],
            2,
            144,
            STAKE,
            Network::Regtest,
        )
        .unwrap();
        let unbonding_info = UnbondingInfo::build(
            pks[0],
            &[pks[1]],
            &pks[2..],
            2,
            101,
            STAKE - MIN_FEE,
            Network::Regtest,
        )
        .unwrap();
        let staking_tx = generate_tx(vec![
            staking_info.staking_output().clone(),
            staking_info.op_return_output().clone(),
        ]);

        Fixture {
            staking_tx,
            staking_info,
            unbonding_info,
        }
    }

    fn unbonding_tx(funding: OutPoint, script: ScriptBuf, value: Amount) -> UnbondingTx {
        UnbondingTx::from_tx(&create_tx(
            create_tx_ins([funding]),
            create_tx_outs([(script, value)]),
        ))
    }

    #[test]
    fn accepts_valid_unbonding_tx() {
        let f = fixture();
        let output = f.unbonding_info.unbonding_output();
        let tx = unbonding_tx(
            OutPoint::new(f.staking_tx.compute_txid(), 0),
            output.script_pubkey.clone(),
            output.value,
        );

        tx.validate(&output.script_pubkey, MIN_FEE, STAKE).unwrap();

        // a random signature does not authorize the unbonding path
        let leaf = f.staking_info.path_script(StakingPath::Unbonding);
        let staker_pk = f.staking_info.metadata().staker_pk;
        assert!(matches!(
            tx.verify_signature(
                f.staking_info.staking_output(),
                leaf,
                &staker_pk,
                &generate_signature(),
            ),
            Err(StakingTxError::Signature(_))
        ));
    }

    #[test]
    fn rejects_invalid_unbonding_tx() {
        let f = fixture();
        let output = f.unbonding_info.unbonding_output();
        let funding = OutPoint::new(f.staking_tx.compute_txid(), 0);

        let wrong_script = unbonding_tx(
            funding,
            f.staking_info.staking_output().script_pubkey.clone(),
            output.value,
        );
        assert!(matches!(
            wrong_script.validate(&output.script_pubkey, MIN_FEE, STAKE),
            Err(StakingTxError::UnbondingOutputMismatch)
        ));

        let low_fee = unbonding_tx(
            funding,
            output.script_pubkey.clone(),
            STAKE - Amount::from_sat(10),
        );
        assert!(matches!(
            low_fee.validate(&output.script_pubkey, MIN_FEE, STAKE),
            Err(StakingTxError::FeeTooLow { .. })
        ));

        let two_outputs = UnbondingTx::from_tx(&create_tx(
            create_tx_ins([funding]),
            create_tx_outs([
                (output.script_pubkey.clone(), Amount::from_sat(50_000)),
                (output.script_pubkey.clone(), Amount::from_sat(40_000)),
            ]),
        ));
        assert!(matches!(
            two_outputs.validate(&output.script_pubkey, MIN_FEE, STAKE),
            Err(StakingTxError::InvalidOutputCount {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn check_against_staking_tx() {
        let f = fixture();
        let output = f.unbonding_info.unbonding_output();
        let params = StakingParams {
            network: Network::Regtest,
            magic_bytes: MagicBytes::new(*b"bbte"),
            covenant_pks: generate_keypairs(3).0,
            covenant_quorum: 2,
            slashing_address: String::new(),
            slashing_rate: "0.1".parse().unwrap(),
            min_slashing_tx_fee: MIN_FEE,
            min_unbonding_tx_fee: MIN_FEE,
            min_staking_time: 10,
            max_staking_time: 1_000,
            min_staking_amount: Amount::from_sat(10_000),
            max_staking_amount: Amount::from_sat(1_000_000),
            finalization_timeout: 10,
            max_active_finality_providers: 100,
        };

        let valid = unbonding_tx(
            OutPoint::new(f.staking_tx.compute_txid(), 0),
            output.script_pubkey.clone(),
            output.value,
        );
        check_unbonding_transactions(&valid, &f.staking_tx, 0, &output.script_pubkey, &params)
            .unwrap();

        let spends_op_return = unbonding_tx(
            OutPoint::new(f.staking_tx.compute_txid(), 1),
            output.script_pubkey.clone(),
            output.value,
        );
        assert!(matches!(
            check_unbonding_transactions(
                &spends_op_return,
                &f.staking_tx,
                0,
                &output.script_pubkey,
                &params
            ),
            Err(StakingTxError::WrongFundingOutput { .. })
        ));
    }
}
