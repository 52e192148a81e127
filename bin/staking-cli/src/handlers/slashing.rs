use anyhow::Result;
use btc_staking_tx::prelude::{check_transactions, SlashingTx};
use tracing::info;

use crate::{
    cli::ValidateSlashingArgs,
    handlers::{decode_tx, load_params},
};

pub(crate) fn handle_validate_slashing(args: ValidateSlashingArgs) -> Result<()> {
    let ValidateSlashingArgs {
        params,
        slashing_tx,
        staking_tx,
        staking_output_idx,
    } = args;
    let params = load_params(&params)?;
    let slashing_tx = SlashingTx::from_hex(slashing_tx.trim())?;
    let staking_tx = decode_tx(&staking_tx)?;

    check_transactions(&slashing_tx, &staking_tx, staking_output_idx, &params)?;

    info!(
        slashing_txid = %slashing_tx.txid()?,
        staking_txid = %staking_tx.compute_txid(),
        "slashing transaction is valid"
    );
    println!("valid");

    Ok(())
}
