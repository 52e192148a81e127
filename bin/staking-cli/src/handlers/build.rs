use anyhow::Result;
use bitcoin::{consensus::encode::serialize_hex, Amount};
use btc_staking_tx::prelude::StakingInfo;
use serde::Serialize;
use tracing::info;

use crate::{
    cli::BuildArgs,
    handlers::{load_params, print_json},
};

#[derive(Debug, Serialize)]
struct BuiltOutputs {
    address: String,
    staking_output: String,
    op_return_output: String,
}

pub(crate) fn handle_build(args: BuildArgs) -> Result<()> {
    let BuildArgs {
        params,
        staker_pk,
        fp_pk,
        staking_time,
        amount,
    } = args;
    let params = load_params(&params)?;

    info!(action = "building staking outputs", %staker_pk, %fp_pk, %staking_time, %amount);

    let info = StakingInfo::build_with_params(
        &params,
        staker_pk,
        fp_pk,
        staking_time,
        Amount::from_sat(amount),
    )?;

    print_json(&BuiltOutputs {
        address: info.address().to_string(),
        staking_output: serialize_hex(info.staking_output()),
        op_return_output: serialize_hex(info.op_return_output()),
    })
}
