use anyhow::{bail, Result};
use btc_staking_tx::prelude::{is_possible_staking_tx, parse_staking_tx_with_params};
use tracing::info;

use crate::{
    cli::ParseArgs,
    handlers::{decode_tx, load_params, print_json},
};

pub(crate) fn handle_parse(args: ParseArgs) -> Result<()> {
    let params = load_params(&args.params)?;
    let tx = decode_tx(&args.tx)?;
    let txid = tx.compute_txid();

    if !is_possible_staking_tx(&tx, &params.magic_bytes) {
        bail!("{txid} does not carry staking metadata tagged {}", params.magic_bytes);
    }

    let parsed = parse_staking_tx_with_params(&tx, &params)?;
    info!(%txid, staking_output_idx = parsed.staking_output_idx, "parsed staking transaction");

    print_json(&parsed)
}
