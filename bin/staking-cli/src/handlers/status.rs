use anyhow::Result;
use bitcoin::{Txid, XOnlyPublicKey};
use btc_staking_delegation::prelude::{
    BtcDelegation, BtcDelegationStatus, BtcLightClient, DelegationQuerier,
};
use btc_staking_primitives::types::{BitcoinBlockHeight, VotingPower};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    cli::StatusArgs,
    handlers::{load_params, print_json, read_json},
};

/// A light client pinned to the height given on the command line.
#[derive(Debug)]
struct FixedTip(BitcoinBlockHeight);

impl BtcLightClient for FixedTip {
    fn tip_height(&self) -> BitcoinBlockHeight {
        self.0
    }
}

#[derive(Debug, Serialize)]
struct DelegationSummary {
    staking_txid: Txid,
    status: BtcDelegationStatus,
    voting_power: VotingPower,
}

#[derive(Debug, Serialize)]
struct ProviderPower {
    fp_btc_pk: XOnlyPublicKey,
    height: BitcoinBlockHeight,
    voting_power: VotingPower,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    delegations: Vec<DelegationSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    finality_provider: Option<ProviderPower>,
}

pub(crate) fn handle_status(args: StatusArgs) -> Result<()> {
    let params = load_params(&args.params)?;
    let delegations: Vec<BtcDelegation> = read_json(&args.delegations)?;

    for delegation in &delegations {
        if let Err(e) = delegation.validate_basic() {
            warn!(btc_pk = %delegation.btc_pk, %e, "delegation fails basic validation");
        }
    }

    let light_client = FixedTip(args.tip_height);
    let querier = DelegationQuerier::new(&light_client, &params, params.covenant_quorum);
    let w = params.finalization_timeout;

    let summaries = querier
        .delegations(&delegations, args.filter)
        .into_iter()
        .map(|response| -> Result<DelegationSummary> {
            Ok(DelegationSummary {
                staking_txid: response.delegation.staking_txid()?,
                status: response.status,
                voting_power: response.delegation.voting_power(
                    args.tip_height,
                    w,
                    params.covenant_quorum,
                ),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let finality_provider = args.fp_pk.map(|fp_btc_pk| {
        let (height, voting_power) = querier.provider_current_power(&delegations, &fp_btc_pk);

        ProviderPower {
            fp_btc_pk,
            height,
            voting_power,
        }
    });

    info!(
        tip_height = %args.tip_height,
        filter = %args.filter,
        matched = summaries.len(),
        total = delegations.len(),
        "computed delegation statuses"
    );

    print_json(&StatusReport {
        delegations: summaries,
        finality_provider,
    })
}
