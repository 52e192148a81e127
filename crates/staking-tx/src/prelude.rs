//! Re-exports of the most commonly used staking transaction types.

pub use crate::{
    errors::{StakingTxError, StakingTxResult},
    metadata::{StakingMetadata, STAKING_METADATA_LEN, STAKING_METADATA_VERSION},
    parse::{
        is_possible_staking_tx, parse_staking_tx, parse_staking_tx_with_params,
        ParsedStakingTransaction,
    },
    scripts::StakingScripts,
    slashing::check_transactions,
    spend_tx::{SlashingTx, UnbondingTx},
    staking::{LeafSpendInfo, StakingInfo, StakingPath, UnbondingInfo},
    unbonding::check_unbonding_transactions,
};
