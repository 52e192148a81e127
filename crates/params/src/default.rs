//! Default values for the staking parameters.

use bitcoin::Amount;

/// Default minimum fee that a slashing transaction must pay.
pub const MIN_SLASHING_TX_FEE: Amount = Amount::from_sat(1_000);

/// Default minimum fee that an unbonding transaction must pay.
pub const MIN_UNBONDING_TX_FEE: Amount = Amount::from_sat(1_000);

/// Default minimum staking time in blocks.
pub const MIN_STAKING_TIME: u16 = 1;

/// Default maximum staking time in blocks.
pub const MAX_STAKING_TIME: u16 = u16::MAX;

/// Default minimum staking amount.
pub const MIN_STAKING_AMOUNT: Amount = Amount::from_sat(10_000);

/// Default maximum staking amount.
pub const MAX_STAKING_AMOUNT: Amount = Amount::from_int_btc(10);

/// Default number of blocks after which a bitcoin checkpoint is considered final (`w`).
pub const FINALIZATION_TIMEOUT: u64 = 100;

/// Default number of finality providers that can be active at the same time.
pub const MAX_ACTIVE_FINALITY_PROVIDERS: u32 = 100;
