//! Re-exports of the most commonly used parameter types.

pub use crate::{
    errors::{MagicBytesError, ParamsError, SlashingRateError},
    slashing_rate::SlashingRate,
    staking::StakingParams,
    types::{MagicBytes, MAGIC_BYTES_LEN},
};
