//! This crate contains the consensus-critical parameters that dictate the behavior of the staking
//! protocol in a way that ensures that all nodes agree on the set of valid staking transactions
//! and the status of every delegation.

pub mod default;
pub mod errors;
pub mod prelude;
pub mod slashing_rate;
pub mod staking;
pub mod types;
