//! Construction, parsing and validation of the bitcoin transactions used for staking.
//!
//! A staking transaction locks bitcoin in a taproot output with three script paths (timelock,
//! unbonding and slashing) and carries a fixed-layout `OP_RETURN` record that identifies the
//! staker and the finality provider. The slashing and unbonding transactions that spend it are
//! pre-signed by the staker and by a quorum of the covenant committee.

pub mod errors;
pub mod metadata;
pub mod parse;
pub mod prelude;
pub mod scripts;
pub mod sighash;
pub mod slashing;
pub mod spend_tx;
pub mod staking;
pub mod unbonding;
