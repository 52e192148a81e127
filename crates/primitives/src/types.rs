//! Common type aliases.

/// Height of a bitcoin block.
pub type BitcoinBlockHeight = u64;

/// Voting power of a delegation or a finality provider, in satoshis.
pub type VotingPower = u64;
