//! Errors for the staking parameters.

use bitcoin::XOnlyPublicKey;
use btc_staking_primitives::errors::AddressError;
use thiserror::Error;

/// Error while creating or validating magic bytes.
#[derive(Debug, Clone, Error)]
pub enum MagicBytesError {
    /// Magic bytes must be exactly 4 bytes.
    #[error("magic bytes must be exactly 4 bytes, got {0} bytes")]
    InvalidSize(usize),

    /// The hex encoding of the magic bytes is invalid.
    #[error("magic bytes are not valid hex")]
    InvalidHex,
}

/// Error while parsing a slashing rate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlashingRateError {
    /// The string is not a plain decimal number.
    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    /// More fractional digits than the fixed-point precision supports.
    #[error("too many decimal places: {0} (max {max})", max = crate::slashing_rate::PRECISION)]
    TooPrecise(usize),

    /// The rate is not strictly between zero and one.
    #[error("slashing rate must be in (0, 1), got {0}")]
    OutOfRange(String),

    /// The rate has more decimal places than the protocol allows.
    #[error("slashing rate must have at most 2 decimal places, got {0}")]
    TooManyDecimalPlaces(String),
}

/// Errors that can occur while loading or validating [`StakingParams`](crate::staking::StakingParams).
#[derive(Debug, Error)]
pub enum ParamsError {
    /// Could not read the params file.
    #[error("could not read params file: {0}")]
    Io(#[from] std::io::Error),

    /// Could not deserialize the params file.
    #[error("could not parse params file: {0}")]
    Toml(#[from] toml::de::Error),

    /// No covenant keys were configured.
    #[error("covenant set must not be empty")]
    EmptyCovenantSet,

    /// The covenant set contains the same key twice.
    #[error("duplicate covenant key: {0}")]
    DuplicateCovenantKey(XOnlyPublicKey),

    /// The covenant quorum is zero or larger than the covenant set.
    #[error("covenant quorum {quorum} is invalid for {num_keys} covenant keys")]
    InvalidCovenantQuorum {
        /// The configured quorum.
        quorum: u32,
        /// Number of covenant keys.
        num_keys: usize,
    },

    /// Minimum staking time is zero or greater than the maximum.
    #[error("invalid staking time range [{min}, {max}]")]
    InvalidStakingTimeRange {
        /// Minimum staking time in blocks.
        min: u16,
        /// Maximum staking time in blocks.
        max: u16,
    },

    /// Minimum staking amount is zero or greater than the maximum.
    #[error("invalid staking amount range [{min}, {max}]")]
    InvalidStakingAmountRange {
        /// Minimum staking amount.
        min: bitcoin::Amount,
        /// Maximum staking amount.
        max: bitcoin::Amount,
    },

    /// The slashing address does not decode for the configured network.
    #[error("invalid slashing address: {0}")]
    InvalidSlashingAddress(#[from] AddressError),
}
