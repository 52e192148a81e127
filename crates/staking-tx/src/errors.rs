//! Errors that can occur while building, parsing, validating or signing staking transactions.

use bitcoin::{consensus::encode::Error as EncodeError, Amount, OutPoint, XOnlyPublicKey};
use btc_staking_primitives::errors::{AddressError, ErrorKind, SignatureError, TaprootError};
use thiserror::Error;

/// Errors that can occur while building, parsing, validating or signing staking transactions.
#[derive(Debug, Error)]
pub enum StakingTxError {
    /// The transaction bytes are not valid consensus encoding.
    #[error("invalid transaction encoding: {0}")]
    InvalidTxEncoding(#[from] EncodeError),

    /// The transaction hex string is invalid.
    #[error("invalid transaction hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The `OP_RETURN` payload does not have the fixed metadata length.
    #[error("invalid staking metadata length: expected {expected}, got {actual}")]
    InvalidMetadataLength {
        /// Required length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// The metadata version is not supported.
    #[error("unsupported staking metadata version {0}")]
    UnsupportedVersion(u8),

    /// A key in the metadata is not a valid x-only public key.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(#[from] secp256k1::Error),

    /// The staking time is zero.
    #[error("staking time must be positive")]
    ZeroStakingTime,

    /// The staking amount is zero.
    #[error("staking amount must be positive")]
    ZeroStakingAmount,

    /// The staking time is outside of the range accepted by the params.
    #[error("staking time {staking_time} is outside of [{min}, {max}]")]
    StakingTimeOutOfRange {
        /// The requested staking time.
        staking_time: u16,
        /// Minimum staking time.
        min: u16,
        /// Maximum staking time.
        max: u16,
    },

    /// The staking amount is outside of the range accepted by the params.
    #[error("staking amount {amount} is outside of [{min}, {max}]")]
    StakingAmountOutOfRange {
        /// The requested amount.
        amount: Amount,
        /// Minimum staking amount.
        min: Amount,
        /// Maximum staking amount.
        max: Amount,
    },

    /// No finality provider keys were provided.
    #[error("finality provider set must not be empty")]
    EmptyFinalityProviderSet,

    /// No covenant keys were provided.
    #[error("covenant set must not be empty")]
    EmptyCovenantSet,

    /// The same key is used twice among the staker, finality provider and covenant keys.
    #[error("duplicate key {0}")]
    DuplicateKey(XOnlyPublicKey),

    /// The covenant quorum is zero or larger than the covenant set.
    #[error("covenant quorum {quorum} is invalid for {num_keys} covenant keys")]
    InvalidCovenantQuorum {
        /// The requested quorum.
        quorum: u32,
        /// Number of covenant keys.
        num_keys: usize,
    },

    /// No output carries the staking metadata.
    #[error("no staking metadata output found")]
    NoOpReturnOutput,

    /// More than one output carries staking metadata with the expected magic bytes.
    #[error("multiple staking metadata outputs found")]
    MultipleOpReturnOutputs,

    /// No output pays to the staking script derived from the metadata.
    #[error("no staking output found")]
    NoStakingOutput,

    /// More than one output pays to the staking script derived from the metadata.
    #[error("multiple staking outputs found")]
    MultipleStakingOutputs,

    /// The transaction does not have the expected number of inputs.
    #[error("expected {expected} input(s), got {actual}")]
    InvalidInputCount {
        /// Required number of inputs.
        expected: usize,
        /// Actual number of inputs.
        actual: usize,
    },

    /// The transaction does not have the expected number of outputs.
    #[error("expected {expected} output(s), got {actual}")]
    InvalidOutputCount {
        /// Required number of outputs.
        expected: usize,
        /// Actual number of outputs.
        actual: usize,
    },

    /// The input signals replaceability or a relative timelock.
    #[error("transaction must not be replaceable")]
    Replaceable,

    /// The transaction has a non-zero absolute locktime.
    #[error("transaction must not have a locktime")]
    NonZeroLockTime,

    /// The input does not spend the expected output.
    #[error("input spends {actual}, expected {expected}")]
    WrongFundingOutput {
        /// The outpoint that should be spent.
        expected: OutPoint,
        /// The outpoint that is spent.
        actual: OutPoint,
    },

    /// The funding transaction has no output at the given index.
    #[error("funding transaction has no output at index {0}")]
    FundingOutputIndexOutOfRange(u32),

    /// The slashing address could not be decoded.
    #[error(transparent)]
    InvalidSlashingAddress(#[from] AddressError),

    /// The first output of the slashing transaction does not pay to the slashing address.
    #[error("slashing output does not pay to the slashing address")]
    SlashingAddressMismatch,

    /// The output of the unbonding transaction does not pay to the unbonding script.
    #[error("unbonding output does not pay to the unbonding script")]
    UnbondingOutputMismatch,

    /// An output is below the dust limit.
    #[error("output {index} is dust: {value} < {min}")]
    DustOutput {
        /// Index of the output.
        index: usize,
        /// Value of the output.
        value: Amount,
        /// Dust limit of the output.
        min: Amount,
    },

    /// The slashing output slashes less than required by the slashing rate.
    #[error("slashing output {actual} is below the required {required}")]
    InsufficientSlashingAmount {
        /// Minimum amount to be slashed.
        required: Amount,
        /// Amount actually slashed.
        actual: Amount,
    },

    /// The outputs spend more than the input provides.
    #[error("outputs {outputs} exceed the input value {input}")]
    OutputsExceedInput {
        /// Value of the spent output.
        input: Amount,
        /// Sum of the outputs.
        outputs: Amount,
    },

    /// The transaction fee is below the minimum.
    #[error("fee {fee} is below the minimum {min}")]
    FeeTooLow {
        /// Actual fee.
        fee: Amount,
        /// Required fee.
        min: Amount,
    },

    /// Error while building a taproot output or computing a sighash.
    #[error(transparent)]
    Taproot(#[from] TaprootError),

    /// Error while creating or verifying a signature.
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl StakingTxError {
    /// Returns the [`ErrorKind`] of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTxEncoding(_)
            | Self::InvalidHex(_)
            | Self::InvalidMetadataLength { .. }
            | Self::UnsupportedVersion(_)
            | Self::InvalidPublicKey(_)
            | Self::ZeroStakingTime
            | Self::EmptyFinalityProviderSet
            | Self::EmptyCovenantSet
            | Self::DuplicateKey(_)
            | Self::InvalidCovenantQuorum { .. }
            | Self::InvalidSlashingAddress(_) => ErrorKind::MalformedInput,

            Self::NoOpReturnOutput
            | Self::MultipleOpReturnOutputs
            | Self::NoStakingOutput
            | Self::MultipleStakingOutputs
            | Self::InvalidInputCount { .. }
            | Self::InvalidOutputCount { .. }
            | Self::Replaceable
            | Self::NonZeroLockTime
            | Self::WrongFundingOutput { .. }
            | Self::FundingOutputIndexOutOfRange(_)
            | Self::SlashingAddressMismatch
            | Self::UnbondingOutputMismatch => ErrorKind::StructuralMismatch,

            Self::ZeroStakingAmount
            | Self::StakingTimeOutOfRange { .. }
            | Self::StakingAmountOutOfRange { .. }
            | Self::DustOutput { .. }
            | Self::InsufficientSlashingAmount { .. }
            | Self::OutputsExceedInput { .. }
            | Self::FeeTooLow { .. } => ErrorKind::EconomicConstraintViolated,

            Self::Taproot(e) => e.kind(),
            Self::Signature(e) => e.kind(),
        }
    }
}

/// Result type alias for staking transactions.
pub type StakingTxResult<T> = Result<T, StakingTxError>;
