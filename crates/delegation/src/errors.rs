//! Errors that can occur while validating or updating delegations.

use bitcoin::{Amount, Txid, XOnlyPublicKey};
use btc_staking_primitives::errors::{ErrorKind, SignatureError};
use btc_staking_tx::errors::StakingTxError;
use thiserror::Error;

/// Errors that can occur while validating or updating delegations.
#[derive(Debug, Error)]
pub enum DelegationError {
    /// The delegation does not carry a proof of possession.
    #[error("empty proof of possession")]
    MissingProofOfPossession,

    /// The proof of possession does not verify.
    #[error("invalid proof of possession: {0}")]
    InvalidProofOfPossession(#[source] SignatureError),

    /// The delegation is not delegated to any finality provider.
    #[error("empty list of finality provider keys")]
    EmptyFinalityProviderSet,

    /// The same finality provider appears twice.
    #[error("duplicate finality provider key {0}")]
    DuplicateFinalityProvider(XOnlyPublicKey),

    /// The start height is not below the end height.
    #[error("invalid height range [{start}, {end}]")]
    InvalidHeightRange {
        /// First bitcoin height of the delegation.
        start: u64,
        /// Last bitcoin height of the delegation.
        end: u64,
    },

    /// The staking transaction has no output at the recorded index.
    #[error("staking transaction has no output at index {0}")]
    StakingOutputIndexOutOfRange(u32),

    /// The recorded stake does not match the staking output.
    #[error("total stake {recorded} does not match the staking output value {actual}")]
    TotalSatMismatch {
        /// The stake recorded in the delegation.
        recorded: Amount,
        /// The value of the staking output.
        actual: Amount,
    },

    /// A staking, slashing or unbonding transaction is invalid.
    #[error(transparent)]
    StakingTx(#[from] StakingTxError),

    /// The covenant member has already signed.
    #[error("covenant {0} has already signed")]
    DuplicatedCovenantSig(XOnlyPublicKey),

    /// A covenant member did not provide one adaptor signature per finality provider.
    #[error("expected {expected} adaptor signature(s), got {actual}")]
    AdaptorSigCountMismatch {
        /// Number of finality providers.
        expected: usize,
        /// Number of signatures provided.
        actual: usize,
    },

    /// The commission of a finality provider is above 100%.
    #[error("commission of {0} bps exceeds 10000 bps")]
    InvalidCommission(u16),

    /// The status string is not recognized.
    #[error("invalid status {0:?}; should be one of {{pending, active, unbonding, unbonded, any}}")]
    InvalidStatus(String),

    /// No delegation is backed by the given staking transaction.
    #[error("no delegation with staking transaction {0}")]
    DelegationNotFound(Txid),
}

impl DelegationError {
    /// Returns the [`ErrorKind`] of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingProofOfPossession
            | Self::EmptyFinalityProviderSet
            | Self::DuplicateFinalityProvider(_)
            | Self::InvalidHeightRange { .. }
            | Self::AdaptorSigCountMismatch { .. }
            | Self::InvalidCommission(_)
            | Self::InvalidStatus(_)
            | Self::DelegationNotFound(_) => ErrorKind::MalformedInput,

            Self::StakingOutputIndexOutOfRange(_) => ErrorKind::StructuralMismatch,

            Self::TotalSatMismatch { .. } => ErrorKind::EconomicConstraintViolated,

            Self::InvalidProofOfPossession(_) => ErrorKind::CryptoVerificationFailed,

            Self::DuplicatedCovenantSig(_) => ErrorKind::DuplicateSignature,

            Self::StakingTx(e) => e.kind(),
        }
    }
}

/// Result type alias for delegations.
pub type DelegationResult<T> = Result<T, DelegationError>;
