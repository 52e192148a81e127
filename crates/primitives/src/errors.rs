//! Errors shared by the staking crates.

use bitcoin::sighash::TaprootError as SighashError;
use thiserror::Error;

/// Coarse classification of every error produced by the staking crates.
///
/// Callers that do not care about the exact failure can branch on this instead of matching on
/// each crate's error enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bytes or strings that cannot be decoded into the expected type.
    MalformedInput,

    /// A transaction or script that does not have the expected shape.
    StructuralMismatch,

    /// A signature or adaptor signature that does not verify.
    CryptoVerificationFailed,

    /// An amount, fee or rate outside of what the protocol allows.
    EconomicConstraintViolated,

    /// A signature that has already been recorded.
    DuplicateSignature,
}

/// Errors that can occur while creating or checking (adaptor) signatures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The encoding of a key or signature is invalid.
    #[error("malformed {0}")]
    Malformed(&'static str),

    /// The signature does not verify against the given key and message.
    #[error("signature verification failed")]
    Verification,

    /// The plain signature was not produced from the given adaptor signature.
    #[error("signature does not match the adaptor signature")]
    Mismatch,

    /// A scalar or point operation produced zero or the point at infinity.
    #[error("curve arithmetic failed: {0}")]
    Arithmetic(#[from] secp256k1::Error),
}

impl SignatureError {
    /// Returns the [`ErrorKind`] of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed(_) | Self::Arithmetic(_) => ErrorKind::MalformedInput,
            Self::Verification | Self::Mismatch => ErrorKind::CryptoVerificationFailed,
        }
    }
}

/// Errors that can occur while building taproot outputs or computing their sighashes.
#[derive(Debug, Error)]
pub enum TaprootError {
    /// No scripts were provided for a script-only spend path.
    #[error("no tapscripts provided")]
    EmptyTapscript,

    /// A leaf could not be added to the taptree.
    #[error("could not build taptree: {0}")]
    BuildFailed(#[from] bitcoin::taproot::TaprootBuilderError),

    /// The taptree has gaps and cannot be finalized.
    #[error("taptree is incomplete")]
    IncompleteTree,

    /// The script is not a leaf of the taptree.
    #[error("script is not a leaf of the taptree")]
    UnknownLeaf,

    /// The sighash could not be computed.
    #[error("could not compute sighash: {0}")]
    Sighash(#[from] SighashError),
}

impl TaprootError {
    /// Returns the [`ErrorKind`] of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Sighash(_) => ErrorKind::StructuralMismatch,
            _ => ErrorKind::MalformedInput,
        }
    }
}

/// Error while decoding a bitcoin address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address {address}: {reason}")]
pub struct AddressError {
    /// The address as given.
    pub address: String,

    /// Why decoding failed.
    pub reason: String,
}
