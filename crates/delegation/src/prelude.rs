//! Re-exports of the most commonly used delegation types.

pub use crate::{
    delegation::{BtcDelegation, SigAddition},
    errors::{DelegationError, DelegationResult},
    finality_provider::{
        filter_top_n, FinalityProvider, FinalityProviderWithMeta, MAX_COMMISSION_BPS,
    },
    pop::ProofOfPossession,
    query::{
        delegations_with_status, provider_voting_power, BtcDelegationResponse, BtcLightClient,
        CheckpointParams, DelegationQuerier,
    },
    status::{BtcDelegationStatus, DelegationStatusFilter},
    types::{CovenantAdaptorSignatures, SignatureInfo},
    undelegation::BtcUndelegation,
};
