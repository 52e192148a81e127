//! Read-only views over delegations, as served to host chain clients.
//!
//! Storage and pagination belong to the host; these helpers accept any iterator of delegations and
//! read the tip height and the finalization timeout through [`BtcLightClient`] and
//! [`CheckpointParams`].

use bitcoin::{Txid, XOnlyPublicKey};
use btc_staking_params::prelude::StakingParams;
use btc_staking_primitives::types::{BitcoinBlockHeight, VotingPower};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    delegation::BtcDelegation,
    errors::{DelegationError, DelegationResult},
    finality_provider::{filter_top_n, FinalityProvider, FinalityProviderWithMeta},
    status::{BtcDelegationStatus, DelegationStatusFilter},
};

/// The view of the bitcoin chain trusted by the host.
pub trait BtcLightClient {
    /// Returns the height of the current bitcoin tip.
    fn tip_height(&self) -> BitcoinBlockHeight;
}

/// The parameters of bitcoin checkpointing on the host.
pub trait CheckpointParams {
    /// Returns the number of blocks after which a bitcoin checkpoint is final (`w`).
    fn finalization_timeout(&self) -> u64;
}

impl CheckpointParams for StakingParams {
    fn finalization_timeout(&self) -> u64 {
        self.finalization_timeout
    }
}

/// A delegation together with its status at the time of the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtcDelegationResponse {
    /// The delegation.
    pub delegation: BtcDelegation,

    /// The status at the tip height.
    pub status: BtcDelegationStatus,
}

/// Returns the delegations whose status at `tip_height` matches `filter`, with their status.
pub fn delegations_with_status<'a>(
    delegations: impl IntoIterator<Item = &'a BtcDelegation>,
    filter: DelegationStatusFilter,
    tip_height: BitcoinBlockHeight,
    w: u64,
    covenant_quorum: u32,
) -> Vec<BtcDelegationResponse> {
    delegations
        .into_iter()
        .filter_map(|delegation| {
            let status = delegation.status(tip_height, w, covenant_quorum);

            filter.matches(status).then(|| BtcDelegationResponse {
                delegation: delegation.clone(),
                status,
            })
        })
        .collect()
}

/// Returns the total voting power of `fp_btc_pk` at `height`: the sum of the stake of every active
/// delegation to it.
pub fn provider_voting_power<'a>(
    delegations: impl IntoIterator<Item = &'a BtcDelegation>,
    fp_btc_pk: &XOnlyPublicKey,
    height: BitcoinBlockHeight,
    w: u64,
    covenant_quorum: u32,
) -> VotingPower {
    delegations
        .into_iter()
        .filter(|delegation| delegation.fp_btc_pk_list.contains(fp_btc_pk))
        .map(|delegation| delegation.voting_power(height, w, covenant_quorum))
        .fold(0, VotingPower::saturating_add)
}

/// Answers delegation queries at the current bitcoin tip.
#[derive(Debug, Clone, Copy)]
pub struct DelegationQuerier<'a, L, C> {
    light_client: &'a L,
    checkpoint_params: &'a C,
    covenant_quorum: u32,
}

impl<'a, L, C> DelegationQuerier<'a, L, C>
where
    L: BtcLightClient,
    C: CheckpointParams,
{
    /// Creates a querier over the given collaborators.
    pub const fn new(light_client: &'a L, checkpoint_params: &'a C, covenant_quorum: u32) -> Self {
        Self {
            light_client,
            checkpoint_params,
            covenant_quorum,
        }
    }

    /// Returns the delegations whose current status matches `filter`.
    pub fn delegations<'d>(
        &self,
        delegations: impl IntoIterator<Item = &'d BtcDelegation>,
        filter: DelegationStatusFilter,
    ) -> Vec<BtcDelegationResponse> {
        let tip_height = self.light_client.tip_height();
        let w = self.checkpoint_params.finalization_timeout();
        trace!(%tip_height, %w, %filter, "querying delegations");

        delegations_with_status(delegations, filter, tip_height, w, self.covenant_quorum)
    }

    /// Returns the delegation backed by the staking transaction `staking_txid`.
    ///
    /// # Errors
    ///
    /// If no delegation matches. Delegations whose staking transaction does not decode are
    /// skipped.
    pub fn delegation<'d>(
        &self,
        delegations: impl IntoIterator<Item = &'d BtcDelegation>,
        staking_txid: &Txid,
    ) -> DelegationResult<BtcDelegationResponse> {
        let delegation = delegations
            .into_iter()
            .find(|delegation| {
                delegation
                    .staking_txid()
                    .is_ok_and(|txid| txid == *staking_txid)
            })
            .ok_or(DelegationError::DelegationNotFound(*staking_txid))?;

        let status = delegation.status(
            self.light_client.tip_height(),
            self.checkpoint_params.finalization_timeout(),
            self.covenant_quorum,
        );

        Ok(BtcDelegationResponse {
            delegation: delegation.clone(),
            status,
        })
    }

    /// Returns the current voting power of `fp_btc_pk` and the height it refers to.
    pub fn provider_current_power<'d>(
        &self,
        delegations: impl IntoIterator<Item = &'d BtcDelegation>,
        fp_btc_pk: &XOnlyPublicKey,
    ) -> (BitcoinBlockHeight, VotingPower) {
        let tip_height = self.light_client.tip_height();
        let power = provider_voting_power(
            delegations,
            fp_btc_pk,
            tip_height,
            self.checkpoint_params.finalization_timeout(),
            self.covenant_quorum,
        );

        (tip_height, power)
    }

    /// Returns at most `max_active` unslashed providers with positive voting power at the tip,
    /// ordered by decreasing voting power.
    pub fn active_finality_providers<'p>(
        &self,
        providers: impl IntoIterator<Item = &'p FinalityProvider>,
        delegations: &[BtcDelegation],
        max_active: usize,
    ) -> Vec<FinalityProviderWithMeta> {
        let tip_height = self.light_client.tip_height();
        let w = self.checkpoint_params.finalization_timeout();

        let candidates = providers
            .into_iter()
            .filter(|provider| !provider.is_slashed())
            .map(|provider| {
                let power = provider_voting_power(
                    delegations,
                    &provider.btc_pk,
                    tip_height,
                    w,
                    self.covenant_quorum,
                );

                FinalityProviderWithMeta::new(provider, tip_height, power)
            })
            .filter(|provider| provider.voting_power > 0)
            .collect();

        filter_top_n(candidates, max_active)
    }
}

#[cfg(test)]
mod tests {
    use btc_staking_test_utils::prelude::{generate_keypair, generate_txid};

    use super::*;
    use crate::{
        pop::ProofOfPossession,
        testing::{adaptor_sigs, covenant_pks, delegation},
    };

    const QUORUM: u32 = 2;
    const W: u64 = 10;

    struct Tip(BitcoinBlockHeight);

    impl BtcLightClient for Tip {
        fn tip_height(&self) -> BitcoinBlockHeight {
            self.0
        }
    }

    struct Timeout(u64);

    impl CheckpointParams for Timeout {
        fn finalization_timeout(&self) -> u64 {
            self.0
        }
    }

    fn with_quorum(mut delegation: BtcDelegation) -> BtcDelegation {
        for pk in covenant_pks(QUORUM) {
            delegation
                .add_covenant_sigs(pk, adaptor_sigs(delegation.fp_btc_pk_list.len()), QUORUM)
                .unwrap();
        }

        delegation
    }

    fn provider(btc_pk: XOnlyPublicKey) -> FinalityProvider {
        let host = generate_keypair();
        let btc = generate_keypair();

        FinalityProvider {
            host_pk: host.public_key(),
            btc_pk,
            pop: Some(ProofOfPossession::new(&host.public_key(), &btc.secret_key())),
            commission_bps: 0,
            slashed_host_height: 0,
            slashed_btc_height: 0,
        }
    }

    #[test]
    fn filters_by_status() {
        let active = with_quorum(delegation(100, 200, 1, 3));
        let pending = delegation(100, 200, 1, 3);
        let expired = with_quorum(delegation(10, 50, 1, 3));
        let all = [active.clone(), pending.clone(), expired.clone()];

        let querier = DelegationQuerier::new(&Tip(150), &Timeout(W), QUORUM);

        let found = querier.delegations(&all, BtcDelegationStatus::Active.into());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].delegation, active);
        assert_eq!(found[0].status, BtcDelegationStatus::Active);

        let found = querier.delegations(&all, BtcDelegationStatus::Unbonded.into());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].delegation, expired);

        assert_eq!(
            querier.delegations(&all, DelegationStatusFilter::Any).len(),
            3
        );
    }

    #[test]
    fn finds_delegation_by_staking_txid() {
        let target = with_quorum(delegation(100, 200, 1, 3));
        let all = [delegation(100, 200, 1, 3), target.clone()];
        let querier = DelegationQuerier::new(&Tip(195), &Timeout(W), QUORUM);

        let found = querier
            .delegation(&all, &target.staking_txid().unwrap())
            .unwrap();
        assert_eq!(found.delegation, target);
        assert_eq!(found.status, BtcDelegationStatus::Unbonded);

        assert!(matches!(
            querier.delegation(&all, &generate_txid()),
            Err(DelegationError::DelegationNotFound(_))
        ));
    }

    #[test]
    fn voting_power_sums_active_delegations() {
        let first = with_quorum(delegation(100, 200, 1, 3));
        let fp = first.fp_btc_pk_list[0];

        let mut second = with_quorum(delegation(120, 300, 1, 3));
        second.fp_btc_pk_list = vec![fp];
        let mut not_started = with_quorum(delegation(500, 600, 1, 3));
        not_started.fp_btc_pk_list = vec![fp];
        let other_fp = with_quorum(delegation(100, 200, 1, 3));

        let all = vec![first.clone(), second.clone(), not_started, other_fp.clone()];

        assert_eq!(
            provider_voting_power(&all, &fp, 150, W, QUORUM),
            first.total_sat + second.total_sat
        );
        assert_eq!(
            provider_voting_power(&all, &fp, 195, W, QUORUM),
            second.total_sat
        );

        let querier = DelegationQuerier::new(&Tip(150), &Timeout(W), QUORUM);
        assert_eq!(
            querier.provider_current_power(&all, &fp),
            (150, first.total_sat + second.total_sat)
        );

        let mut slashed = provider(other_fp.fp_btc_pk_list[0]);
        slashed.slashed_host_height = 3;
        let providers = [
            provider(generate_keypair().x_only_public_key().0),
            slashed,
            provider(fp),
        ];
        let active = querier.active_finality_providers(&providers, &all, 10);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].btc_pk, fp);
        assert_eq!(active[0].height, 150);
        assert_eq!(active[0].voting_power, first.total_sat + second.total_sat);

        assert!(querier
            .active_finality_providers(&providers, &all, 0)
            .is_empty());
    }
}
