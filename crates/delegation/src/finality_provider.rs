//! Finality providers and the selection of the active set.

use bitcoin::XOnlyPublicKey;
use btc_staking_primitives::types::{BitcoinBlockHeight, VotingPower};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{DelegationError, DelegationResult},
    pop::ProofOfPossession,
};

/// Maximum commission in basis points (100%).
pub const MAX_COMMISSION_BPS: u16 = 10_000;

/// A finality provider as registered on the host chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalityProvider {
    /// The provider's key on the host chain.
    pub host_pk: PublicKey,

    /// The provider's bitcoin key, which is also the encryption key of the covenant adaptor
    /// signatures.
    pub btc_pk: XOnlyPublicKey,

    /// Proof that the owner of [`Self::host_pk`] controls [`Self::btc_pk`].
    pub pop: Option<ProofOfPossession>,

    /// The share of the rewards kept by the provider, in basis points.
    pub commission_bps: u16,

    /// The host chain height at which the provider was slashed, or zero.
    #[serde(default)]
    pub slashed_host_height: u64,

    /// The bitcoin height at which the provider was slashed, or zero.
    #[serde(default)]
    pub slashed_btc_height: BitcoinBlockHeight,
}

impl FinalityProvider {
    /// Returns `true` if the provider has been slashed.
    pub const fn is_slashed(&self) -> bool {
        self.slashed_host_height > 0
    }

    /// Performs the stateless checks on the provider.
    ///
    /// # Errors
    ///
    /// If the proof of possession is missing or invalid or the commission exceeds 100%.
    pub fn validate_basic(&self) -> DelegationResult<()> {
        let pop = self
            .pop
            .as_ref()
            .ok_or(DelegationError::MissingProofOfPossession)?;
        pop.verify(&self.host_pk, &self.btc_pk)
            .map_err(DelegationError::InvalidProofOfPossession)?;

        if self.commission_bps > MAX_COMMISSION_BPS {
            return Err(DelegationError::InvalidCommission(self.commission_bps));
        }

        Ok(())
    }
}

/// The voting power of a finality provider at a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinalityProviderWithMeta {
    /// The provider's bitcoin key.
    pub btc_pk: XOnlyPublicKey,

    /// The bitcoin height the voting power refers to.
    pub height: BitcoinBlockHeight,

    /// The total stake of the provider's active delegations.
    pub voting_power: VotingPower,

    /// The host chain height at which the provider was slashed, or zero.
    pub slashed_host_height: u64,

    /// The bitcoin height at which the provider was slashed, or zero.
    pub slashed_btc_height: BitcoinBlockHeight,
}

impl FinalityProviderWithMeta {
    /// Creates the view of `provider` with `voting_power` at `height`.
    pub const fn new(
        provider: &FinalityProvider,
        height: BitcoinBlockHeight,
        voting_power: VotingPower,
    ) -> Self {
        Self {
            btc_pk: provider.btc_pk,
            height,
            voting_power,
            slashed_host_height: provider.slashed_host_height,
            slashed_btc_height: provider.slashed_btc_height,
        }
    }

    /// Returns `true` if the provider has been slashed.
    pub const fn is_slashed(&self) -> bool {
        self.slashed_host_height > 0
    }
}

/// Keeps the `n` providers with the highest voting power.
///
/// The sort is stable: providers with equal voting power keep their input order, so every node
/// selects the same set from the same input.
pub fn filter_top_n(
    mut providers: Vec<FinalityProviderWithMeta>,
    n: usize,
) -> Vec<FinalityProviderWithMeta> {
    providers.sort_by(|a, b| b.voting_power.cmp(&a.voting_power));
    providers.truncate(n);

    providers
}

#[cfg(test)]
mod tests {
    use btc_staking_test_utils::prelude::{generate_keypair, generate_xonly_pubkey};
    use proptest::prelude::*;

    use super::*;

    fn with_power(voting_power: VotingPower) -> FinalityProviderWithMeta {
        FinalityProviderWithMeta {
            btc_pk: generate_xonly_pubkey(),
            height: 100,
            voting_power,
            slashed_host_height: 0,
            slashed_btc_height: 0,
        }
    }

    #[test]
    fn top_n_is_stable() {
        let providers: Vec<_> = [5, 10, 5, 7, 10, 1].into_iter().map(with_power).collect();

        let top = filter_top_n(providers.clone(), 4);
        assert_eq!(
            top,
            vec![providers[1], providers[4], providers[3], providers[0]]
        );

        assert_eq!(filter_top_n(providers.clone(), 0), vec![]);
        assert_eq!(filter_top_n(providers.clone(), 100).len(), providers.len());
    }

    #[test]
    fn provider_validation() {
        let host = generate_keypair();
        let btc = generate_keypair();

        let mut provider = FinalityProvider {
            host_pk: host.public_key(),
            btc_pk: btc.x_only_public_key().0,
            pop: Some(ProofOfPossession::new(&host.public_key(), &btc.secret_key())),
            commission_bps: 500,
            slashed_host_height: 0,
            slashed_btc_height: 0,
        };
        provider.validate_basic().unwrap();
        assert!(!provider.is_slashed());

        provider.slashed_host_height = 10;
        assert!(provider.is_slashed());
        assert!(FinalityProviderWithMeta::new(&provider, 1, 0).is_slashed());

        provider.commission_bps = MAX_COMMISSION_BPS + 1;
        assert!(matches!(
            provider.validate_basic(),
            Err(DelegationError::InvalidCommission(10_001))
        ));

        provider.pop = None;
        assert!(matches!(
            provider.validate_basic(),
            Err(DelegationError::MissingProofOfPossession)
        ));
    }

    proptest! {
        #[test]
        fn top_n_keeps_highest_in_order(
            powers in prop::collection::vec(0u64..5, 0..20),
            n in 0usize..25,
        ) {
            let providers: Vec<_> = powers.iter().copied().map(with_power).collect();
            let top = filter_top_n(providers.clone(), n);

            prop_assert_eq!(top.len(), n.min(providers.len()));
            prop_assert!(top.windows(2).all(|w| w[0].voting_power >= w[1].voting_power));

            // equal powers keep their input order
            let position = |p: &FinalityProviderWithMeta| {
                providers.iter().position(|q| q.btc_pk == p.btc_pk)
            };
            for pair in top.windows(2) {
                if pair[0].voting_power == pair[1].voting_power {
                    prop_assert!(position(&pair[0]) < position(&pair[1]));
                }
            }
        }
    }
}
