//! Early unbonding of a delegation.

use bitcoin::XOnlyPublicKey;
use btc_staking_primitives::adaptor::AdaptorSignature;
use btc_staking_tx::spend_tx::{SlashingTx, UnbondingTx};
use secp256k1::schnorr;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    delegation::SigAddition,
    errors::{DelegationError, DelegationResult},
    types::{CovenantAdaptorSignatures, SignatureInfo},
};

/// The request of a delegator to unbond before the staking timelock expires.
///
/// The unbonding transaction needs plain covenant signatures, while the slashing transaction of
/// the unbonding output needs adaptor signatures. A covenant member counts as signed only once it
/// appears in both collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtcUndelegation {
    /// The transaction that moves the stake into the unbonding output.
    pub unbonding_tx: UnbondingTx,

    /// The slashing transaction of the unbonding output.
    pub slashing_tx: SlashingTx,

    /// The delegator's signature over [`Self::unbonding_tx`].
    pub delegator_unbonding_sig: schnorr::Signature,

    /// The delegator's signature over [`Self::slashing_tx`].
    pub delegator_slashing_sig: schnorr::Signature,

    /// Covenant signatures over [`Self::unbonding_tx`].
    #[serde(default)]
    covenant_unbonding_sig_list: Vec<SignatureInfo>,

    /// Covenant adaptor signatures over [`Self::slashing_tx`].
    #[serde(default)]
    covenant_slashing_sigs: Vec<CovenantAdaptorSignatures>,
}

impl BtcUndelegation {
    /// Creates an undelegation without any covenant signature.
    pub const fn new(
        unbonding_tx: UnbondingTx,
        slashing_tx: SlashingTx,
        delegator_unbonding_sig: schnorr::Signature,
        delegator_slashing_sig: schnorr::Signature,
    ) -> Self {
        Self {
            unbonding_tx,
            slashing_tx,
            delegator_unbonding_sig,
            delegator_slashing_sig,
            covenant_unbonding_sig_list: Vec::new(),
            covenant_slashing_sigs: Vec::new(),
        }
    }

    /// Returns the covenant signatures over the unbonding transaction.
    pub fn covenant_unbonding_sig_list(&self) -> &[SignatureInfo] {
        &self.covenant_unbonding_sig_list
    }

    /// Returns the covenant adaptor signatures over the slashing transaction.
    pub fn covenant_slashing_sigs(&self) -> &[CovenantAdaptorSignatures] {
        &self.covenant_slashing_sigs
    }

    /// Returns `true` if at least `quorum` covenant members signed the unbonding transaction.
    pub fn has_covenant_quorum_on_unbonding(&self, quorum: u32) -> bool {
        self.covenant_unbonding_sig_list.len() >= quorum as usize
    }

    /// Returns `true` if at least `quorum` covenant members signed the slashing transaction.
    pub fn has_covenant_quorum_on_slashing(&self, quorum: u32) -> bool {
        self.covenant_slashing_sigs.len() >= quorum as usize
    }

    /// Returns `true` if both collections reached `quorum`.
    pub fn has_all_signatures(&self, quorum: u32) -> bool {
        self.has_covenant_quorum_on_unbonding(quorum) && self.has_covenant_quorum_on_slashing(quorum)
    }

    /// Returns `true` if `cov_pk` signed the unbonding transaction.
    pub fn is_signed_by_covenant_member_on_unbonding(&self, cov_pk: &XOnlyPublicKey) -> bool {
        self.covenant_unbonding_sig_list
            .iter()
            .any(|info| info.pk == *cov_pk)
    }

    /// Returns `true` if `cov_pk` signed the slashing transaction.
    pub fn is_signed_by_covenant_member_on_slashing(&self, cov_pk: &XOnlyPublicKey) -> bool {
        self.covenant_slashing_sigs
            .iter()
            .any(|sigs| sigs.cov_pk == *cov_pk)
    }

    /// Returns `true` if `cov_pk` signed both transactions.
    pub fn is_signed_by_covenant_member(&self, cov_pk: &XOnlyPublicKey) -> bool {
        self.is_signed_by_covenant_member_on_unbonding(cov_pk)
            && self.is_signed_by_covenant_member_on_slashing(cov_pk)
    }

    /// Records the signatures of a covenant member over the unbonding transaction and the slashing
    /// transaction of the unbonding output.
    ///
    /// Each collection only receives the signature if it does not already hold one from `cov_pk`,
    /// so neither ever counts a member twice.
    ///
    /// # Errors
    ///
    /// If `cov_pk` has already signed both transactions.
    pub fn add_covenant_sigs(
        &mut self,
        cov_pk: XOnlyPublicKey,
        unbonding_sig: schnorr::Signature,
        slashing_sigs: Vec<AdaptorSignature>,
        quorum: u32,
    ) -> DelegationResult<SigAddition> {
        if self.has_all_signatures(quorum) {
            trace!(%cov_pk, "covenant quorum already reached on unbonding, ignoring signatures");
            return Ok(SigAddition::QuorumAlreadyReached);
        }

        if self.is_signed_by_covenant_member(&cov_pk) {
            return Err(DelegationError::DuplicatedCovenantSig(cov_pk));
        }

        if !self.is_signed_by_covenant_member_on_unbonding(&cov_pk) {
            self.covenant_unbonding_sig_list
                .push(SignatureInfo::new(cov_pk, unbonding_sig));
        }

        if !self.is_signed_by_covenant_member_on_slashing(&cov_pk) {
            self.covenant_slashing_sigs.push(CovenantAdaptorSignatures {
                cov_pk,
                adaptor_sigs: slashing_sigs,
            });
        }

        debug!(
            %cov_pk,
            num_unbonding_sigs = self.covenant_unbonding_sig_list.len(),
            num_slashing_sigs = self.covenant_slashing_sigs.len(),
            %quorum,
            "added covenant signatures on unbonding"
        );

        Ok(SigAddition::Added)
    }
}

#[cfg(test)]
mod tests {
    use btc_staking_test_utils::prelude::{generate_signature, generate_xonly_pubkey};

    use super::*;
    use crate::testing::{adaptor_sigs, undelegation};

    /// Reloads `undel` as a stored record in which `cov_pk` only signed the unbonding transaction.
    fn without_slashing_sig(undel: &BtcUndelegation, cov_pk: &XOnlyPublicKey) -> BtcUndelegation {
        let mut json = serde_json::to_value(undel).unwrap();
        json["covenant_slashing_sigs"]
            .as_array_mut()
            .unwrap()
            .retain(|sigs| sigs["cov_pk"] != cov_pk.to_string());

        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn partial_member_gets_only_the_missing_half() {
        let mut undel = undelegation();
        let cov_pk = generate_xonly_pubkey();
        let unbonding_sig = generate_signature();

        undel
            .add_covenant_sigs(cov_pk, unbonding_sig, adaptor_sigs(1), 2)
            .unwrap();
        let mut undel = without_slashing_sig(&undel, &cov_pk);
        assert!(undel.is_signed_by_covenant_member_on_unbonding(&cov_pk));
        assert!(!undel.is_signed_by_covenant_member_on_slashing(&cov_pk));
        assert!(!undel.is_signed_by_covenant_member(&cov_pk));

        let slashing_sigs = adaptor_sigs(1);
        assert_eq!(
            undel
                .add_covenant_sigs(cov_pk, generate_signature(), slashing_sigs.clone(), 2)
                .unwrap(),
            SigAddition::Added
        );
        assert!(undel.is_signed_by_covenant_member(&cov_pk));
        assert_eq!(
            undel.covenant_unbonding_sig_list(),
            &[SignatureInfo::new(cov_pk, unbonding_sig)]
        );
        assert_eq!(
            undel.covenant_slashing_sigs(),
            &[CovenantAdaptorSignatures {
                cov_pk,
                adaptor_sigs: slashing_sigs,
            }]
        );

        assert!(matches!(
            undel.add_covenant_sigs(cov_pk, generate_signature(), adaptor_sigs(1), 2),
            Err(DelegationError::DuplicatedCovenantSig(_))
        ));
        assert_eq!(undel.covenant_unbonding_sig_list().len(), 1);
        assert_eq!(undel.covenant_slashing_sigs().len(), 1);
    }

    #[test]
    fn quorum_requires_both_collections() {
        let mut undel = undelegation();

        for _ in 0..2 {
            undel
                .add_covenant_sigs(
                    generate_xonly_pubkey(),
                    generate_signature(),
                    adaptor_sigs(1),
                    2,
                )
                .unwrap();
        }
        assert!(undel.has_all_signatures(2));
        assert!(!undel.has_all_signatures(3));

        assert_eq!(
            undel
                .add_covenant_sigs(
                    generate_xonly_pubkey(),
                    generate_signature(),
                    adaptor_sigs(1),
                    2
                )
                .unwrap(),
            SigAddition::QuorumAlreadyReached
        );
        assert_eq!(undel.covenant_unbonding_sig_list().len(), 2);
        assert_eq!(undel.covenant_slashing_sigs().len(), 2);

        // a third member that only signed the unbonding transaction is not enough for quorum 3
        let third = generate_xonly_pubkey();
        undel
            .add_covenant_sigs(third, generate_signature(), adaptor_sigs(1), 3)
            .unwrap();
        let undel = without_slashing_sig(&undel, &third);
        assert!(undel.has_covenant_quorum_on_unbonding(3));
        assert!(!undel.has_covenant_quorum_on_slashing(3));
        assert!(!undel.has_all_signatures(3));
    }
}
