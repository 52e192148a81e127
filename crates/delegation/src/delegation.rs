//! A bitcoin delegation as recorded on the host chain.

use bitcoin::{consensus, Amount, Transaction, Txid, XOnlyPublicKey};
use btc_staking_primitives::{
    adaptor::AdaptorSignature,
    types::{BitcoinBlockHeight, VotingPower},
};
use btc_staking_tx::spend_tx::SlashingTx;
use secp256k1::{schnorr, PublicKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    errors::{DelegationError, DelegationResult},
    pop::ProofOfPossession,
    status::BtcDelegationStatus,
    types::{first_duplicate, CovenantAdaptorSignatures},
    undelegation::BtcUndelegation,
};

/// The outcome of a successful call to `add_covenant_sigs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigAddition {
    /// The signatures were recorded.
    Added,

    /// The quorum was already reached; the signatures were ignored.
    QuorumAlreadyReached,
}

/// A delegation of a bitcoin stake to one or more finality providers.
///
/// Only the covenant signatures, through [`Self::add_covenant_sigs`], and
/// [`Self::btc_undelegation`] change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtcDelegation {
    /// The delegator's key on the host chain.
    pub host_pk: PublicKey,

    /// The delegator's bitcoin key.
    pub btc_pk: XOnlyPublicKey,

    /// Proof that the owner of [`Self::host_pk`] controls [`Self::btc_pk`].
    pub pop: Option<ProofOfPossession>,

    /// The finality providers the stake is delegated to.
    pub fp_btc_pk_list: Vec<XOnlyPublicKey>,

    /// The consensus-encoded staking transaction.
    #[serde(with = "hex::serde")]
    pub staking_tx: Vec<u8>,

    /// The index of the staking output in [`Self::staking_tx`].
    pub staking_output_idx: u32,

    /// The bitcoin height at which the staking transaction was included.
    pub start_height: BitcoinBlockHeight,

    /// The bitcoin height at which the staking timelock expires.
    pub end_height: BitcoinBlockHeight,

    /// The staked amount in satoshis.
    pub total_sat: u64,

    /// The slashing transaction of the staking output.
    pub slashing_tx: SlashingTx,

    /// The delegator's signature over [`Self::slashing_tx`].
    pub delegator_sig: schnorr::Signature,

    /// The covenant members' adaptor signatures over [`Self::slashing_tx`], one entry per member.
    #[serde(default)]
    covenant_sigs: Vec<CovenantAdaptorSignatures>,

    /// Set once the delegator asks to unbond early.
    #[serde(default)]
    pub btc_undelegation: Option<BtcUndelegation>,
}

impl BtcDelegation {
    /// Creates a delegation without any covenant signature or undelegation.
    #[expect(clippy::too_many_arguments)]
    pub fn new(
        host_pk: PublicKey,
        btc_pk: XOnlyPublicKey,
        pop: Option<ProofOfPossession>,
        fp_btc_pk_list: Vec<XOnlyPublicKey>,
        staking_tx: Vec<u8>,
        staking_output_idx: u32,
        start_height: BitcoinBlockHeight,
        end_height: BitcoinBlockHeight,
        total_sat: u64,
        slashing_tx: SlashingTx,
        delegator_sig: schnorr::Signature,
    ) -> Self {
        Self {
            host_pk,
            btc_pk,
            pop,
            fp_btc_pk_list,
            staking_tx,
            staking_output_idx,
            start_height,
            end_height,
            total_sat,
            slashing_tx,
            delegator_sig,
            covenant_sigs: Vec::new(),
            btc_undelegation: None,
        }
    }

    /// Returns the covenant adaptor signatures collected so far.
    pub fn covenant_sigs(&self) -> &[CovenantAdaptorSignatures] {
        &self.covenant_sigs
    }

    /// Performs the stateless checks on the delegation.
    ///
    /// # Errors
    ///
    /// If the proof of possession is missing or invalid, the finality provider list is empty or
    /// contains a duplicate, the height range is empty, the staking or slashing transaction does
    /// not decode, or the staking output does not hold [`Self::total_sat`].
    pub fn validate_basic(&self) -> DelegationResult<()> {
        let pop = self
            .pop
            .as_ref()
            .ok_or(DelegationError::MissingProofOfPossession)?;
        pop.verify(&self.host_pk, &self.btc_pk)
            .map_err(DelegationError::InvalidProofOfPossession)?;

        if self.fp_btc_pk_list.is_empty() {
            return Err(DelegationError::EmptyFinalityProviderSet);
        }

        if let Some(dup) = first_duplicate(&self.fp_btc_pk_list) {
            return Err(DelegationError::DuplicateFinalityProvider(dup));
        }

        if self.start_height >= self.end_height {
            return Err(DelegationError::InvalidHeightRange {
                start: self.start_height,
                end: self.end_height,
            });
        }

        let staking_tx = self.staking_tx()?;
        let staking_output = staking_tx
            .output
            .get(self.staking_output_idx as usize)
            .ok_or(DelegationError::StakingOutputIndexOutOfRange(
                self.staking_output_idx,
            ))?;
        if staking_output.value.to_sat() != self.total_sat {
            return Err(DelegationError::TotalSatMismatch {
                recorded: Amount::from_sat(self.total_sat),
                actual: staking_output.value,
            });
        }

        self.slashing_tx.to_tx()?;

        Ok(())
    }

    /// Decodes the staking transaction.
    pub fn staking_tx(&self) -> DelegationResult<Transaction> {
        consensus::deserialize(&self.staking_tx)
            .map_err(|e| DelegationError::StakingTx(e.into()))
    }

    /// Returns the txid of the staking transaction, which identifies the delegation.
    pub fn staking_txid(&self) -> DelegationResult<Txid> {
        Ok(self.staking_tx()?.compute_txid())
    }

    /// Returns `true` if at least `quorum` covenant members have signed.
    pub fn has_covenant_quorum(&self, quorum: u32) -> bool {
        self.covenant_sigs.len() >= quorum as usize
    }

    /// Returns `true` if `cov_pk` has already signed.
    pub fn is_signed_by_covenant_member(&self, cov_pk: &XOnlyPublicKey) -> bool {
        self.covenant_sigs.iter().any(|sigs| sigs.cov_pk == *cov_pk)
    }

    /// Records the adaptor signatures of a covenant member over the slashing transaction.
    ///
    /// The signatures are not verified here.
    ///
    /// # Errors
    ///
    /// If `cov_pk` has already signed or did not provide one signature per finality provider.
    pub fn add_covenant_sigs(
        &mut self,
        cov_pk: XOnlyPublicKey,
        adaptor_sigs: Vec<AdaptorSignature>,
        quorum: u32,
    ) -> DelegationResult<SigAddition> {
        if self.has_covenant_quorum(quorum) {
            trace!(%cov_pk, "covenant quorum already reached, ignoring signatures");
            return Ok(SigAddition::QuorumAlreadyReached);
        }

        if self.is_signed_by_covenant_member(&cov_pk) {
            return Err(DelegationError::DuplicatedCovenantSig(cov_pk));
        }

        if adaptor_sigs.len() != self.fp_btc_pk_list.len() {
            return Err(DelegationError::AdaptorSigCountMismatch {
                expected: self.fp_btc_pk_list.len(),
                actual: adaptor_sigs.len(),
            });
        }

        self.covenant_sigs.push(CovenantAdaptorSignatures {
            cov_pk,
            adaptor_sigs,
        });
        debug!(%cov_pk, num_sigs = self.covenant_sigs.len(), %quorum, "added covenant signatures");

        Ok(SigAddition::Added)
    }

    /// Returns the status of the delegation at `btc_height`.
    ///
    /// `w` is the finalization timeout: a delegation stops being active `w` blocks before its
    /// timelock expires so that its slashing transaction can still be confirmed. A delegation whose
    /// start height is still in the future is reported as [`BtcDelegationStatus::Unbonded`].
    pub fn status(
        &self,
        btc_height: BitcoinBlockHeight,
        w: u64,
        covenant_quorum: u32,
    ) -> BtcDelegationStatus {
        if let Some(undelegation) = &self.btc_undelegation {
            return match undelegation.has_all_signatures(covenant_quorum) {
                true => BtcDelegationStatus::Unbonded,
                false => BtcDelegationStatus::Unbonding,
            };
        }

        let in_window = self.start_height <= btc_height
            && btc_height
                .checked_add(w)
                .is_some_and(|height| height <= self.end_height);

        match (in_window, self.has_covenant_quorum(covenant_quorum)) {
            (true, true) => BtcDelegationStatus::Active,
            (true, false) => BtcDelegationStatus::Pending,
            (false, _) => BtcDelegationStatus::Unbonded,
        }
    }

    /// Returns the voting power of the delegation at `btc_height`: the staked amount if it is
    /// active, zero otherwise.
    pub fn voting_power(
        &self,
        btc_height: BitcoinBlockHeight,
        w: u64,
        covenant_quorum: u32,
    ) -> VotingPower {
        match self.status(btc_height, w, covenant_quorum) {
            BtcDelegationStatus::Active => self.total_sat,
            _ => 0,
        }
    }
}
