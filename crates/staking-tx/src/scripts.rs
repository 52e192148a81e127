//! Leaf scripts of staking and unbonding outputs.
//!
//! * timelock: `<staker> OP_CHECKSIGVERIFY <lock_time> OP_CHECKSEQUENCEVERIFY`
//! * unbonding: `<staker> OP_CHECKSIGVERIFY <covenant multisig>`
//! * slashing: `<staker> OP_CHECKSIGVERIFY <finality provider> OP_CHECKSIGVERIFY <covenant
//!   multisig>`
//!
//! Multisig keys are always sorted by their x-only encoding so that the scripts do not depend on
//! the order in which the keys are supplied.

use std::collections::BTreeSet;

use bitcoin::{
    opcodes::all::{
        OP_CHECKSIG, OP_CHECKSIGADD, OP_CHECKSIGVERIFY, OP_CSV, OP_NUMEQUAL, OP_NUMEQUALVERIFY,
    },
    script::Builder,
    ScriptBuf, XOnlyPublicKey,
};

use crate::errors::{StakingTxError, StakingTxResult};

/// The leaf scripts committed in a staking output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StakingScripts {
    /// Lets the staker withdraw after the timelock expires.
    pub timelock_script: ScriptBuf,

    /// Lets the staker withdraw early with the covenant committee's approval.
    pub unbonding_script: ScriptBuf,

    /// Lets the covenant committee slash the stake once the finality provider's key is known.
    pub slashing_script: ScriptBuf,
}

impl StakingScripts {
    /// Builds the leaf scripts after checking the keys, the quorum and the timelock.
    ///
    /// # Errors
    ///
    /// If there is no finality provider or covenant key, if any key appears twice across the
    /// staker, finality provider and covenant sets, if the quorum is not in `1..=covenants`, or if
    /// the timelock is zero.
    pub fn new(
        staker_pk: &XOnlyPublicKey,
        finality_provider_pks: &[XOnlyPublicKey],
        covenant_pks: &[XOnlyPublicKey],
        covenant_quorum: u32,
        lock_time: u16,
    ) -> StakingTxResult<Self> {
        validate_keys(
            staker_pk,
            finality_provider_pks,
            covenant_pks,
            covenant_quorum,
        )?;

        if lock_time == 0 {
            return Err(StakingTxError::ZeroStakingTime);
        }

        Ok(Self {
            timelock_script: timelock_script(staker_pk, lock_time),
            unbonding_script: unbonding_script(staker_pk, covenant_pks, covenant_quorum),
            slashing_script: slashing_script(
                staker_pk,
                finality_provider_pks,
                covenant_pks,
                covenant_quorum,
            ),
        })
    }

    /// Returns the leaves in the order they are committed in the taptree.
    pub fn leaf_scripts(&self) -> [ScriptBuf; 3] {
        [
            self.timelock_script.clone(),
            self.unbonding_script.clone(),
            self.slashing_script.clone(),
        ]
    }
}

/// Checks the key sets and the quorum shared by staking and unbonding outputs.
pub(crate) fn validate_keys(
    staker_pk: &XOnlyPublicKey,
    finality_provider_pks: &[XOnlyPublicKey],
    covenant_pks: &[XOnlyPublicKey],
    covenant_quorum: u32,
) -> StakingTxResult<()> {
    if finality_provider_pks.is_empty() {
        return Err(StakingTxError::EmptyFinalityProviderSet);
    }

    if covenant_pks.is_empty() {
        return Err(StakingTxError::EmptyCovenantSet);
    }

    if covenant_quorum == 0 || covenant_quorum as usize > covenant_pks.len() {
        return Err(StakingTxError::InvalidCovenantQuorum {
            quorum: covenant_quorum,
            num_keys: covenant_pks.len(),
        });
    }

    let mut seen = BTreeSet::new();
    std::iter::once(staker_pk)
        .chain(finality_provider_pks)
        .chain(covenant_pks)
        .try_for_each(|pk| match seen.insert(pk.serialize()) {
            true => Ok(()),
            false => Err(StakingTxError::DuplicateKey(*pk)),
        })
}

/// `<staker> OP_CHECKSIGVERIFY <lock_time> OP_CHECKSEQUENCEVERIFY`
pub fn timelock_script(staker_pk: &XOnlyPublicKey, lock_time: u16) -> ScriptBuf {
    Builder::new()
        .push_x_only_key(staker_pk)
        .push_opcode(OP_CHECKSIGVERIFY)
        .push_int(lock_time as i64)
        .push_opcode(OP_CSV)
        .into_script()
}

/// `<staker> OP_CHECKSIGVERIFY <covenant multisig>`
pub fn unbonding_script(
    staker_pk: &XOnlyPublicKey,
    covenant_pks: &[XOnlyPublicKey],
    covenant_quorum: u32,
) -> ScriptBuf {
    let builder = Builder::new()
        .push_x_only_key(staker_pk)
        .push_opcode(OP_CHECKSIGVERIFY);

    push_multisig(builder, covenant_pks, covenant_quorum, false).into_script()
}

/// `<staker> OP_CHECKSIGVERIFY <finality provider 1-of-n> <covenant multisig>`
///
/// With a single finality provider the middle part is `<fp> OP_CHECKSIGVERIFY`.
pub fn slashing_script(
    staker_pk: &XOnlyPublicKey,
    finality_provider_pks: &[XOnlyPublicKey],
    covenant_pks: &[XOnlyPublicKey],
    covenant_quorum: u32,
) -> ScriptBuf {
    let builder = Builder::new()
        .push_x_only_key(staker_pk)
        .push_opcode(OP_CHECKSIGVERIFY);
    let builder = push_multisig(builder, finality_provider_pks, 1, true);

    push_multisig(builder, covenant_pks, covenant_quorum, false).into_script()
}

/// Appends a `threshold`-of-n multisig over the sorted `pks`.
///
/// A single key collapses to `<pk> OP_CHECKSIG[VERIFY]`, otherwise the script is
/// `<pk_1> OP_CHECKSIG <pk_2> OP_CHECKSIGADD ... <pk_n> OP_CHECKSIGADD <threshold>
/// OP_NUMEQUAL[VERIFY]`.
fn push_multisig(
    mut builder: Builder,
    pks: &[XOnlyPublicKey],
    threshold: u32,
    verify: bool,
) -> Builder {
    if let [pk] = pks {
        let opcode = if verify { OP_CHECKSIGVERIFY } else { OP_CHECKSIG };

        return builder.push_x_only_key(pk).push_opcode(opcode);
    }

    let mut sorted = pks.to_vec();
    sorted.sort_by_key(|pk| pk.serialize());

    for (i, pk) in sorted.iter().enumerate() {
        let opcode = if i == 0 { OP_CHECKSIG } else { OP_CHECKSIGADD };
        builder = builder.push_x_only_key(pk).push_opcode(opcode);
    }

    let opcode = if verify { OP_NUMEQUALVERIFY } else { OP_NUMEQUAL };
    builder.push_int(threshold as i64).push_opcode(opcode)
}
