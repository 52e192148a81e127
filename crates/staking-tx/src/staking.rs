//! Staking and unbonding outputs.

use bitcoin::{
    taproot::{ControlBlock, TaprootSpendInfo},
    Address, Amount, Network, ScriptBuf, TxOut, XOnlyPublicKey,
};
use btc_staking_params::prelude::{MagicBytes, StakingParams};
use btc_staking_primitives::{
    errors::TaprootError,
    scripts::taproot::{control_block, create_taproot_addr},
};
use tracing::debug;

use crate::{
    errors::{StakingTxError, StakingTxResult},
    metadata::StakingMetadata,
    scripts::{slashing_script, timelock_script, validate_keys, StakingScripts},
};

/// The script paths of a staking output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StakingPath {
    /// Withdrawal by the staker once the timelock expires.
    Timelock,

    /// Early withdrawal by the staker with the covenant committee's approval.
    Unbonding,

    /// Slashing by the covenant committee and the finality provider's (leaked) key.
    Slashing,
}

/// Everything needed to spend an output through one of its leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafSpendInfo {
    /// The leaf script.
    pub script: ScriptBuf,

    /// The proof that the script is committed in the output key.
    pub control_block: ControlBlock,
}

/// The outputs of a staking transaction together with the data needed to spend them.
///
/// Built once by [`StakingInfo::build`] and immutable afterwards.
#[derive(Debug, Clone)]
pub struct StakingInfo {
    staking_output: TxOut,
    op_return_output: TxOut,
    metadata: StakingMetadata,
    scripts: StakingScripts,
    spend_info: TaprootSpendInfo,
    address: Address,
}

impl StakingInfo {
    /// Builds the staking output and the `OP_RETURN` output of a staking transaction.
    ///
    /// # Errors
    ///
    /// If the staking amount is zero or the keys, quorum or staking time are invalid (see
    /// [`StakingScripts::new`]).
    #[expect(clippy::too_many_arguments)]
    pub fn build(
        magic_bytes: MagicBytes,
        staker_pk: XOnlyPublicKey,
        finality_provider_pk: XOnlyPublicKey,
        covenant_pks: &[XOnlyPublicKey],
        covenant_quorum: u32,
        staking_time: u16,
        staking_amount: Amount,
        network: Network,
    ) -> StakingTxResult<Self> {
        if staking_amount == Amount::ZERO {
            return Err(StakingTxError::ZeroStakingAmount);
        }

        let scripts = StakingScripts::new(
            &staker_pk,
            &[finality_provider_pk],
            covenant_pks,
            covenant_quorum,
            staking_time,
        )?;
        let (address, spend_info) = create_taproot_addr(network, &scripts.leaf_scripts())?;

        let metadata =
            StakingMetadata::new(magic_bytes, staker_pk, finality_provider_pk, staking_time);

        debug!(
            %address,
            %staker_pk,
            %finality_provider_pk,
            %staking_time,
            %staking_amount,
            "built staking output"
        );

        Ok(Self {
            staking_output: TxOut {
                value: staking_amount,
                script_pubkey: address.script_pubkey(),
            },
            op_return_output: metadata.op_return_output(),
            metadata,
            scripts,
            spend_info,
            address,
        })
    }

    /// Builds the staking outputs with the magic bytes, covenant committee and network of
    /// `params`.
    ///
    /// Unlike [`Self::build`], this also enforces the staking time and amount ranges of `params`.
    pub fn build_with_params(
        params: &StakingParams,
        staker_pk: XOnlyPublicKey,
        finality_provider_pk: XOnlyPublicKey,
        staking_time: u16,
        staking_amount: Amount,
    ) -> StakingTxResult<Self> {
        if !(params.min_staking_time..=params.max_staking_time).contains(&staking_time) {
            return Err(StakingTxError::StakingTimeOutOfRange {
                staking_time,
                min: params.min_staking_time,
                max: params.max_staking_time,
            });
        }

        if !(params.min_staking_amount..=params.max_staking_amount).contains(&staking_amount) {
            return Err(StakingTxError::StakingAmountOutOfRange {
                amount: staking_amount,
                min: params.min_staking_amount,
                max: params.max_staking_amount,
            });
        }

        Self::build(
            params.magic_bytes,
            staker_pk,
            finality_provider_pk,
            &params.covenant_pks,
            params.covenant_quorum,
            staking_time,
            staking_amount,
            params.network,
        )
    }

    /// Returns the staking output.
    pub const fn staking_output(&self) -> &TxOut {
        &self.staking_output
    }

    /// Returns the `OP_RETURN` output that carries the metadata.
    pub const fn op_return_output(&self) -> &TxOut {
        &self.op_return_output
    }

    /// Returns the metadata carried in the `OP_RETURN` output.
    pub const fn metadata(&self) -> &StakingMetadata {
        &self.metadata
    }

    /// Returns the leaf scripts of the staking output.
    pub const fn scripts(&self) -> &StakingScripts {
        &self.scripts
    }

    /// Returns the address of the staking output.
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Returns the taproot spend info of the staking output.
    pub const fn spend_info(&self) -> &TaprootSpendInfo {
        &self.spend_info
    }

    /// Returns the leaf script of the given path.
    pub const fn path_script(&self, path: StakingPath) -> &ScriptBuf {
        match path {
            StakingPath::Timelock => &self.scripts.timelock_script,
            StakingPath::Unbonding => &self.scripts.unbonding_script,
            StakingPath::Slashing => &self.scripts.slashing_script,
        }
    }

    /// Returns the leaf script and control block needed to spend through `path`.
    pub fn leaf_spend_info(&self, path: StakingPath) -> StakingTxResult<LeafSpendInfo> {
        let script = self.path_script(path).clone();
        let control_block = control_block(&self.spend_info, &script)?;

        Ok(LeafSpendInfo {
            script,
            control_block,
        })
    }
}

/// The output of an unbonding transaction together with the data needed to spend it.
///
/// An unbonding output can only be withdrawn after its timelock or slashed; it cannot be unbonded
/// again.
#[derive(Debug, Clone)]
pub struct UnbondingInfo {
    unbonding_output: TxOut,
    timelock_script: ScriptBuf,
    slashing_script: ScriptBuf,
    spend_info: TaprootSpendInfo,
}

impl UnbondingInfo {
    /// Builds the output of an unbonding transaction.
    ///
    /// # Errors
    ///
    /// If the amount or the unbonding time is zero or the keys or quorum are invalid.
    pub fn build(
        staker_pk: XOnlyPublicKey,
        finality_provider_pks: &[XOnlyPublicKey],
        covenant_pks: &[XOnlyPublicKey],
        covenant_quorum: u32,
        unbonding_time: u16,
        unbonding_amount: Amount,
        network: Network,
    ) -> StakingTxResult<Self> {
        if unbonding_amount == Amount::ZERO {
            return Err(StakingTxError::ZeroStakingAmount);
        }

        if unbonding_time == 0 {
            return Err(StakingTxError::ZeroStakingTime);
        }

        validate_keys(
            &staker_pk,
            finality_provider_pks,
            covenant_pks,
            covenant_quorum,
        )?;

        let timelock_script = timelock_script(&staker_pk, unbonding_time);
        let slashing_script = slashing_script(
            &staker_pk,
            finality_provider_pks,
            covenant_pks,
            covenant_quorum,
        );

        let (address, spend_info) = create_taproot_addr(
            network,
            &[timelock_script.clone(), slashing_script.clone()],
        )?;

        debug!(%address, %staker_pk, %unbonding_time, %unbonding_amount, "built unbonding output");

        Ok(Self {
            unbonding_output: TxOut {
                value: unbonding_amount,
                script_pubkey: address.script_pubkey(),
            },
            timelock_script,
            slashing_script,
            spend_info,
        })
    }

    /// Returns the unbonding output.
    pub const fn unbonding_output(&self) -> &TxOut {
        &self.unbonding_output
    }

    /// Returns the taproot spend info of the unbonding output.
    pub const fn spend_info(&self) -> &TaprootSpendInfo {
        &self.spend_info
    }

    /// Returns the leaf script and control block needed to spend through `path`.
    ///
    /// # Errors
    ///
    /// [`StakingPath::Unbonding`] does not exist on an unbonding output.
    pub fn leaf_spend_info(&self, path: StakingPath) -> StakingTxResult<LeafSpendInfo> {
        let script = match path {
            StakingPath::Timelock => self.timelock_script.clone(),
            StakingPath::Slashing => self.slashing_script.clone(),
            StakingPath::Unbonding => return Err(TaprootError::UnknownLeaf.into()),
        };
        let control_block = control_block(&self.spend_info, &script)?;

        Ok(LeafSpendInfo {
            script,
            control_block,
        })
    }
}
