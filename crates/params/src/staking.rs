//! Parameters of the staking protocol such as the covenant committee, the slashing rules and the
//! accepted staking ranges.

use std::{collections::BTreeSet, fs, path::Path};

use bitcoin::{Amount, Network, XOnlyPublicKey};
use btc_staking_primitives::bitcoin::BitcoinAddress;
use serde::{Deserialize, Serialize};

use crate::{
    default::{
        FINALIZATION_TIMEOUT, MAX_ACTIVE_FINALITY_PROVIDERS, MAX_STAKING_AMOUNT, MAX_STAKING_TIME,
        MIN_SLASHING_TX_FEE, MIN_STAKING_AMOUNT, MIN_STAKING_TIME, MIN_UNBONDING_TX_FEE,
    },
    errors::ParamsError,
    slashing_rate::SlashingRate,
    types::MagicBytes,
};

/// The consensus-critical parameters of the staking protocol.
///
/// Every node must use the same values in order to agree on which bitcoin transactions are valid
/// staking transactions and which delegations are active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingParams {
    /// The bitcoin network on which staking happens.
    pub network: Network,

    /// The tag that identifies staking transactions.
    pub magic_bytes: MagicBytes,

    /// The x-only public keys of the covenant committee.
    pub covenant_pks: Vec<XOnlyPublicKey>,

    /// The number of covenant signatures required to authorize a spend.
    pub covenant_quorum: u32,

    /// The address that receives the slashed funds.
    ///
    /// This is kept as a string and decoded against [`Self::network`] on use.
    pub slashing_address: String,

    /// The minimum fraction of the staking output that a slashing transaction must slash.
    pub slashing_rate: SlashingRate,

    /// The minimum fee that a slashing transaction must pay.
    #[serde(default = "default_min_slashing_tx_fee")]
    pub min_slashing_tx_fee: Amount,

    /// The minimum fee that an unbonding transaction must pay.
    #[serde(default = "default_min_unbonding_tx_fee")]
    pub min_unbonding_tx_fee: Amount,

    /// The minimum staking time in blocks.
    #[serde(default = "default_min_staking_time")]
    pub min_staking_time: u16,

    /// The maximum staking time in blocks.
    #[serde(default = "default_max_staking_time")]
    pub max_staking_time: u16,

    /// The minimum staking amount.
    #[serde(default = "default_min_staking_amount")]
    pub min_staking_amount: Amount,

    /// The maximum staking amount.
    #[serde(default = "default_max_staking_amount")]
    pub max_staking_amount: Amount,

    /// The number of blocks after which a bitcoin checkpoint is final (`w`).
    ///
    /// A delegation stops being active `w` blocks before its timelock expires.
    #[serde(default = "default_finalization_timeout")]
    pub finalization_timeout: u64,

    /// The maximum number of finality providers with voting power at any height.
    #[serde(default = "default_max_active_finality_providers")]
    pub max_active_finality_providers: u32,
}

const fn default_min_slashing_tx_fee() -> Amount {
    MIN_SLASHING_TX_FEE
}

const fn default_min_unbonding_tx_fee() -> Amount {
    MIN_UNBONDING_TX_FEE
}

const fn default_min_staking_time() -> u16 {
    MIN_STAKING_TIME
}

const fn default_max_staking_time() -> u16 {
    MAX_STAKING_TIME
}

const fn default_min_staking_amount() -> Amount {
    MIN_STAKING_AMOUNT
}

const fn default_max_staking_amount() -> Amount {
    MAX_STAKING_AMOUNT
}

const fn default_finalization_timeout() -> u64 {
    FINALIZATION_TIMEOUT
}

const fn default_max_active_finality_providers() -> u32 {
    MAX_ACTIVE_FINALITY_PROVIDERS
}

impl StakingParams {
    /// Reads the params from a TOML file and validates them.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let contents = fs::read_to_string(path)?;
        let params: Self = toml::from_str(&contents)?;
        params.validate()?;

        Ok(params)
    }

    /// Checks that the params are internally consistent.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.covenant_pks.is_empty() {
            return Err(ParamsError::EmptyCovenantSet);
        }

        let mut seen = BTreeSet::new();
        if let Some(dup) = self.covenant_pks.iter().find(|pk| !seen.insert(XOnlyPublicKey::serialize(pk))) {
            return Err(ParamsError::DuplicateCovenantKey(*dup));
        }

        if self.covenant_quorum == 0 || self.covenant_quorum as usize > self.covenant_pks.len() {
            return Err(ParamsError::InvalidCovenantQuorum {
                quorum: self.covenant_quorum,
                num_keys: self.covenant_pks.len(),
            });
        }

        if self.min_staking_time == 0 || self.min_staking_time > self.max_staking_time {
            return Err(ParamsError::InvalidStakingTimeRange {
                min: self.min_staking_time,
                max: self.max_staking_time,
            });
        }

        if self.min_staking_amount == Amount::ZERO
            || self.min_staking_amount > self.max_staking_amount
        {
            return Err(ParamsError::InvalidStakingAmountRange {
                min: self.min_staking_amount,
                max: self.max_staking_amount,
            });
        }

        self.slashing_address()?;

        Ok(())
    }

    /// Decodes the slashing address for the configured network.
    pub fn slashing_address(&self) -> Result<BitcoinAddress, ParamsError> {
        Ok(BitcoinAddress::parse(&self.slashing_address, self.network)?)
    }
}
