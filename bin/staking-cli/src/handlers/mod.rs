//! Handlers for the CLI subcommands.

pub(crate) mod build;
pub(crate) mod parse;
pub(crate) mod slashing;
pub(crate) mod status;

use std::{fs, path::Path};

use anyhow::{Context, Result};
use bitcoin::{consensus, Transaction};
use btc_staking_params::prelude::StakingParams;
use serde::Serialize;

pub(crate) fn load_params(path: &Path) -> Result<StakingParams> {
    StakingParams::from_path(path)
        .with_context(|| format!("could not load params from {}", path.display()))
}

pub(crate) fn decode_tx(hex: &str) -> Result<Transaction> {
    consensus::encode::deserialize_hex(hex.trim()).context("invalid transaction hex")
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;

    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}

pub(crate) fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}
