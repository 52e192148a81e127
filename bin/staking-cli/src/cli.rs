use std::path::PathBuf;

use bitcoin::XOnlyPublicKey;
use btc_staking_delegation::prelude::DelegationStatusFilter;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "staking-cli",
    about = "Build, parse and check bitcoin staking transactions and delegations",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Commands {
    Build(BuildArgs),

    Parse(ParseArgs),

    ValidateSlashing(ValidateSlashingArgs),

    Status(StatusArgs),
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Build the staking and OP_RETURN outputs of a staking transaction")]
pub(crate) struct BuildArgs {
    #[arg(long, env = "STAKING_PARAMS", help = "the path to the params file")]
    pub(crate) params: PathBuf,

    #[arg(long, help = "the x-only public key of the staker")]
    pub(crate) staker_pk: XOnlyPublicKey,

    #[arg(long, help = "the x-only public key of the finality provider")]
    pub(crate) fp_pk: XOnlyPublicKey,

    #[arg(long, help = "the staking time in blocks")]
    pub(crate) staking_time: u16,

    #[arg(long, help = "the staking amount in satoshis")]
    pub(crate) amount: u64,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Parse a raw transaction as a staking transaction")]
pub(crate) struct ParseArgs {
    #[arg(long, env = "STAKING_PARAMS", help = "the path to the params file")]
    pub(crate) params: PathBuf,

    #[arg(long, help = "the consensus-encoded transaction as hex")]
    pub(crate) tx: String,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Check a slashing transaction against its staking transaction")]
pub(crate) struct ValidateSlashingArgs {
    #[arg(long, env = "STAKING_PARAMS", help = "the path to the params file")]
    pub(crate) params: PathBuf,

    #[arg(long, help = "the consensus-encoded slashing transaction as hex")]
    pub(crate) slashing_tx: String,

    #[arg(long, help = "the consensus-encoded staking transaction as hex")]
    pub(crate) staking_tx: String,

    #[arg(long, help = "the index of the staking output", default_value_t = 0)]
    pub(crate) staking_output_idx: u32,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Compute the status and voting power of delegations at a bitcoin height")]
pub(crate) struct StatusArgs {
    #[arg(long, env = "STAKING_PARAMS", help = "the path to the params file")]
    pub(crate) params: PathBuf,

    #[arg(long, help = "the path to a JSON array of delegations")]
    pub(crate) delegations: PathBuf,

    #[arg(long, help = "the bitcoin tip height")]
    pub(crate) tip_height: u64,

    #[arg(
        long,
        default_value = "any",
        help = "only report delegations with this status (pending, active, unbonding, unbonded, any)"
    )]
    pub(crate) filter: DelegationStatusFilter,

    #[arg(long, help = "also report the voting power of this finality provider")]
    pub(crate) fp_pk: Option<XOnlyPublicKey>,
}
