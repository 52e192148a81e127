//! CLI over the staking transaction and delegation crates.

mod handlers;

use anyhow::{Error, Result};
use btc_staking_common::logging::{self, LoggerConfig};
use clap::Parser;

use crate::handlers::{build, parse, slashing, status};

mod cli;

fn main() -> Result<(), Error> {
    logging::init(LoggerConfig::with_base_name("staking-cli"));

    let cli = cli::Cli::parse();
    match cli.command {
        cli::Commands::Build(args) => build::handle_build(args),
        cli::Commands::Parse(args) => parse::handle_parse(args),
        cli::Commands::ValidateSlashing(args) => slashing::handle_validate_slashing(args),
        cli::Commands::Status(args) => status::handle_status(args),
    }
}
