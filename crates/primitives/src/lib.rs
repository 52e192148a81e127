//! This crate contains the cryptographic and script-level building blocks that are shared across
//! the staking crates.
//!
//! It is not intended to be used directly by end users, but rather to be used as a dependency by
//! other crates. Also note that this crate lies at the bottom of the crate-hierarchy in this
//! workspace i.e., it does not depend on any other crate in this workspace.

pub mod adaptor;
pub mod bitcoin;
pub mod constants;
pub mod errors;
pub mod scripts;
pub mod secp;
pub mod types;
