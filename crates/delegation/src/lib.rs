//! Lifecycle of bitcoin delegations on the host chain.
//!
//! A delegation is derived purely from the bitcoin tip height, the finalization timeout and the
//! covenant signatures collected so far. Nothing here stores or caches the status; it is computed
//! fresh on every call.

pub mod delegation;
pub mod errors;
pub mod finality_provider;
pub mod pop;
pub mod prelude;
pub mod query;
pub mod status;
pub mod types;
pub mod undelegation;

#[cfg(test)]
mod testing;
