//! This crate provides test-utilities related to external libraries.
//!
//! These utilities are mostly used to generate random keys, outpoints and transactions for testing
//! purposes.

pub mod bitcoin;
pub mod prelude;
