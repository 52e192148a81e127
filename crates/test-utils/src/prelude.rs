//! Re-exports of the generators.

pub use crate::bitcoin::*;
