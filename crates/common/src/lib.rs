//! Reusable utils for the binaries built on the staking crates, such as initializing the tracing
//! framework.

pub mod logging;

// Re-export tracing crate for convenience.
pub use tracing;
