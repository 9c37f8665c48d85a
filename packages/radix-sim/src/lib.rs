//! # radix-sim
//!
//! Synthetic multi-vendor radar detection generator. Used by `radix-server`
//! in the absence of a live sensor feed, and standalone via the `radix-sim`
//! binary for manual testing.

pub mod formats;
pub mod simulator;
pub mod target;

pub use formats::{AesaSimulator, FmcwSimulator, PulseDopplerSimulator};
pub use simulator::{RadarConfig, RadarSimulator};
pub use target::Target;
