//! # radix-core
//!
//! The algorithmic core of RADIX: coordinate projection, per-vendor
//! normalization, multi-target tracking, and ML dataset extraction.

pub mod coord;
pub mod extractor;
pub mod normalizer;
pub mod tracker;

pub use extractor::{ExtractError, Extractor};
pub use normalizer::Normalizer;
pub use tracker::Tracker;
