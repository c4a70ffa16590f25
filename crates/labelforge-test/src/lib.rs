//! Shared test models for LabelForge crates.
//!
//! This crate only depends on `labelforge-core`, so the search crate can use
//! it as a dev-dependency without a cycle.
//!
//! - [`queens`] - N-Queens with diagonal helper variables
//! - [`models`] - Small int, bool, set and cost models
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! labelforge-test = { workspace = true }
//! ```

pub mod models;
pub mod queens;

pub use models::{mixed_kinds, pair, sum_model, unsat_triangle, MixedKinds, Pair, SumModel};
pub use queens::{queens, QueensModel};
