//! Statistical reduction operators over record lists and sparse blocks.
//!
//! - [`StatsRule`] - reduces a cell's record list to one scalar
//! - [`BlockStatsRule`] - reduces per-record sparse blocks to one aggregate
//!   per distinct sparse key
//!
//! Every rule declares a default value returned on empty input; a compiled
//! pipeline never fails during evaluation, it degrades to defaults.

mod block;
mod scalar;

pub use block::{BlockStatsRule, SparseBlock};
pub use scalar::{Scalar, StatsRule};
