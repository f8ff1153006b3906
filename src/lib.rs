//! gridstat: a multivariate partition and sparse aggregation engine for Rust.
//!
//! This crate provides the feature-construction core of an automated
//! data-preparation pipeline: univariate discretizations and value groupings,
//! their composition into multivariate grids, sparse bucketing of
//! secondary-table records into grid cells, and the statistical reduction
//! operators that turn each cell into derived values.

pub mod cache;
pub mod construction;
pub mod error;
pub mod partition;
pub mod stats;
pub mod value;
