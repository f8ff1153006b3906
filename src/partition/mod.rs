//! Partition primitives and their multivariate composition.
//!
//! A univariate partition maps one raw value to a 0-based part index:
//!
//! - [`IntervalBounds`] - intervals over numeric values
//! - [`ContinuousValueSet`] - nearest representative numeric value
//! - [`ValueGroups`] - groups of categorical values with a star fallback
//! - [`SymbolValueSet`] - one part per categorical value
//!
//! A [`Partition`] composes univariate partitions into a multivariate grid
//! of cells, and a [`TablePartition`] buckets secondary-table records into
//! the non-empty cells of that grid.

mod describe;
mod grid;
mod grouping;
mod search;
mod table;
mod univariate;

pub use describe::{PartitionDescription, UnivariateDescription};
pub use grid::Partition;
pub use grouping::{SymbolValueSet, ValueGroup, ValueGroups};
pub use table::{SparseCells, TablePartition};
pub use univariate::{ContinuousValueSet, IntervalBounds, UnivariatePartition};
