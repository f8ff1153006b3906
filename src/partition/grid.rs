//! Multivariate partition: an ordered tuple of univariate partitions.
//!
//! Cells are numbered in mixed-radix order with dimension 0 fastest-varying:
//! `index = Σ_d part[d] * factor[d]` where `factor[0] = 1` and
//! `factor[d] = factor[d-1] * part_count[d-1]`. The externally exposed cell
//! key is the 1-based `NKey = index + 1`.

use super::univariate::UnivariatePartition;
use crate::error::{DefinitionError, DefinitionErrors};

/// Compiled layout of a [`Partition`]: radix factors and the cell total.
#[derive(Clone, Debug, PartialEq)]
struct GridLayout {
    /// Mixed-radix factor per dimension, dimension 0 fastest-varying.
    factors: Vec<usize>,
    /// Product of all part counts; fits in `i32` by construction.
    total_cells: usize,
}

/// Ordered tuple of univariate partitions forming a multivariate grid.
///
/// Built once, compiled, then read-mostly: [`compile`](Self::compile)
/// validates every dimension and the total cell count, after which the index
/// operations are pure lookups. Calling an index operation before a
/// successful compile is a programming error.
///
/// # Example
///
/// ```
/// use gridstat::partition::{IntervalBounds, Partition, SymbolValueSet};
///
/// let mut grid = Partition::new(vec![
///     IntervalBounds::new(vec![10.0, 20.0]).into(),          // 3 parts
///     SymbolValueSet::new(["a", "b", "c", "d"]).into(),      // 4 parts
/// ]);
/// grid.compile().unwrap();
/// assert_eq!(grid.total_cell_count(), 12);
/// assert_eq!(grid.cell_index(&[2, 3]), 11);
/// assert_eq!(grid.nkey(&[2, 3]), 12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    dimensions: Vec<UnivariatePartition>,
    layout: Option<GridLayout>,
}

impl Partition {
    /// Grid over the given dimensions, in order.
    pub fn new(dimensions: Vec<UnivariatePartition>) -> Self {
        Self {
            dimensions,
            layout: None,
        }
    }

    /// Number of dimensions.
    #[inline]
    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// The dimensions, in order.
    #[inline]
    pub fn dimensions(&self) -> &[UnivariatePartition] {
        &self.dimensions
    }

    /// Dimension `d`.
    #[inline]
    pub fn dimension(&self, d: usize) -> &UnivariatePartition {
        &self.dimensions[d]
    }

    /// Whether [`compile`](Self::compile) has succeeded since construction.
    #[inline]
    pub fn is_compiled(&self) -> bool {
        self.layout.is_some()
    }

    /// Validate every dimension and compute the grid layout.
    ///
    /// Structural errors are collected across all dimensions and reported as
    /// one batch. The total cell count is accumulated in `i64` and rejected
    /// when it exceeds `i32::MAX`, before any truncation. Recompiling an
    /// unchanged partition is idempotent.
    pub fn compile(&mut self) -> Result<(), DefinitionErrors> {
        let mut errors = DefinitionErrors::new();
        if self.dimensions.is_empty() {
            errors.push(DefinitionError::EmptyPartition);
        }
        for dim in &self.dimensions {
            dim.check_definition(&mut errors);
        }
        errors.into_result()?;

        for dim in &mut self.dimensions {
            dim.compile();
        }

        let mut factors = Vec::with_capacity(self.dimensions.len());
        let mut total: i64 = 1;
        for dim in &self.dimensions {
            factors.push(total as usize);
            total *= dim.part_count() as i64;
            if total > i64::from(i32::MAX) {
                return Err(DefinitionError::CellCountOverflow.into());
            }
        }

        self.layout = Some(GridLayout {
            factors,
            total_cells: total as usize,
        });
        Ok(())
    }

    #[inline]
    fn layout(&self) -> &GridLayout {
        self.layout
            .as_ref()
            .expect("partition used before successful compile")
    }

    /// Total number of cells in the grid.
    ///
    /// # Panics
    ///
    /// Panics if the partition is not compiled.
    #[inline]
    pub fn total_cell_count(&self) -> usize {
        self.layout().total_cells
    }

    /// Composite 0-based cell index of one part index per dimension.
    ///
    /// # Panics
    ///
    /// Panics if the partition is not compiled, `parts` has the wrong
    /// length, or a part index is out of range for its dimension.
    #[inline]
    pub fn cell_index(&self, parts: &[usize]) -> usize {
        let layout = self.layout();
        assert_eq!(
            parts.len(),
            self.dimensions.len(),
            "part index count does not match dimension count"
        );
        let mut index = 0;
        for (d, (&part, factor)) in parts.iter().zip(&layout.factors).enumerate() {
            debug_assert!(
                part < self.dimensions[d].part_count(),
                "part {part} out of range for dimension {d}"
            );
            index += part * factor;
        }
        index
    }

    /// Per-dimension part indices of a composite cell index.
    ///
    /// Inverse of [`cell_index`](Self::cell_index).
    ///
    /// # Panics
    ///
    /// Panics if the partition is not compiled or `index` is out of range.
    pub fn decompose(&self, index: usize) -> Vec<usize> {
        assert!(
            index < self.total_cell_count(),
            "cell index {index} out of range"
        );
        let mut rest = index;
        self.dimensions
            .iter()
            .map(|dim| {
                let part = rest % dim.part_count();
                rest /= dim.part_count();
                part
            })
            .collect()
    }

    /// 1-based cell key of one part index per dimension.
    #[inline]
    pub fn nkey(&self, parts: &[usize]) -> usize {
        self.cell_index(parts) + 1
    }

    /// Human-readable label of a cell: its part labels joined by ` x `.
    pub fn cell_label(&self, index: usize) -> String {
        let parts = self.decompose(index);
        parts
            .iter()
            .enumerate()
            .map(|(d, &p)| self.dimensions[d].part_label(p))
            .collect::<Vec<_>>()
            .join(" x ")
    }
}
