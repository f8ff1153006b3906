//! Sparse bucketing of secondary-table records into partition cells.
//!
//! A [`TablePartition`] binds a compiled [`Partition`] to one value selector
//! per dimension and buckets records into the grid's cells, materializing
//! only the non-empty ones. The caller decides which cells it cares about
//! through a [`SparseKeyIndexer`]; records landing in unrequested cells are
//! dropped silently.
//!
//! # Reuse and Thread Safety
//!
//! The bucketing scratch (one record list per possible slot plus a touched
//! list) is owned by the `TablePartition` and reused across
//! [`compute`](TablePartition::compute) calls; it is fully reset before each
//! call returns, so no state leaks between computations. It is mutated in
//! place, so a `TablePartition` must be per-thread or externally guarded.

use std::marker::PhantomData;
use std::mem;

use super::grid::Partition;
use crate::error::{DefinitionError, DefinitionErrors};
use crate::value::{SparseKeyIndexer, ValueSelector};

/// Non-empty cells of one bucketing pass, ascending by sparse slot.
///
/// Each entry pairs a dense sparse slot with the indices (into the input
/// record slice) of the records that landed in it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseCells {
    cells: Vec<(usize, Vec<usize>)>,
}

impl SparseCells {
    /// Number of non-empty cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no record landed in a requested cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `(slot, record indices)` pairs, ascending by slot.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> + '_ {
        self.cells.iter().map(|(slot, records)| (*slot, &records[..]))
    }

    /// Record indices bucketed at `slot`, if the cell is non-empty.
    pub fn records_at(&self, slot: usize) -> Option<&[usize]> {
        self.cells
            .binary_search_by_key(&slot, |(s, _)| *s)
            .ok()
            .map(|pos| &self.cells[pos].1[..])
    }
}

/// Buckets records of a secondary table into sparse partition cells.
///
/// `R` is the record type and `S` the per-dimension selector type; the
/// selectors' value kinds are validated against the partition's dimensions at
/// construction, so [`compute`](Self::compute) cannot kind-fault.
#[derive(Debug)]
pub struct TablePartition<R, S: ValueSelector<R>> {
    partition: Partition,
    selectors: Vec<S>,
    /// Scratch: one lazily filled record list per possible sparse slot.
    slots: Vec<Vec<usize>>,
    /// Scratch: slots touched by the current pass.
    touched: Vec<usize>,
    /// Scratch: per-dimension part indices of the current record.
    parts: Vec<usize>,
    _record: PhantomData<fn(&R)>,
}

impl<R, S: ValueSelector<R>> TablePartition<R, S> {
    /// Bind a partition to one selector per dimension.
    ///
    /// Compiles the partition and validates that the selector count matches
    /// the dimension count and that every selector's value kind matches its
    /// dimension's kind. All problems are reported as one batch.
    pub fn new(mut partition: Partition, selectors: Vec<S>) -> Result<Self, DefinitionErrors> {
        partition.compile()?;

        let mut errors = DefinitionErrors::new();
        if selectors.len() != partition.dimension_count() {
            errors.push(DefinitionError::SelectorCountMismatch {
                selectors: selectors.len(),
                dimensions: partition.dimension_count(),
            });
        } else {
            for (d, selector) in selectors.iter().enumerate() {
                let expected = partition.dimension(d).kind();
                if selector.kind() != expected {
                    errors.push(DefinitionError::KindMismatch {
                        dimension: d,
                        selector: selector.kind(),
                        partition: expected,
                    });
                }
            }
        }
        errors.into_result()?;

        let dims = partition.dimension_count();
        Ok(Self {
            partition,
            selectors,
            slots: Vec::new(),
            touched: Vec::new(),
            parts: vec![0; dims],
            _record: PhantomData,
        })
    }

    /// The compiled partition.
    #[inline]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Bucket `records` into the cells requested by `indexer`.
    ///
    /// Records whose NKey the indexer does not grant a slot are dropped
    /// silently. The result lists cells in ascending slot order, a contract
    /// composing layers rely on to merge sparse vectors without re-sorting.
    ///
    /// O(N + T log T) time and O(S) memory for N records, T touched cells
    /// and S possible slots; never proportional to the total cell count.
    pub fn compute(&mut self, records: &[R], indexer: &dyn SparseKeyIndexer) -> SparseCells {
        let slot_count = indexer.slot_count();
        if self.slots.len() < slot_count {
            self.slots.resize_with(slot_count, Vec::new);
        }

        for (record_index, record) in records.iter().enumerate() {
            for (d, selector) in self.selectors.iter().enumerate() {
                self.parts[d] = self.partition.dimension(d).part_index(selector.select(record));
            }
            let nkey = self.partition.nkey(&self.parts);
            let Some(slot) = indexer.slot_of(nkey) else {
                continue;
            };
            debug_assert!(slot < slot_count, "indexer slot out of range");
            let bucket = &mut self.slots[slot];
            if bucket.is_empty() {
                self.touched.push(slot);
            }
            bucket.push(record_index);
        }

        self.touched.sort_unstable();
        let cells = self
            .touched
            .iter()
            .map(|&slot| (slot, mem::take(&mut self.slots[slot])))
            .collect();
        self.touched.clear();

        SparseCells { cells }
    }
}
