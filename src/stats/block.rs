//! Block statistics: reduce per-record sparse blocks key by key.
//!
//! Each record of a cell may carry a [`SparseBlock`] of `(sparse index,
//! value)` entries. A [`BlockStatsRule`] accumulates the entries of every
//! record per sparse index and applies its scalar [`StatsRule`] to each
//! accumulator, passing the cell's total record count so absent entries
//! behave as the block's implicit zeros. Only indices whose result differs
//! from the rule's default are emitted, in ascending index order.
//!
//! Source and target sparse spaces may differ: a remap table, built once at
//! compile time from the caller's [`SparseKeyIndexer`], translates source
//! indices and silently drops unmapped ones. Identical spaces skip the
//! translation entirely.
//!
//! Like the bucketing scratch of a `TablePartition`, the per-index
//! accumulators are owned, reused across calls, and reset before each call
//! returns; a `BlockStatsRule` must be per-thread or externally guarded.

use super::scalar::StatsRule;
use crate::value::SparseKeyIndexer;

/// Sparse numeric vector: `(sparse index, value)` entries, ascending.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseBlock {
    entries: Vec<(usize, f64)>,
}

impl SparseBlock {
    /// An empty block.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Block over the given entries.
    ///
    /// # Panics
    ///
    /// Panics if the entries are not strictly ascending by index.
    pub fn new(entries: Vec<(usize, f64)>) -> Self {
        assert!(
            entries.windows(2).all(|w| w[0].0 < w[1].0),
            "block entries must be strictly ascending by sparse index"
        );
        Self { entries }
    }

    /// The entries, ascending by index.
    #[inline]
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Number of materialized entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is materialized.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value at `index`, if materialized.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.entries
            .binary_search_by_key(&index, |(i, _)| *i)
            .ok()
            .map(|pos| self.entries[pos].1)
    }
}

/// How source block indices map into the output sparse space.
#[derive(Clone, Debug)]
enum IndexRegime {
    /// Source and target spaces are identical; indices are reused.
    Shared { slot_count: usize },
    /// Spaces differ; `table[source]` is the target slot, `None` drops.
    Remapped { table: Vec<Option<usize>> },
}

/// Reduces per-record sparse blocks to one aggregate per sparse key.
#[derive(Clone, Debug)]
pub struct BlockStatsRule {
    rule: StatsRule,
    regime: IndexRegime,
    /// Number of output slots; fixed at construction.
    slot_count: usize,
    /// Scratch: one value accumulator per output slot, reused across calls.
    accumulators: Vec<Vec<f64>>,
    /// Scratch: slots touched by the current pass.
    touched: Vec<usize>,
}

impl BlockStatsRule {
    /// Block rule over a shared sparse space of `slot_count` indices.
    ///
    /// # Panics
    ///
    /// Panics on a symbolic rule; blocks carry numeric values.
    pub fn shared(rule: StatsRule, slot_count: usize) -> Self {
        assert!(
            block_capable(&rule),
            "rule {rule:?} cannot reduce numeric sparse blocks"
        );
        Self {
            rule,
            regime: IndexRegime::Shared { slot_count },
            slot_count,
            accumulators: Vec::new(),
            touched: Vec::new(),
        }
    }

    /// Block rule translating source indices `0..source_count` through the
    /// target space's key indexer. The remap table is built here, once; the
    /// per-call path only indexes into it. Block sparse keys are 1-based
    /// like NKeys, so source index `i` resolves through key `i + 1`.
    ///
    /// # Panics
    ///
    /// Panics on a symbolic rule.
    pub fn remapped(
        rule: StatsRule,
        source_count: usize,
        indexer: &dyn SparseKeyIndexer,
    ) -> Self {
        assert!(
            block_capable(&rule),
            "rule {rule:?} cannot reduce numeric sparse blocks"
        );
        let table = (0..source_count).map(|i| indexer.slot_of(i + 1)).collect();
        Self {
            rule,
            regime: IndexRegime::Remapped { table },
            slot_count: indexer.slot_count(),
            accumulators: Vec::new(),
            touched: Vec::new(),
        }
    }

    /// The scalar rule applied per sparse index.
    #[inline]
    pub fn rule(&self) -> &StatsRule {
        &self.rule
    }

    /// Reduce the blocks of one cell's records.
    ///
    /// `blocks` holds one entry per record of the cell (empty blocks
    /// included); its length is the total record count N passed to the
    /// scalar rule, so Mean and StdDev normalize over all N records even
    /// though absent entries are never materialized.
    pub fn compute(&mut self, blocks: &[&SparseBlock]) -> SparseBlock {
        if self.accumulators.len() < self.slot_count {
            self.accumulators.resize_with(self.slot_count, Vec::new);
        }

        for block in blocks {
            for &(index, value) in block.entries() {
                let slot = match &self.regime {
                    IndexRegime::Shared { slot_count } => {
                        debug_assert!(index < *slot_count, "block index out of range");
                        index
                    }
                    IndexRegime::Remapped { table } => {
                        match table.get(index).copied().flatten() {
                            Some(slot) => slot,
                            None => continue, // unmapped: drop silently
                        }
                    }
                };
                let acc = &mut self.accumulators[slot];
                if acc.is_empty() {
                    self.touched.push(slot);
                }
                acc.push(value);
            }
        }

        let total = blocks.len();
        let default = self.rule.default_value().as_numeric();
        self.touched.sort_unstable();
        let mut entries = Vec::with_capacity(self.touched.len());
        for &slot in &self.touched {
            let result = self
                .rule
                .compute_numeric_with_total(&self.accumulators[slot], total);
            self.accumulators[slot].clear();
            if result != default {
                entries.push((slot, result));
            }
        }
        self.touched.clear();

        SparseBlock { entries }
    }
}

/// Whether a scalar rule can reduce numeric sparse blocks.
fn block_capable(rule: &StatsRule) -> bool {
    rule.output_kind() == crate::value::AttributeKind::Numeric
        && !matches!(rule, StatsRule::Entropy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SubsetIndexer;
    use approx::assert_relative_eq;

    fn blocks_of(lists: &[&[(usize, f64)]]) -> Vec<SparseBlock> {
        lists
            .iter()
            .map(|entries| SparseBlock::new(entries.to_vec()))
            .collect()
    }

    fn refs(blocks: &[SparseBlock]) -> Vec<&SparseBlock> {
        blocks.iter().collect()
    }

    #[test]
    fn mean_normalizes_by_total_record_count() {
        // Key 7 appears with values {4, 6} in 2 of 10 records.
        let mut blocks = vec![SparseBlock::empty(); 10];
        blocks[2] = SparseBlock::new(vec![(7, 4.0)]);
        blocks[5] = SparseBlock::new(vec![(7, 6.0)]);

        let mut rule = BlockStatsRule::shared(StatsRule::Mean, 8);
        let out = rule.compute(&refs(&blocks));
        assert_eq!(out.entries(), &[(7, 1.0)]);
    }

    #[test]
    fn sum_accumulates_per_key_ascending() {
        let blocks = blocks_of(&[
            &[(1, 2.0), (4, 1.0)],
            &[(4, 3.0)],
            &[(1, 5.0), (2, 7.0)],
        ]);
        let mut rule = BlockStatsRule::shared(StatsRule::CountSum, 6);
        let out = rule.compute(&refs(&blocks));
        assert_eq!(out.entries(), &[(1, 7.0), (2, 7.0), (4, 4.0)]);
    }

    #[test]
    fn default_valued_results_are_suppressed() {
        // Key 3 sums to zero, which is CountSum's default.
        let blocks = blocks_of(&[&[(3, 2.0), (5, 1.0)], &[(3, -2.0)]]);
        let mut rule = BlockStatsRule::shared(StatsRule::CountSum, 6);
        let out = rule.compute(&refs(&blocks));
        assert_eq!(out.entries(), &[(5, 1.0)]);
    }

    #[test]
    fn count_counts_present_entries() {
        let blocks = blocks_of(&[&[(0, 1.0)], &[(0, 9.0), (2, 9.0)], &[]]);
        let mut rule = BlockStatsRule::shared(StatsRule::Count, 3);
        let out = rule.compute(&refs(&blocks));
        assert_eq!(out.entries(), &[(0, 2.0), (2, 1.0)]);
    }

    #[test]
    fn std_dev_counts_absent_entries_as_zeros() {
        let mut blocks = vec![SparseBlock::empty(); 10];
        blocks[0] = SparseBlock::new(vec![(7, 4.0)]);
        blocks[1] = SparseBlock::new(vec![(7, 6.0)]);

        let mut rule = BlockStatsRule::shared(StatsRule::StdDev, 8);
        let out = rule.compute(&refs(&blocks));
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out.get(7).unwrap(), 4.2f64.sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn remapped_spaces_translate_and_drop() {
        // Source space has 6 indices; the target requests keys 2 and 5,
        // i.e. source indices 1 and 4. Everything else is dropped.
        let indexer = SubsetIndexer::new(vec![2, 5]);
        let blocks = blocks_of(&[&[(1, 3.0), (3, 9.0)], &[(4, 5.0)]]);

        let mut rule = BlockStatsRule::remapped(StatsRule::CountSum, 6, &indexer);
        let out = rule.compute(&refs(&blocks));
        assert_eq!(out.entries(), &[(0, 3.0), (1, 5.0)]);
    }

    #[test]
    fn scratch_resets_between_computations() {
        let mut rule = BlockStatsRule::shared(StatsRule::CountSum, 4);

        let first = blocks_of(&[&[(1, 5.0)]]);
        assert_eq!(rule.compute(&refs(&first)).entries(), &[(1, 5.0)]);

        let second = blocks_of(&[&[(2, 3.0)]]);
        assert_eq!(rule.compute(&refs(&second)).entries(), &[(2, 3.0)]);
    }

    #[test]
    fn empty_cell_emits_nothing() {
        let mut rule = BlockStatsRule::shared(StatsRule::Mean, 4);
        let out = rule.compute(&[]);
        assert!(out.is_empty());
    }

    #[test]
    #[should_panic(expected = "cannot reduce numeric sparse blocks")]
    fn symbolic_rules_are_rejected() {
        BlockStatsRule::shared(StatsRule::Mode, 4);
    }

    #[test]
    fn block_get_and_order_invariants() {
        let block = SparseBlock::new(vec![(1, 2.0), (5, 3.0)]);
        assert_eq!(block.get(1), Some(2.0));
        assert_eq!(block.get(2), None);
    }

    #[test]
    #[should_panic(expected = "strictly ascending")]
    fn unsorted_block_entries_are_rejected() {
        SparseBlock::new(vec![(5, 1.0), (1, 2.0)]);
    }
}
