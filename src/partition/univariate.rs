//! Univariate partitions over numeric values, and the variant sum type.
//!
//! [`IntervalBounds`] and [`ContinuousValueSet`] cover the numeric side of
//! the family; the categorical side lives in the sibling `grouping` module.
//! [`UnivariatePartition`] ties all four variants together behind a single
//! `part_index` entry point that dispatches on both the partition variant and
//! the value variant, so a kind mismatch is a programming error caught by an
//! assert rather than a silent fallback.

use super::grouping::{SymbolValueSet, ValueGroups};
use super::search::first_admitting;
use crate::error::{DefinitionError, DefinitionErrors};
use crate::value::{AttributeKind, Value, MISSING};

// ============================================================================
// IntervalBounds
// ============================================================================

/// Interval partition of the numeric line.
///
///`P - 1` ascending bounds define `P` parts. The tie-break is "≤": a value
/// equal to a bound falls in the lower interval, and a value above every
/// bound falls in the last, open part. A first bound equal to [`MISSING`]
/// declares a dedicated missing part.
///
/// # Example
///
/// ```
/// use gridstat::partition::IntervalBounds;
///
/// let part = IntervalBounds::new(vec![0.8, 1.45, 1.75]);
/// assert_eq!(part.part_count(), 4);
/// assert_eq!(part.part_index(1.2), 1);
/// assert_eq!(part.part_index(0.5), 0);
/// assert_eq!(part.part_index(5.0), 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct IntervalBounds {
    /// Ascending bounds, one fewer than the part count.
    bounds: Vec<f64>,
}

impl IntervalBounds {
    /// Partition with the given ascending bounds.
    ///
    /// Validation is deferred to [`check_definition`](Self::check_definition).
    pub fn new(bounds: Vec<f64>) -> Self {
        Self { bounds }
    }

    /// Number of parts.
    #[inline]
    pub fn part_count(&self) -> usize {
        self.bounds.len() + 1
    }

    /// The bounds, ascending.
    #[inline]
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Whether the first part is a dedicated missing part.
    #[inline]
    pub fn has_missing_part(&self) -> bool {
        self.bounds.first().is_some_and(|&b| b == MISSING)
    }

    /// Part index of `value`: the first part whose upper bound admits it.
    #[inline]
    pub fn part_index(&self, value: f64) -> usize {
        first_admitting(self.bounds.len(), |i| value <= self.bounds[i])
    }

    /// Human-readable label of part `index`.
    pub fn part_label(&self, index: usize) -> String {
        assert!(index < self.part_count(), "part {index} out of bounds");
        if index == 0 && self.has_missing_part() {
            return "Missing".to_string();
        }
        let lower = if index == 0 {
            "-inf".to_string()
        } else {
            format_bound(self.bounds[index - 1])
        };
        match self.bounds.get(index) {
            Some(&upper) => format!("]{lower};{}]", format_bound(upper)),
            None => format!("]{lower};+inf["),
        }
    }

    /// Collect every structural problem of this definition into `errors`.
    pub fn check_definition(&self, errors: &mut DefinitionErrors) {
        for (i, pair) in self.bounds.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                errors.push(DefinitionError::UnorderedBounds {
                    index: i + 1,
                    bound: pair[1],
                    previous: pair[0],
                });
            }
        }
    }
}

fn format_bound(bound: f64) -> String {
    if bound == MISSING {
        "-inf".to_string()
    } else {
        format!("{bound}")
    }
}

// ============================================================================
// ContinuousValueSet
// ============================================================================

/// Nearest-representative partition of the numeric line.
///
/// Each ascending representative value is one part; a probe maps to the part
/// whose representative is nearest, decided by midpoint comparison between
/// consecutive representatives.
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuousValueSet {
    /// Ascending distinct representative values.
    values: Vec<f64>,
}

impl ContinuousValueSet {
    /// Partition with the given ascending representatives.
    ///
    /// Validation is deferred to [`check_definition`](Self::check_definition).
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Number of parts (one per representative).
    #[inline]
    pub fn part_count(&self) -> usize {
        self.values.len()
    }

    /// The representatives, ascending.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Part index of `value`: the nearest representative by midpoint rule.
    #[inline]
    pub fn part_index(&self, value: f64) -> usize {
        // n - 1 midpoints separate n representatives; the first midpoint at
        // or above the probe names its part.
        let midpoints = self.values.len().saturating_sub(1);
        first_admitting(midpoints, |i| {
            value <= midpoint(self.values[i], self.values[i + 1])
        })
    }

    /// Label of part `index`: its representative value.
    pub fn part_label(&self, index: usize) -> String {
        assert!(index < self.part_count(), "part {index} out of bounds");
        format_bound(self.values[index])
    }

    /// Collect every structural problem of this definition into `errors`.
    pub fn check_definition(&self, errors: &mut DefinitionErrors) {
        if self.values.is_empty() {
            errors.push(DefinitionError::EmptyValueSet);
        }
        for (i, pair) in self.values.windows(2).enumerate() {
            if pair[1] == pair[0] {
                errors.push(DefinitionError::DuplicateNumericValue { value: pair[0] });
            } else if pair[1] < pair[0] {
                errors.push(DefinitionError::UnorderedValues { index: i + 1 });
            }
        }
    }
}

#[inline]
fn midpoint(lower: f64, upper: f64) -> f64 {
    // A missing-value representative sits at -inf; its midpoint with any
    // finite neighbor is -inf, so only a missing probe lands on it.
    if lower == MISSING {
        MISSING
    } else {
        lower + (upper - lower) / 2.0
    }
}

// ============================================================================
// UnivariatePartition
// ============================================================================

/// One dimension of a multivariate partition.
#[derive(Clone, Debug, PartialEq)]
pub enum UnivariatePartition {
    /// Numeric intervals.
    Interval(IntervalBounds),
    /// Nearest numeric representative.
    ContinuousSet(ContinuousValueSet),
    /// Categorical value groups with star fallback.
    Groups(ValueGroups),
    /// One part per categorical value.
    SymbolSet(SymbolValueSet),
}

impl UnivariatePartition {
    /// Kind of value this partition consumes.
    #[inline]
    pub fn kind(&self) -> AttributeKind {
        match self {
            UnivariatePartition::Interval(_) | UnivariatePartition::ContinuousSet(_) => {
                AttributeKind::Numeric
            }
            UnivariatePartition::Groups(_) | UnivariatePartition::SymbolSet(_) => {
                AttributeKind::Categorical
            }
        }
    }

    /// Number of parts.
    #[inline]
    pub fn part_count(&self) -> usize {
        match self {
            UnivariatePartition::Interval(p) => p.part_count(),
            UnivariatePartition::ContinuousSet(p) => p.part_count(),
            UnivariatePartition::Groups(p) => p.part_count(),
            UnivariatePartition::SymbolSet(p) => p.part_count(),
        }
    }

    /// Part index of a typed value.
    ///
    /// # Panics
    ///
    /// Panics if the value kind does not match the partition kind, or if a
    /// categorical variant has not been compiled since its last mutation.
    /// [`Partition::compile`](super::Partition::compile) rules both out for
    /// compiled pipelines.
    #[inline]
    pub fn part_index(&self, value: Value<'_>) -> usize {
        match (self, value) {
            (UnivariatePartition::Interval(p), Value::Numeric(v)) => p.part_index(v),
            (UnivariatePartition::ContinuousSet(p), Value::Numeric(v)) => p.part_index(v),
            (UnivariatePartition::Groups(p), Value::Categorical(v)) => p.group_index(v),
            (UnivariatePartition::SymbolSet(p), Value::Categorical(v)) => p.value_index(v),
            (p, v) => panic!(
                "kind mismatch: {} partition probed with {} value",
                p.kind(),
                v.kind()
            ),
        }
    }

    /// Human-readable label of part `index`.
    pub fn part_label(&self, index: usize) -> String {
        match self {
            UnivariatePartition::Interval(p) => p.part_label(index),
            UnivariatePartition::ContinuousSet(p) => p.part_label(index),
            UnivariatePartition::Groups(p) => p.part_label(index),
            UnivariatePartition::SymbolSet(p) => p.part_label(index),
        }
    }

    /// Collect every structural problem of this definition into `errors`.
    pub fn check_definition(&self, errors: &mut DefinitionErrors) {
        match self {
            UnivariatePartition::Interval(p) => p.check_definition(errors),
            UnivariatePartition::ContinuousSet(p) => p.check_definition(errors),
            UnivariatePartition::Groups(p) => p.check_definition(errors),
            UnivariatePartition::SymbolSet(p) => p.check_definition(errors),
        }
    }

    /// Build (or refresh) any lazily compiled lookup tables.
    pub fn compile(&mut self) {
        match self {
            UnivariatePartition::Groups(p) => p.compile(),
            UnivariatePartition::SymbolSet(p) => p.compile(),
            UnivariatePartition::Interval(_) | UnivariatePartition::ContinuousSet(_) => {}
        }
    }
}

impl From<IntervalBounds> for UnivariatePartition {
    fn from(p: IntervalBounds) -> Self {
        UnivariatePartition::Interval(p)
    }
}

impl From<ContinuousValueSet> for UnivariatePartition {
    fn from(p: ContinuousValueSet) -> Self {
        UnivariatePartition::ContinuousSet(p)
    }
}

impl From<ValueGroups> for UnivariatePartition {
    fn from(p: ValueGroups) -> Self {
        UnivariatePartition::Groups(p)
    }
}

impl From<SymbolValueSet> for UnivariatePartition {
    fn from(p: SymbolValueSet) -> Self {
        UnivariatePartition::SymbolSet(p)
    }
}
