//! Scalar statistics rules: reduce a record list to one value.

use std::collections::BTreeMap;

use crate::value::{AttributeKind, Value, ValueSelector, MISSING};

/// Result of a statistics rule.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// Numeric result; [`MISSING`] encodes "no value".
    Numeric(f64),
    /// Symbolic result; the empty string encodes "no value".
    Symbol(String),
}

impl Scalar {
    /// The numeric payload.
    ///
    /// # Panics
    ///
    /// Panics on a symbolic scalar; rule output kinds are fixed, so this is
    /// a programming error, not a data condition.
    #[inline]
    pub fn as_numeric(&self) -> f64 {
        match self {
            Scalar::Numeric(v) => *v,
            Scalar::Symbol(_) => panic!("numeric access on a symbolic scalar"),
        }
    }

    /// The symbolic payload.
    ///
    /// # Panics
    ///
    /// Panics on a numeric scalar.
    #[inline]
    pub fn as_symbol(&self) -> &str {
        match self {
            Scalar::Symbol(s) => s,
            Scalar::Numeric(_) => panic!("symbolic access on a numeric scalar"),
        }
    }
}

/// A statistics reduction over one cell's record list.
///
/// Numeric rules read numeric values through their selector and skip
/// [`MISSING`] inputs; when nothing remains they return their default.
/// Symbolic rules (`Mode`, `Entropy`, `Concat`, `CountDistinct`) read
/// categorical values.
#[derive(Clone, Debug, PartialEq)]
pub enum StatsRule {
    /// Number of records; ignores values entirely.
    Count,
    /// Number of distinct categorical values.
    CountDistinct,
    /// Sum of numeric values; missing when there are none.
    Sum,
    /// Sum of numeric values; 0 when there are none.
    CountSum,
    /// Arithmetic mean.
    Mean,
    /// Population standard deviation, two-pass.
    StdDev,
    /// Middle value, or the mean of the two middle values.
    Median,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Most frequent categorical value; ties break to the smallest value.
    Mode,
    /// Shannon entropy of the categorical distribution, natural log.
    Entropy,
    /// Delimiter-joined categorical values, bounded in count and length.
    Concat {
        separator: String,
        max_values: usize,
        max_chars: usize,
    },
}

impl StatsRule {
    /// A concat rule with the given separator and the standard bounds.
    pub fn concat(separator: impl Into<String>) -> Self {
        StatsRule::Concat {
            separator: separator.into(),
            max_values: 100,
            max_chars: 1000,
        }
    }

    /// Kind of value this rule reads through its selector.
    pub fn input_kind(&self) -> AttributeKind {
        match self {
            StatsRule::Count
            | StatsRule::Sum
            | StatsRule::CountSum
            | StatsRule::Mean
            | StatsRule::StdDev
            | StatsRule::Median
            | StatsRule::Min
            | StatsRule::Max => AttributeKind::Numeric,
            StatsRule::CountDistinct
            | StatsRule::Mode
            | StatsRule::Entropy
            | StatsRule::Concat { .. } => AttributeKind::Categorical,
        }
    }

    /// Kind of scalar this rule produces.
    pub fn output_kind(&self) -> AttributeKind {
        match self {
            StatsRule::Mode | StatsRule::Concat { .. } => AttributeKind::Categorical,
            _ => AttributeKind::Numeric,
        }
    }

    /// Value returned on empty input.
    pub fn default_value(&self) -> Scalar {
        match self {
            StatsRule::Count | StatsRule::CountDistinct | StatsRule::CountSum => {
                Scalar::Numeric(0.0)
            }
            StatsRule::Sum
            | StatsRule::Mean
            | StatsRule::StdDev
            | StatsRule::Median
            | StatsRule::Min
            | StatsRule::Max
            | StatsRule::Entropy => Scalar::Numeric(MISSING),
            StatsRule::Mode | StatsRule::Concat { .. } => Scalar::Symbol(String::new()),
        }
    }

    /// Reduce the records at `indices` to one scalar.
    pub fn compute<R, S: ValueSelector<R>>(
        &self,
        records: &[R],
        indices: &[usize],
        selector: &S,
    ) -> Scalar {
        match self.input_kind() {
            AttributeKind::Numeric => {
                if matches!(self, StatsRule::Count) {
                    return Scalar::Numeric(indices.len() as f64);
                }
                let values: Vec<f64> = indices
                    .iter()
                    .filter_map(|&i| match selector.select(&records[i]) {
                        Value::Numeric(v) if v != MISSING => Some(v),
                        Value::Numeric(_) => None,
                        Value::Categorical(_) => {
                            panic!("kind mismatch: numeric rule with categorical selector")
                        }
                    })
                    .collect();
                Scalar::Numeric(self.compute_numeric(&values))
            }
            AttributeKind::Categorical => {
                let values: Vec<&str> = indices
                    .iter()
                    .map(|&i| match selector.select(&records[i]) {
                        Value::Categorical(s) => s,
                        Value::Numeric(_) => {
                            panic!("kind mismatch: categorical rule with numeric selector")
                        }
                    })
                    .collect();
                self.compute_categorical(&values)
            }
        }
    }

    /// Reduce numeric values (missing inputs already filtered out).
    ///
    /// # Panics
    ///
    /// Panics on a categorical rule.
    pub fn compute_numeric(&self, values: &[f64]) -> f64 {
        self.compute_numeric_with_total(values, values.len())
    }

    /// Reduce a numeric multiset of `total` values of which only `values`
    /// are materialized; the `total - values.len()` absent ones are implicit
    /// zeros. This is the normalization contract of the sparse block rules.
    ///
    /// # Panics
    ///
    /// Panics on a categorical rule other than `CountDistinct`.
    pub fn compute_numeric_with_total(&self, values: &[f64], total: usize) -> f64 {
        debug_assert!(values.len() <= total);
        if total == 0 {
            return self.default_value().as_numeric();
        }
        let implicit_zeros = total - values.len();
        match self {
            StatsRule::Count => values.len() as f64,
            StatsRule::CountDistinct => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                sorted.dedup();
                sorted.len() as f64
            }
            StatsRule::Sum | StatsRule::CountSum => {
                if values.is_empty() && matches!(self, StatsRule::Sum) {
                    return MISSING;
                }
                values.iter().sum()
            }
            StatsRule::Mean => {
                if values.is_empty() && implicit_zeros == 0 {
                    return MISSING;
                }
                values.iter().sum::<f64>() / total as f64
            }
            StatsRule::StdDev => {
                if values.is_empty() && implicit_zeros == 0 {
                    return MISSING;
                }
                // Two-pass: mean first, then squared deviations; the absent
                // entries each contribute (0 - mean)^2.
                let mean = values.iter().sum::<f64>() / total as f64;
                let deviations: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
                let total_deviation = deviations + implicit_zeros as f64 * mean * mean;
                (total_deviation / total as f64).sqrt()
            }
            StatsRule::Median => {
                if values.is_empty() && implicit_zeros == 0 {
                    return MISSING;
                }
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                median_with_zeros(&sorted, implicit_zeros)
            }
            StatsRule::Min => {
                if values.is_empty() && implicit_zeros == 0 {
                    return MISSING;
                }
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                if implicit_zeros > 0 {
                    min.min(0.0)
                } else {
                    min
                }
            }
            StatsRule::Max => {
                if values.is_empty() && implicit_zeros == 0 {
                    return MISSING;
                }
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if implicit_zeros > 0 {
                    max.max(0.0)
                } else {
                    max
                }
            }
            StatsRule::Mode | StatsRule::Entropy | StatsRule::Concat { .. } => {
                panic!("categorical rule applied to numeric values")
            }
        }
    }

    /// Reduce categorical values.
    ///
    /// # Panics
    ///
    /// Panics on a numeric rule (`Count` excepted, which only counts).
    pub fn compute_categorical(&self, values: &[&str]) -> Scalar {
        if values.is_empty() {
            return self.default_value();
        }
        match self {
            StatsRule::Count => Scalar::Numeric(values.len() as f64),
            StatsRule::CountDistinct => {
                let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                for v in values {
                    *counts.entry(v).or_default() += 1;
                }
                Scalar::Numeric(counts.len() as f64)
            }
            StatsRule::Mode => {
                let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                for v in values {
                    *counts.entry(v).or_default() += 1;
                }
                // Ascending key order: the first maximum is the smallest value.
                let mut best = "";
                let mut best_count = 0;
                for (value, count) in counts {
                    if count > best_count {
                        best = value;
                        best_count = count;
                    }
                }
                Scalar::Symbol(best.to_string())
            }
            StatsRule::Entropy => {
                let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                for v in values {
                    *counts.entry(v).or_default() += 1;
                }
                let total = values.len() as f64;
                let entropy = counts
                    .values()
                    .map(|&c| {
                        let p = c as f64 / total;
                        // p > 0 for every observed value; 0 ln 0 never arises.
                        -p * p.ln()
                    })
                    .sum::<f64>();
                Scalar::Numeric(entropy)
            }
            StatsRule::Concat {
                separator,
                max_values,
                max_chars,
            } => {
                let mut out = String::new();
                for (i, v) in values.iter().take(*max_values).enumerate() {
                    let added = v.len() + if i > 0 { separator.len() } else { 0 };
                    if !out.is_empty() && out.len() + added > *max_chars {
                        break;
                    }
                    if i > 0 {
                        out.push_str(separator);
                    }
                    out.push_str(v);
                }
                if out.len() > *max_chars {
                    // Back off to a char boundary so multi-byte values cannot
                    // split mid-character.
                    let mut cut = *max_chars;
                    while !out.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    out.truncate(cut);
                }
                Scalar::Symbol(out)
            }
            _ => panic!("numeric rule applied to categorical values"),
        }
    }
}

/// Median of `sorted` plus `zeros` implicit zero entries, without
/// materializing them.
fn median_with_zeros(sorted: &[f64], zeros: usize) -> f64 {
    let total = sorted.len() + zeros;
    debug_assert!(total > 0);
    // Conceptual order: negatives, the implicit zeros, the rest.
    let negatives = sorted.partition_point(|&v| v < 0.0);
    let nth = |rank: usize| -> f64 {
        if rank < negatives {
            sorted[rank]
        } else if rank < negatives + zeros {
            0.0
        } else {
            sorted[rank - zeros]
        }
    };
    if total % 2 == 1 {
        nth(total / 2)
    } else {
        (nth(total / 2 - 1) + nth(total / 2)) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{FieldSelector, FieldValue};
    use approx::assert_relative_eq;

    fn numeric_records(values: &[f64]) -> Vec<Vec<FieldValue>> {
        values.iter().map(|&v| vec![FieldValue::Numeric(v)]).collect()
    }

    fn all_indices(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    fn reduce(rule: &StatsRule, values: &[f64]) -> f64 {
        let records = numeric_records(values);
        rule.compute(&records, &all_indices(values.len()), &FieldSelector::numeric(0))
            .as_numeric()
    }

    fn reduce_symbols(rule: &StatsRule, values: &[&str]) -> Scalar {
        let records: Vec<Vec<FieldValue>> = values
            .iter()
            .map(|&v| vec![FieldValue::Categorical(v.into())])
            .collect();
        rule.compute(&records, &all_indices(values.len()), &FieldSelector::categorical(0))
    }

    #[test]
    fn count_counts_records() {
        assert_eq!(reduce(&StatsRule::Count, &[1.0, 2.0, 3.0]), 3.0);
    }

    #[test]
    fn sum_and_mean() {
        assert_eq!(reduce(&StatsRule::Sum, &[1.0, 2.0, 3.0]), 6.0);
        assert_eq!(reduce(&StatsRule::Mean, &[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn missing_inputs_are_skipped() {
        assert_eq!(reduce(&StatsRule::Sum, &[1.0, MISSING, 3.0]), 4.0);
        assert_eq!(reduce(&StatsRule::Mean, &[1.0, MISSING, 3.0]), 2.0);
        // Count still counts every record.
        assert_eq!(reduce(&StatsRule::Count, &[1.0, MISSING, 3.0]), 3.0);
    }

    #[test]
    fn every_rule_returns_its_default_on_empty_input() {
        let numeric_rules = [
            StatsRule::Count,
            StatsRule::Sum,
            StatsRule::CountSum,
            StatsRule::Mean,
            StatsRule::StdDev,
            StatsRule::Median,
            StatsRule::Min,
            StatsRule::Max,
        ];
        for rule in numeric_rules {
            assert_eq!(
                Scalar::Numeric(reduce(&rule, &[])),
                rule.default_value(),
                "{rule:?}"
            );
        }
        for rule in [
            StatsRule::CountDistinct,
            StatsRule::Mode,
            StatsRule::Entropy,
            StatsRule::concat(", "),
        ] {
            assert_eq!(reduce_symbols(&rule, &[]), rule.default_value(), "{rule:?}");
        }
    }

    #[test]
    fn sum_defaults_to_missing_but_count_sum_to_zero() {
        assert_eq!(reduce(&StatsRule::Sum, &[]), MISSING);
        assert_eq!(reduce(&StatsRule::CountSum, &[]), 0.0);
    }

    #[test]
    fn std_dev_is_stable_around_large_offsets() {
        // Naive sum-of-squares loses all precision here; two-pass does not.
        let offset = 1e9;
        let values = [offset - 1.0, offset, offset + 1.0];
        let sd = reduce(&StatsRule::StdDev, &values);
        assert_relative_eq!(sd, (2.0f64 / 3.0).sqrt(), max_relative = 1e-9);
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(reduce(&StatsRule::Median, &[5.0, 1.0, 3.0]), 3.0);
        assert_eq!(reduce(&StatsRule::Median, &[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn min_and_max() {
        assert_eq!(reduce(&StatsRule::Min, &[4.0, -1.0, 3.0]), -1.0);
        assert_eq!(reduce(&StatsRule::Max, &[4.0, -1.0, 3.0]), 4.0);
    }

    #[test]
    fn mode_breaks_ties_to_smallest_value() {
        assert_eq!(
            reduce_symbols(&StatsRule::Mode, &["b", "a", "b", "a", "c"]),
            Scalar::Symbol("a".into())
        );
        assert_eq!(
            reduce_symbols(&StatsRule::Mode, &["c", "b", "b"]),
            Scalar::Symbol("b".into())
        );
    }

    #[test]
    fn count_distinct_counts_values_once() {
        assert_eq!(
            reduce_symbols(&StatsRule::CountDistinct, &["a", "b", "a", "c", "b"]),
            Scalar::Numeric(3.0)
        );
    }

    #[test]
    fn entropy_uniform_distribution() {
        let e = reduce_symbols(&StatsRule::Entropy, &["a", "b", "c", "d"]).as_numeric();
        assert_relative_eq!(e, 4.0f64.ln(), max_relative = 1e-12);
    }

    #[test]
    fn entropy_single_value_is_zero() {
        let e = reduce_symbols(&StatsRule::Entropy, &["a", "a", "a"]).as_numeric();
        assert_relative_eq!(e, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn concat_joins_with_separator() {
        assert_eq!(
            reduce_symbols(&StatsRule::concat(";"), &["a", "b", "c"]),
            Scalar::Symbol("a;b;c".into())
        );
    }

    #[test]
    fn concat_is_bounded() {
        let rule = StatsRule::Concat {
            separator: ",".into(),
            max_values: 2,
            max_chars: 100,
        };
        assert_eq!(
            reduce_symbols(&rule, &["a", "b", "c", "d"]),
            Scalar::Symbol("a,b".into())
        );

        let tight = StatsRule::Concat {
            separator: ",".into(),
            max_values: 100,
            max_chars: 3,
        };
        assert_eq!(
            reduce_symbols(&tight, &["aa", "bb", "cc"]),
            Scalar::Symbol("aa".into())
        );
    }

    #[test]
    fn concat_truncates_on_char_boundaries() {
        let tight = StatsRule::Concat {
            separator: ",".into(),
            max_values: 100,
            max_chars: 3,
        };
        // "éé" is 4 bytes; the cut backs off to the first full character.
        assert_eq!(
            reduce_symbols(&tight, &["éé"]),
            Scalar::Symbol("é".into())
        );
        assert_eq!(
            reduce_symbols(&tight, &["日本語"]),
            Scalar::Symbol("日".into())
        );
    }

    #[test]
    fn implicit_zero_normalization_uses_the_total() {
        // 2 present values among a total of 10: the 8 absent are zeros.
        assert_eq!(
            StatsRule::Mean.compute_numeric_with_total(&[4.0, 6.0], 10),
            1.0
        );
        assert_eq!(
            StatsRule::Min.compute_numeric_with_total(&[4.0, 6.0], 10),
            0.0
        );
        assert_eq!(
            StatsRule::Max.compute_numeric_with_total(&[-4.0, -6.0], 10),
            0.0
        );
        assert_eq!(
            StatsRule::Median.compute_numeric_with_total(&[4.0, 6.0], 10),
            0.0
        );
        assert_eq!(
            StatsRule::Median.compute_numeric_with_total(&[-2.0, 4.0, 6.0], 4),
            2.0
        );
    }

    #[test]
    fn std_dev_with_implicit_zeros() {
        // Values {4, 6} plus 8 zeros: mean 1, variance (9+25+8)/10 = 4.2.
        let sd = StatsRule::StdDev.compute_numeric_with_total(&[4.0, 6.0], 10);
        assert_relative_eq!(sd, 4.2f64.sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn rule_kinds() {
        assert_eq!(StatsRule::Mean.input_kind(), AttributeKind::Numeric);
        assert_eq!(StatsRule::Mode.input_kind(), AttributeKind::Categorical);
        assert_eq!(StatsRule::Mode.output_kind(), AttributeKind::Categorical);
        assert_eq!(StatsRule::Entropy.output_kind(), AttributeKind::Numeric);
    }
}
