//! Categorical partitions: value groupings and symbol value sets.
//!
//! Both variants resolve a probe through a sorted lookup table that is
//! rebuilt lazily: structural mutations bump a generation counter, and the
//! next [`compile`](ValueGroups::compile) rebuilds the table exactly once.
//! Probing an uncompiled partition is a precondition violation.

use std::collections::HashMap;

use super::search::first_admitting;
use crate::cache::{Cached, Generation};
use crate::error::{DefinitionError, DefinitionErrors};
use crate::value::STAR;

// ============================================================================
// ValueGroup
// ============================================================================

/// One part of a [`ValueGroups`] partition: a set of categorical values.
///
/// At most one group of a partition contains the [`STAR`] wildcard, which
/// absorbs every value not listed elsewhere.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueGroup {
    values: Vec<String>,
}

impl ValueGroup {
    /// Group over the given values.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Values in this group, in declaration order.
    #[inline]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Whether this group contains the star wildcard.
    #[inline]
    pub fn contains_star(&self) -> bool {
        self.values.iter().any(|v| v == STAR)
    }
}

// ============================================================================
// ValueGroups
// ============================================================================

/// Compiled value-to-group lookup of a [`ValueGroups`] partition.
#[derive(Clone, Debug, Default)]
struct GroupLookup {
    /// (value, group) pairs sorted by value, star excluded.
    entries: Vec<(String, usize)>,
    /// Group holding the star wildcard; fallback for unmatched probes.
    star_group: usize,
}

/// Categorical partition into ordered groups of values.
///
/// Probes resolve through a sorted lookup table; values listed in no group
/// fall into the group holding the [`STAR`] wildcard.
///
/// # Example
///
/// ```
/// use gridstat::partition::{ValueGroup, ValueGroups};
///
/// let mut groups = ValueGroups::new(vec![
///     ValueGroup::new(["A", "B"]),
///     ValueGroup::new(["C", "*"]),
/// ]);
/// groups.compile();
/// assert_eq!(groups.group_index("A"), 0);
/// assert_eq!(groups.group_index("C"), 1);
/// assert_eq!(groups.group_index("unknown"), 1);
/// ```
#[derive(Clone, Debug)]
pub struct ValueGroups {
    groups: Vec<ValueGroup>,
    generation: Generation,
    lookup: Cached<GroupLookup>,
}

impl PartialEq for ValueGroups {
    fn eq(&self, other: &Self) -> bool {
        // Structural equality; compiled lookup state is derived.
        self.groups == other.groups
    }
}

impl ValueGroups {
    /// Partition with the given groups.
    ///
    /// Validation is deferred to [`check_definition`](Self::check_definition)
    /// and the lookup table to [`compile`](Self::compile).
    pub fn new(groups: Vec<ValueGroup>) -> Self {
        Self {
            groups,
            generation: Generation::default(),
            lookup: Cached::new(GroupLookup::default()),
        }
    }

    /// Number of parts (one per group).
    #[inline]
    pub fn part_count(&self) -> usize {
        self.groups.len()
    }

    /// The groups, in part order.
    #[inline]
    pub fn groups(&self) -> &[ValueGroup] {
        &self.groups
    }

    /// Append a group, invalidating the compiled lookup table.
    pub fn push_group(&mut self, group: ValueGroup) {
        self.groups.push(group);
        self.generation.bump();
    }

    /// Rebuild the sorted lookup table if a mutation has staled it.
    pub fn compile(&mut self) {
        let groups = &self.groups;
        self.lookup
            .ensure(self.generation.current(), || build_group_lookup(groups));
    }

    /// Group index of `value`; unmatched values fall to the star group.
    ///
    /// # Panics
    ///
    /// Panics if the partition was mutated since the last
    /// [`compile`](Self::compile).
    #[inline]
    pub fn group_index(&self, value: &str) -> usize {
        let lookup = self.lookup.get(self.generation.current());
        search_sorted(&lookup.entries, value).unwrap_or(lookup.star_group)
    }

    /// Label of part `index`: its values in braces.
    pub fn part_label(&self, index: usize) -> String {
        assert!(index < self.part_count(), "part {index} out of bounds");
        format!("{{{}}}", self.groups[index].values().join(", "))
    }

    /// Collect every structural problem of this definition into `errors`.
    ///
    /// Checks: groups non-empty, non-star values globally unique, star
    /// wildcard present in exactly one group.
    pub fn check_definition(&self, errors: &mut DefinitionErrors) {
        if self.groups.is_empty() {
            errors.push(DefinitionError::EmptyValueSet);
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut star_group: Option<usize> = None;
        for (g, group) in self.groups.iter().enumerate() {
            if group.values().is_empty() {
                errors.push(DefinitionError::EmptyGroup { group: g });
            }
            for value in group.values() {
                if value == STAR {
                    match star_group {
                        None => star_group = Some(g),
                        Some(first) => {
                            errors.push(DefinitionError::DuplicatedStar { first, second: g });
                        }
                    }
                } else if let Some(&first) = seen.get(value.as_str()) {
                    errors.push(DefinitionError::ValueInMultipleGroups {
                        value: value.clone(),
                        first,
                        second: g,
                    });
                } else {
                    seen.insert(value.as_str(), g);
                }
            }
        }
        if star_group.is_none() {
            errors.push(DefinitionError::MissingStar);
        }
    }
}

fn build_group_lookup(groups: &[ValueGroup]) -> GroupLookup {
    let mut entries = Vec::new();
    let mut star_group = 0;
    for (g, group) in groups.iter().enumerate() {
        for value in group.values() {
            if value == STAR {
                star_group = g;
            } else {
                entries.push((value.clone(), g));
            }
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    GroupLookup {
        entries,
        star_group,
    }
}

/// Exact-match search over value-sorted `(value, payload)` entries.
fn search_sorted(entries: &[(String, usize)], value: &str) -> Option<usize> {
    let pos = first_admitting(entries.len(), |i| value <= entries[i].0.as_str());
    match entries.get(pos) {
        Some((candidate, payload)) if candidate == value => Some(*payload),
        _ => None,
    }
}

// ============================================================================
// SymbolValueSet
// ============================================================================

/// Compiled lookup of a [`SymbolValueSet`].
#[derive(Clone, Debug, Default)]
struct SymbolLookup {
    /// (value, part) pairs sorted by value.
    entries: Vec<(String, usize)>,
    /// Part for unlisted probes: the star's part if listed, else part 0.
    fallback: usize,
}

/// Categorical partition with one part per listed value.
///
/// Unlisted probes fall to the star value's part when a star is listed,
/// otherwise to part 0.
#[derive(Clone, Debug)]
pub struct SymbolValueSet {
    values: Vec<String>,
    generation: Generation,
    lookup: Cached<SymbolLookup>,
}

impl PartialEq for SymbolValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl SymbolValueSet {
    /// Partition over the given values, one part each, in order.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            generation: Generation::default(),
            lookup: Cached::new(SymbolLookup::default()),
        }
    }

    /// Number of parts (one per value).
    #[inline]
    pub fn part_count(&self) -> usize {
        self.values.len()
    }

    /// The values, in part order.
    #[inline]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Append a value as a new part, invalidating the compiled lookup.
    pub fn push_value(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
        self.generation.bump();
    }

    /// Rebuild the sorted lookup table if a mutation has staled it.
    pub fn compile(&mut self) {
        let values = &self.values;
        self.lookup
            .ensure(self.generation.current(), || build_symbol_lookup(values));
    }

    /// Part index of `value`; unlisted values fall to the star part, else 0.
    ///
    /// # Panics
    ///
    /// Panics if the partition was mutated since the last
    /// [`compile`](Self::compile).
    #[inline]
    pub fn value_index(&self, value: &str) -> usize {
        let lookup = self.lookup.get(self.generation.current());
        search_sorted(&lookup.entries, value).unwrap_or(lookup.fallback)
    }

    /// Label of part `index`: its value.
    pub fn part_label(&self, index: usize) -> String {
        assert!(index < self.part_count(), "part {index} out of bounds");
        self.values[index].clone()
    }

    /// Collect every structural problem of this definition into `errors`.
    pub fn check_definition(&self, errors: &mut DefinitionErrors) {
        if self.values.is_empty() {
            errors.push(DefinitionError::EmptyValueSet);
        }
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (i, value) in self.values.iter().enumerate() {
            if seen.insert(value.as_str(), i).is_some() {
                errors.push(DefinitionError::DuplicateValue {
                    value: value.clone(),
                });
            }
        }
    }
}

fn build_symbol_lookup(values: &[String]) -> SymbolLookup {
    let mut entries: Vec<(String, usize)> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (v.clone(), i))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let fallback = values.iter().position(|v| v == STAR).unwrap_or(0);
    SymbolLookup { entries, fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled_groups() -> ValueGroups {
        let mut groups = ValueGroups::new(vec![
            ValueGroup::new(["A", "B"]),
            ValueGroup::new(["C", STAR]),
        ]);
        groups.compile();
        groups
    }

    #[test]
    fn listed_values_resolve_to_their_group() {
        let groups = compiled_groups();
        assert_eq!(groups.group_index("A"), 0);
        assert_eq!(groups.group_index("B"), 0);
        assert_eq!(groups.group_index("C"), 1);
    }

    #[test]
    fn unmatched_values_fall_to_star_group() {
        let groups = compiled_groups();
        assert_eq!(groups.group_index("unknown"), 1);
        assert_eq!(groups.group_index(""), 1);
    }

    #[test]
    fn large_grouping_uses_dichotomic_path() {
        // 40 distinct values across 4 groups forces the dichotomic search.
        let make = |lo: usize| ValueGroup::new((lo..lo + 10).map(|i| format!("v{i:02}")));
        let mut groups = ValueGroups::new(vec![
            make(0),
            make(10),
            make(20),
            ValueGroup::new(
                (30..40)
                    .map(|i| format!("v{i:02}"))
                    .chain([STAR.to_string()]),
            ),
        ]);
        groups.compile();
        assert_eq!(groups.group_index("v05"), 0);
        assert_eq!(groups.group_index("v19"), 1);
        assert_eq!(groups.group_index("v20"), 2);
        assert_eq!(groups.group_index("v39"), 3);
        assert_eq!(groups.group_index("zzz"), 3);
    }

    #[test]
    fn mutation_requires_recompile() {
        let mut groups = compiled_groups();
        groups.push_group(ValueGroup::new(["D"]));
        groups.compile();
        assert_eq!(groups.group_index("D"), 2);
        assert_eq!(groups.group_index("A"), 0);
    }

    #[test]
    #[should_panic(expected = "stale cache read")]
    fn probing_after_mutation_without_recompile_panics() {
        let mut groups = compiled_groups();
        groups.push_group(ValueGroup::new(["D"]));
        groups.group_index("A");
    }

    #[test]
    fn group_validation_catches_all_problems_at_once() {
        let groups = ValueGroups::new(vec![
            ValueGroup::new(["A", STAR]),
            ValueGroup::new(["A", STAR]),
            ValueGroup::new(Vec::<String>::new()),
        ]);
        let mut errors = DefinitionErrors::new();
        groups.check_definition(&mut errors);
        assert!(errors.errors().contains(&DefinitionError::EmptyGroup { group: 2 }));
        assert!(errors
            .errors()
            .contains(&DefinitionError::DuplicatedStar { first: 0, second: 1 }));
        assert!(errors.errors().contains(&DefinitionError::ValueInMultipleGroups {
            value: "A".into(),
            first: 0,
            second: 1
        }));
    }

    #[test]
    fn missing_star_is_an_error() {
        let groups = ValueGroups::new(vec![ValueGroup::new(["A"])]);
        let mut errors = DefinitionErrors::new();
        groups.check_definition(&mut errors);
        assert!(errors.errors().contains(&DefinitionError::MissingStar));
    }

    #[test]
    fn group_labels_list_values() {
        let groups = compiled_groups();
        assert_eq!(groups.part_label(0), "{A, B}");
        assert_eq!(groups.part_label(1), "{C, *}");
    }

    #[test]
    fn symbol_set_each_value_is_a_part() {
        let mut set = SymbolValueSet::new(["red", "green", "blue"]);
        set.compile();
        assert_eq!(set.part_count(), 3);
        assert_eq!(set.value_index("red"), 0);
        assert_eq!(set.value_index("green"), 1);
        assert_eq!(set.value_index("blue"), 2);
    }

    #[test]
    fn symbol_set_fallback_without_star_is_part_zero() {
        let mut set = SymbolValueSet::new(["red", "green"]);
        set.compile();
        assert_eq!(set.value_index("mauve"), 0);
    }

    #[test]
    fn symbol_set_fallback_with_star_is_star_part() {
        let mut set = SymbolValueSet::new(["red", STAR, "green"]);
        set.compile();
        assert_eq!(set.value_index("mauve"), 1);
    }

    #[test]
    fn symbol_set_rejects_duplicates() {
        let set = SymbolValueSet::new(["red", "red"]);
        let mut errors = DefinitionErrors::new();
        set.check_definition(&mut errors);
        assert_eq!(
            errors.errors(),
            &[DefinitionError::DuplicateValue { value: "red".into() }]
        );
    }
}
