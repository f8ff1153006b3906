//! Construction-rule catalog: the registry of feature-engineering operators.
//!
//! A [`ConstructionDomain`] owns a set of [`ConstructionRule`]s keyed by
//! name. Rules are tagged by the [`ConstructionFamily`] of their primary
//! input, carry usage and priority flags consumed by the hosting pipeline,
//! and may bundle a partition variant and a block variant alongside the base
//! operator. The sorted catalog view is rebuilt lazily against a freshness
//! stamp.
//!
//! The domain is an explicit owned value, configured during a
//! single-threaded setup phase and read-only afterwards; concurrent mutation
//! is a documented precondition violation, not an enforced one.

use std::collections::HashMap;

use crate::cache::{Cached, Generation};
use crate::error::DefinitionError;
use crate::stats::StatsRule;

// ============================================================================
// ConstructionFamily
// ============================================================================

/// Family of a construction rule: the type of its primary input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstructionFamily {
    Numerical,
    Categorical,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    /// Secondary-table aggregation.
    Table,
}

impl ConstructionFamily {
    /// Whether this is one of the temporal families, disabled by the
    /// default selection policy.
    #[inline]
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ConstructionFamily::Date
                | ConstructionFamily::Time
                | ConstructionFamily::Timestamp
                | ConstructionFamily::TimestampTz
        )
    }
}

// ============================================================================
// ConstructionRule
// ============================================================================

/// One registered feature-engineering operator.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstructionRule {
    name: String,
    label: String,
    family: ConstructionFamily,
    /// The scalar reduction behind a Table-family rule, when there is one.
    stats_rule: Option<StatsRule>,
    /// Name of the partition-variant form, when the rule has one.
    partition_variant: Option<String>,
    /// Name of the block-variant form, when the rule has one.
    block_variant: Option<String>,
    /// Whether the rule participates in record selection.
    selection: bool,
    used: bool,
    priority: u32,
}

impl ConstructionRule {
    /// Rule with the given unique name, display label, and family.
    ///
    /// Non-temporal rules start used with priority 0; temporal rules start
    /// unused with priority 1.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        family: ConstructionFamily,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            family,
            stats_rule: None,
            partition_variant: None,
            block_variant: None,
            selection: false,
            used: !family.is_temporal(),
            priority: u32::from(family.is_temporal()),
        }
    }

    /// Attach the scalar reduction behind this rule.
    pub fn with_stats_rule(mut self, rule: StatsRule) -> Self {
        self.stats_rule = Some(rule);
        self
    }

    /// Register a partition-variant form under the given name.
    pub fn with_partition_variant(mut self, name: impl Into<String>) -> Self {
        self.partition_variant = Some(name.into());
        self
    }

    /// Register a block-variant form under the given name.
    pub fn with_block_variant(mut self, name: impl Into<String>) -> Self {
        self.block_variant = Some(name.into());
        self
    }

    /// Mark the rule as selection-capable.
    pub fn with_selection(mut self) -> Self {
        self.selection = true;
        self
    }

    /// Unique rule name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Family tag.
    #[inline]
    pub fn family(&self) -> ConstructionFamily {
        self.family
    }

    /// The scalar reduction behind this rule, when there is one.
    #[inline]
    pub fn stats_rule(&self) -> Option<&StatsRule> {
        self.stats_rule.as_ref()
    }

    /// Partition-variant name, when registered.
    #[inline]
    pub fn partition_variant(&self) -> Option<&str> {
        self.partition_variant.as_deref()
    }

    /// Block-variant name, when registered.
    #[inline]
    pub fn block_variant(&self) -> Option<&str> {
        self.block_variant.as_deref()
    }

    /// Whether the rule participates in record selection.
    #[inline]
    pub fn is_selection(&self) -> bool {
        self.selection
    }

    /// Whether the rule is enabled for construction.
    #[inline]
    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Construction priority; 0 is preferred.
    #[inline]
    pub fn priority(&self) -> u32 {
        self.priority
    }
}

// ============================================================================
// ConstructionDomain
// ============================================================================

/// Owned registry of construction rules plus the global construction
/// settings of a data-preparation pass.
#[derive(Clone, Debug)]
pub struct ConstructionDomain {
    rules: HashMap<String, ConstructionRule>,
    generation: Generation,
    /// Rule names sorted by (family, name); rebuilt lazily.
    catalog: Cached<Vec<String>>,

    interpretable_names: bool,
    rule_optimization: bool,
    sparse_optimization: bool,
    sparse_block_min_size: usize,
    import_attribute_costs: bool,
    construction_regularization: f64,
}

impl Default for ConstructionDomain {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
            generation: Generation::default(),
            catalog: Cached::new(Vec::new()),
            interpretable_names: true,
            rule_optimization: true,
            sparse_optimization: true,
            sparse_block_min_size: 0,
            import_attribute_costs: false,
            construction_regularization: 1.0,
        }
    }
}

impl ConstructionDomain {
    /// An empty domain with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the built-in catalog: the Table-family statistics operators
    /// with their partition and block variants, the temporal extraction
    /// rules, and the selection rule.
    pub fn initialize_standard_construction_rules(&mut self) {
        let table_stats: [(&str, &str, StatsRule, bool); 12] = [
            ("TableCount", "Count of records", StatsRule::Count, true),
            (
                "TableCountDistinct",
                "Count of distinct values",
                StatsRule::CountDistinct,
                false,
            ),
            ("TableSum", "Sum of values", StatsRule::Sum, true),
            ("TableCountSum", "Sum of values, zero default", StatsRule::CountSum, true),
            ("TableMean", "Mean of values", StatsRule::Mean, true),
            ("TableStdDev", "Standard deviation of values", StatsRule::StdDev, true),
            ("TableMedian", "Median of values", StatsRule::Median, true),
            ("TableMin", "Min of values", StatsRule::Min, true),
            ("TableMax", "Max of values", StatsRule::Max, true),
            ("TableMode", "Most frequent value", StatsRule::Mode, false),
            ("TableEntropy", "Entropy of the value distribution", StatsRule::Entropy, false),
            ("TableConcat", "Concatenation of values", StatsRule::concat(", "), false),
        ];
        for (name, label, stats, block) in table_stats {
            let mut rule = ConstructionRule::new(name, label, ConstructionFamily::Table)
                .with_stats_rule(stats)
                .with_partition_variant(format!("{name}Part"));
            if block {
                rule = rule.with_block_variant(format!("{name}Block"));
            }
            self.insert(rule).expect("standard rule names are unique");
        }

        self.insert(
            ConstructionRule::new(
                "TableSelection",
                "Selection of records",
                ConstructionFamily::Table,
            )
            .with_selection(),
        )
        .expect("standard rule names are unique");

        let temporal: [(&str, &str, ConstructionFamily); 12] = [
            ("Year", "Year of a date", ConstructionFamily::Date),
            ("Month", "Month of a date", ConstructionFamily::Date),
            ("Day", "Day of a date", ConstructionFamily::Date),
            ("WeekDay", "Week day of a date", ConstructionFamily::Date),
            ("YearDay", "Day of year of a date", ConstructionFamily::Date),
            ("Hour", "Hour of a time", ConstructionFamily::Time),
            ("Minute", "Minute of a time", ConstructionFamily::Time),
            ("DecimalTime", "Decimal hours of a time", ConstructionFamily::Time),
            ("DecimalYearTS", "Decimal year of a timestamp", ConstructionFamily::Timestamp),
            ("AbsoluteSecond", "Epoch second of a timestamp", ConstructionFamily::Timestamp),
            ("UtcTimestamp", "UTC view of a zoned timestamp", ConstructionFamily::TimestampTz),
            ("LocalTimestamp", "Local view of a zoned timestamp", ConstructionFamily::TimestampTz),
        ];
        for (name, label, family) in temporal {
            self.insert(ConstructionRule::new(name, label, family))
                .expect("standard rule names are unique");
        }
    }

    /// Number of registered rules.
    #[inline]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Look up a rule by name.
    pub fn rule(&self, name: &str) -> Option<&ConstructionRule> {
        self.rules.get(name)
    }

    /// Register a rule; its name must be free.
    pub fn insert(&mut self, rule: ConstructionRule) -> Result<(), DefinitionError> {
        if self.rules.contains_key(rule.name()) {
            return Err(DefinitionError::DuplicateRuleName {
                name: rule.name().to_string(),
            });
        }
        self.rules.insert(rule.name().to_string(), rule);
        self.generation.bump();
        Ok(())
    }

    /// Unregister and return a rule; its name must be registered.
    pub fn remove(&mut self, name: &str) -> Result<ConstructionRule, DefinitionError> {
        let rule = self
            .rules
            .remove(name)
            .ok_or_else(|| DefinitionError::UnknownRuleName {
                name: name.to_string(),
            })?;
        self.generation.bump();
        Ok(rule)
    }

    /// Enable or disable a rule.
    pub fn set_rule_used(&mut self, name: &str, used: bool) -> Result<(), DefinitionError> {
        let rule = self
            .rules
            .get_mut(name)
            .ok_or_else(|| DefinitionError::UnknownRuleName {
                name: name.to_string(),
            })?;
        rule.used = used;
        self.generation.bump();
        Ok(())
    }

    /// Apply the default selection policy: temporal families disabled with
    /// priority 1, everything else enabled with priority 0.
    pub fn select_default_construction_rules(&mut self) {
        for rule in self.rules.values_mut() {
            let temporal = rule.family.is_temporal();
            rule.used = !temporal;
            rule.priority = u32::from(temporal);
        }
        self.generation.bump();
    }

    /// All rules sorted by (family, name).
    ///
    /// The sorted view is cached and rebuilt only when a mutation has staled
    /// it since the previous call.
    pub fn all_construction_rules(&mut self) -> impl Iterator<Item = &ConstructionRule> {
        let rules = &self.rules;
        let names = self.catalog.ensure(self.generation.current(), || {
            let mut names: Vec<String> = rules.keys().cloned().collect();
            names.sort_by(|a, b| {
                let fa = rules[a].family;
                let fb = rules[b].family;
                fa.cmp(&fb).then_with(|| a.cmp(b))
            });
            names
        });
        names.iter().map(move |name| &rules[name])
    }

    /// Whether any selection-capable rule is enabled.
    pub fn is_selection_rule_used(&self) -> bool {
        self.rules.values().any(|r| r.selection && r.used)
    }

    // --- Global construction settings ---

    /// Whether constructed variables get interpretable names.
    #[inline]
    pub fn interpretable_names(&self) -> bool {
        self.interpretable_names
    }

    pub fn set_interpretable_names(&mut self, on: bool) {
        self.interpretable_names = on;
    }

    /// Whether redundant derivation rules are optimized away.
    #[inline]
    pub fn rule_optimization(&self) -> bool {
        self.rule_optimization
    }

    pub fn set_rule_optimization(&mut self, on: bool) {
        self.rule_optimization = on;
    }

    /// Whether sparse block forms are preferred where available.
    #[inline]
    pub fn sparse_optimization(&self) -> bool {
        self.sparse_optimization
    }

    pub fn set_sparse_optimization(&mut self, on: bool) {
        self.sparse_optimization = on;
    }

    /// Minimum entry count below which a sparse block is not worth building.
    #[inline]
    pub fn sparse_block_min_size(&self) -> usize {
        self.sparse_block_min_size
    }

    pub fn set_sparse_block_min_size(&mut self, size: usize) {
        self.sparse_block_min_size = size;
    }

    /// Whether attribute costs are imported from the host dictionary.
    #[inline]
    pub fn import_attribute_costs(&self) -> bool {
        self.import_attribute_costs
    }

    pub fn set_import_attribute_costs(&mut self, on: bool) {
        self.import_attribute_costs = on;
    }

    /// Regularization weight applied to construction costs.
    #[inline]
    pub fn construction_regularization(&self) -> f64 {
        self.construction_regularization
    }

    pub fn set_construction_regularization(&mut self, weight: f64) {
        self.construction_regularization = weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_domain() -> ConstructionDomain {
        let mut domain = ConstructionDomain::new();
        domain.initialize_standard_construction_rules();
        domain
    }

    #[test]
    fn standard_catalog_registers_all_families() {
        let mut domain = standard_domain();
        assert_eq!(domain.rule_count(), 25);

        let families: Vec<ConstructionFamily> = domain
            .all_construction_rules()
            .map(|r| r.family())
            .collect();
        assert!(families.contains(&ConstructionFamily::Table));
        assert!(families.contains(&ConstructionFamily::Date));
        assert!(families.contains(&ConstructionFamily::TimestampTz));
    }

    #[test]
    fn insert_rejects_duplicate_names() {
        let mut domain = standard_domain();
        let err = domain
            .insert(ConstructionRule::new(
                "TableMean",
                "again",
                ConstructionFamily::Table,
            ))
            .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DuplicateRuleName {
                name: "TableMean".into()
            }
        );
    }

    #[test]
    fn remove_rejects_unknown_names() {
        let mut domain = standard_domain();
        assert!(domain.remove("TableMean").is_ok());
        let err = domain.remove("TableMean").unwrap_err();
        assert_eq!(
            err,
            DefinitionError::UnknownRuleName {
                name: "TableMean".into()
            }
        );
    }

    #[test]
    fn catalog_is_sorted_by_family_then_name() {
        let mut domain = standard_domain();
        let keys: Vec<(ConstructionFamily, String)> = domain
            .all_construction_rules()
            .map(|r| (r.family(), r.name().to_string()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn catalog_rebuilds_after_mutation() {
        let mut domain = standard_domain();
        let before = domain.all_construction_rules().count();

        domain
            .insert(ConstructionRule::new(
                "Aardvark",
                "sorts first in its family",
                ConstructionFamily::Table,
            ))
            .unwrap();

        let names: Vec<&str> = domain.all_construction_rules().map(|r| r.name()).collect();
        assert_eq!(names.len(), before + 1);
        assert!(names.contains(&"Aardvark"));
    }

    #[test]
    fn default_selection_disables_temporal_families() {
        let mut domain = standard_domain();
        // Flip everything, then reapply the policy.
        for name in ["TableMean", "Year", "Hour"] {
            let flipped = !domain.rule(name).unwrap().is_used();
            domain.set_rule_used(name, flipped).unwrap();
        }

        domain.select_default_construction_rules();

        for rule in domain.all_construction_rules() {
            if rule.family().is_temporal() {
                assert!(!rule.is_used(), "{}", rule.name());
                assert_eq!(rule.priority(), 1, "{}", rule.name());
            } else {
                assert!(rule.is_used(), "{}", rule.name());
                assert_eq!(rule.priority(), 0, "{}", rule.name());
            }
        }
    }

    #[test]
    fn selection_rule_probe_follows_used_flag() {
        let mut domain = standard_domain();
        assert!(domain.is_selection_rule_used());
        domain.set_rule_used("TableSelection", false).unwrap();
        assert!(!domain.is_selection_rule_used());
    }

    #[test]
    fn table_rules_carry_their_variants() {
        let domain = standard_domain();
        let mean = domain.rule("TableMean").unwrap();
        assert_eq!(mean.stats_rule(), Some(&StatsRule::Mean));
        assert_eq!(mean.partition_variant(), Some("TableMeanPart"));
        assert_eq!(mean.block_variant(), Some("TableMeanBlock"));

        let mode = domain.rule("TableMode").unwrap();
        assert_eq!(mode.block_variant(), None);
    }

    #[test]
    fn settings_have_defaults_and_setters() {
        let mut domain = ConstructionDomain::new();
        assert!(domain.interpretable_names());
        assert!(domain.sparse_optimization());
        assert_eq!(domain.sparse_block_min_size(), 0);

        domain.set_sparse_block_min_size(8);
        domain.set_construction_regularization(0.5);
        assert_eq!(domain.sparse_block_min_size(), 8);
        assert_eq!(domain.construction_regularization(), 0.5);
    }
}
