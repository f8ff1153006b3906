//! Import/export of external discretization and grouping descriptions.
//!
//! The narrow persistence contract of the engine: a partition can be rebuilt
//! from, or dumped to, a plain description of its bounds, values, or groups.
//! Both directions copy verbatim, preserving order and part count, so
//! `export_to(import_from(x)) == x`. The descriptions derive serde traits;
//! the encoding itself (JSON or otherwise) belongs to the host.

use serde::{Deserialize, Serialize};

use super::grouping::{SymbolValueSet, ValueGroup, ValueGroups};
use super::univariate::{ContinuousValueSet, IntervalBounds, UnivariatePartition};
use crate::partition::Partition;

/// External description of one univariate partition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnivariateDescription {
    /// Interval partition: ascending bounds.
    IntervalBounds { bounds: Vec<f64> },
    /// Nearest-representative partition: ascending values.
    ContinuousValueSet { values: Vec<f64> },
    /// Value grouping: one value list per group, star included verbatim.
    ValueGroups { groups: Vec<Vec<String>> },
    /// Symbol set: one value per part.
    SymbolValueSet { values: Vec<String> },
}

/// External description of a multivariate partition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionDescription {
    pub dimensions: Vec<UnivariateDescription>,
}

impl UnivariatePartition {
    /// Build a partition from an external description, copying verbatim.
    ///
    /// The result is unvalidated and uncompiled, like one built by hand.
    pub fn import_from(description: &UnivariateDescription) -> Self {
        match description {
            UnivariateDescription::IntervalBounds { bounds } => {
                IntervalBounds::new(bounds.clone()).into()
            }
            UnivariateDescription::ContinuousValueSet { values } => {
                ContinuousValueSet::new(values.clone()).into()
            }
            UnivariateDescription::ValueGroups { groups } => ValueGroups::new(
                groups
                    .iter()
                    .map(|values| ValueGroup::new(values.iter().cloned()))
                    .collect(),
            )
            .into(),
            UnivariateDescription::SymbolValueSet { values } => {
                SymbolValueSet::new(values.iter().cloned()).into()
            }
        }
    }

    /// Dump this partition to an external description, copying verbatim.
    pub fn export_to(&self) -> UnivariateDescription {
        match self {
            UnivariatePartition::Interval(p) => UnivariateDescription::IntervalBounds {
                bounds: p.bounds().to_vec(),
            },
            UnivariatePartition::ContinuousSet(p) => UnivariateDescription::ContinuousValueSet {
                values: p.values().to_vec(),
            },
            UnivariatePartition::Groups(p) => UnivariateDescription::ValueGroups {
                groups: p
                    .groups()
                    .iter()
                    .map(|g| g.values().to_vec())
                    .collect(),
            },
            UnivariatePartition::SymbolSet(p) => UnivariateDescription::SymbolValueSet {
                values: p.values().to_vec(),
            },
        }
    }
}

impl Partition {
    /// Build an uncompiled grid from an external description.
    pub fn import_from(description: &PartitionDescription) -> Self {
        Partition::new(
            description
                .dimensions
                .iter()
                .map(UnivariatePartition::import_from)
                .collect(),
        )
    }

    /// Dump this grid to an external description.
    pub fn export_to(&self) -> PartitionDescription {
        PartitionDescription {
            dimensions: self.dimensions().iter().map(UnivariatePartition::export_to).collect(),
        }
    }
}
