//! Structural definition errors.
//!
//! All recoverable errors in this crate surface at compile/validation time;
//! a successfully compiled pipeline cannot fail during per-record
//! evaluation. Validation collects every problem it finds into a
//! [`DefinitionErrors`] batch instead of stopping at the first one, so a
//! caller fixing a hand-written partition description sees the full list.

use crate::value::AttributeKind;

/// A single structural problem found while validating a definition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("interval bounds not strictly increasing: bound[{index}] = {bound} does not exceed bound[{}] = {previous}", .index - 1)]
    UnorderedBounds {
        index: usize,
        bound: f64,
        previous: f64,
    },

    #[error("value set is empty")]
    EmptyValueSet,

    #[error("duplicate value {value:?} in value set")]
    DuplicateValue { value: String },

    #[error("duplicate numeric value {value} in value set")]
    DuplicateNumericValue { value: f64 },

    #[error("value set not in ascending order at position {index}")]
    UnorderedValues { index: usize },

    #[error("value group {group} is empty")]
    EmptyGroup { group: usize },

    #[error("value {value:?} appears in groups {first} and {second}")]
    ValueInMultipleGroups {
        value: String,
        first: usize,
        second: usize,
    },

    #[error("star value missing: no group contains the wildcard")]
    MissingStar,

    #[error("star value duplicated: groups {first} and {second} both contain the wildcard")]
    DuplicatedStar { first: usize, second: usize },

    #[error("partition has no dimensions")]
    EmptyPartition,

    #[error("dimension {dimension}: selector yields {selector} values but the partition expects {partition}")]
    KindMismatch {
        dimension: usize,
        selector: AttributeKind,
        partition: AttributeKind,
    },

    #[error("selector count {selectors} does not match dimension count {dimensions}")]
    SelectorCountMismatch { selectors: usize, dimensions: usize },

    #[error("total cell count overflows: product of part counts exceeds {max}", max = i32::MAX)]
    CellCountOverflow,

    #[error("construction rule {name:?} is already registered")]
    DuplicateRuleName { name: String },

    #[error("construction rule {name:?} is not registered")]
    UnknownRuleName { name: String },
}

/// A batch of definition errors collected during one validation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionErrors {
    errors: Vec<DefinitionError>,
}

impl std::error::Error for DefinitionErrors {}

impl std::fmt::Display for DefinitionErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} definition error(s)", self.errors.len())?;
        for e in &self.errors {
            write!(f, "\n  - {e}")?;
        }
        Ok(())
    }
}

impl DefinitionErrors {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one error.
    pub fn push(&mut self, error: DefinitionError) {
        self.errors.push(error);
    }

    /// Whether any error was recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[DefinitionError] {
        &self.errors
    }

    /// `Ok(())` when empty, otherwise the batch as an error.
    pub fn into_result(self) -> Result<(), DefinitionErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<DefinitionError> for DefinitionErrors {
    fn from(error: DefinitionError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_collects_multiple_errors() {
        let mut batch = DefinitionErrors::new();
        assert!(batch.is_empty());

        batch.push(DefinitionError::EmptyValueSet);
        batch.push(DefinitionError::MissingStar);

        let err = batch.into_result().unwrap_err();
        assert_eq!(err.errors().len(), 2);
        let msg = err.to_string();
        assert!(msg.contains("2 definition error(s)"));
        assert!(msg.contains("value set is empty"));
        assert!(msg.contains("star value missing"));
    }

    #[test]
    fn empty_batch_is_ok() {
        assert!(DefinitionErrors::new().into_result().is_ok());
    }
}
