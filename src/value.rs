//! Typed values, selectors, and sparse-key resolution.
//!
//! This module defines the narrow contracts the engine requires from its
//! collaborators:
//! - [`Value`] - a typed field value read out of a record
//! - [`ValueSelector`] - an opaque capability extracting one value per record
//! - [`SparseKeyIndexer`] - maps domain keys (NKeys, block keys) to dense slots
//!
//! # Missing Values
//!
//! Missing numeric values are represented by the [`MISSING`] sentinel, which
//! orders below every finite value. An interval partition whose first bound
//! equals `MISSING` therefore gets a dedicated missing part with no special
//! casing in the lookup path.

/// Numeric missing-value sentinel.
///
/// Orders strictly below every finite value, so the "value <= bound" rule of
/// interval lookup places missing values in a leading missing part when one
/// is declared.
pub const MISSING: f64 = f64::NEG_INFINITY;

/// Reserved wildcard categorical value meaning "any unlisted value".
pub const STAR: &str = "*";

// ============================================================================
// AttributeKind
// ============================================================================

/// Whether an attribute carries numeric or categorical values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttributeKind {
    /// Continuous numeric attribute.
    #[default]
    Numeric,
    /// Categorical (symbolic) attribute.
    Categorical,
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeKind::Numeric => write!(f, "Numeric"),
            AttributeKind::Categorical => write!(f, "Categorical"),
        }
    }
}

// ============================================================================
// Value
// ============================================================================

/// A typed field value read from a record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value<'a> {
    /// A numeric value; [`MISSING`] encodes absence.
    Numeric(f64),
    /// A categorical value; the empty string encodes absence.
    Categorical(&'a str),
}

impl Value<'_> {
    /// Kind of this value.
    #[inline]
    pub fn kind(&self) -> AttributeKind {
        match self {
            Value::Numeric(_) => AttributeKind::Numeric,
            Value::Categorical(_) => AttributeKind::Categorical,
        }
    }
}

/// An owned field value, used where records store their own fields.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Numeric(f64),
    Categorical(String),
}

impl FieldValue {
    /// Borrowed view of this field.
    #[inline]
    pub fn as_value(&self) -> Value<'_> {
        match self {
            FieldValue::Numeric(v) => Value::Numeric(*v),
            FieldValue::Categorical(s) => Value::Categorical(s),
        }
    }

    /// Kind of this field.
    #[inline]
    pub fn kind(&self) -> AttributeKind {
        match self {
            FieldValue::Numeric(_) => AttributeKind::Numeric,
            FieldValue::Categorical(_) => AttributeKind::Categorical,
        }
    }
}

// ============================================================================
// ValueSelector
// ============================================================================

/// Capability extracting one typed value per record.
///
/// Selectors declare their value kind up front so a [`Partition`] can verify
/// kind agreement with its dimensions at compile time; after a successful
/// compile, evaluation never kind-faults.
///
/// [`Partition`]: crate::partition::Partition
pub trait ValueSelector<R: ?Sized> {
    /// Kind of value this selector yields.
    fn kind(&self) -> AttributeKind;

    /// Extract the value from a record.
    fn select<'a>(&self, record: &'a R) -> Value<'a>;
}

/// Selector reading a fixed field position out of a `[FieldValue]` record.
#[derive(Clone, Copy, Debug)]
pub struct FieldSelector {
    field: usize,
    kind: AttributeKind,
}

impl FieldSelector {
    /// Selector for a numeric field at `field`.
    pub fn numeric(field: usize) -> Self {
        Self {
            field,
            kind: AttributeKind::Numeric,
        }
    }

    /// Selector for a categorical field at `field`.
    pub fn categorical(field: usize) -> Self {
        Self {
            field,
            kind: AttributeKind::Categorical,
        }
    }

    /// Field position this selector reads.
    #[inline]
    pub fn field(&self) -> usize {
        self.field
    }
}

impl<R: AsRef<[FieldValue]> + ?Sized> ValueSelector<R> for FieldSelector {
    #[inline]
    fn kind(&self) -> AttributeKind {
        self.kind
    }

    #[inline]
    fn select<'a>(&self, record: &'a R) -> Value<'a> {
        record.as_ref()[self.field].as_value()
    }
}

// ============================================================================
// SparseKeyIndexer
// ============================================================================

/// Maps a domain key (an NKey or a block sparse key) to a dense sparse slot.
///
/// Keys the caller did not request resolve to `None` and are dropped
/// silently by the engine; this is not an error.
pub trait SparseKeyIndexer {
    /// Number of dense slots this indexer can hand out.
    fn slot_count(&self) -> usize;

    /// Dense slot for `key`, or `None` when the key is not requested.
    fn slot_of(&self, key: usize) -> Option<usize>;
}

/// Indexer granting every key in `1..=count` its own slot (`key - 1`).
#[derive(Clone, Copy, Debug)]
pub struct IdentityIndexer {
    count: usize,
}

impl IdentityIndexer {
    /// Identity indexer over keys `1..=count`.
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl SparseKeyIndexer for IdentityIndexer {
    #[inline]
    fn slot_count(&self) -> usize {
        self.count
    }

    #[inline]
    fn slot_of(&self, key: usize) -> Option<usize> {
        (key >= 1 && key <= self.count).then(|| key - 1)
    }
}

/// Indexer granting slots to an explicit ascending subset of keys.
#[derive(Clone, Debug)]
pub struct SubsetIndexer {
    /// Requested keys, ascending and distinct. Slot = position in this list.
    keys: Vec<usize>,
}

impl SubsetIndexer {
    /// Indexer over the given keys.
    ///
    /// # Panics
    ///
    /// Panics if `keys` is not strictly ascending.
    pub fn new(keys: Vec<usize>) -> Self {
        assert!(
            keys.windows(2).all(|w| w[0] < w[1]),
            "requested keys must be strictly ascending"
        );
        Self { keys }
    }

    /// Requested keys, ascending.
    pub fn keys(&self) -> &[usize] {
        &self.keys
    }
}

impl SparseKeyIndexer for SubsetIndexer {
    #[inline]
    fn slot_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    fn slot_of(&self, key: usize) -> Option<usize> {
        self.keys.binary_search(&key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_orders_below_everything() {
        assert!(MISSING < f64::MIN);
        assert!(MISSING < 0.0);
    }

    #[test]
    fn field_selector_reads_typed_fields() {
        let record = vec![
            FieldValue::Numeric(3.5),
            FieldValue::Categorical("red".into()),
        ];
        let num = FieldSelector::numeric(0);
        let cat = FieldSelector::categorical(1);

        assert_eq!(num.select(&record), Value::Numeric(3.5));
        assert_eq!(cat.select(&record), Value::Categorical("red"));
        assert_eq!(
            ValueSelector::<[FieldValue]>::kind(&num),
            AttributeKind::Numeric
        );
        assert_eq!(
            ValueSelector::<[FieldValue]>::kind(&cat),
            AttributeKind::Categorical
        );
    }

    #[test]
    fn identity_indexer_grants_all_keys() {
        let idx = IdentityIndexer::new(4);
        assert_eq!(idx.slot_count(), 4);
        assert_eq!(idx.slot_of(1), Some(0));
        assert_eq!(idx.slot_of(4), Some(3));
        assert_eq!(idx.slot_of(0), None);
        assert_eq!(idx.slot_of(5), None);
    }

    #[test]
    fn subset_indexer_grants_requested_keys_only() {
        let idx = SubsetIndexer::new(vec![2, 5, 9]);
        assert_eq!(idx.slot_count(), 3);
        assert_eq!(idx.slot_of(2), Some(0));
        assert_eq!(idx.slot_of(5), Some(1));
        assert_eq!(idx.slot_of(9), Some(2));
        assert_eq!(idx.slot_of(3), None);
    }

    #[test]
    #[should_panic(expected = "strictly ascending")]
    fn subset_indexer_rejects_unsorted_keys() {
        SubsetIndexer::new(vec![5, 2]);
    }
}
