//! Freshness-stamped lazy caches.
//!
//! Several structures in this crate own a derived artifact that is expensive
//! to rebuild and only changes when the owner is structurally mutated: the
//! sorted value-to-group table of a value grouping, the sorted catalog of a
//! construction domain. The protocol is always the same: the owner carries a
//! monotonically increasing generation counter bumped on every structural
//! mutation, and the derived artifact carries the generation it was built at.
//! A read first ensures the artifact is fresh, rebuilding at most once per
//! mutation.

/// A derived value stamped with the owner generation it was built at.
#[derive(Clone, Debug, Default)]
pub struct Cached<T> {
    stamp: u64,
    value: T,
}

impl<T> Cached<T> {
    /// An empty cache, stale against any generation >= 1.
    pub fn new(value: T) -> Self {
        Self { stamp: 0, value }
    }

    /// Whether the cached value was built at `generation`.
    #[inline]
    pub fn is_fresh(&self, generation: u64) -> bool {
        self.stamp == generation
    }

    /// Rebuild the cached value if the owner generation has advanced.
    ///
    /// `rebuild` runs at most once per generation advance; a fresh cache is
    /// returned untouched.
    pub fn ensure(&mut self, generation: u64, rebuild: impl FnOnce() -> T) -> &T {
        if self.stamp != generation {
            self.value = rebuild();
            self.stamp = generation;
        }
        &self.value
    }

    /// The cached value, valid only when fresh.
    ///
    /// # Panics
    ///
    /// Panics if the cache is stale against `generation`; callers must have
    /// ensured freshness first (a compiled-only precondition).
    #[inline]
    pub fn get(&self, generation: u64) -> &T {
        assert!(
            self.stamp == generation,
            "stale cache read: built at generation {}, owner at {}",
            self.stamp,
            generation
        );
        &self.value
    }
}

/// A monotonically increasing generation counter.
///
/// Starts at 1 so a default [`Cached`] (stamp 0) is always stale.
#[derive(Clone, Copy, Debug)]
pub struct Generation(u64);

impl Default for Generation {
    fn default() -> Self {
        Self(1)
    }
}

impl Generation {
    /// Current generation.
    #[inline]
    pub fn current(&self) -> u64 {
        self.0
    }

    /// Advance after a structural mutation.
    #[inline]
    pub fn bump(&mut self) {
        self.0 += 1;
    }
}
