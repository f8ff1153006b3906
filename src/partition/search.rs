//! Shared sorted-lookup routine.
//!
//! Every partition variant reduces its lookup to "first position whose sorted
//! key admits the probe". Small partitions are scanned linearly (cheaper than
//! the branch-heavy dichotomic loop on a handful of elements); larger ones
//! use dichotomic search. Both strategies are kept callable so tests can
//! assert pointwise agreement.

/// Largest element count still served by the linear scan.
pub(crate) const LINEAR_SEARCH_MAX: usize = 10;

/// First index `i` in `0..len` for which `admits(i)` is true, or `len`.
///
/// `admits` must be monotone: once true it stays true for all larger indices.
/// Dispatches to a linear scan at or below [`LINEAR_SEARCH_MAX`] elements.
#[inline]
pub(crate) fn first_admitting(len: usize, admits: impl Fn(usize) -> bool) -> usize {
    if len <= LINEAR_SEARCH_MAX {
        linear(len, admits)
    } else {
        dichotomic(len, admits)
    }
}

/// Linear variant of [`first_admitting`].
pub(crate) fn linear(len: usize, admits: impl Fn(usize) -> bool) -> usize {
    for i in 0..len {
        if admits(i) {
            return i;
        }
    }
    len
}

/// Dichotomic variant of [`first_admitting`].
pub(crate) fn dichotomic(len: usize, admits: impl Fn(usize) -> bool) -> usize {
    let mut lo = 0usize;
    let mut hi = len;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if admits(mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}
