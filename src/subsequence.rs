//! Order-preserving subsequence test
//!
//! `x` is a subsequence of `y` when `x` can be obtained from `y` by deleting
//! elements without reordering the rest. The scan walks `y` once, left to
//! right, and never backtracks. An empty `x` is a subsequence of anything.

/// Greedy subsequence test over slices.
#[inline]
pub fn is_subsequence<T: PartialEq>(x: &[T], y: &[T]) -> bool {
    if x.len() > y.len() {
        return false;
    }
    let mut rest = y.iter();
    x.iter().all(|wanted| rest.any(|candidate| candidate == wanted))
}

/// `true` when the characters of `needle` appear in `haystack` in order.
pub fn pattern_contains(haystack: &str, needle: &str) -> bool {
    let needle: Vec<char> = needle.chars().collect();
    let haystack: Vec<char> = haystack.chars().collect();
    is_subsequence(&needle, &haystack)
}
