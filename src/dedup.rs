//! Group-by-count over a stream of tuples.

use indexmap::IndexMap;
use std::hash::Hash;

/// Count occurrences of each distinct value, in first-occurrence order.
///
/// Drains `items` completely before returning.
pub fn distinct_count<T, I>(items: I) -> Vec<(T, u64)>
where
    T: Eq + Hash,
    I: IntoIterator<Item = T>,
{
    distinct_count_weighted(items.into_iter().map(|item| (item, 1)))
}

/// Like [`distinct_count`], but each item carries its own multiplicity.
pub fn distinct_count_weighted<T, I>(items: I) -> Vec<(T, u64)>
where
    T: Eq + Hash,
    I: IntoIterator<Item = (T, u64)>,
{
    let mut counts: IndexMap<T, u64> = IndexMap::new();
    for (item, n) in items {
        *counts.entry(item).or_insert(0) += n;
    }
    counts.into_iter().collect()
}
