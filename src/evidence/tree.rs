use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::link::PairedStrandedIntervals;

type LeftKey = (Arc<str>, u32, u32);

/// Index of paired stranded intervals answering two-sided overlap queries.
///
/// Entries are ordered by their left interval. Because a left interval can only
/// overlap the query's left side if it starts no earlier than `query.start` minus the
/// longest left interval stored on that contig, the range scan stays bounded by
/// `O(log n + k')` where `k'` counts entries whose left side is a near miss.
#[derive(Debug, Clone)]
pub struct PairedStrandedIntervalTree<V> {
    entries: BTreeMap<LeftKey, Vec<(PairedStrandedIntervals, V)>>,
    max_left_len: HashMap<Arc<str>, u32>,
    len: usize,
}

impl<V> Default for PairedStrandedIntervalTree<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            max_left_len: HashMap::new(),
            len: 0,
        }
    }
}

impl<V> PairedStrandedIntervalTree<V> {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Duplicate keys are kept side by side.
    pub fn insert(&mut self, pair: PairedStrandedIntervals, value: V) {
        let left = &pair.left.interval;
        let longest = self
            .max_left_len
            .entry(Arc::clone(&left.contig))
            .or_insert(0);
        *longest = (*longest).max(left.len());

        let key = (Arc::clone(&left.contig), left.start, left.end);
        self.entries.entry(key).or_default().push((pair, value));
        self.len += 1;
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Every entry, ordered by left interval then insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&PairedStrandedIntervals, &V)> {
        self.entries
            .values()
            .flat_map(|bucket| bucket.iter().map(|(pair, value)| (pair, value)))
    }

    /// Entries whose left and right sides both overlap the query's sides with
    /// identical strands.
    pub fn overlappers<'a>(
        &'a self,
        query: &'a PairedStrandedIntervals,
    ) -> impl Iterator<Item = (&'a PairedStrandedIntervals, &'a V)> + 'a {
        let left = &query.left.interval;
        let window = self.max_left_len.get(&left.contig).map(|&longest| {
            let lowest_start = left.start.saturating_sub(longest.saturating_sub(1));
            (
                (Arc::clone(&left.contig), lowest_start, 0),
                (Arc::clone(&left.contig), left.end, u32::MAX),
            )
        });

        window
            .into_iter()
            .flat_map(move |(low, high)| self.entries.range(low..=high))
            .flat_map(|(_, bucket)| bucket.iter())
            .filter(move |(pair, _)| pair.matches(query))
            .map(|(pair, value)| (pair, value))
    }
}

impl<V> FromIterator<(PairedStrandedIntervals, V)> for PairedStrandedIntervalTree<V> {
    fn from_iter<T: IntoIterator<Item = (PairedStrandedIntervals, V)>>(iter: T) -> Self {
        let mut tree = Self::new();
        for (pair, value) in iter {
            tree.insert(pair, value);
        }
        tree
    }
}
