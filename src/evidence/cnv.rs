use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::alignment::SimpleInterval;

/// Externally produced copy-number call with its posterior over integer states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CnvCall {
    /// Call identifier.
    pub id: String,
    /// Called segment.
    pub interval: SimpleInterval,
    /// Posterior (or log posterior) of copy number `0, 1, 2, ...`.
    pub copy_number_posteriors: Vec<f64>,
}

impl CnvCall {
    /// Build a call; an empty or `.` id becomes `CNV_<contig>_<start>_<end>`.
    pub fn new(id: impl Into<String>, interval: SimpleInterval, copy_number_posteriors: Vec<f64>) -> Self {
        let mut id = id.into();
        if id.is_empty() || id == "." {
            id = format!("CNV_{}_{}_{}", interval.contig, interval.start, interval.end);
        }
        Self {
            id,
            interval,
            copy_number_posteriors,
        }
    }

    /// Maximum a posteriori copy number; ties resolve to the lower state.
    pub fn map_copy_number(&self) -> Option<u32> {
        let mut best: Option<(usize, f64)> = None;
        for (state, &posterior) in self.copy_number_posteriors.iter().enumerate() {
            if posterior.is_nan() {
                continue;
            }
            match best {
                Some((_, top)) if posterior <= top => {}
                _ => best = Some((state, posterior)),
            }
        }
        best.map(|(state, _)| state as u32)
    }

    /// Number of bases shared with `other`.
    pub fn overlap_len(&self, other: &SimpleInterval) -> u32 {
        if !self.interval.overlaps(other) {
            return 0;
        }
        self.interval.end.min(other.end) - self.interval.start.max(other.start) + 1
    }
}

/// Interval index over external CNV calls.
#[derive(Debug, Clone, Default)]
pub struct CnvOverlay {
    by_contig: HashMap<Arc<str>, Vec<CnvCall>>,
    max_len: HashMap<Arc<str>, u32>,
    len: usize,
}

impl CnvOverlay {
    /// Index the given calls.
    pub fn new(calls: impl IntoIterator<Item = CnvCall>) -> Self {
        let mut overlay = Self::default();
        for call in calls {
            let contig = Arc::clone(&call.interval.contig);
            let longest = overlay.max_len.entry(Arc::clone(&contig)).or_insert(0);
            *longest = (*longest).max(call.interval.len());
            overlay.by_contig.entry(contig).or_default().push(call);
            overlay.len += 1;
        }
        for calls in overlay.by_contig.values_mut() {
            calls.sort_by(|a, b| {
                (a.interval.start, a.interval.end, &a.id).cmp(&(b.interval.start, b.interval.end, &b.id))
            });
        }
        overlay
    }

    /// Number of indexed calls.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the overlay holds no calls.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Calls overlapping `interval`, ordered by start.
    pub fn overlapping<'a: 'b, 'b>(&'a self, interval: &'b SimpleInterval) -> impl Iterator<Item = &'a CnvCall> + 'b {
        let calls = self
            .by_contig
            .get(&interval.contig)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let longest = self.max_len.get(&interval.contig).copied().unwrap_or(0);
        let lowest_start = interval.start.saturating_sub(longest);
        let first = calls.partition_point(|call| call.interval.start < lowest_start);
        calls[first..]
            .iter()
            .take_while(move |call| call.interval.start <= interval.end)
            .filter(move |call| call.interval.overlaps(interval))
    }

    /// Overlapping call sharing the most bases with `interval`; earliest wins ties.
    pub fn best_overlap(&self, interval: &SimpleInterval) -> Option<&CnvCall> {
        let mut best: Option<(&CnvCall, u32)> = None;
        for call in self.overlapping(interval) {
            let shared = call.overlap_len(interval);
            if best.map_or(true, |(_, top)| shared > top) {
                best = Some((call, shared));
            }
        }
        best.map(|(call, _)| call)
    }

    /// Look a call up by identifier.
    pub fn get(&self, id: &str) -> Option<&CnvCall> {
        self.by_contig
            .values()
            .flat_map(|calls| calls.iter())
            .find(|call| call.id == id)
    }
}
