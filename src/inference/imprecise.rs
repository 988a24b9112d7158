use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::alignment::{SimpleInterval, Strand};
use crate::calls::{CallProvenance, EvidenceSupport, Genotype, StructuralCallRecord, SvType};
use crate::config::DiscoveryConfig;
use crate::evidence::{EvidenceIndex, EvidenceTargetLink, PairedStrandedIntervalTree};
use crate::reference::ReferenceSource;

/// Scoring parameters of the imprecise detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpreciseParams {
    /// Minimum weighted support.
    pub threshold: u32,
    /// Weight of a split read.
    pub split_read_weight: u32,
    /// Weight of a read pair.
    pub read_pair_weight: u32,
}

impl ImpreciseParams {
    /// Parameters from the run configuration.
    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self {
            threshold: config.imprecise_evidence_threshold,
            split_read_weight: config.split_read_weight,
            read_pair_weight: config.read_pair_weight,
        }
    }

    /// Weighted support of a set of observations.
    pub fn support(&self, split_reads: u64, read_pairs: u64) -> u64 {
        u64::from(self.split_read_weight) * split_reads + u64::from(self.read_pair_weight) * read_pairs
    }
}

struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut idx: usize) -> usize {
        while self.parent[idx] != idx {
            self.parent[idx] = self.parent[self.parent[idx]];
            idx = self.parent[idx];
        }
        idx
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Smaller root wins so cluster identity follows index order.
            let (keep, drop) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[drop] = keep;
        }
    }
}

/// Imprecise deletions from clusters of deletion-consistent evidence links.
///
/// Links join a cluster when both of their sides overlap (transitively). A cluster
/// produces one call when its weighted support reaches the threshold; its position
/// and end sit at the midpoints of the left and right side unions, which also form
/// the confidence intervals.
pub fn detect_imprecise_variants(
    index: &EvidenceIndex,
    params: &ImpreciseParams,
    sample: &str,
    reference: &dyn ReferenceSource,
) -> Vec<StructuralCallRecord> {
    let links: Vec<&EvidenceTargetLink> = index
        .iter()
        .map(|(_, link)| link)
        .filter(|link| link.is_deletion_consistent())
        .collect();
    if links.is_empty() {
        return Vec::new();
    }

    let local: PairedStrandedIntervalTree<usize> = links
        .iter()
        .enumerate()
        .map(|(idx, link)| (link.pair.clone(), idx))
        .collect();
    let mut sets = DisjointSets::new(links.len());
    for (idx, link) in links.iter().enumerate() {
        for (_, &other) in local.overlappers(&link.pair) {
            sets.union(idx, other);
        }
    }

    let mut clusters: BTreeMap<usize, Vec<&EvidenceTargetLink>> = BTreeMap::new();
    for (idx, link) in links.iter().enumerate() {
        clusters.entry(sets.find(idx)).or_default().push(link);
    }

    let calls: Vec<StructuralCallRecord> = clusters
        .into_values()
        .filter_map(|members| cluster_call(&members, params, sample, reference))
        .collect();
    debug!(
        links = links.len(),
        calls = calls.len(),
        "imprecise deletion calls"
    );
    calls
}

fn cluster_call(
    members: &[&EvidenceTargetLink],
    params: &ImpreciseParams,
    sample: &str,
    reference: &dyn ReferenceSource,
) -> Option<StructuralCallRecord> {
    let split_reads: u64 = members.iter().map(|link| u64::from(link.split_reads)).sum();
    let read_pairs: u64 = members.iter().map(|link| u64::from(link.read_pairs)).sum();
    let support = params.support(split_reads, read_pairs);
    if support < u64::from(params.threshold) {
        debug!(
            links = members.len(),
            support,
            threshold = params.threshold,
            "dropping under-supported evidence cluster"
        );
        return None;
    }

    let left = union_of(members.iter().map(|link| &link.pair.left.interval))?;
    let right = union_of(members.iter().map(|link| &link.pair.right.interval))?;
    let start = left.midpoint();
    let end = right.midpoint().max(start);

    let mut call = StructuralCallRecord::new(
        Arc::clone(&left.contig),
        start,
        end,
        SvType::Deletion,
        (Strand::Forward, Strand::Reverse),
        CallProvenance::Imprecise,
    );
    call.ref_allele = reference.base(&left.contig, start).unwrap_or(b'N');
    call.genotype = Genotype::no_call(sample);
    call.evidence = Some(EvidenceSupport {
        split_reads: u32::try_from(split_reads).unwrap_or(u32::MAX),
        read_pairs: u32::try_from(read_pairs).unwrap_or(u32::MAX),
    });
    call.junction_count = members.len() as u32;
    call.ci_pos = Some(left);
    call.ci_end = Some(right);
    Some(call)
}

fn union_of<'a>(mut intervals: impl Iterator<Item = &'a SimpleInterval>) -> Option<SimpleInterval> {
    let first = intervals.next()?.clone();
    intervals.try_fold(first, |acc, interval| acc.span_with(interval))
}
