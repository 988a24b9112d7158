use serde::{Deserialize, Serialize};

use crate::alignment::{SimpleInterval, Strand};

/// Reference interval paired with the strand of the breakpoint side it describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StrandedInterval {
    /// Reference interval.
    pub interval: SimpleInterval,
    /// Breakpoint side strand.
    pub strand: Strand,
}

impl StrandedInterval {
    /// Construct a stranded interval.
    pub fn new(interval: SimpleInterval, strand: Strand) -> Self {
        Self { interval, strand }
    }

    /// Same strand and overlapping intervals.
    pub fn matches(&self, other: &StrandedInterval) -> bool {
        self.strand == other.strand && self.interval.overlaps(&other.interval)
    }
}

/// Two stranded intervals joined by a putative novel adjacency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairedStrandedIntervals {
    /// First breakpoint side.
    pub left: StrandedInterval,
    /// Second breakpoint side.
    pub right: StrandedInterval,
}

impl PairedStrandedIntervals {
    /// Construct a pair.
    pub fn new(left: StrandedInterval, right: StrandedInterval) -> Self {
        Self { left, right }
    }

    /// Both sides overlap the other pair's sides with equal strands.
    pub fn matches(&self, other: &PairedStrandedIntervals) -> bool {
        self.left.matches(&other.left) && self.right.matches(&other.right)
    }

    /// Copy of the pair with both sides widened by `padding` bases.
    pub fn padded(&self, padding: u32) -> PairedStrandedIntervals {
        PairedStrandedIntervals {
            left: StrandedInterval::new(self.left.interval.padded(padding), self.left.strand),
            right: StrandedInterval::new(self.right.interval.padded(padding), self.right.strand),
        }
    }
}

/// Aggregated split-read and read-pair observations between two genomic intervals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceTargetLink {
    /// Linked breakpoint sides.
    #[serde(flatten)]
    pub pair: PairedStrandedIntervals,
    /// Split-read observations.
    pub split_reads: u32,
    /// Discordant read-pair observations.
    pub read_pairs: u32,
}

impl EvidenceTargetLink {
    /// Build a link from its sides and counts.
    pub fn new(
        left: StrandedInterval,
        right: StrandedInterval,
        split_reads: u32,
        read_pairs: u32,
    ) -> Self {
        Self {
            pair: PairedStrandedIntervals::new(left, right),
            split_reads,
            read_pairs,
        }
    }

    /// Deletion-consistent: one reference contig, `+` then `-`, left side before right.
    pub fn is_deletion_consistent(&self) -> bool {
        let PairedStrandedIntervals { left, right } = &self.pair;
        left.interval.contig == right.interval.contig
            && left.strand == Strand::Forward
            && right.strand == Strand::Reverse
            && left.interval.end < right.interval.start
    }
}
