use std::sync::Arc;

use crate::alignment::{AlignmentInterval, ReferenceNames, Strand};

/// Adjacency between two consecutive alignment intervals of a contig.
#[derive(Debug, Clone, Copy)]
pub struct Junction<'a> {
    /// Interval earlier along the contig.
    pub first: &'a AlignmentInterval,
    /// Interval right after it.
    pub second: &'a AlignmentInterval,
}

/// One side of a novel adjacency: the reference base next to the junction and the
/// strand of the segment it belongs to (`+` when the segment lies to its left).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct JunctionSide {
    /// Reference contig.
    pub contig: Arc<str>,
    /// Junction-proximal reference base.
    pub position: u32,
    /// Side strand.
    pub strand: Strand,
}

impl<'a> Junction<'a> {
    /// Every junction of an ordered interval list.
    pub fn all(intervals: &'a [AlignmentInterval]) -> impl Iterator<Item = Junction<'a>> + 'a {
        intervals.windows(2).map(|pair| Junction {
            first: &pair[0],
            second: &pair[1],
        })
    }

    /// Contig bases between the two intervals; negative when they overlap on the contig.
    pub fn contig_gap(&self) -> i64 {
        i64::from(self.second.start_in_contig) - i64::from(self.first.end_in_contig) - 1
    }

    /// Flanks on different reference contigs.
    pub fn is_inter_contig(&self) -> bool {
        self.first.contig() != self.second.contig()
    }

    /// Flanks on opposite strands.
    pub fn is_strand_switch(&self) -> bool {
        self.first.strand != self.second.strand
    }

    /// Reference bases skipped walking along the contig, for same-contig same-strand
    /// flanks; negative when the reference is re-traversed.
    pub fn reference_gap(&self) -> Option<i64> {
        if self.is_inter_contig() || self.is_strand_switch() {
            return None;
        }
        let (first, second) = (&self.first.reference_span, &self.second.reference_span);
        Some(match self.first.strand {
            Strand::Forward => i64::from(second.start) - i64::from(first.end) - 1,
            Strand::Reverse => i64::from(first.start) - i64::from(second.end) - 1,
        })
    }

    /// Junction-proximal side of the first interval.
    pub fn first_side(&self) -> JunctionSide {
        let span = &self.first.reference_span;
        match self.first.strand {
            Strand::Forward => JunctionSide::new(span.contig.clone(), span.end, Strand::Forward),
            Strand::Reverse => JunctionSide::new(span.contig.clone(), span.start, Strand::Reverse),
        }
    }

    /// Junction-proximal side of the second interval.
    pub fn second_side(&self) -> JunctionSide {
        let span = &self.second.reference_span;
        match self.second.strand {
            Strand::Forward => JunctionSide::new(span.contig.clone(), span.start, Strand::Reverse),
            Strand::Reverse => JunctionSide::new(span.contig.clone(), span.end, Strand::Forward),
        }
    }

    /// Both sides in reference order: dictionary index, then position.
    pub fn ordered_sides(&self, names: &ReferenceNames) -> (JunctionSide, JunctionSide) {
        let (a, b) = (self.first_side(), self.second_side());
        let key = |side: &JunctionSide| {
            (names.rank(&side.contig), Arc::clone(&side.contig), side.position)
        };
        if key(&a) <= key(&b) {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl JunctionSide {
    fn new(contig: Arc<str>, position: u32, strand: Strand) -> Self {
        Self {
            contig,
            position,
            strand,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::interval;
    use super::*;

    fn names() -> ReferenceNames {
        ReferenceNames::new([("chr1", 10_000), ("chr2", 10_000), ("chr10", 10_000)])
    }

    #[test]
    fn forward_deletion_geometry() {
        let intervals = [
            interval("chr1", 1, (1, 100), 200, Strand::Forward),
            interval("chr1", 151, (101, 200), 200, Strand::Forward),
        ];
        let junction = Junction::all(&intervals).next().unwrap();
        assert_eq!(junction.contig_gap(), 0);
        assert_eq!(junction.reference_gap(), Some(50));
        let (left, right) = junction.ordered_sides(&names());
        assert_eq!((left.position, left.strand), (100, Strand::Forward));
        assert_eq!((right.position, right.strand), (151, Strand::Reverse));
    }

    #[test]
    fn reverse_strand_gap_runs_against_the_reference() {
        let intervals = [
            interval("chr1", 1151, (1, 100), 200, Strand::Reverse),
            interval("chr1", 1001, (101, 200), 200, Strand::Reverse),
        ];
        let junction = Junction::all(&intervals).next().unwrap();
        assert_eq!(junction.reference_gap(), Some(50));
        let (left, right) = junction.ordered_sides(&names());
        assert_eq!((left.position, left.strand), (1100, Strand::Forward));
        assert_eq!((right.position, right.strand), (1151, Strand::Reverse));
    }

    #[test]
    fn sides_follow_dictionary_order_not_name_order() {
        let intervals = [
            interval("chr10", 501, (1, 100), 200, Strand::Forward),
            interval("chr2", 3001, (101, 200), 200, Strand::Forward),
        ];
        let junction = Junction::all(&intervals).next().unwrap();
        let (left, right) = junction.ordered_sides(&names());
        assert_eq!((left.contig.as_ref(), left.position), ("chr2", 3001));
        assert_eq!((right.contig.as_ref(), right.position), ("chr10", 600));
    }
}
