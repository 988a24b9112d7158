use std::fmt;

use crate::alignment::AlignedContig;

use super::junction::Junction;

/// Structural signature of a contig, decided from its alignment layout alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RawCategory {
    /// Two flanks joined by a single novel adjacency.
    SimpleChimera,
    /// Strand switch on one reference contig.
    InversionSignature,
    /// Indel signature: contig bases between the flanks exceed the reference gap, or
    /// a chain of same-strand pieces walking forward along one reference contig.
    Insertion,
    /// Reference re-traversed along the contig.
    TandemDuplication,
    /// Nothing the precise caller can interpret.
    Unclassifiable,
}

impl RawCategory {
    /// Every category, in dispatch order.
    pub const ALL: [RawCategory; 5] = [
        RawCategory::SimpleChimera,
        RawCategory::InversionSignature,
        RawCategory::Insertion,
        RawCategory::TandemDuplication,
        RawCategory::Unclassifiable,
    ];

    /// Lower-case label, used for per-category output files.
    pub fn label(self) -> &'static str {
        match self {
            RawCategory::SimpleChimera => "simple_chimera",
            RawCategory::InversionSignature => "inversion",
            RawCategory::Insertion => "insertion",
            RawCategory::TandemDuplication => "tandem_duplication",
            RawCategory::Unclassifiable => "unclassifiable",
        }
    }
}

impl fmt::Display for RawCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Assign exactly one category to a contig.
pub fn classify(contig: &AlignedContig) -> RawCategory {
    if contig.has_equally_good_alignment_config {
        return RawCategory::Unclassifiable;
    }

    match contig.alignments.len() {
        0 | 1 => RawCategory::Unclassifiable,
        2 => {
            let junction = Junction {
                first: &contig.alignments[0],
                second: &contig.alignments[1],
            };
            classify_single_junction(&junction)
        }
        _ => classify_multi_junction(contig),
    }
}

fn classify_single_junction(junction: &Junction<'_>) -> RawCategory {
    if junction.is_inter_contig() {
        return RawCategory::SimpleChimera;
    }
    if junction.is_strand_switch() {
        return RawCategory::InversionSignature;
    }
    let contig_gap = junction.contig_gap();
    match junction.reference_gap() {
        Some(gap) if gap < 0 => RawCategory::TandemDuplication,
        Some(gap) if contig_gap > gap => RawCategory::Insertion,
        _ => RawCategory::SimpleChimera,
    }
}

fn classify_multi_junction(contig: &AlignedContig) -> RawCategory {
    let first = &contig.alignments[0];
    let one_contig = contig
        .alignments
        .iter()
        .all(|interval| interval.contig() == first.contig());
    if !one_contig {
        return RawCategory::Unclassifiable;
    }

    let junctions: Vec<_> = Junction::all(&contig.alignments).collect();
    if junctions.iter().all(Junction::is_strand_switch) {
        return RawCategory::InversionSignature;
    }
    let re_traversed = junctions
        .iter()
        .all(|junction| matches!(junction.reference_gap(), Some(gap) if gap < 0));
    if re_traversed {
        return RawCategory::TandemDuplication;
    }
    let forward_chain = junctions
        .iter()
        .all(|junction| matches!(junction.reference_gap(), Some(gap) if gap >= 0));
    if forward_chain {
        return RawCategory::Insertion;
    }
    RawCategory::Unclassifiable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::Strand;
    use crate::inference::junction::fixtures::interval;
    use std::sync::Arc;
    use test_case::test_case;

    fn contig(intervals: Vec<crate::alignment::AlignmentInterval>, ambiguous: bool) -> AlignedContig {
        AlignedContig::new("asm000001:tig00000", Arc::from(vec![b'A'; 300]), intervals, ambiguous)
    }

    #[test_case("chr2", 151, (101, 200), Strand::Forward => RawCategory::SimpleChimera ; "inter chromosome")]
    #[test_case("chr1", 5000, (101, 200), Strand::Reverse => RawCategory::InversionSignature ; "strand switch")]
    #[test_case("chr1", 51, (101, 200), Strand::Forward => RawCategory::TandemDuplication ; "re-traversed reference")]
    #[test_case("chr1", 101, (131, 230), Strand::Forward => RawCategory::Insertion ; "extra contig bases")]
    #[test_case("chr1", 151, (101, 200), Strand::Forward => RawCategory::SimpleChimera ; "plain deletion")]
    fn two_interval_shapes(chrom: &str, ref_start: u32, span: (u32, u32), strand: Strand) -> RawCategory {
        let len = span.1.max(200);
        classify(&contig(
            vec![
                interval("chr1", 1, (1, 100), len, Strand::Forward),
                interval(chrom, ref_start, span, len, strand),
            ],
            false,
        ))
    }

    #[test]
    fn ambiguous_and_single_interval_contigs_are_unclassifiable() {
        let pair = vec![
            interval("chr1", 1, (1, 100), 200, Strand::Forward),
            interval("chr2", 1, (101, 200), 200, Strand::Forward),
        ];
        assert_eq!(classify(&contig(pair, true)), RawCategory::Unclassifiable);
        let single = vec![interval("chr1", 1, (1, 200), 200, Strand::Forward)];
        assert_eq!(classify(&contig(single, false)), RawCategory::Unclassifiable);
    }

    #[test]
    fn alternating_strands_over_three_intervals_is_an_inversion() {
        let intervals = vec![
            interval("chr1", 1, (1, 100), 300, Strand::Forward),
            interval("chr1", 1001, (101, 200), 300, Strand::Reverse),
            interval("chr1", 2001, (201, 300), 300, Strand::Forward),
        ];
        assert_eq!(
            classify(&contig(intervals, false)),
            RawCategory::InversionSignature
        );
    }

    #[test]
    fn same_strand_chain_with_gaps_is_an_indel() {
        let intervals = vec![
            interval("chr1", 1, (1, 100), 300, Strand::Forward),
            interval("chr1", 201, (101, 200), 300, Strand::Forward),
            interval("chr1", 401, (201, 300), 300, Strand::Forward),
        ];
        assert_eq!(classify(&contig(intervals, false)), RawCategory::Insertion);
    }

    #[test]
    fn chain_mixing_gaps_and_re_traversal_is_unclassifiable() {
        let intervals = vec![
            interval("chr1", 1, (1, 100), 300, Strand::Forward),
            interval("chr1", 201, (101, 200), 300, Strand::Forward),
            interval("chr1", 151, (201, 300), 300, Strand::Forward),
        ];
        assert_eq!(classify(&contig(intervals, false)), RawCategory::Unclassifiable);
    }

    #[test]
    fn mixed_three_interval_layout_is_unclassifiable() {
        let intervals = vec![
            interval("chr1", 1, (1, 100), 300, Strand::Forward),
            interval("chr1", 1001, (101, 200), 300, Strand::Forward),
            interval("chr1", 2001, (201, 300), 300, Strand::Reverse),
        ];
        assert_eq!(classify(&contig(intervals, false)), RawCategory::Unclassifiable);
    }
}
