use proptest::prelude::*;
use sv_discovery::alignment::{
    contig_span_from_cigar, reference_length, split_gapped_alignment, unclipped_length,
    AlignmentInterval, AlignmentOrigin, CigarOp, CigarOpKind, SimpleInterval, Strand,
};

/// Blocks of gap operations, each followed by a match run.
type Blocks = Vec<(Vec<(bool, u32)>, u32)>;

fn gapped_interval() -> impl Strategy<Value = (AlignmentInterval, Blocks)> {
    (
        0u32..20,
        1u32..60,
        prop::collection::vec(
            (prop::collection::vec((any::<bool>(), 1u32..80), 1..3), 1u32..60),
            0..5,
        ),
        0u32..20,
        any::<bool>(),
        1u32..50_000,
    )
        .prop_map(|(lead, first, blocks, trail, reverse, ref_start)| {
            let mut cigar = Vec::new();
            if lead > 0 {
                cigar.push(CigarOp::new(CigarOpKind::SoftClip, lead));
            }
            cigar.push(CigarOp::new(CigarOpKind::Match, first));
            for (gaps, matched) in &blocks {
                for &(insertion, len) in gaps {
                    let kind = if insertion {
                        CigarOpKind::Insertion
                    } else {
                        CigarOpKind::Deletion
                    };
                    cigar.push(CigarOp::new(kind, len));
                }
                cigar.push(CigarOp::new(CigarOpKind::Match, *matched));
            }
            if trail > 0 {
                cigar.push(CigarOp::new(CigarOpKind::HardClip, trail));
            }

            let strand = if reverse { Strand::Reverse } else { Strand::Forward };
            let (start_in_contig, end_in_contig) = contig_span_from_cigar(&cigar, strand);
            let ref_len = reference_length(&cigar);
            let interval = AlignmentInterval {
                reference_span: SimpleInterval::new("chr1", ref_start, ref_start + ref_len - 1),
                start_in_contig,
                end_in_contig,
                strand,
                cigar,
                mapq: 60,
                mismatches: Some(2),
                score: 100,
                origin: AlignmentOrigin::Aligner,
            };
            (interval, blocks)
        })
}

fn matched_bases(cigar: &[CigarOp]) -> u32 {
    cigar
        .iter()
        .filter(|op| op.kind == CigarOpKind::Match)
        .map(|op| op.len)
        .sum()
}

proptest! {
    #[test]
    fn pieces_partition_the_original(
        (interval, blocks) in gapped_interval(),
        sensitivity in 10u32..60,
    ) {
        let pieces = split_gapped_alignment(&interval, sensitivity);
        let large_runs = blocks
            .iter()
            .filter(|(gaps, _)| gaps.iter().any(|&(_, len)| len >= sensitivity))
            .count();
        prop_assert_eq!(pieces.len(), large_runs + 1);
        if large_runs == 0 {
            prop_assert_eq!(&pieces[0], &interval);
        }

        let contig_len = unclipped_length(&interval.cigar);
        for piece in &pieces {
            prop_assert!(piece.is_consistent(contig_len));
            prop_assert_eq!(piece.strand, interval.strand);
            prop_assert_eq!(piece.contig(), interval.contig());
        }

        let matched: u32 = pieces.iter().map(|piece| matched_bases(&piece.cigar)).sum();
        prop_assert_eq!(matched, matched_bases(&interval.cigar));

        prop_assert_eq!(pieces[0].reference_span.start, interval.reference_span.start);
        prop_assert_eq!(
            pieces[pieces.len() - 1].reference_span.end,
            interval.reference_span.end
        );
        for pair in pieces.windows(2) {
            prop_assert!(pair[0].reference_span.end < pair[1].reference_span.start);
        }

        let mut along_contig: Vec<_> = pieces
            .iter()
            .map(|piece| (piece.start_in_contig, piece.end_in_contig))
            .collect();
        along_contig.sort_unstable();
        prop_assert_eq!(along_contig[0].0, interval.start_in_contig);
        prop_assert_eq!(along_contig[along_contig.len() - 1].1, interval.end_in_contig);
        for pair in along_contig.windows(2) {
            prop_assert!(pair[0].1 < pair[1].0);
        }
    }

    #[test]
    fn splitting_is_idempotent_on_pieces(
        (interval, _) in gapped_interval(),
        sensitivity in 10u32..60,
    ) {
        for piece in split_gapped_alignment(&interval, sensitivity) {
            prop_assert_eq!(split_gapped_alignment(&piece, sensitivity), vec![piece]);
        }
    }
}
