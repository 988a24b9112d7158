use std::sync::Arc;

use proptest::prelude::*;
use sv_discovery::alignment::{
    contig_span_from_cigar, AlignedContig, AlignmentInterval, AlignmentOrigin, CigarOp,
    CigarOpKind, ReferenceNames, SimpleInterval, Strand,
};
use sv_discovery::calls::SvType;
use sv_discovery::inference::{call_contig, classify, PreciseCallParams, RawCategory};
use sv_discovery::{DiscoveryConfig, InMemoryReference};

const CONTIG_LEN: u32 = 500;

fn interval(chrom: &str, ref_start: u32, span: (u32, u32), strand: Strand) -> AlignmentInterval {
    let aligned = span.1 - span.0 + 1;
    let (head, tail) = (span.0 - 1, CONTIG_LEN - span.1);
    let (leading, trailing) = if strand.is_reverse() { (tail, head) } else { (head, tail) };
    let mut cigar = Vec::new();
    if leading > 0 {
        cigar.push(CigarOp::new(CigarOpKind::SoftClip, leading));
    }
    cigar.push(CigarOp::new(CigarOpKind::Match, aligned));
    if trailing > 0 {
        cigar.push(CigarOp::new(CigarOpKind::SoftClip, trailing));
    }
    let (start_in_contig, end_in_contig) = contig_span_from_cigar(&cigar, strand);
    AlignmentInterval {
        reference_span: SimpleInterval::new(chrom, ref_start, ref_start + aligned - 1),
        start_in_contig,
        end_in_contig,
        strand,
        cigar,
        mapq: 60,
        mismatches: Some(0),
        score: aligned as i32,
        origin: AlignmentOrigin::Aligner,
    }
}

fn aligned_contig() -> impl Strategy<Value = AlignedContig> {
    (
        prop::collection::vec(
            (
                prop::sample::select(vec!["chr1", "chr2"]),
                1u32..5_000,
                1u32..400,
                20u32..100,
                any::<bool>(),
            ),
            0..5,
        ),
        any::<bool>(),
    )
        .prop_map(|(specs, ambiguous)| {
            let intervals = specs
                .into_iter()
                .map(|(chrom, ref_start, start, len, reverse)| {
                    let strand = if reverse { Strand::Reverse } else { Strand::Forward };
                    interval(chrom, ref_start, (start, (start + len - 1).min(CONTIG_LEN)), strand)
                })
                .collect();
            let bases: Vec<u8> = (0..CONTIG_LEN as usize).map(|i| b"ACGT"[i % 4]).collect();
            AlignedContig::new("asm000001:tig00000", Arc::from(bases), intervals, ambiguous)
        })
}

fn reference() -> InMemoryReference {
    InMemoryReference::new()
        .with_sequence("chr1", b"ACGT".repeat(1_500))
        .with_sequence("chr2", b"GATTACA".repeat(1_000))
}

proptest! {
    #[test]
    fn every_contig_gets_exactly_one_category(contig in aligned_contig()) {
        let category = classify(&contig);
        prop_assert!(RawCategory::ALL.contains(&category));
        prop_assert_eq!(classify(&contig), category);
        if contig.has_equally_good_alignment_config || contig.alignments.len() < 2 {
            prop_assert_eq!(category, RawCategory::Unclassifiable);
        }
    }

    #[test]
    fn precise_calls_are_well_formed(contig in aligned_contig()) {
        let reference = reference();
        let names = ReferenceNames::new([("chr1", 6_000), ("chr2", 7_000)]);
        let params =
            PreciseCallParams::from_config(&DiscoveryConfig::default(), "sample", &names, &reference);
        let category = classify(&contig);
        let calls = call_contig(&contig, category, &params);
        if category == RawCategory::Unclassifiable {
            prop_assert!(calls.is_empty());
        }
        for call in &calls {
            prop_assert!(call.start <= call.end);
            prop_assert_eq!(call.supporting_contigs.clone(), vec![contig.name.clone()]);
            prop_assert_eq!(call.mate.is_some(), call.sv_type == SvType::Breakend);
        }
    }
}
