use rayon::prelude::*;
use tracing::debug;

use super::raw::{AssemblyResult, RawAlignment, ReferenceNames};
use super::split::split_gapped_alignment;
use super::types::{
    aligned_query_length, format_contig_name, reference_length, AlignedContig, AlignmentInterval,
    AlignmentOrigin, SimpleInterval,
};
use super::ParseError;

/// Convert every successful assembly's contig hits straight into [`AlignedContig`]s.
///
/// Excused assemblies are skipped, unmapped and secondary hits discarded, and large
/// gapped alignments split at `split_sensitivity`. Contigs left without any
/// alignment are dropped. Output order follows assembly then contig order.
pub fn parse_assemblies_direct(
    assemblies: &[AssemblyResult],
    names: &ReferenceNames,
    split_sensitivity: u32,
) -> Result<Vec<AlignedContig>, ParseError> {
    let per_assembly = assemblies
        .par_iter()
        .map(|assembly| parse_one_assembly(assembly, names, split_sensitivity))
        .collect::<Result<Vec<_>, _>>()?;

    let contigs: Vec<AlignedContig> = per_assembly
        .into_iter()
        .flatten()
        .filter(|contig| !contig.alignments.is_empty())
        .collect();
    debug!(contigs = contigs.len(), "parsed contig alignments directly");
    Ok(contigs)
}

fn parse_one_assembly(
    assembly: &AssemblyResult,
    names: &ReferenceNames,
    split_sensitivity: u32,
) -> Result<Vec<AlignedContig>, ParseError> {
    let Some(contigs) = assembly.contigs() else {
        return Ok(Vec::new());
    };

    contigs
        .iter()
        .enumerate()
        .map(|(idx, contig)| {
            let name = format_contig_name(assembly.assembly_id, idx);
            let contig_len = contig.sequence.len() as u32;
            for hit in contig.alignments.iter().filter(|hit| !hit.is_unmapped()) {
                names
                    .name(hit.ref_id)
                    .ok_or(ParseError::UnknownReferenceId(hit.ref_id))?;
                hit.validate(contig_len)?;
            }
            let mut alignments = Vec::new();
            for hit in contig.alignments.iter().filter(|hit| is_usable(hit)) {
                let interval = interval_from_raw(hit, names, contig_len)?;
                alignments.extend(split_gapped_alignment(&interval, split_sensitivity));
            }
            let ambiguous = has_equally_good_alternative(
                contig
                    .alignments
                    .iter()
                    .filter(|hit| !hit.is_unmapped())
                    .map(|hit| (hit.is_secondary(), hit.score)),
            );
            Ok(AlignedContig::new(
                name,
                contig.sequence.clone(),
                alignments,
                ambiguous,
            ))
        })
        .collect()
}

fn is_usable(hit: &RawAlignment) -> bool {
    !hit.is_unmapped() && !hit.is_secondary()
}

/// Translate one mapped aligner hit into the normalized model.
pub fn interval_from_raw(
    hit: &RawAlignment,
    names: &ReferenceNames,
    contig_len: u32,
) -> Result<AlignmentInterval, ParseError> {
    let contig = names
        .name(hit.ref_id)
        .ok_or(ParseError::UnknownReferenceId(hit.ref_id))?;
    hit.validate(contig_len)?;
    let ref_len = reference_length(&hit.cigar);
    let ref_start = hit.ref_start as u32 + 1;

    Ok(AlignmentInterval {
        reference_span: SimpleInterval::new(contig.clone(), ref_start, ref_start + ref_len - 1),
        start_in_contig: hit.seq_start + 1,
        end_in_contig: hit.seq_start + aligned_query_length(&hit.cigar),
        strand: hit.strand(),
        cigar: hit.clipped_cigar(contig_len),
        mapq: hit.mapq,
        mismatches: Some(hit.mismatches),
        score: hit.score,
        origin: AlignmentOrigin::Aligner,
    })
}

/// A contig is ambiguous when a secondary placement scores as well as the best
/// primary or supplementary one.
pub(crate) fn has_equally_good_alternative(hits: impl Iterator<Item = (bool, i32)>) -> bool {
    let mut best_primary: Option<i32> = None;
    let mut best_secondary: Option<i32> = None;
    for (secondary, score) in hits {
        let slot = if secondary {
            &mut best_secondary
        } else {
            &mut best_primary
        };
        *slot = Some(slot.map_or(score, |best| best.max(score)));
    }
    matches!((best_primary, best_secondary), (Some(p), Some(s)) if s >= p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::raw::{AssembledContig, FLAG_SECONDARY, FLAG_SUPPLEMENTARY};
    use crate::alignment::types::{CigarOp, CigarOpKind, Strand};
    use std::sync::Arc;

    fn names() -> ReferenceNames {
        ReferenceNames::new([("chr1", 100_000), ("chr2", 100_000)])
    }

    fn hit(ref_id: i32, ref_start: i32, seq: (u32, u32), flag: u16, score: i32) -> RawAlignment {
        let len = seq.1 - seq.0;
        RawAlignment {
            ref_id,
            ref_start,
            ref_end: ref_start + len as i32,
            seq_start: seq.0,
            seq_end: seq.1,
            cigar: vec![CigarOp::new(CigarOpKind::Match, len)],
            mapq: 60,
            mismatches: 1,
            score,
            sam_flag: flag,
        }
    }

    fn contig(alignments: Vec<RawAlignment>) -> AssembledContig {
        AssembledContig {
            sequence: Arc::from(vec![b'A'; 200]),
            alignments,
        }
    }

    #[test]
    fn filters_unmapped_secondary_and_excused() {
        let assemblies = vec![
            AssemblyResult::assembled(
                1,
                vec![
                    contig(vec![
                        hit(0, 1000, (0, 100), 0, 100),
                        hit(1, 5000, (100, 200), FLAG_SUPPLEMENTARY, 90),
                        hit(1, 9000, (100, 200), FLAG_SECONDARY, 40),
                    ]),
                    contig(vec![hit(-1, -1, (0, 0), 0x4, 0)]),
                ],
            ),
            AssemblyResult::excused(2, "no reads"),
        ];

        let contigs = parse_assemblies_direct(&assemblies, &names(), 30).unwrap();
        assert_eq!(contigs.len(), 1);
        let contig = &contigs[0];
        assert_eq!(contig.name, "asm000001:tig00000");
        assert_eq!(contig.alignments.len(), 2);
        assert!(!contig.has_equally_good_alignment_config);
        assert_eq!(contig.alignments[1].reference_span.contig.as_ref(), "chr2");
        assert_eq!(contig.alignments[1].strand, Strand::Forward);
        assert!(contig.alignments.iter().all(|a| a.is_consistent(200)));
    }

    #[test]
    fn equally_scoring_secondary_marks_contig_ambiguous() {
        let assemblies = vec![AssemblyResult::assembled(
            7,
            vec![contig(vec![
                hit(0, 1000, (0, 200), 0, 150),
                hit(1, 3000, (0, 200), FLAG_SECONDARY, 150),
            ])],
        )];
        let contigs = parse_assemblies_direct(&assemblies, &names(), 30).unwrap();
        assert!(contigs[0].has_equally_good_alignment_config);
    }

    #[test]
    fn hit_longer_than_its_contig_is_rejected() {
        let overlong = hit(0, 1000, (0, 100), 0, 100);
        let assemblies = vec![AssemblyResult::assembled(
            1,
            vec![AssembledContig {
                sequence: Arc::from(vec![b'A'; 80]),
                alignments: vec![overlong],
            }],
        )];
        let err = parse_assemblies_direct(&assemblies, &names(), 30).unwrap_err();
        assert!(matches!(err, ParseError::InconsistentHit { ref_id: 0, .. }));
    }

    #[test]
    fn inconsistent_secondary_hit_is_still_fatal() {
        let mut secondary = hit(1, 3000, (0, 200), FLAG_SECONDARY, 40);
        secondary.ref_end += 10;
        let assemblies = vec![AssemblyResult::assembled(
            1,
            vec![contig(vec![hit(0, 1000, (0, 200), 0, 150), secondary])],
        )];
        assert!(parse_assemblies_direct(&assemblies, &names(), 30).is_err());
    }

    #[test]
    fn unknown_reference_id_is_fatal() {
        let assemblies = vec![AssemblyResult::assembled(
            1,
            vec![contig(vec![hit(5, 10, (0, 50), 0, 50)])],
        )];
        let err = parse_assemblies_direct(&assemblies, &names(), 30).unwrap_err();
        assert!(matches!(err, ParseError::UnknownReferenceId(5)));
    }
}
