use rayon::prelude::*;
use tracing::debug;

use crate::calls::{CallProvenance, CnvOverlap, EvidenceSupport, StructuralCallRecord, SvType, Zygosity};
use crate::evidence::{CnvOverlay, EvidenceIndex};

/// Assign split-read and read-pair support to precise calls.
///
/// The call's breakpoint sides are padded by `padding` bases and every overlapping
/// evidence link with matching strands contributes. Support is assigned, never
/// accumulated, so reconciling twice gives the same calls.
pub fn assign_evidence_support(calls: &mut [StructuralCallRecord], index: &EvidenceIndex, padding: u32) {
    calls
        .par_iter_mut()
        .filter(|call| call.provenance == CallProvenance::Precise)
        .for_each(|call| {
            let Some(sides) = call.breakpoint_sides() else {
                return;
            };
            let query = sides.padded(padding);
            let support = index
                .overlappers(&query)
                .fold(EvidenceSupport::default(), |acc, (_, link)| EvidenceSupport {
                    split_reads: acc.split_reads.saturating_add(link.split_reads),
                    read_pairs: acc.read_pairs.saturating_add(link.read_pairs),
                });
            call.evidence = Some(support);
        });
}

/// Attach overlapping external CNV calls and adopt the copy number of the best one.
///
/// A copy number already present on the genotype is kept.
pub fn overlay_cnv_calls(calls: &mut [StructuralCallRecord], overlay: &CnvOverlay) {
    calls.par_iter_mut().for_each(|call| {
        let span = call.span();
        call.external_cnv = overlay
            .overlapping(&span)
            .map(|cnv| CnvOverlap {
                id: cnv.id.clone(),
                copy_number: cnv.map_copy_number(),
            })
            .collect();
        if call.genotype.copy_number.is_none() {
            call.genotype.copy_number = overlay
                .best_overlap(&span)
                .and_then(|cnv| cnv.map_copy_number());
        }
    });
}

/// Zygosity implied by a copy number for deletions and duplications.
pub fn zygosity_from_copy_number(sv_type: SvType, copy_number: u32) -> Option<Zygosity> {
    match (sv_type, copy_number) {
        (SvType::Deletion | SvType::Duplication, 2) => Some(Zygosity::HomReference),
        (SvType::Deletion, 0) => Some(Zygosity::HomVariant),
        (SvType::Deletion, 1) => Some(Zygosity::HetVariant),
        (SvType::Duplication, 3) => Some(Zygosity::HetVariant),
        (SvType::Duplication, cn) if cn >= 4 => Some(Zygosity::HomVariant),
        _ => None,
    }
}

/// Full reconciliation step: evidence support, then the CNV overlay.
pub fn reconcile_calls(
    mut calls: Vec<StructuralCallRecord>,
    index: Option<&EvidenceIndex>,
    padding: u32,
    overlay: Option<&CnvOverlay>,
) -> Vec<StructuralCallRecord> {
    if let Some(index) = index {
        assign_evidence_support(&mut calls, index, padding);
    }
    if let Some(overlay) = overlay {
        overlay_cnv_calls(&mut calls, overlay);
    }
    for call in calls.iter_mut() {
        if let Some(zygosity) = call
            .genotype
            .copy_number
            .and_then(|cn| zygosity_from_copy_number(call.sv_type, cn))
        {
            call.genotype.zygosity = zygosity;
        }
    }
    debug!(calls = calls.len(), padding, "reconciled precise calls");
    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{SimpleInterval, Strand};
    use crate::evidence::{build_evidence_index, CnvCall, EvidenceTargetLink, StrandedInterval};
    use std::sync::Arc;
    use test_case::test_case;

    fn deletion() -> StructuralCallRecord {
        StructuralCallRecord::new(
            Arc::from("chr1"),
            1100,
            1150,
            SvType::Deletion,
            (Strand::Forward, Strand::Reverse),
            CallProvenance::Precise,
        )
    }

    fn index() -> EvidenceIndex {
        let side = |s, e, strand| StrandedInterval::new(SimpleInterval::new("chr1", s, e), strand);
        build_evidence_index(vec![
            EvidenceTargetLink::new(side(1000, 1090, Strand::Forward), side(1160, 1300, Strand::Reverse), 3, 4),
            EvidenceTargetLink::new(side(1050, 1120, Strand::Forward), side(1140, 1200, Strand::Reverse), 1, 1),
            EvidenceTargetLink::new(side(1050, 1120, Strand::Forward), side(1140, 1200, Strand::Forward), 9, 9),
        ])
    }

    #[test]
    fn padding_widens_the_evidence_search() {
        let mut tight = vec![deletion()];
        assign_evidence_support(&mut tight, &index(), 0);
        assert_eq!(tight[0].evidence, Some(EvidenceSupport { split_reads: 1, read_pairs: 1 }));

        let mut padded = vec![deletion()];
        assign_evidence_support(&mut padded, &index(), 20);
        assert_eq!(padded[0].evidence, Some(EvidenceSupport { split_reads: 4, read_pairs: 5 }));
    }

    #[test]
    fn reconciling_twice_is_idempotent() {
        let overlay = CnvOverlay::new(vec![CnvCall::new(
            "cnv1",
            SimpleInterval::new("chr1", 1000, 1200),
            vec![0.1, 0.8, 0.1],
        )]);
        let once = reconcile_calls(vec![deletion()], Some(&index()), 20, Some(&overlay));
        let twice = reconcile_calls(once.clone(), Some(&index()), 20, Some(&overlay));
        assert_eq!(once, twice);
        assert_eq!(once[0].genotype.copy_number, Some(1));
        assert_eq!(once[0].genotype.zygosity, Zygosity::HetVariant);
        assert_eq!(once[0].external_cnv[0].id, "cnv1");
    }

    #[test_case(SvType::Deletion, 0 => Some(Zygosity::HomVariant))]
    #[test_case(SvType::Deletion, 1 => Some(Zygosity::HetVariant))]
    #[test_case(SvType::Deletion, 2 => Some(Zygosity::HomReference))]
    #[test_case(SvType::Duplication, 3 => Some(Zygosity::HetVariant))]
    #[test_case(SvType::Duplication, 5 => Some(Zygosity::HomVariant))]
    #[test_case(SvType::Inversion, 1 => None)]
    fn copy_number_zygosity(sv_type: SvType, copy_number: u32) -> Option<Zygosity> {
        zygosity_from_copy_number(sv_type, copy_number)
    }
}
