//! Base-pair resolution calls from classified contigs.
//!
//! Every junction whose flanks are trustworthy becomes a novel adjacency, which is
//! then typed by the strands of its sides and by the contig and reference gaps.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::alignment::{reverse_complement, AlignedContig, AlignmentInterval, ReferenceNames, Strand};
use crate::calls::{BreakendMate, CallProvenance, Genotype, StructuralCallRecord, SvType};
use crate::config::DiscoveryConfig;
use crate::reference::ReferenceSource;

use super::classifier::RawCategory;
use super::junction::Junction;

/// Inputs shared by every precise call of a run.
#[derive(Debug, Clone, Copy)]
pub struct PreciseCallParams<'a> {
    /// Flank mapping quality floor.
    pub min_mapq: u8,
    /// Flank reference length floor.
    pub min_alignment_length: u32,
    /// Sample the genotypes belong to.
    pub sample: &'a str,
    /// Reference dictionary ordering the sides of each adjacency.
    pub reference_names: &'a ReferenceNames,
    /// Reference for the `REF` allele.
    pub reference: &'a dyn ReferenceSource,
}

impl<'a> PreciseCallParams<'a> {
    /// Thresholds from the run configuration.
    pub fn from_config(
        config: &DiscoveryConfig,
        sample: &'a str,
        reference_names: &'a ReferenceNames,
        reference: &'a dyn ReferenceSource,
    ) -> Self {
        Self {
            min_mapq: config.min_mapq,
            min_alignment_length: config.min_alignment_length,
            sample,
            reference_names,
            reference,
        }
    }

    fn trusts(&self, interval: &AlignmentInterval) -> bool {
        interval.mapq >= self.min_mapq && interval.reference_span.len() >= self.min_alignment_length
    }
}

/// Precise calls for a batch of classified contigs, merged across contigs.
pub fn call_precise_variants(
    classified: &[(RawCategory, &AlignedContig)],
    params: &PreciseCallParams<'_>,
) -> Vec<StructuralCallRecord> {
    let calls: Vec<StructuralCallRecord> = classified
        .par_iter()
        .flat_map_iter(|(category, contig)| call_contig(contig, *category, params))
        .collect();
    let merged = merge_across_contigs(calls);
    debug!(calls = merged.len(), "precise calls");
    merged
}

/// Precise calls from one contig.
pub fn call_contig(
    contig: &AlignedContig,
    category: RawCategory,
    params: &PreciseCallParams<'_>,
) -> Vec<StructuralCallRecord> {
    if category == RawCategory::Unclassifiable {
        return Vec::new();
    }

    let candidates: Vec<StructuralCallRecord> = Junction::all(&contig.alignments)
        .filter(|junction| params.trusts(junction.first) && params.trusts(junction.second))
        .filter_map(|junction| junction_call(contig, &junction, params))
        .collect();

    let multi_segment = contig.alignments.len() > 2
        && matches!(
            category,
            RawCategory::InversionSignature | RawCategory::TandemDuplication
        );
    if multi_segment {
        consensus_merge(candidates)
    } else {
        candidates
    }
}

fn junction_call(
    contig: &AlignedContig,
    junction: &Junction<'_>,
    params: &PreciseCallParams<'_>,
) -> Option<StructuralCallRecord> {
    let contig_gap = junction.contig_gap();
    let (left, right) = junction.ordered_sides(params.reference_names);

    let mut call = if junction.is_inter_contig() {
        let mut call = StructuralCallRecord::new(
            Arc::clone(&left.contig),
            left.position,
            left.position,
            SvType::Breakend,
            (left.strand, right.strand),
            CallProvenance::Precise,
        );
        call.mate = Some(BreakendMate {
            contig: Arc::clone(&right.contig),
            position: right.position,
        });
        call.id = format!(
            "BND_{}_{}_{}_{}",
            left.contig, left.position, right.contig, right.position
        );
        call
    } else if junction.is_strand_switch() {
        StructuralCallRecord::new(
            Arc::clone(&left.contig),
            left.position,
            right.position,
            SvType::Inversion,
            (left.strand, right.strand),
            CallProvenance::Precise,
        )
    } else {
        let reference_gap = junction.reference_gap()?;
        same_strand_call(&left.contig, left.position, right.position, reference_gap, contig_gap)?
    };

    if contig_gap < 0 {
        let overlap = contig_gap.unsigned_abs() as u32;
        let end = junction.first.end_in_contig;
        call.microhomology = Some(oriented(
            contig.bases(end + 1 - overlap.min(end), end),
            junction,
        ));
    } else if contig_gap > 0 && call.sv_type != SvType::Duplication {
        call.inserted_sequence = Some(oriented(
            contig.bases(junction.first.end_in_contig + 1, junction.second.start_in_contig - 1),
            junction,
        ));
    }

    call.ref_allele = params.reference.base(&call.contig, call.start).unwrap_or(b'N');
    call.genotype = Genotype::no_call(params.sample);
    call.supporting_contigs = vec![contig.name.clone()];
    Some(call)
}

fn same_strand_call(
    contig: &Arc<str>,
    left: u32,
    right: u32,
    reference_gap: i64,
    contig_gap: i64,
) -> Option<StructuralCallRecord> {
    let record = |start: u32, end: u32, sv_type: SvType, strands: (Strand, Strand)| {
        StructuralCallRecord::new(
            Arc::clone(contig),
            start,
            end,
            sv_type,
            strands,
            CallProvenance::Precise,
        )
    };

    if reference_gap < 0 {
        // Left side is the start of the repeated copy, right side its end.
        let mut call = record(left, right, SvType::Duplication, (Strand::Reverse, Strand::Forward));
        call.sv_len = -reference_gap;
        return Some(call);
    }
    if reference_gap > 0 && reference_gap >= contig_gap.max(0) {
        return Some(record(
            left,
            right - 1,
            SvType::Deletion,
            (Strand::Forward, Strand::Reverse),
        ));
    }
    if contig_gap > reference_gap {
        let mut call = record(
            left,
            right - 1,
            SvType::Insertion,
            (Strand::Forward, Strand::Reverse),
        );
        call.sv_len = contig_gap;
        return Some(call);
    }
    None
}

/// Contig bases in reference orientation when both flanks are reverse.
fn oriented(bases: &[u8], junction: &Junction<'_>) -> Vec<u8> {
    if junction.first.strand.is_reverse() && junction.second.strand.is_reverse() {
        reverse_complement(bases)
    } else {
        bases.to_ascii_uppercase()
    }
}

/// Collapse overlapping candidates of the same type into one call spanning their union.
fn consensus_merge(mut candidates: Vec<StructuralCallRecord>) -> Vec<StructuralCallRecord> {
    candidates.sort_by(|a, b| (a.sv_type, a.start, a.end).cmp(&(b.sv_type, b.start, b.end)));
    let mut merged: Vec<StructuralCallRecord> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match merged.last_mut() {
            Some(last)
                if last.sv_type == candidate.sv_type
                    && last.contig == candidate.contig
                    && last.mate.is_none()
                    && candidate.start <= last.end =>
            {
                last.end = last.end.max(candidate.end);
                last.junction_count += candidate.junction_count;
                last.sv_len = match last.sv_type {
                    SvType::Deletion => -(i64::from(last.end) - i64::from(last.start)),
                    SvType::Duplication => i64::from(last.end) - i64::from(last.start) + 1,
                    _ => i64::from(last.end) - i64::from(last.start),
                };
                last.id = format!("{}_{}_{}_{}", last.sv_type, last.contig, last.start, last.end);
                last.microhomology = None;
                last.inserted_sequence = None;
            }
            _ => merged.push(candidate),
        }
    }
    merged
}

type CallKey = (Arc<str>, u32, u32, SvType, (Strand, Strand), Option<BreakendMate>);

/// Merge identical calls derived from different contigs.
fn merge_across_contigs(calls: Vec<StructuralCallRecord>) -> Vec<StructuralCallRecord> {
    let mut by_key: BTreeMap<CallKey, StructuralCallRecord> = BTreeMap::new();
    for call in calls {
        let key = (
            Arc::clone(&call.contig),
            call.start,
            call.end,
            call.sv_type,
            call.strands,
            call.mate.clone(),
        );
        match by_key.get_mut(&key) {
            Some(existing) => {
                existing
                    .supporting_contigs
                    .extend(call.supporting_contigs.into_iter());
                existing.supporting_contigs.sort();
                existing.supporting_contigs.dedup();
                existing.junction_count = existing.junction_count.max(call.junction_count);
            }
            None => {
                by_key.insert(key, call);
            }
        }
    }
    by_key.into_values().collect()
}
