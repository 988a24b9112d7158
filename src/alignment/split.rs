//! Cutting aligner records at large internal gaps.
//!
//! An aligner may bridge a sizeable insertion or deletion with a single gapped
//! record. For structural variant inference such a record is more useful as two
//! (or more) independent segments whose junction can then be typed like any other
//! chimeric junction.

use std::sync::Arc;

use super::types::{
    contig_span_from_cigar, AlignmentInterval, AlignmentOrigin, CigarOp, CigarOpKind,
    SimpleInterval,
};

/// Aligned block of a record between two splitting gaps.
#[derive(Debug, Default)]
struct Piece {
    ops: Vec<CigarOp>,
    query_offset: u32,
    reference_offset: u32,
    query_len: u32,
    reference_len: u32,
    has_match: bool,
}

impl Piece {
    fn starting_at(query_offset: u32, reference_offset: u32) -> Self {
        Self {
            query_offset,
            reference_offset,
            ..Self::default()
        }
    }

    fn push(&mut self, op: CigarOp) {
        match op.kind {
            CigarOpKind::Match => {
                self.query_len += op.len;
                self.reference_len += op.len;
                self.has_match = true;
            }
            CigarOpKind::Insertion => self.query_len += op.len,
            CigarOpKind::Deletion => self.reference_len += op.len,
            CigarOpKind::SoftClip | CigarOpKind::HardClip => {}
        }
        self.ops.push(op);
    }
}

/// Split `interval` at every run of consecutive insertions/deletions that contains an
/// operation of at least `sensitivity` bases.
///
/// Returns the original interval untouched when no such gap exists. Otherwise each
/// piece gets its own reference and contig coordinates; bases outside a piece become
/// clipping (hard when the original end was hard clipped), and the pieces' mismatch
/// counts are unknown.
pub fn split_gapped_alignment(interval: &AlignmentInterval, sensitivity: u32) -> Vec<AlignmentInterval> {
    let ops = &interval.cigar;
    let lead_count = ops.iter().take_while(|op| op.kind.is_clip()).count();
    let trail_count = ops[lead_count..]
        .iter()
        .rev()
        .take_while(|op| op.kind.is_clip())
        .count();
    let leading = &ops[..lead_count];
    let trailing = &ops[ops.len() - trail_count..];
    let core = &ops[lead_count..ops.len() - trail_count];

    let mut pieces = Vec::new();
    let mut current = Piece::starting_at(0, 0);
    let mut query_offset = 0u32;
    let mut reference_offset = 0u32;
    let mut idx = 0;

    while idx < core.len() {
        let op = core[idx];
        if !op.kind.is_gap() {
            current.push(op);
            query_offset += op.len;
            reference_offset += op.len;
            idx += 1;
            continue;
        }

        let run_end = idx + core[idx..].iter().take_while(|op| op.kind.is_gap()).count();
        let run = &core[idx..run_end];
        let run_query: u32 = run
            .iter()
            .filter(|op| op.kind == CigarOpKind::Insertion)
            .map(|op| op.len)
            .sum();
        let run_reference: u32 = run
            .iter()
            .filter(|op| op.kind == CigarOpKind::Deletion)
            .map(|op| op.len)
            .sum();
        let large = run.iter().any(|op| op.len >= sensitivity);
        let match_follows = core[run_end..]
            .iter()
            .any(|op| op.kind == CigarOpKind::Match);

        query_offset += run_query;
        reference_offset += run_reference;
        if large && current.has_match && match_follows {
            pieces.push(std::mem::replace(
                &mut current,
                Piece::starting_at(query_offset, reference_offset),
            ));
        } else {
            run.iter().for_each(|op| current.push(*op));
        }
        idx = run_end;
    }
    pieces.push(current);

    if pieces.len() == 1 {
        return vec![interval.clone()];
    }

    let leading_len: u32 = leading.iter().map(|op| op.len).sum();
    let trailing_len: u32 = trailing.iter().map(|op| op.len).sum();
    let total = leading_len + query_offset + trailing_len;
    let leading_kind = clip_kind(leading);
    let trailing_kind = clip_kind(trailing);
    let contig: &Arc<str> = &interval.reference_span.contig;

    pieces
        .into_iter()
        .map(|piece| {
            let clip_before = leading_len + piece.query_offset;
            let clip_after = total - clip_before - piece.query_len;

            let mut cigar = Vec::with_capacity(piece.ops.len() + 2);
            if clip_before > 0 {
                cigar.push(CigarOp::new(leading_kind, clip_before));
            }
            cigar.extend(piece.ops);
            if clip_after > 0 {
                cigar.push(CigarOp::new(trailing_kind, clip_after));
            }

            let ref_start = interval.reference_span.start + piece.reference_offset;
            let (start_in_contig, end_in_contig) = contig_span_from_cigar(&cigar, interval.strand);
            AlignmentInterval {
                reference_span: SimpleInterval::new(
                    Arc::clone(contig),
                    ref_start,
                    ref_start + piece.reference_len - 1,
                ),
                start_in_contig,
                end_in_contig,
                strand: interval.strand,
                cigar,
                mapq: interval.mapq,
                mismatches: None,
                score: interval.score,
                origin: AlignmentOrigin::SplitGapped,
            }
        })
        .collect()
}

fn clip_kind(clips: &[CigarOp]) -> CigarOpKind {
    if clips.iter().any(|op| op.kind == CigarOpKind::HardClip) {
        CigarOpKind::HardClip
    } else {
        CigarOpKind::SoftClip
    }
}
