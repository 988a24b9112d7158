use std::fmt;
use std::sync::Arc;

use rust_htslib::bam::record::{Cigar, CigarString};
use serde::{Deserialize, Serialize};

use super::ParseError;

/// Orientation of an alignment or breakpoint side relative to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strand {
    /// Aligned to the forward reference strand.
    Forward,
    /// Aligned to the reverse complement of the reference.
    Reverse,
}

impl Strand {
    /// Strand implied by the SAM reverse flag.
    pub fn from_reverse_flag(is_reverse: bool) -> Self {
        if is_reverse {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }

    /// Whether this is the reverse strand.
    pub fn is_reverse(self) -> bool {
        matches!(self, Strand::Reverse)
    }

    /// Single-character representation (`+` / `-`).
    pub fn symbol(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

/// Closed, 1-based interval on a named reference sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "IntervalFields")]
pub struct SimpleInterval {
    /// Reference contig/chromosome name.
    pub contig: Arc<str>,
    /// First covered position (1-based, inclusive).
    pub start: u32,
    /// Last covered position (1-based, inclusive).
    pub end: u32,
}

impl SimpleInterval {
    /// Construct a new interval; `start` must not exceed `end`.
    pub fn new(contig: impl Into<Arc<str>>, start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "interval start {start} beyond end {end}");
        Self {
            contig: contig.into(),
            start,
            end,
        }
    }

    /// Number of covered positions.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Closed intervals always cover at least one base.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the two intervals share at least one base.
    pub fn overlaps(&self, other: &SimpleInterval) -> bool {
        self.contig == other.contig && self.start <= other.end && other.start <= self.end
    }

    /// Smallest interval covering both; `None` when they sit on different contigs.
    pub fn span_with(&self, other: &SimpleInterval) -> Option<SimpleInterval> {
        if self.contig != other.contig {
            return None;
        }
        Some(SimpleInterval {
            contig: Arc::clone(&self.contig),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        })
    }

    /// Central position (rounded down).
    pub fn midpoint(&self) -> u32 {
        self.start + (self.end - self.start) / 2
    }

    /// Interval widened by `padding` bases on both sides, clamped at position 1.
    pub fn padded(&self, padding: u32) -> SimpleInterval {
        SimpleInterval {
            contig: Arc::clone(&self.contig),
            start: self.start.saturating_sub(padding).max(1),
            end: self.end.saturating_add(padding),
        }
    }
}

#[derive(Deserialize)]
struct IntervalFields {
    contig: Arc<str>,
    start: u32,
    end: u32,
}

impl TryFrom<IntervalFields> for SimpleInterval {
    type Error = String;

    fn try_from(fields: IntervalFields) -> Result<Self, Self::Error> {
        if fields.start == 0 || fields.start > fields.end {
            return Err(format!(
                "interval {}:{}-{} must be 1-based with start <= end",
                fields.contig, fields.start, fields.end
            ));
        }
        Ok(Self {
            contig: fields.contig,
            start: fields.start,
            end: fields.end,
        })
    }
}

impl fmt::Display for SimpleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

/// Simple CIGAR operation kinds describing how a contig aligns to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CigarOpKind {
    /// Consuming match/mismatch.
    Match,
    /// Insertion relative to the reference.
    Insertion,
    /// Deletion relative to the reference.
    Deletion,
    /// Soft clipping (sequence present in the record).
    SoftClip,
    /// Hard clipping (sequence trimmed from the record).
    HardClip,
}

impl CigarOpKind {
    /// Whether the operation advances along the reference.
    pub fn consumes_reference(self) -> bool {
        matches!(self, CigarOpKind::Match | CigarOpKind::Deletion)
    }

    /// Whether the operation covers bases stored in the record sequence.
    pub fn consumes_query(self) -> bool {
        matches!(
            self,
            CigarOpKind::Match | CigarOpKind::Insertion | CigarOpKind::SoftClip
        )
    }

    /// Soft or hard clip.
    pub fn is_clip(self) -> bool {
        matches!(self, CigarOpKind::SoftClip | CigarOpKind::HardClip)
    }

    /// Insertion or deletion.
    pub fn is_gap(self) -> bool {
        matches!(self, CigarOpKind::Insertion | CigarOpKind::Deletion)
    }
}

/// CIGAR operation with length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CigarOp {
    /// Operation kind.
    pub kind: CigarOpKind,
    /// Number of bases affected by the operation.
    pub len: u32,
}

impl CigarOp {
    /// Construct a new CIGAR operation.
    pub fn new(kind: CigarOpKind, len: u32) -> Self {
        Self { kind, len }
    }

    /// Convert an htslib operation; `=`/`X` fold into matches and `N` into deletions.
    pub fn from_htslib(op: &Cigar) -> Result<Self, ParseError> {
        let op = match *op {
            Cigar::Match(len) | Cigar::Equal(len) | Cigar::Diff(len) => {
                CigarOp::new(CigarOpKind::Match, len)
            }
            Cigar::Ins(len) => CigarOp::new(CigarOpKind::Insertion, len),
            Cigar::Del(len) | Cigar::RefSkip(len) => CigarOp::new(CigarOpKind::Deletion, len),
            Cigar::SoftClip(len) => CigarOp::new(CigarOpKind::SoftClip, len),
            Cigar::HardClip(len) => CigarOp::new(CigarOpKind::HardClip, len),
            Cigar::Pad(_) => return Err(ParseError::UnsupportedCigarOp('P')),
        };
        Ok(op)
    }

    /// Equivalent htslib operation.
    pub fn to_htslib(self) -> Cigar {
        match self.kind {
            CigarOpKind::Match => Cigar::Match(self.len),
            CigarOpKind::Insertion => Cigar::Ins(self.len),
            CigarOpKind::Deletion => Cigar::Del(self.len),
            CigarOpKind::SoftClip => Cigar::SoftClip(self.len),
            CigarOpKind::HardClip => Cigar::HardClip(self.len),
        }
    }
}

/// Render a CIGAR in SAM text form (`*` when empty).
pub fn cigar_to_string(ops: &[CigarOp]) -> String {
    if ops.is_empty() {
        return "*".to_string();
    }
    CigarString(ops.iter().map(|op| op.to_htslib()).collect()).to_string()
}

/// Parse SAM CIGAR text.
pub fn parse_cigar(text: &str) -> Result<Vec<CigarOp>, ParseError> {
    if text == "*" {
        return Ok(Vec::new());
    }
    let parsed = CigarString::try_from(text)
        .map_err(|err| ParseError::InvalidCigar(format!("{text}: {err}")))?;
    parsed.0.iter().map(CigarOp::from_htslib).collect()
}

/// Reference bases spanned by the operations.
pub fn reference_length(ops: &[CigarOp]) -> u32 {
    ops.iter()
        .filter(|op| op.kind.consumes_reference())
        .map(|op| op.len)
        .sum()
}

/// Contig bases covered by aligned operations (matches and insertions).
pub fn aligned_query_length(ops: &[CigarOp]) -> u32 {
    ops.iter()
        .filter(|op| matches!(op.kind, CigarOpKind::Match | CigarOpKind::Insertion))
        .map(|op| op.len)
        .sum()
}

/// Length of the full contig the record was aligned from (clips included).
pub fn unclipped_length(ops: &[CigarOp]) -> u32 {
    ops.iter()
        .filter(|op| op.kind != CigarOpKind::Deletion)
        .map(|op| op.len)
        .sum()
}

/// Total clipping at the leading and trailing end, in reference orientation.
pub fn clip_lengths(ops: &[CigarOp]) -> (u32, u32) {
    let leading = ops
        .iter()
        .take_while(|op| op.kind.is_clip())
        .map(|op| op.len)
        .sum();
    let trailing = ops
        .iter()
        .rev()
        .take_while(|op| op.kind.is_clip())
        .map(|op| op.len)
        .sum();
    (leading, trailing)
}

/// Contig-local span (1-based, contig orientation) implied by clipping and strand.
pub fn contig_span_from_cigar(ops: &[CigarOp], strand: Strand) -> (u32, u32) {
    let (leading, trailing) = clip_lengths(ops);
    let aligned = aligned_query_length(ops);
    let before = if strand.is_reverse() { trailing } else { leading };
    (before + 1, before + aligned)
}

/// Reverse complement of a nucleotide sequence; unknown symbols become `N`.
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence
        .iter()
        .rev()
        .map(|base| match base {
            b'A' | b'a' => b'T',
            b'C' | b'c' => b'G',
            b'G' | b'g' => b'C',
            b'T' | b't' => b'A',
            _ => b'N',
        })
        .collect()
}

/// How an alignment interval came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignmentOrigin {
    /// Reported by the aligner as-is.
    Aligner,
    /// Piece of an aligner record cut at a large gap.
    SplitGapped,
}

/// One contiguous mapped segment of a contig.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentInterval {
    /// Reference bases covered by the segment.
    pub reference_span: SimpleInterval,
    /// First contig base covered (1-based, contig orientation).
    pub start_in_contig: u32,
    /// Last contig base covered (1-based, contig orientation).
    pub end_in_contig: u32,
    /// Strand of the reference the contig aligned to.
    pub strand: Strand,
    /// CIGAR in reference orientation, clipping included.
    pub cigar: Vec<CigarOp>,
    /// Mapping quality (Phred-scaled).
    pub mapq: u8,
    /// Edit distance to the reference; unknown for split pieces.
    pub mismatches: Option<u32>,
    /// Aligner score.
    pub score: i32,
    /// Provenance of the interval.
    pub origin: AlignmentOrigin,
}

impl AlignmentInterval {
    /// Contig bases covered by the segment.
    pub fn contig_length(&self) -> u32 {
        self.end_in_contig - self.start_in_contig + 1
    }

    /// Reference contig of the segment.
    pub fn contig(&self) -> &Arc<str> {
        &self.reference_span.contig
    }

    /// Check the coordinate invariants against the owning contig's length.
    pub fn is_consistent(&self, contig_len: u32) -> bool {
        let (start, end) = contig_span_from_cigar(&self.cigar, self.strand);
        start == self.start_in_contig
            && end == self.end_in_contig
            && reference_length(&self.cigar) == self.reference_span.len()
            && unclipped_length(&self.cigar) == contig_len
    }
}

/// Locally assembled contig together with its parsed alignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedContig {
    /// Contig identity, see [`format_contig_name`].
    pub name: String,
    /// Assembled bases.
    pub sequence: Arc<[u8]>,
    /// Alignments ordered along the contig.
    pub alignments: Vec<AlignmentInterval>,
    /// Set when the aligner found an equally good alternative placement.
    pub has_equally_good_alignment_config: bool,
}

impl AlignedContig {
    /// Build a contig, ordering alignments by contig position.
    pub fn new(
        name: impl Into<String>,
        sequence: Arc<[u8]>,
        mut alignments: Vec<AlignmentInterval>,
        has_equally_good_alignment_config: bool,
    ) -> Self {
        alignments.sort_by(|a, b| {
            (a.start_in_contig, a.end_in_contig, &a.reference_span)
                .cmp(&(b.start_in_contig, b.end_in_contig, &b.reference_span))
        });
        Self {
            name: name.into(),
            sequence,
            alignments,
            has_equally_good_alignment_config,
        }
    }

    /// Contig length in bases.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the contig carries no bases.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Contig bases between two 1-based inclusive positions (empty when reversed).
    pub fn bases(&self, start: u32, end: u32) -> &[u8] {
        if start == 0 || start > end || end as usize > self.sequence.len() {
            return &[];
        }
        &self.sequence[(start - 1) as usize..end as usize]
    }
}

/// Name of contig `contig_idx` of assembly `assembly_id`.
pub fn format_contig_name(assembly_id: u32, contig_idx: usize) -> String {
    format!("asm{assembly_id:06}:tig{contig_idx:05}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cigar_text_round_trips_through_htslib() {
        let ops = parse_cigar("5S20M3I10M2D15M7H").unwrap();
        assert_eq!(ops.len(), 7);
        assert_eq!(ops[0], CigarOp::new(CigarOpKind::SoftClip, 5));
        assert_eq!(ops[6], CigarOp::new(CigarOpKind::HardClip, 7));
        assert_eq!(cigar_to_string(&ops), "5S20M3I10M2D15M7H");
    }

    #[test]
    fn cigar_lengths() {
        let ops = parse_cigar("5S20M3I10M2D15M7H").unwrap();
        assert_eq!(reference_length(&ops), 47);
        assert_eq!(aligned_query_length(&ops), 48);
        assert_eq!(unclipped_length(&ops), 60);
        assert_eq!(clip_lengths(&ops), (5, 7));
    }

    #[test]
    fn contig_span_depends_on_strand() {
        let ops = parse_cigar("10S30M60S").unwrap();
        assert_eq!(contig_span_from_cigar(&ops, Strand::Forward), (11, 40));
        assert_eq!(contig_span_from_cigar(&ops, Strand::Reverse), (61, 90));
    }

    #[test]
    fn interval_overlap_and_padding() {
        let a = SimpleInterval::new("chr1", 100, 200);
        let b = SimpleInterval::new("chr1", 200, 300);
        let c = SimpleInterval::new("chr2", 100, 200);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(a.padded(150).start, 1);
        assert_eq!(a.span_with(&b).unwrap(), SimpleInterval::new("chr1", 100, 300));
        assert_eq!(a.midpoint(), 150);
    }

    #[test]
    fn deserialized_intervals_must_be_ordered_and_one_based() {
        let ok: SimpleInterval =
            serde_json::from_str(r#"{"contig": "chr1", "start": 5, "end": 5}"#).unwrap();
        assert_eq!(ok, SimpleInterval::new("chr1", 5, 5));
        assert!(serde_json::from_str::<SimpleInterval>(r#"{"contig": "chr1", "start": 9, "end": 5}"#).is_err());
        assert!(serde_json::from_str::<SimpleInterval>(r#"{"contig": "chr1", "start": 0, "end": 5}"#).is_err());
    }

    #[test]
    fn contig_names_are_zero_padded() {
        assert_eq!(format_contig_name(12, 3), "asm000012:tig00003");
    }

    #[test]
    fn reverse_complement_handles_ambiguity() {
        assert_eq!(reverse_complement(b"ACGTN"), b"NACGT".to_vec());
    }
}
