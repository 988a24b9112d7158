//! Normalized contig alignment model and the parsers that produce it.
//!
//! Aligner hits for locally assembled contigs arrive as [`AssemblyResult`]s. They are
//! turned into [`AlignedContig`]s either directly ([`parse_assemblies_direct`]) or by
//! way of SAM text ([`parse_assemblies_via_sam`]); both paths agree exactly.

mod parser;
mod raw;
mod sam;
mod split;
mod types;

use thiserror::Error;

pub use parser::{interval_from_raw, parse_assemblies_direct};
pub use raw::{
    AssembledContig, AssemblyOutcome, AssemblyResult, RawAlignment, ReferenceNames,
    ReferenceSequence, FLAG_REVERSE, FLAG_SECONDARY, FLAG_SUPPLEMENTARY, FLAG_UNMAPPED,
};
pub use sam::{
    assembly_sam_lines, interval_from_sam, parse_assemblies_via_sam, parse_sam_line, to_sam_line,
    SamAlignmentLine,
};
pub use split::split_gapped_alignment;
pub use types::{
    aligned_query_length, cigar_to_string, clip_lengths, contig_span_from_cigar,
    format_contig_name, parse_cigar, reference_length, reverse_complement, unclipped_length,
    AlignedContig, AlignmentInterval, AlignmentOrigin, CigarOp, CigarOpKind, SimpleInterval,
    Strand,
};

/// Errors raised while normalizing contig alignments.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Aligner reported a reference id outside the reference name table.
    #[error("reference id {0} is not present in the reference dictionary")]
    UnknownReferenceId(i32),

    /// SAM record names a sequence absent from the dictionary.
    #[error("reference '{0}' is not present in the reference dictionary")]
    UnknownReferenceName(String),

    /// Aligner hit whose coordinates disagree with its CIGAR or its contig.
    #[error("inconsistent hit on reference id {ref_id}: {reason}")]
    InconsistentHit {
        /// Reference id of the hit.
        ref_id: i32,
        /// Which coordinate check failed.
        reason: String,
    },

    /// Mapped hit without any reference bases.
    #[error("empty reference span {contig}:{start}-{end}")]
    EmptyReferenceSpan {
        /// Reference contig of the hit.
        contig: String,
        /// Reported start.
        start: i64,
        /// Reported end.
        end: i64,
    },

    /// SAM text that cannot be interpreted.
    #[error("malformed SAM record: {0}")]
    MalformedSam(String),

    /// CIGAR text rejected by htslib.
    #[error("invalid CIGAR {0}")]
    InvalidCigar(String),

    /// CIGAR operation the model has no equivalent for.
    #[error("unsupported CIGAR operation '{0}'")]
    UnsupportedCigarOp(char),

    /// Stored sequence disagrees with the CIGAR.
    #[error("SEQ holds {found} bases but the CIGAR consumes {expected}")]
    SequenceLengthMismatch {
        /// Query bases consumed by the CIGAR.
        expected: usize,
        /// Bases present in SEQ.
        found: usize,
    },
}
