use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::types::{aligned_query_length, reference_length, CigarOp, CigarOpKind, Strand};
use super::ParseError;

/// SAM flag: segment unmapped.
pub const FLAG_UNMAPPED: u16 = 0x4;
/// SAM flag: sequence reverse complemented.
pub const FLAG_REVERSE: u16 = 0x10;
/// SAM flag: secondary alignment.
pub const FLAG_SECONDARY: u16 = 0x100;
/// SAM flag: supplementary alignment.
pub const FLAG_SUPPLEMENTARY: u16 = 0x800;

/// One hit reported by the contig aligner.
///
/// Coordinates are 0-based half-open. `seq_start..seq_end` is measured along the
/// contig as assembled; `cigar` covers only the aligned part, in reference orientation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAlignment {
    /// Index into the reference name table; negative when unmapped.
    pub ref_id: i32,
    /// First reference base (0-based).
    pub ref_start: i32,
    /// One past the last reference base.
    pub ref_end: i32,
    /// First aligned contig base (0-based).
    pub seq_start: u32,
    /// One past the last aligned contig base.
    pub seq_end: u32,
    /// Aligned-part CIGAR without clipping.
    pub cigar: Vec<CigarOp>,
    /// Mapping quality.
    pub mapq: u8,
    /// Edit distance (NM).
    pub mismatches: u32,
    /// Aligner score (AS).
    pub score: i32,
    /// SAM flag bits.
    pub sam_flag: u16,
}

impl RawAlignment {
    /// Unmapped hits carry a negative reference id or the unmapped flag.
    pub fn is_unmapped(&self) -> bool {
        self.ref_id < 0 || self.sam_flag & FLAG_UNMAPPED != 0
    }

    /// Secondary ("XA"-class) placement.
    pub fn is_secondary(&self) -> bool {
        self.sam_flag & FLAG_SECONDARY != 0
    }

    /// Supplementary (chimeric) placement.
    pub fn is_supplementary(&self) -> bool {
        self.sam_flag & FLAG_SUPPLEMENTARY != 0
    }

    /// Strand of the placement.
    pub fn strand(&self) -> Strand {
        Strand::from_reverse_flag(self.sam_flag & FLAG_REVERSE != 0)
    }

    /// Check the reported coordinates of a mapped hit against its CIGAR and the
    /// length of the contig it came from.
    pub fn validate(&self, contig_len: u32) -> Result<(), ParseError> {
        let inconsistent = |reason: String| {
            Err(ParseError::InconsistentHit {
                ref_id: self.ref_id,
                reason,
            })
        };
        if self.seq_start > self.seq_end || self.seq_end > contig_len {
            return inconsistent(format!(
                "contig span {}..{} does not fit a contig of {contig_len} bases",
                self.seq_start, self.seq_end
            ));
        }
        let query = aligned_query_length(&self.cigar);
        if self.seq_end - self.seq_start != query {
            return inconsistent(format!(
                "contig span {}..{} but the CIGAR aligns {query} contig bases",
                self.seq_start, self.seq_end
            ));
        }
        let reference = reference_length(&self.cigar);
        if reference == 0 {
            return inconsistent("CIGAR covers no reference bases".to_string());
        }
        if self.ref_start < 0
            || i64::from(self.ref_end) - i64::from(self.ref_start) != i64::from(reference)
        {
            return inconsistent(format!(
                "reference span {}..{} but the CIGAR covers {reference} reference bases",
                self.ref_start, self.ref_end
            ));
        }
        Ok(())
    }

    /// Full CIGAR with the unaligned contig ends expressed as clipping.
    ///
    /// Supplementary placements are hard clipped, everything else soft clipped.
    pub fn clipped_cigar(&self, contig_len: u32) -> Vec<CigarOp> {
        let clip = if self.is_supplementary() {
            CigarOpKind::HardClip
        } else {
            CigarOpKind::SoftClip
        };
        let head = self.seq_start;
        let tail = contig_len.saturating_sub(self.seq_end);
        let (leading, trailing) = if self.strand().is_reverse() {
            (tail, head)
        } else {
            (head, tail)
        };

        let mut ops = Vec::with_capacity(self.cigar.len() + 2);
        if leading > 0 {
            ops.push(CigarOp::new(clip, leading));
        }
        ops.extend_from_slice(&self.cigar);
        if trailing > 0 {
            ops.push(CigarOp::new(clip, trailing));
        }
        ops
    }
}

/// A contig produced by the local assembler together with its aligner hits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledContig {
    /// Contig bases as assembled.
    #[serde(with = "bases_as_text")]
    pub sequence: Arc<[u8]>,
    /// Every hit the aligner reported for this contig.
    pub alignments: Vec<RawAlignment>,
}

mod bases_as_text {
    use super::*;

    pub fn serialize<S: Serializer>(bases: &Arc<[u8]>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(bases))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<[u8]>, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Arc::from(text.into_bytes()))
    }
}

/// Outcome of assembling one candidate region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssemblyOutcome {
    /// Assembly produced contigs that were aligned.
    Assembled {
        /// Contigs in assembler order.
        contigs: Vec<AssembledContig>,
    },
    /// Assembly was skipped or failed.
    Excused {
        /// Why no contigs exist.
        reason: String,
    },
}

/// One local assembly, successful or excused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyResult {
    /// Assembly identifier, used to name its contigs.
    pub assembly_id: u32,
    /// Contigs or the excuse.
    pub outcome: AssemblyOutcome,
}

impl AssemblyResult {
    /// Convenience constructor for a successful assembly.
    pub fn assembled(assembly_id: u32, contigs: Vec<AssembledContig>) -> Self {
        Self {
            assembly_id,
            outcome: AssemblyOutcome::Assembled { contigs },
        }
    }

    /// Convenience constructor for a failed assembly.
    pub fn excused(assembly_id: u32, reason: impl Into<String>) -> Self {
        Self {
            assembly_id,
            outcome: AssemblyOutcome::Excused {
                reason: reason.into(),
            },
        }
    }

    /// Contigs of a successful assembly; `None` when excused.
    pub fn contigs(&self) -> Option<&[AssembledContig]> {
        match &self.outcome {
            AssemblyOutcome::Assembled { contigs } => Some(contigs),
            AssemblyOutcome::Excused { .. } => None,
        }
    }
}

/// Named reference sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSequence {
    /// Sequence name.
    pub name: Arc<str>,
    /// Sequence length.
    pub length: u32,
}

/// Reference dictionary indexed by aligner reference id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceNames {
    sequences: Vec<ReferenceSequence>,
}

impl ReferenceNames {
    /// Build from `(name, length)` pairs in reference id order.
    pub fn new<N: Into<Arc<str>>>(entries: impl IntoIterator<Item = (N, u32)>) -> Self {
        Self {
            sequences: entries
                .into_iter()
                .map(|(name, length)| ReferenceSequence {
                    name: name.into(),
                    length,
                })
                .collect(),
        }
    }

    /// Name for a reference id.
    pub fn name(&self, ref_id: i32) -> Option<&Arc<str>> {
        usize::try_from(ref_id)
            .ok()
            .and_then(|idx| self.sequences.get(idx))
            .map(|seq| &seq.name)
    }

    /// Shared handle for a name present in the dictionary.
    pub fn lookup(&self, name: &str) -> Option<&Arc<str>> {
        self.sequences
            .iter()
            .find(|seq| seq.name.as_ref() == name)
            .map(|seq| &seq.name)
    }

    /// Position of `name` in dictionary order; names outside the dictionary rank last.
    pub fn rank(&self, name: &str) -> usize {
        self.sequences
            .iter()
            .position(|seq| seq.name.as_ref() == name)
            .unwrap_or(usize::MAX)
    }

    /// Ordered entries.
    pub fn iter(&self) -> impl Iterator<Item = &ReferenceSequence> {
        self.sequences.iter()
    }

    /// Number of sequences.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}
