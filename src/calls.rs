//! Structural variant call records produced by the pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::alignment::{ReferenceNames, SimpleInterval, Strand};
use crate::evidence::{PairedStrandedIntervals, StrandedInterval};

/// Structural variant type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SvType {
    /// Reference bases removed.
    Deletion,
    /// Novel bases inserted.
    Insertion,
    /// Reference segment reversed.
    Inversion,
    /// Reference segment repeated in tandem.
    Duplication,
    /// Adjacency between distant loci.
    Breakend,
}

impl SvType {
    /// Short tag used in identifiers and the `SVTYPE` column.
    pub fn abbreviation(self) -> &'static str {
        match self {
            SvType::Deletion => "DEL",
            SvType::Insertion => "INS",
            SvType::Inversion => "INV",
            SvType::Duplication => "DUP",
            SvType::Breakend => "BND",
        }
    }

    /// Symbolic alternate allele.
    pub fn symbolic_allele(self) -> String {
        format!("<{}>", self.abbreviation())
    }
}

impl fmt::Display for SvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Genotype zygosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Zygosity {
    /// Not genotyped.
    #[default]
    NoCall,
    /// One alternate allele.
    HetVariant,
    /// Two alternate alleles.
    HomVariant,
    /// Reference only.
    HomReference,
}

impl Zygosity {
    /// Diploid `GT` representation.
    pub fn as_gt(self) -> &'static str {
        match self {
            Zygosity::NoCall => "./.",
            Zygosity::HetVariant => "0/1",
            Zygosity::HomVariant => "1/1",
            Zygosity::HomReference => "0/0",
        }
    }
}

/// Per-sample genotype.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Genotype {
    /// Sample name.
    pub sample: String,
    /// Zygosity.
    pub zygosity: Zygosity,
    /// Maximum a posteriori copy number, when known.
    pub copy_number: Option<u32>,
}

impl Genotype {
    /// Ungenotyped sample.
    pub fn no_call(sample: impl Into<String>) -> Self {
        Self {
            sample: sample.into(),
            ..Self::default()
        }
    }
}

/// How the call was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallProvenance {
    /// Base-pair resolution from assembled contigs.
    Precise,
    /// Aggregated evidence only.
    Imprecise,
}

/// Split-read and read-pair counts backing a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvidenceSupport {
    /// Split reads.
    pub split_reads: u32,
    /// Discordant read pairs.
    pub read_pairs: u32,
}

/// External CNV call overlapping a structural variant call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CnvOverlap {
    /// CNV call identifier.
    pub id: String,
    /// Its maximum a posteriori copy number.
    pub copy_number: Option<u32>,
}

/// Remote side of a breakend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BreakendMate {
    /// Mate contig.
    pub contig: Arc<str>,
    /// Mate position (1-based).
    pub position: u32,
}

/// One structural variant call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralCallRecord {
    /// Call identifier.
    pub id: String,
    /// Reference contig.
    pub contig: Arc<str>,
    /// 1-based position.
    pub start: u32,
    /// 1-based end position.
    pub end: u32,
    /// Variant type.
    pub sv_type: SvType,
    /// Signed variant length (negative for deletions).
    pub sv_len: i64,
    /// Reference base at `start`, `N` when unavailable.
    pub ref_allele: u8,
    /// Breakpoint strands `(left, right)`.
    pub strands: (Strand, Strand),
    /// Remote locus of a breakend.
    pub mate: Option<BreakendMate>,
    /// Sample genotype.
    pub genotype: Genotype,
    /// Precise or imprecise.
    pub provenance: CallProvenance,
    /// Evidence supporting the call.
    pub evidence: Option<EvidenceSupport>,
    /// Confidence interval around `start` (imprecise only).
    pub ci_pos: Option<SimpleInterval>,
    /// Confidence interval around `end` (imprecise only).
    pub ci_end: Option<SimpleInterval>,
    /// Inserted bases at the junction.
    pub inserted_sequence: Option<Vec<u8>>,
    /// Bases shared by both flanks.
    pub microhomology: Option<Vec<u8>>,
    /// Contigs the call was derived from.
    pub supporting_contigs: Vec<String>,
    /// Overlapping external CNV calls.
    pub external_cnv: Vec<CnvOverlap>,
    /// Junctions merged into this call.
    pub junction_count: u32,
    /// INFO-style attributes written by the annotation engine.
    pub attributes: BTreeMap<String, String>,
}

impl StructuralCallRecord {
    /// Call skeleton with no genotype, evidence or annotation.
    pub fn new(
        contig: Arc<str>,
        start: u32,
        end: u32,
        sv_type: SvType,
        strands: (Strand, Strand),
        provenance: CallProvenance,
    ) -> Self {
        let id = match provenance {
            CallProvenance::Precise => format!("{}_{}_{}_{}", sv_type, contig, start, end),
            CallProvenance::Imprecise => {
                format!("IMPRECISE_{}_{}_{}_{}", sv_type, contig, start, end)
            }
        };
        let sv_len = match sv_type {
            SvType::Deletion => -(i64::from(end) - i64::from(start)),
            SvType::Breakend => 0,
            _ => i64::from(end) - i64::from(start),
        };
        Self {
            id,
            contig,
            start,
            end,
            sv_type,
            sv_len,
            ref_allele: b'N',
            strands,
            mate: None,
            genotype: Genotype::default(),
            provenance,
            evidence: None,
            ci_pos: None,
            ci_end: None,
            inserted_sequence: None,
            microhomology: None,
            supporting_contigs: Vec::new(),
            external_cnv: Vec::new(),
            junction_count: 1,
            attributes: BTreeMap::new(),
        }
    }

    /// Symbolic alternate allele.
    pub fn alt_allele(&self) -> String {
        self.sv_type.symbolic_allele()
    }

    /// Region of the reference touched by the call.
    pub fn span(&self) -> SimpleInterval {
        SimpleInterval::new(Arc::clone(&self.contig), self.start, self.end.max(self.start))
    }

    /// Both breakpoint sides with their strands; `None` for insertions.
    pub fn breakpoint_sides(&self) -> Option<PairedStrandedIntervals> {
        let left = StrandedInterval::new(
            SimpleInterval::new(Arc::clone(&self.contig), self.start, self.start),
            self.strands.0,
        );
        let right = match (&self.mate, self.sv_type) {
            (_, SvType::Insertion) => return None,
            (Some(mate), _) => SimpleInterval::new(Arc::clone(&mate.contig), mate.position, mate.position),
            (None, _) => SimpleInterval::new(Arc::clone(&self.contig), self.end, self.end),
        };
        Some(PairedStrandedIntervals::new(
            left,
            StrandedInterval::new(right, self.strands.1),
        ))
    }
}

/// Stable sort by reference order (dictionary index, then name), start, end and type.
pub fn sort_calls(calls: &mut [StructuralCallRecord], names: &ReferenceNames) {
    calls.sort_by(|a, b| {
        (names.rank(&a.contig), &a.contig, a.start, a.end, a.sv_type)
            .cmp(&(names.rank(&b.contig), &b.contig, b.start, b.end, b.sv_type))
    });
}
