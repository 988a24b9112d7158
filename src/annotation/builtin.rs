//! Annotations shipped with the crate.

use crate::calls::{CallProvenance, Genotype, StructuralCallRecord, SvType};
use crate::inference::zygosity_from_copy_number;

use super::api::{AnnotationContext, CallAnnotation, FieldDescription};
use super::AnnotationError;

type InfoResult = Result<Vec<(String, String)>, AnnotationError>;

fn field(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

/// `SVTYPE`, `SVLEN`, `END`, strands and breakend mates.
#[derive(Debug, Default, Clone, Copy)]
pub struct VariantShape;

impl CallAnnotation for VariantShape {
    fn name(&self) -> &'static str {
        "variant_shape"
    }

    fn description(&self) -> &'static str {
        "Variant type, length, end position and breakpoint strands."
    }

    fn describe_fields(&self) -> Vec<FieldDescription> {
        vec![
            FieldDescription::info("SVTYPE", "1", "String", "Type of structural variant"),
            FieldDescription::info("SVLEN", "1", "Integer", "Difference in length between REF and ALT alleles"),
            FieldDescription::info("END", "1", "Integer", "End position of the variant"),
            FieldDescription::info("STRANDS", "1", "String", "Breakpoint side strands"),
            FieldDescription::info("MATE", "1", "String", "Remote locus of a breakend"),
        ]
    }

    fn compute_info(&self, call: &StructuralCallRecord, _context: &AnnotationContext<'_>) -> InfoResult {
        let mut info = vec![
            field("SVTYPE", call.sv_type),
            field("END", call.end),
            field(
                "STRANDS",
                format!("{}{}", call.strands.0.symbol(), call.strands.1.symbol()),
            ),
        ];
        if call.sv_type != SvType::Breakend {
            info.push(field("SVLEN", call.sv_len));
        }
        if let Some(mate) = &call.mate {
            info.push(field("MATE", format!("{}:{}", mate.contig, mate.position)));
        }
        Ok(info)
    }
}

/// Split-read and read-pair counts.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvidenceCounts;

impl CallAnnotation for EvidenceCounts {
    fn name(&self) -> &'static str {
        "evidence_counts"
    }

    fn description(&self) -> &'static str {
        "Split reads and discordant read pairs supporting the call."
    }

    fn describe_fields(&self) -> Vec<FieldDescription> {
        vec![
            FieldDescription::info("SR", "1", "Integer", "Supporting split reads"),
            FieldDescription::info("PE", "1", "Integer", "Supporting discordant read pairs"),
        ]
    }

    fn compute_info(&self, call: &StructuralCallRecord, _context: &AnnotationContext<'_>) -> InfoResult {
        Ok(call
            .evidence
            .map(|support| {
                vec![
                    field("SR", support.split_reads),
                    field("PE", support.read_pairs),
                ]
            })
            .unwrap_or_default())
    }
}

/// `IMPRECISE` flag with `CIPOS`/`CIEND` offsets.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfidenceIntervals;

impl CallAnnotation for ConfidenceIntervals {
    fn name(&self) -> &'static str {
        "confidence_intervals"
    }

    fn description(&self) -> &'static str {
        "Imprecise flag and confidence intervals around POS and END."
    }

    fn describe_fields(&self) -> Vec<FieldDescription> {
        vec![
            FieldDescription::info("IMPRECISE", "0", "Flag", "Imprecise structural variation"),
            FieldDescription::info("CIPOS", "2", "Integer", "Confidence interval around POS"),
            FieldDescription::info("CIEND", "2", "Integer", "Confidence interval around END"),
        ]
    }

    fn compute_info(&self, call: &StructuralCallRecord, _context: &AnnotationContext<'_>) -> InfoResult {
        if call.provenance != CallProvenance::Imprecise {
            return Ok(Vec::new());
        }
        let offsets = |anchor: u32, start: u32, end: u32| {
            format!(
                "{},{}",
                i64::from(start) - i64::from(anchor),
                i64::from(end) - i64::from(anchor)
            )
        };
        let mut info = vec![field("IMPRECISE", "")];
        if let Some(ci) = &call.ci_pos {
            info.push(field("CIPOS", offsets(call.start, ci.start, ci.end)));
        }
        if let Some(ci) = &call.ci_end {
            info.push(field("CIEND", offsets(call.end, ci.start, ci.end)));
        }
        Ok(info)
    }
}

/// Supporting contigs, junction count, microhomology and inserted bases.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContigSupport;

impl CallAnnotation for ContigSupport {
    fn name(&self) -> &'static str {
        "contig_support"
    }

    fn description(&self) -> &'static str {
        "Assembled contigs and junction sequence behind precise calls."
    }

    fn describe_fields(&self) -> Vec<FieldDescription> {
        vec![
            FieldDescription::info("CONTIGS", ".", "String", "Supporting assembled contigs"),
            FieldDescription::info("JUNCTIONS", "1", "Integer", "Contig junctions merged into the call"),
            FieldDescription::info("HOMSEQ", "1", "String", "Microhomology at the breakpoint"),
            FieldDescription::info("INSSEQ", "1", "String", "Inserted sequence at the breakpoint"),
        ]
    }

    fn compute_info(&self, call: &StructuralCallRecord, _context: &AnnotationContext<'_>) -> InfoResult {
        if call.supporting_contigs.is_empty() {
            return Ok(Vec::new());
        }
        let mut info = vec![
            field("CONTIGS", call.supporting_contigs.join(",")),
            field("JUNCTIONS", call.junction_count),
        ];
        if let Some(bases) = call.microhomology.as_deref().filter(|b| !b.is_empty()) {
            info.push(field("HOMSEQ", String::from_utf8_lossy(bases)));
        }
        if let Some(bases) = call.inserted_sequence.as_deref().filter(|b| !b.is_empty()) {
            info.push(field("INSSEQ", String::from_utf8_lossy(bases)));
        }
        Ok(info)
    }
}

/// Identifiers and copy numbers of overlapping external CNV calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExternalCnv;

impl CallAnnotation for ExternalCnv {
    fn name(&self) -> &'static str {
        "external_cnv"
    }

    fn description(&self) -> &'static str {
        "External CNV calls overlapping the variant, with their MAP copy numbers."
    }

    fn describe_fields(&self) -> Vec<FieldDescription> {
        vec![FieldDescription::info(
            "EXTERNAL_CNV_CALLS",
            ".",
            "String",
            "Overlapping external CNV calls as id:copy_number",
        )]
    }

    fn compute_info(&self, call: &StructuralCallRecord, _context: &AnnotationContext<'_>) -> InfoResult {
        if call.external_cnv.is_empty() {
            return Ok(Vec::new());
        }
        let value = call
            .external_cnv
            .iter()
            .map(|cnv| match cnv.copy_number {
                Some(cn) => format!("{}:{}", cnv.id, cn),
                None => format!("{}:.", cnv.id),
            })
            .collect::<Vec<_>>()
            .join(",");
        Ok(vec![field("EXTERNAL_CNV_CALLS", value)])
    }
}

/// Genotype derived from the MAP copy number.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyNumberGenotype;

impl CallAnnotation for CopyNumberGenotype {
    fn name(&self) -> &'static str {
        "copy_number_genotype"
    }

    fn description(&self) -> &'static str {
        "Zygosity of deletions and duplications from the MAP copy number."
    }

    fn describe_fields(&self) -> Vec<FieldDescription> {
        vec![
            FieldDescription::format("GT", "1", "String", "Genotype"),
            FieldDescription::format("CN", "1", "Integer", "Copy number maximum a posteriori"),
        ]
    }

    fn compute_genotype(
        &self,
        call: &StructuralCallRecord,
        genotype: &mut Genotype,
        _context: &AnnotationContext<'_>,
    ) -> Result<(), AnnotationError> {
        if let Some(zygosity) = genotype
            .copy_number
            .and_then(|cn| zygosity_from_copy_number(call.sv_type, cn))
        {
            genotype.zygosity = zygosity;
        }
        Ok(())
    }
}
