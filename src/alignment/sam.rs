//! Contig alignments routed through SAM text.
//!
//! This path renders every aligner hit as a SAM line and then parses the line back,
//! deriving contig coordinates from clipping and strand alone. It must agree with
//! [`parse_assemblies_direct`](super::parse_assemblies_direct) on every input; the
//! contig BAM writer reuses the rendered records.

use std::str::FromStr;

use rayon::prelude::*;
use tracing::debug;

use super::parser::has_equally_good_alternative;
use super::raw::{AssemblyResult, RawAlignment, ReferenceNames, FLAG_REVERSE, FLAG_SECONDARY, FLAG_UNMAPPED};
use super::split::split_gapped_alignment;
use super::types::{
    cigar_to_string, contig_span_from_cigar, format_contig_name, parse_cigar, reference_length,
    reverse_complement, AlignedContig, AlignmentInterval, AlignmentOrigin, CigarOp, CigarOpKind,
    SimpleInterval, Strand,
};
use super::ParseError;

/// Fields of one SAM alignment line used by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamAlignmentLine {
    /// Contig name.
    pub qname: String,
    /// SAM flag bits.
    pub flag: u16,
    /// Reference name, `*` when unmapped.
    pub rname: String,
    /// 1-based leftmost reference position, 0 when unmapped.
    pub pos: u32,
    /// Mapping quality.
    pub mapq: u8,
    /// Full CIGAR including clipping.
    pub cigar: Vec<CigarOp>,
    /// Stored bases (hard-clipped bases absent), empty for `*`.
    pub seq: Vec<u8>,
    /// `NM` tag.
    pub mismatches: Option<u32>,
    /// `AS` tag.
    pub score: Option<i32>,
}

impl SamAlignmentLine {
    /// Unmapped flag set.
    pub fn is_unmapped(&self) -> bool {
        self.flag & FLAG_UNMAPPED != 0
    }

    /// Secondary flag set.
    pub fn is_secondary(&self) -> bool {
        self.flag & FLAG_SECONDARY != 0
    }

    /// Strand from the reverse flag.
    pub fn strand(&self) -> Strand {
        Strand::from_reverse_flag(self.flag & FLAG_REVERSE != 0)
    }
}

/// Render one aligner hit of contig `qname` as a SAM text line.
pub fn to_sam_line(
    qname: &str,
    contig_sequence: &[u8],
    hit: &RawAlignment,
    names: &ReferenceNames,
) -> Result<String, ParseError> {
    if hit.is_unmapped() {
        let seq = String::from_utf8_lossy(contig_sequence);
        return Ok(format!(
            "{qname}\t{flag}\t*\t0\t0\t*\t*\t0\t0\t{seq}\t*\tAS:i:{score}",
            flag = hit.sam_flag | FLAG_UNMAPPED,
            score = hit.score,
        ));
    }

    let rname = names
        .name(hit.ref_id)
        .ok_or(ParseError::UnknownReferenceId(hit.ref_id))?;
    hit.validate(contig_sequence.len() as u32)?;
    let cigar = hit.clipped_cigar(contig_sequence.len() as u32);
    let oriented = if hit.strand().is_reverse() {
        reverse_complement(contig_sequence)
    } else {
        contig_sequence.to_vec()
    };
    let hard_leading: usize = hard_clip_run(cigar.iter());
    let hard_trailing: usize = hard_clip_run(cigar.iter().rev());
    let stored = &oriented[hard_leading..oriented.len() - hard_trailing];

    Ok(format!(
        "{qname}\t{flag}\t{rname}\t{pos}\t{mapq}\t{cigar}\t*\t0\t0\t{seq}\t*\tNM:i:{nm}\tAS:i:{score}",
        flag = hit.sam_flag,
        pos = hit.ref_start + 1,
        mapq = hit.mapq,
        cigar = cigar_to_string(&cigar),
        seq = String::from_utf8_lossy(stored),
        nm = hit.mismatches,
        score = hit.score,
    ))
}

fn hard_clip_run<'a>(ops: impl Iterator<Item = &'a CigarOp>) -> usize {
    ops.take_while(|op| op.kind.is_clip())
        .filter(|op| op.kind == CigarOpKind::HardClip)
        .map(|op| op.len as usize)
        .sum()
}

/// Parse a SAM alignment line.
pub fn parse_sam_line(line: &str) -> Result<SamAlignmentLine, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 11 {
        return Err(ParseError::MalformedSam(format!(
            "expected at least 11 columns, found {}",
            fields.len()
        )));
    }

    let mut mismatches = None;
    let mut score = None;
    for tag in &fields[11..] {
        let mut parts = tag.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("NM"), Some("i"), Some(value)) => {
                mismatches = Some(value.parse().map_err(|_| {
                    ParseError::MalformedSam(format!("invalid NM tag '{tag}'"))
                })?);
            }
            (Some("AS"), Some("i"), Some(value)) => {
                score = Some(value.parse().map_err(|_| {
                    ParseError::MalformedSam(format!("invalid AS tag '{tag}'"))
                })?);
            }
            _ => {}
        }
    }

    Ok(SamAlignmentLine {
        qname: fields[0].to_string(),
        flag: column(&fields, 1, "FLAG")?,
        rname: fields[2].to_string(),
        pos: column(&fields, 3, "POS")?,
        mapq: column(&fields, 4, "MAPQ")?,
        cigar: parse_cigar(fields[5])?,
        seq: if fields[9] == "*" {
            Vec::new()
        } else {
            fields[9].as_bytes().to_vec()
        },
        mismatches,
        score,
    })
}

fn column<T: FromStr>(fields: &[&str], idx: usize, what: &str) -> Result<T, ParseError> {
    fields[idx]
        .parse()
        .map_err(|_| ParseError::MalformedSam(format!("invalid {what} '{}'", fields[idx])))
}

/// Build an [`AlignmentInterval`] from a mapped SAM line.
pub fn interval_from_sam(
    line: &SamAlignmentLine,
    names: &ReferenceNames,
) -> Result<AlignmentInterval, ParseError> {
    let contig = names
        .lookup(&line.rname)
        .ok_or_else(|| ParseError::UnknownReferenceName(line.rname.clone()))?;
    let ref_len = reference_length(&line.cigar);
    if ref_len == 0 || line.pos == 0 {
        return Err(ParseError::EmptyReferenceSpan {
            contig: line.rname.clone(),
            start: line.pos as i64,
            end: line.pos as i64 + ref_len as i64,
        });
    }

    let stored: u32 = line
        .cigar
        .iter()
        .filter(|op| op.kind.consumes_query())
        .map(|op| op.len)
        .sum();
    if !line.seq.is_empty() && stored as usize != line.seq.len() {
        return Err(ParseError::SequenceLengthMismatch {
            expected: stored as usize,
            found: line.seq.len(),
        });
    }

    let strand = line.strand();
    let (start_in_contig, end_in_contig) = contig_span_from_cigar(&line.cigar, strand);
    Ok(AlignmentInterval {
        reference_span: SimpleInterval::new(contig.clone(), line.pos, line.pos + ref_len - 1),
        start_in_contig,
        end_in_contig,
        strand,
        cigar: line.cigar.clone(),
        mapq: line.mapq,
        mismatches: line.mismatches,
        score: line.score.unwrap_or(0),
        origin: AlignmentOrigin::Aligner,
    })
}

/// SAM lines for every hit of every contig in successful assemblies.
pub fn assembly_sam_lines(
    assembly: &AssemblyResult,
    names: &ReferenceNames,
) -> Result<Vec<Vec<String>>, ParseError> {
    let Some(contigs) = assembly.contigs() else {
        return Ok(Vec::new());
    };
    contigs
        .iter()
        .enumerate()
        .map(|(idx, contig)| {
            let qname = format_contig_name(assembly.assembly_id, idx);
            contig
                .alignments
                .iter()
                .map(|hit| to_sam_line(&qname, &contig.sequence, hit, names))
                .collect()
        })
        .collect()
}

/// Parse assemblies by way of SAM text; equivalent to the direct path.
pub fn parse_assemblies_via_sam(
    assemblies: &[AssemblyResult],
    names: &ReferenceNames,
    split_sensitivity: u32,
) -> Result<Vec<AlignedContig>, ParseError> {
    let per_assembly = assemblies
        .par_iter()
        .map(|assembly| {
            let Some(contigs) = assembly.contigs() else {
                return Ok(Vec::new());
            };
            let rendered = assembly_sam_lines(assembly, names)?;
            contigs
                .iter()
                .zip(rendered)
                .enumerate()
                .map(|(idx, (contig, lines))| {
                    let parsed = lines
                        .iter()
                        .map(|line| parse_sam_line(line))
                        .collect::<Result<Vec<_>, _>>()?;
                    let ambiguous = has_equally_good_alternative(
                        parsed
                            .iter()
                            .filter(|line| !line.is_unmapped())
                            .map(|line| (line.is_secondary(), line.score.unwrap_or(0))),
                    );
                    let mut alignments = Vec::new();
                    for line in parsed
                        .iter()
                        .filter(|line| !line.is_unmapped() && !line.is_secondary())
                    {
                        let interval = interval_from_sam(line, names)?;
                        alignments.extend(split_gapped_alignment(&interval, split_sensitivity));
                    }
                    Ok(AlignedContig::new(
                        format_contig_name(assembly.assembly_id, idx),
                        contig.sequence.clone(),
                        alignments,
                        ambiguous,
                    ))
                })
                .collect::<Result<Vec<_>, ParseError>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let contigs: Vec<AlignedContig> = per_assembly
        .into_iter()
        .flatten()
        .filter(|contig| !contig.alignments.is_empty())
        .collect();
    debug!(contigs = contigs.len(), "parsed contig alignments via SAM records");
    Ok(contigs)
}
