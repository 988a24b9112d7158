use std::path::Path;

use rust_htslib::bam::{self, header::Header, header::HeaderRecord, HeaderView, Record, Writer};
use tracing::info;

use crate::alignment::{assembly_sam_lines, AssemblyResult, ReferenceNames};
use crate::error::DiscoveryError;

/// BAM header listing every sequence of the reference dictionary.
pub fn contig_bam_header(names: &ReferenceNames) -> Header {
    let mut header = Header::new();

    let mut hd = HeaderRecord::new(b"HD");
    hd.push_tag(b"VN", &"1.6");
    hd.push_tag(b"SO", &"unknown");
    header.push_record(&hd);

    for sequence in names.iter() {
        let mut sq = HeaderRecord::new(b"SQ");
        sq.push_tag(b"SN", &sequence.name.as_ref());
        sq.push_tag(b"LN", &i64::from(sequence.length));
        header.push_record(&sq);
    }
    header
}

/// Create a BAM writer for contig alignments.
pub fn create_contig_bam_writer<P: AsRef<Path>>(
    output_path: P,
    names: &ReferenceNames,
) -> Result<Writer, DiscoveryError> {
    let header = contig_bam_header(names);
    Ok(bam::Writer::from_path(output_path, &header, bam::Format::Bam)?)
}

/// Write every aligner hit of every successful assembly as a BAM record.
///
/// Records are produced from the same SAM text the SAM parse path reads, so the file
/// shows exactly what the parser saw. Returns the number of records written.
pub fn write_contig_alignments(
    output_path: &Path,
    assemblies: &[AssemblyResult],
    names: &ReferenceNames,
) -> Result<usize, DiscoveryError> {
    let mut writer = create_contig_bam_writer(output_path, names)?;
    let mut view = HeaderView::from_header(&contig_bam_header(names));

    let mut written = 0;
    for assembly in assemblies {
        for contig_lines in assembly_sam_lines(assembly, names)? {
            for line in contig_lines {
                let record = Record::from_sam(&mut view, line.as_bytes())?;
                writer.write(&record)?;
                written += 1;
            }
        }
    }
    info!(records = written, path = %output_path.display(), "wrote contig alignments");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{AssembledContig, CigarOp, CigarOpKind, RawAlignment};
    use rust_htslib::bam::Read;
    use std::sync::Arc;

    #[test]
    fn contig_alignments_round_trip_through_bam() {
        let names = ReferenceNames::new([("chr1", 10_000)]);
        let assemblies = vec![AssemblyResult::assembled(
            3,
            vec![AssembledContig {
                sequence: Arc::from(b"ACGT".repeat(25)),
                alignments: vec![RawAlignment {
                    ref_id: 0,
                    ref_start: 499,
                    ref_end: 599,
                    seq_start: 0,
                    seq_end: 100,
                    cigar: vec![CigarOp::new(CigarOpKind::Match, 100)],
                    mapq: 60,
                    mismatches: 0,
                    score: 100,
                    sam_flag: 0,
                }],
            }],
        )];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contigs.bam");
        assert_eq!(write_contig_alignments(&path, &assemblies, &names).unwrap(), 1);

        let mut reader = bam::Reader::from_path(&path).unwrap();
        let records: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].qname(), b"asm000003:tig00000");
        assert_eq!(records[0].pos(), 499);
    }
}
