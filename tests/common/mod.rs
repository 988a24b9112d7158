#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use sv_discovery::alignment::{
    AssembledContig, AssemblyResult, CigarOp, CigarOpKind, RawAlignment, ReferenceNames,
    SimpleInterval, Strand,
};
use sv_discovery::evidence::{EvidenceTargetLink, StrandedInterval};
use sv_discovery::pipeline::{CallWriter, ReadMetadata, RunInputs, SvDiscoveryInputData};
use sv_discovery::{DiscoveryError, InMemoryReference, StructuralCallRecord};

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("SV_DISCOVERY_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set SV_DISCOVERY_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

pub const SAMPLE: &str = "NA12878";

/// `chr1` and `chr2`, 10 kb each.
pub fn reference_names() -> ReferenceNames {
    ReferenceNames::new([("chr1", 10_000), ("chr2", 10_000)])
}

pub fn reference() -> InMemoryReference {
    InMemoryReference::new()
        .with_sequence("chr1", b"ACGT".repeat(2_500))
        .with_sequence("chr2", b"TTGCA".repeat(2_000))
}

/// Mapped primary hit with a single `M` run over `seq` (0-based, half-open).
pub fn hit(ref_id: i32, ref_start: i32, seq: (u32, u32)) -> RawAlignment {
    let len = seq.1 - seq.0;
    RawAlignment {
        ref_id,
        ref_start,
        ref_end: ref_start + len as i32,
        seq_start: seq.0,
        seq_end: seq.1,
        cigar: vec![CigarOp::new(CigarOpKind::Match, len)],
        mapq: 60,
        mismatches: 0,
        score: len as i32,
        sam_flag: 0,
    }
}

pub fn contig(len: usize, alignments: Vec<RawAlignment>) -> AssembledContig {
    let bases: Vec<u8> = (0..len).map(|i| b"ACGTTGCA"[i % 8]).collect();
    AssembledContig {
        sequence: Arc::from(bases),
        alignments,
    }
}

/// Contig whose two halves sit 50 bases apart on `chr1` (1000-1099 and 1150-1249).
pub fn deletion_assembly(assembly_id: u32) -> AssemblyResult {
    AssemblyResult::assembled(
        assembly_id,
        vec![contig(200, vec![hit(0, 999, (0, 100)), hit(0, 1149, (100, 200))])],
    )
}

/// Contig joining `chr1:3000-3099` to `chr2:500-599`.
pub fn breakend_assembly(assembly_id: u32) -> AssemblyResult {
    AssemblyResult::assembled(
        assembly_id,
        vec![contig(200, vec![hit(0, 2999, (0, 100)), hit(1, 499, (100, 200))])],
    )
}

pub fn side(contig: &str, start: u32, end: u32, strand: Strand) -> StrandedInterval {
    StrandedInterval::new(SimpleInterval::new(contig, start, end), strand)
}

/// Deletion-consistent link on `chr1`.
pub fn deletion_link(
    left: (u32, u32),
    right: (u32, u32),
    split_reads: u32,
    read_pairs: u32,
) -> EvidenceTargetLink {
    EvidenceTargetLink::new(
        side("chr1", left.0, left.1, Strand::Forward),
        side("chr1", right.0, right.1, Strand::Reverse),
        split_reads,
        read_pairs,
    )
}

pub fn run_inputs(assemblies: Vec<AssemblyResult>) -> RunInputs {
    RunInputs {
        sample_id: SAMPLE.to_string(),
        reference_names: reference_names(),
        read_metadata: ReadMetadata {
            sample: SAMPLE.to_string(),
            median_fragment_size: 400,
        },
        assemblies,
        evidence_links: Vec::new(),
    }
}

/// Writer that only remembers what it was asked to write.
#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub writes: Mutex<Vec<(PathBuf, Vec<StructuralCallRecord>)>>,
}

impl RecordingWriter {
    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

impl CallWriter for RecordingWriter {
    fn write(
        &self,
        data: &SvDiscoveryInputData,
        calls: &[StructuralCallRecord],
    ) -> Result<(), DiscoveryError> {
        self.writes
            .lock()
            .unwrap()
            .push((data.output_path.clone(), calls.to_vec()));
        Ok(())
    }
}
