//! File adapters: run inputs, reference FASTA, external CNV and evidence files, the
//! call table, and contig alignment BAM output.

mod bam;
mod inputs;
mod table;

pub use bam::{contig_bam_header, create_contig_bam_writer, write_contig_alignments};
pub use inputs::{
    parse_cnv_calls, parse_fasta, read_cnv_calls, read_evidence_links, read_fasta,
    read_run_inputs,
};
pub use table::{render_calls, write_calls, TsvCallWriter};
