//! # Structural variant discovery from assembled contigs
//!
//! Local assemblies of candidate regions are aligned back to the reference; contigs
//! whose alignments are split or gapped reveal novel adjacencies. This crate turns
//! those contig alignments, together with read-level breakpoint evidence, into a
//! genotyped and annotated structural variant call set.
//!
//! ## Stages
//!
//! 1. **Parsing**: aligner hits become [`alignment::AlignedContig`]s, with large
//!    gapped alignments split into pieces.
//! 2. **Classification**: every contig receives one [`inference::RawCategory`].
//! 3. **Precise calling**: each trusted junction is typed into a base-pair call.
//! 4. **Reconciliation**: calls collect read evidence and external copy numbers.
//! 5. **Imprecise calling**: clusters of deletion-consistent evidence links.
//! 6. **Annotation**: registry-selected annotations and `binding.FIELD` expressions.
//!
//! ## Usage Example
//!
//! ```ignore
//! use sv_discovery::{DiscoveryConfig, SvDiscoveryPipeline, io::TsvCallWriter};
//!
//! let inputs = sv_discovery::io::read_run_inputs("run.json".as_ref())?;
//! let reference = Arc::new(sv_discovery::io::read_fasta("ref.fa".as_ref())?);
//! let pipeline = SvDiscoveryPipeline::new(DiscoveryConfig::default());
//! let outcome = pipeline.run(inputs, reference, "calls.tsv", &TsvCallWriter)?;
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod alignment;  // Contig alignment model and parsers
pub mod annotation; // Call annotation registry and engine
pub mod calls;      // Structural variant call records
pub mod config;     // Run configuration
pub mod error;      // Top-level error type
pub mod evidence;   // Evidence links, interval index, CNV overlay
pub mod inference;  // Classification, precise/imprecise calling, reconciliation
pub mod io;         // File adapters
pub mod pipeline;   // Orchestration
pub mod reference;  // Reference base access

// Re-exports for convenience
pub use alignment::{AlignedContig, AlignmentInterval, ParseError, SimpleInterval, Strand};
pub use annotation::{AnnotationEngine, AnnotationError, AnnotationRegistry};
pub use calls::{StructuralCallRecord, SvType};
pub use config::{ConfigError, DiscoveryConfig};
pub use error::DiscoveryError;
pub use evidence::{EvidenceIndex, EvidenceTargetLink, PairedStrandedIntervalTree};
pub use inference::RawCategory;
pub use pipeline::{CallWriter, RunInputs, RunOutcome, SvDiscoveryInputData, SvDiscoveryPipeline};
pub use reference::{InMemoryReference, ReferenceSource};
