use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::alignment::{AssemblyResult, ReferenceNames};
use crate::config::DiscoveryConfig;
use crate::evidence::{CnvOverlay, EvidenceIndex, EvidenceTargetLink};
use crate::reference::ReferenceSource;

/// Library statistics of the sequenced sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadMetadata {
    /// Sample name.
    pub sample: String,
    /// Median insert size of read pairs.
    pub median_fragment_size: u32,
}

impl ReadMetadata {
    /// Padding applied to breakpoint sides when looking up evidence.
    pub fn default_evidence_padding(&self) -> u32 {
        self.median_fragment_size / 2
    }
}

/// Everything a run reads besides the reference and the external files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInputs {
    /// Sample identifier written to the output.
    pub sample_id: String,
    /// Reference dictionary in aligner id order.
    pub reference_names: ReferenceNames,
    /// Library statistics.
    pub read_metadata: ReadMetadata,
    /// Local assemblies with their contig alignments.
    pub assemblies: Vec<AssemblyResult>,
    /// Evidence links gathered from the reads.
    #[serde(default)]
    pub evidence_links: Vec<EvidenceTargetLink>,
}

/// Read-only context shared by every stage of a run.
#[derive(Debug, Clone)]
pub struct SvDiscoveryInputData {
    /// Sample identifier.
    pub sample_id: String,
    /// Run configuration.
    pub config: Arc<DiscoveryConfig>,
    /// Where the call set goes.
    pub output_path: PathBuf,
    /// Library statistics.
    pub read_metadata: Arc<ReadMetadata>,
    /// Reference dictionary.
    pub reference_names: Arc<ReferenceNames>,
    /// Reference bases.
    pub reference: Arc<dyn ReferenceSource>,
    /// External CNV calls, when configured.
    pub cnv_calls: Option<Arc<CnvOverlay>>,
    /// Evidence index, when any links exist.
    pub evidence: Option<Arc<EvidenceIndex>>,
}

impl SvDiscoveryInputData {
    /// Same context writing to a different path.
    pub fn with_output_path(&self, output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            ..self.clone()
        }
    }

    /// Output location.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Padding for evidence lookups: the configured value or half the median fragment.
    pub fn evidence_padding(&self) -> u32 {
        self.config
            .evidence_padding
            .unwrap_or_else(|| self.read_metadata.default_evidence_padding())
    }
}
