use std::path::PathBuf;

use thiserror::Error;

/// Default length at which an internal gap splits an alignment.
pub const DEFAULT_SPLIT_SENSITIVITY: u32 = 30;
/// Default weighted evidence support required for an imprecise call.
pub const DEFAULT_IMPRECISE_THRESHOLD: u32 = 7;
/// Default minimum mapping quality of a junction flank.
pub const DEFAULT_MIN_MAPQ: u8 = 60;
/// Default minimum reference length of a junction flank.
pub const DEFAULT_MIN_ALIGNMENT_LENGTH: u32 = 50;

/// Configuration problems detected before any pipeline stage runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Mutually exclusive inputs were both supplied.
    #[error("{first} and {second} cannot be used together")]
    ConflictingInputs {
        /// First option name.
        first: &'static str,
        /// Second option name.
        second: &'static str,
    },

    /// Numeric parameter outside its valid range.
    #[error("invalid value for {name}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Which annotations decorate the final call set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSelection {
    /// Annotation ids to run; empty means every builtin.
    pub include: Vec<String>,
    /// Annotation ids never to run.
    pub exclude: Vec<String>,
    /// `binding.FIELD` expressions copied into each call's attributes.
    pub expressions: Vec<String>,
}

/// Parameters of one discovery run.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryConfig {
    /// Gap length at which gapped alignments are split.
    pub split_sensitivity: u32,
    /// Weighted evidence support required to emit an imprecise call.
    pub imprecise_evidence_threshold: u32,
    /// Minimum mapping quality for both flanks of a junction.
    pub min_mapq: u8,
    /// Minimum reference length for both flanks of a junction.
    pub min_alignment_length: u32,
    /// Weight of one split read in the support score.
    pub split_read_weight: u32,
    /// Weight of one read pair in the support score.
    pub read_pair_weight: u32,
    /// Padding applied to breakpoint sides when looking up evidence; derived from read
    /// metadata when unset.
    pub evidence_padding: Option<u32>,
    /// Extra evidence links (JSON).
    pub external_evidence_file: Option<PathBuf>,
    /// External CNV calls (tab separated).
    pub cnv_calls_file: Option<PathBuf>,
    /// Directory receiving one call set per raw contig category.
    pub experimental_output_dir: Option<PathBuf>,
    /// Where to write contig alignments as BAM.
    pub contig_alignments_bam: Option<PathBuf>,
    /// Annotation choices.
    pub annotations: AnnotationSelection,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            split_sensitivity: DEFAULT_SPLIT_SENSITIVITY,
            imprecise_evidence_threshold: DEFAULT_IMPRECISE_THRESHOLD,
            min_mapq: DEFAULT_MIN_MAPQ,
            min_alignment_length: DEFAULT_MIN_ALIGNMENT_LENGTH,
            split_read_weight: 1,
            read_pair_weight: 1,
            evidence_padding: None,
            external_evidence_file: None,
            cnv_calls_file: None,
            experimental_output_dir: None,
            contig_alignments_bam: None,
            annotations: AnnotationSelection::default(),
        }
    }
}

impl DiscoveryConfig {
    /// Set the gap split sensitivity.
    pub fn with_split_sensitivity(mut self, sensitivity: u32) -> Self {
        self.split_sensitivity = sensitivity;
        self
    }

    /// Set the imprecise call threshold.
    pub fn with_imprecise_threshold(mut self, threshold: u32) -> Self {
        self.imprecise_evidence_threshold = threshold;
        self
    }

    /// Set the flank mapping quality floor.
    pub fn with_min_mapq(mut self, mapq: u8) -> Self {
        self.min_mapq = mapq;
        self
    }

    /// Set the flank length floor.
    pub fn with_min_alignment_length(mut self, length: u32) -> Self {
        self.min_alignment_length = length;
        self
    }

    /// Set evidence weights.
    pub fn with_weights(mut self, split_read_weight: u32, read_pair_weight: u32) -> Self {
        self.split_read_weight = split_read_weight;
        self.read_pair_weight = read_pair_weight;
        self
    }

    /// Override breakpoint padding used for evidence lookups.
    pub fn with_evidence_padding(mut self, padding: u32) -> Self {
        self.evidence_padding = Some(padding);
        self
    }

    /// Read extra evidence links from a file.
    pub fn with_external_evidence_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.external_evidence_file = Some(path.into());
        self
    }

    /// Read external CNV calls from a file.
    pub fn with_cnv_calls_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cnv_calls_file = Some(path.into());
        self
    }

    /// Also write per-category call sets into `dir`.
    pub fn with_experimental_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.experimental_output_dir = Some(dir.into());
        self
    }

    /// Write contig alignments to a BAM file.
    pub fn with_contig_alignments_bam(mut self, path: impl Into<PathBuf>) -> Self {
        self.contig_alignments_bam = Some(path.into());
        self
    }

    /// Replace the annotation selection.
    pub fn with_annotations(mut self, annotations: AnnotationSelection) -> Self {
        self.annotations = annotations;
        self
    }

    /// Reject inconsistent settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.external_evidence_file.is_some() && self.cnv_calls_file.is_some() {
            return Err(ConfigError::ConflictingInputs {
                first: "external evidence file",
                second: "CNV calls file",
            });
        }
        if self.split_sensitivity == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "split sensitivity",
                reason: "must be > 0".to_string(),
            });
        }
        if self.imprecise_evidence_threshold == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "imprecise evidence threshold",
                reason: "must be > 0".to_string(),
            });
        }
        if self.split_read_weight == 0 && self.read_pair_weight == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "evidence weights",
                reason: "at least one weight must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.split_sensitivity, 30);
        assert_eq!(config.imprecise_evidence_threshold, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn evidence_and_cnv_files_conflict() {
        let config = DiscoveryConfig::default()
            .with_external_evidence_file("links.json")
            .with_cnv_calls_file("cnv.tsv");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ConflictingInputs { .. })
        ));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let config = DiscoveryConfig::default().with_imprecise_threshold(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "imprecise evidence threshold", .. })
        ));
    }
}
