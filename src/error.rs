use std::path::PathBuf;

use thiserror::Error;

use crate::alignment::ParseError;
use crate::annotation::AnnotationError;
use crate::config::ConfigError;

/// Top-level error of a discovery run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Contig alignments could not be normalized.
    #[error("contig alignment parsing failed: {0}")]
    Parse(#[from] ParseError),

    /// Annotation setup or evaluation failed.
    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    /// File system failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON input that does not deserialize.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Line-oriented input with bad content.
    #[error("{path}:{line}: {message}")]
    InvalidInput {
        /// File involved.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What is wrong.
        message: String,
    },

    /// htslib failure while writing BAM.
    #[error("BAM output failed: {0}")]
    Bam(#[from] rust_htslib::errors::Error),
}

impl DiscoveryError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DiscoveryError::Io {
            path: path.into(),
            source,
        }
    }
}
