//! Call annotation: a registry of annotations selectable by id and an engine that
//! applies them, together with `binding.FIELD` expressions, to the final call set.

mod api;
mod builtin;
mod engine;
mod registry;

use thiserror::Error;

pub use api::{AnnotationContext, CallAnnotation, FieldDescription, FieldScope};
pub use builtin::{
    ConfidenceIntervals, ContigSupport, CopyNumberGenotype, EvidenceCounts, ExternalCnv,
    VariantShape,
};
pub use engine::{AnnotationEngine, AnnotationExpression, ExpressionField, CNV_BINDING};
pub use registry::{AnnotationInfo, AnnotationRegistry};

/// Errors raised while resolving or running annotations.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// Requested annotation id is not registered.
    #[error("unknown annotation '{0}'")]
    UnknownAnnotation(String),

    /// Expression is not of the form `binding.FIELD`.
    #[error("malformed annotation expression '{0}' (expected binding.FIELD)")]
    MalformedExpression(String),

    /// Expression refers to a source that does not exist.
    #[error("annotation expression refers to unknown binding '{0}'")]
    UnknownBinding(String),

    /// Expression asks for a field the source does not have.
    #[error("binding '{binding}' has no field '{field}'")]
    UnknownField {
        /// Source name.
        binding: String,
        /// Requested field.
        field: String,
    },

    /// Annotation failed on a call.
    #[error("annotation {annotation} failed: {message}")]
    Compute {
        /// Annotation id.
        annotation: String,
        /// What went wrong.
        message: String,
    },
}
