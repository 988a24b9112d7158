use crate::calls::{Genotype, StructuralCallRecord};
use crate::evidence::CnvOverlay;

use super::AnnotationError;

/// Header-style description of one field an annotation writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescription {
    /// Attribute key.
    pub key: &'static str,
    /// Value count (`1`, `.`, `0` for flags).
    pub number: &'static str,
    /// Value type (`Integer`, `String`, `Flag`).
    pub kind: &'static str,
    /// Free text.
    pub description: &'static str,
    /// `INFO` or `FORMAT`.
    pub scope: FieldScope,
}

/// Where a field lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope {
    /// Per call.
    Info,
    /// Per sample.
    Format,
}

impl FieldDescription {
    /// Per-call field.
    pub const fn info(
        key: &'static str,
        number: &'static str,
        kind: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            number,
            kind,
            description,
            scope: FieldScope::Info,
        }
    }

    /// Per-sample field.
    pub const fn format(
        key: &'static str,
        number: &'static str,
        kind: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            number,
            kind,
            description,
            scope: FieldScope::Format,
        }
    }
}

/// Read-only state annotations may consult.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationContext<'a> {
    /// External CNV calls, bound as `cnv` in expressions.
    pub cnv: Option<&'a CnvOverlay>,
}

/// Trait implemented by call annotations.
///
/// Annotations must be pure functions of the call and the context: the engine
/// assigns their output, so running it twice leaves calls unchanged.
pub trait CallAnnotation: Send + Sync + 'static {
    /// Unique annotation id.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Fields this annotation may write.
    fn describe_fields(&self) -> Vec<FieldDescription>;

    /// `INFO` attributes for the call.
    fn compute_info(
        &self,
        _call: &StructuralCallRecord,
        _context: &AnnotationContext<'_>,
    ) -> Result<Vec<(String, String)>, AnnotationError> {
        Ok(Vec::new())
    }

    /// Update the sample genotype of the call.
    fn compute_genotype(
        &self,
        _call: &StructuralCallRecord,
        _genotype: &mut Genotype,
        _context: &AnnotationContext<'_>,
    ) -> Result<(), AnnotationError> {
        Ok(())
    }
}
