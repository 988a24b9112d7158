use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::calls::StructuralCallRecord;
use crate::config::AnnotationSelection;

use super::api::{AnnotationContext, CallAnnotation};
use super::registry::AnnotationRegistry;
use super::AnnotationError;

/// Name under which the external CNV overlay is bound in expressions.
pub const CNV_BINDING: &str = "cnv";

/// Field of a bound CNV call an expression can copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionField {
    /// Call identifier.
    Id,
    /// MAP copy number.
    CopyNumber,
    /// End coordinate.
    End,
}

impl ExpressionField {
    fn parse(binding: &str, field: &str) -> Result<Self, AnnotationError> {
        match field {
            "ID" => Ok(ExpressionField::Id),
            "CN" => Ok(ExpressionField::CopyNumber),
            "END" => Ok(ExpressionField::End),
            _ => Err(AnnotationError::UnknownField {
                binding: binding.to_string(),
                field: field.to_string(),
            }),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ExpressionField::Id => "ID",
            ExpressionField::CopyNumber => "CN",
            ExpressionField::End => "END",
        }
    }
}

/// `binding.FIELD` reference copied into each call's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationExpression {
    /// Source name, e.g. `cnv`.
    pub binding: String,
    /// Field of the source record.
    pub field: ExpressionField,
}

impl AnnotationExpression {
    /// Attribute key the value is stored under.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AnnotationExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.binding, self.field.as_str())
    }
}

impl FromStr for AnnotationExpression {
    type Err = AnnotationError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let malformed = || AnnotationError::MalformedExpression(text.to_string());
        let (binding, field) = text.split_once('.').ok_or_else(malformed)?;
        let well_formed = |part: &str| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        if !well_formed(binding) || !well_formed(field) {
            return Err(malformed());
        }
        Ok(Self {
            binding: binding.to_string(),
            field: ExpressionField::parse(binding, field)?,
        })
    }
}

/// Selected annotations plus expressions, resolved once before any call is made.
#[derive(Clone)]
pub struct AnnotationEngine {
    annotations: Vec<Arc<dyn CallAnnotation>>,
    expressions: Vec<AnnotationExpression>,
}

impl fmt::Debug for AnnotationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationEngine")
            .field(
                "annotations",
                &self.annotations.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field("expressions", &self.expressions)
            .finish()
    }
}

impl AnnotationEngine {
    /// Resolve a selection against `registry`.
    ///
    /// `bindings` names the sources that will exist at annotation time; an expression
    /// referring to anything else is rejected here rather than silently skipped.
    pub fn new(
        registry: &AnnotationRegistry,
        selection: &AnnotationSelection,
        bindings: &[&str],
    ) -> Result<Self, AnnotationError> {
        let annotations = registry.select(selection)?;
        let expressions = selection
            .expressions
            .iter()
            .map(|text| {
                let expression: AnnotationExpression = text.parse()?;
                if !bindings.contains(&expression.binding.as_str()) {
                    return Err(AnnotationError::UnknownBinding(expression.binding));
                }
                Ok(expression)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            annotations,
            expressions,
        })
    }

    /// Names of the active annotations.
    pub fn annotation_names(&self) -> Vec<&'static str> {
        self.annotations.iter().map(|a| a.name()).collect()
    }

    /// Parsed expressions.
    pub fn expressions(&self) -> &[AnnotationExpression] {
        &self.expressions
    }

    /// Decorate calls in place. Values are assigned, so annotating twice is a no-op.
    pub fn annotate(
        &self,
        calls: &mut [StructuralCallRecord],
        context: &AnnotationContext<'_>,
    ) -> Result<(), AnnotationError> {
        calls
            .par_iter_mut()
            .try_for_each(|call| self.annotate_call(call, context))?;
        debug!(
            calls = calls.len(),
            annotations = self.annotations.len(),
            expressions = self.expressions.len(),
            "annotated calls"
        );
        Ok(())
    }

    fn annotate_call(
        &self,
        call: &mut StructuralCallRecord,
        context: &AnnotationContext<'_>,
    ) -> Result<(), AnnotationError> {
        for annotation in &self.annotations {
            let info = annotation.compute_info(call, context)?;
            call.attributes.extend(info);

            let mut genotype = call.genotype.clone();
            annotation.compute_genotype(call, &mut genotype, context)?;
            call.genotype = genotype;
        }

        for expression in &self.expressions {
            if let Some(value) = self.evaluate(expression, call, context)? {
                call.attributes.insert(expression.key(), value);
            }
        }
        Ok(())
    }

    fn evaluate(
        &self,
        expression: &AnnotationExpression,
        call: &StructuralCallRecord,
        context: &AnnotationContext<'_>,
    ) -> Result<Option<String>, AnnotationError> {
        if expression.binding != CNV_BINDING {
            return Err(AnnotationError::UnknownBinding(expression.binding.clone()));
        }
        let overlay = context
            .cnv
            .ok_or_else(|| AnnotationError::UnknownBinding(expression.binding.clone()))?;
        let Some(cnv) = overlay.best_overlap(&call.span()) else {
            return Ok(None);
        };
        Ok(match expression.field {
            ExpressionField::Id => Some(cnv.id.clone()),
            ExpressionField::CopyNumber => cnv.map_copy_number().map(|cn| cn.to_string()),
            ExpressionField::End => Some(cnv.interval.end.to_string()),
        })
    }
}
