use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::config::AnnotationSelection;

use super::api::{CallAnnotation, FieldDescription};
use super::builtin::{
    ConfidenceIntervals, ContigSupport, CopyNumberGenotype, EvidenceCounts, ExternalCnv,
    VariantShape,
};
use super::AnnotationError;

/// Metadata describing a registered annotation.
#[derive(Debug, Clone)]
pub struct AnnotationInfo {
    /// Annotation id.
    pub name: String,
    /// Description.
    pub description: String,
    /// Fields it writes.
    pub fields: Vec<FieldDescription>,
}

/// Registry of available call annotations, keyed by id.
#[derive(Default, Clone)]
pub struct AnnotationRegistry {
    entries: BTreeMap<String, Arc<dyn CallAnnotation>>,
}

impl fmt::Debug for AnnotationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationRegistry")
            .field("annotations", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AnnotationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every builtin annotation.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(VariantShape);
        registry.register(EvidenceCounts);
        registry.register(ConfidenceIntervals);
        registry.register(ContigSupport);
        registry.register(ExternalCnv);
        registry.register(CopyNumberGenotype);
        registry
    }

    /// Register an annotation and return an `Arc` handle to it.
    pub fn register<A>(&mut self, annotation: A) -> Arc<A>
    where
        A: CallAnnotation,
    {
        let arc = Arc::new(annotation);
        self.entries
            .insert(arc.name().to_string(), arc.clone() as Arc<dyn CallAnnotation>);
        arc
    }

    /// Retrieve an annotation by id.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CallAnnotation>> {
        self.entries.get(name).cloned()
    }

    /// List all registered annotations in id order.
    pub fn list(&self) -> Vec<AnnotationInfo> {
        self.entries
            .iter()
            .map(|(name, annotation)| AnnotationInfo {
                name: name.clone(),
                description: annotation.description().to_string(),
                fields: annotation.describe_fields(),
            })
            .collect()
    }

    /// Annotations chosen by include/exclude lists, in id order.
    ///
    /// An empty include list selects everything. Unknown ids in either list are errors.
    pub fn select(
        &self,
        selection: &AnnotationSelection,
    ) -> Result<Vec<Arc<dyn CallAnnotation>>, AnnotationError> {
        for name in selection.include.iter().chain(&selection.exclude) {
            if !self.entries.contains_key(name) {
                return Err(AnnotationError::UnknownAnnotation(name.clone()));
            }
        }
        Ok(self
            .entries
            .iter()
            .filter(|(name, _)| {
                selection.include.is_empty() || selection.include.iter().any(|id| id == *name)
            })
            .filter(|(name, _)| !selection.exclude.iter().any(|id| id == *name))
            .map(|(_, annotation)| Arc::clone(annotation))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_lists_every_annotation() {
        let names: Vec<_> = AnnotationRegistry::builtin()
            .list()
            .into_iter()
            .map(|info| info.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "confidence_intervals",
                "contig_support",
                "copy_number_genotype",
                "evidence_counts",
                "external_cnv",
                "variant_shape",
            ]
        );
    }

    #[test]
    fn selection_honours_include_and_exclude() {
        let registry = AnnotationRegistry::builtin();
        let selection = AnnotationSelection {
            include: vec!["variant_shape".into(), "evidence_counts".into()],
            exclude: vec!["evidence_counts".into()],
            expressions: Vec::new(),
        };
        let chosen = registry.select(&selection).unwrap();
        assert_eq!(chosen.len(), 1);
        assert_eq!(chosen[0].name(), "variant_shape");
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let selection = AnnotationSelection {
            exclude: vec!["no_such_thing".into()],
            ..AnnotationSelection::default()
        };
        assert!(matches!(
            AnnotationRegistry::builtin().select(&selection),
            Err(AnnotationError::UnknownAnnotation(name)) if name == "no_such_thing"
        ));
    }
}
