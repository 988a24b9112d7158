use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::alignment::{parse_assemblies_direct, AlignedContig};
use crate::annotation::{AnnotationContext, AnnotationEngine, AnnotationRegistry, CNV_BINDING};
use crate::calls::{sort_calls, StructuralCallRecord};
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::evidence::{build_evidence_index, CnvOverlay};
use crate::inference::{
    call_precise_variants, classify, detect_imprecise_variants, reconcile_calls, ImpreciseParams,
    PreciseCallParams, RawCategory,
};
use crate::io::{read_cnv_calls, read_evidence_links, write_contig_alignments};
use crate::reference::ReferenceSource;

use super::context::{RunInputs, SvDiscoveryInputData};

/// Destination of a finished call set.
pub trait CallWriter: Send + Sync {
    /// Persist `calls` for the run described by `data` (its `output_path` in particular).
    fn write(
        &self,
        data: &SvDiscoveryInputData,
        calls: &[StructuralCallRecord],
    ) -> Result<(), DiscoveryError>;
}

/// What a run produced.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// No assembly yielded an aligned contig; nothing was written.
    NothingToCall,
    /// Calls were made and handed to the writer.
    Called {
        /// Final sorted call set.
        calls: Vec<StructuralCallRecord>,
        /// One output per raw category when experimental output is enabled.
        experimental_outputs: Vec<(RawCategory, PathBuf)>,
    },
}

impl RunOutcome {
    /// Calls of the main output; empty for [`RunOutcome::NothingToCall`].
    pub fn calls(&self) -> &[StructuralCallRecord] {
        match self {
            RunOutcome::NothingToCall => &[],
            RunOutcome::Called { calls, .. } => calls,
        }
    }
}

/// End-to-end discovery: parse contigs, call, reconcile, annotate, write.
#[derive(Debug, Clone)]
pub struct SvDiscoveryPipeline {
    config: Arc<DiscoveryConfig>,
    registry: AnnotationRegistry,
}

impl SvDiscoveryPipeline {
    /// Pipeline with the built-in annotations.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config: Arc::new(config),
            registry: AnnotationRegistry::builtin(),
        }
    }

    /// Replace the annotation registry.
    pub fn with_registry(mut self, registry: AnnotationRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Run configuration.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Run every stage on `inputs` and hand the result to `writer`.
    ///
    /// Configuration and annotation setup are checked before any input file is read.
    pub fn run(
        &self,
        inputs: RunInputs,
        reference: Arc<dyn ReferenceSource>,
        output_path: impl Into<PathBuf>,
        writer: &dyn CallWriter,
    ) -> Result<RunOutcome, DiscoveryError> {
        self.config.validate()?;
        let bindings: &[&str] = if self.config.cnv_calls_file.is_some() {
            &[CNV_BINDING]
        } else {
            &[]
        };
        let engine = AnnotationEngine::new(&self.registry, &self.config.annotations, bindings)?;
        info!(
            sample = %inputs.sample_id,
            assemblies = inputs.assemblies.len(),
            annotations = ?engine.annotation_names(),
            "starting structural variant discovery"
        );

        let cnv_calls = match &self.config.cnv_calls_file {
            Some(path) => {
                let overlay = CnvOverlay::new(read_cnv_calls(path)?);
                info!(cnv_calls = overlay.len(), "loaded external CNV calls");
                Some(Arc::new(overlay))
            }
            None => None,
        };

        if inputs.assemblies.is_empty() {
            info!("no assemblies, nothing to call");
            return Ok(RunOutcome::NothingToCall);
        }
        if let Some(path) = &self.config.contig_alignments_bam {
            write_contig_alignments(path, &inputs.assemblies, &inputs.reference_names)?;
        }
        let contigs = parse_assemblies_direct(
            &inputs.assemblies,
            &inputs.reference_names,
            self.config.split_sensitivity,
        )?;
        if contigs.is_empty() {
            info!("no aligned contigs, nothing to call");
            return Ok(RunOutcome::NothingToCall);
        }

        let mut links = inputs.evidence_links;
        if let Some(path) = &self.config.external_evidence_file {
            let external = read_evidence_links(path)?;
            info!(links = external.len(), "loaded external evidence links");
            links.extend(external);
        }
        let evidence = if links.is_empty() {
            None
        } else {
            Some(Arc::new(build_evidence_index(links)))
        };

        let data = SvDiscoveryInputData {
            sample_id: inputs.sample_id,
            config: Arc::clone(&self.config),
            output_path: output_path.into(),
            read_metadata: Arc::new(inputs.read_metadata),
            reference_names: Arc::new(inputs.reference_names),
            reference,
            cnv_calls,
            evidence,
        };

        let classified: Vec<(RawCategory, &AlignedContig)> = contigs
            .par_iter()
            .map(|contig| (classify(contig), contig))
            .collect();

        let calls = call_variants(&data, &engine, &classified)?;
        writer.write(&data, &calls)?;
        info!(
            calls = calls.len(),
            output = %data.output_path.display(),
            "wrote structural variant calls"
        );

        let mut experimental_outputs = Vec::new();
        if let Some(dir) = &self.config.experimental_output_dir {
            for category in RawCategory::ALL {
                let subset: Vec<(RawCategory, &AlignedContig)> = classified
                    .iter()
                    .filter(|(raw, _)| *raw == category)
                    .copied()
                    .collect();
                let path = dir.join(format!("{}.tsv", category.label()));
                let category_data = data.with_output_path(&path);
                let category_calls = call_variants(&category_data, &engine, &subset)?;
                writer.write(&category_data, &category_calls)?;
                debug!(
                    %category,
                    contigs = subset.len(),
                    calls = category_calls.len(),
                    "wrote experimental output"
                );
                experimental_outputs.push((category, path));
            }
        }

        Ok(RunOutcome::Called {
            calls,
            experimental_outputs,
        })
    }
}

fn call_variants(
    data: &SvDiscoveryInputData,
    engine: &AnnotationEngine,
    classified: &[(RawCategory, &AlignedContig)],
) -> Result<Vec<StructuralCallRecord>, DiscoveryError> {
    let params = PreciseCallParams::from_config(
        &data.config,
        &data.sample_id,
        &data.reference_names,
        data.reference.as_ref(),
    );
    let precise = call_precise_variants(classified, &params);
    let mut calls = reconcile_calls(
        precise,
        data.evidence.as_deref(),
        data.evidence_padding(),
        data.cnv_calls.as_deref(),
    );

    if let Some(index) = data.evidence.as_deref() {
        let imprecise = detect_imprecise_variants(
            index,
            &ImpreciseParams::from_config(&data.config),
            &data.sample_id,
            data.reference.as_ref(),
        );
        debug!(imprecise = imprecise.len(), "imprecise calls");
        calls.extend(imprecise);
    }

    let context = AnnotationContext {
        cnv: data.cnv_calls.as_deref(),
    };
    engine.annotate(&mut calls, &context)?;
    sort_calls(&mut calls, &data.reference_names);
    Ok(calls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{
        AssembledContig, AssemblyResult, CigarOp, CigarOpKind, RawAlignment, ReferenceNames,
    };
    use crate::calls::SvType;
    use crate::config::ConfigError;
    use crate::pipeline::ReadMetadata;
    use crate::reference::InMemoryReference;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingWriter {
        writes: Mutex<Vec<(PathBuf, usize)>>,
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
                .push((data.output_path.clone(), calls.len()));
            Ok(())
        }
    }

    fn hit(ref_start: i32, seq: (u32, u32)) -> RawAlignment {
        let len = seq.1 - seq.0;
        RawAlignment {
            ref_id: 0,
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

    fn inputs(assemblies: Vec<AssemblyResult>) -> RunInputs {
        RunInputs {
            sample_id: "sample".into(),
            reference_names: ReferenceNames::new([("chr1", 10_000)]),
            read_metadata: ReadMetadata {
                sample: "sample".into(),
                median_fragment_size: 300,
            },
            assemblies,
            evidence_links: Vec::new(),
        }
    }

    fn deletion_assembly() -> AssemblyResult {
        AssemblyResult::assembled(
            0,
            vec![AssembledContig {
                sequence: Arc::from(vec![b'A'; 200]),
                alignments: vec![hit(999, (0, 100)), hit(1149, (100, 200))],
            }],
        )
    }

    fn reference() -> Arc<dyn ReferenceSource> {
        Arc::new(InMemoryReference::new().with_sequence("chr1", vec![b'C'; 10_000]))
    }

    #[test]
    fn no_assemblies_means_nothing_to_call() {
        let writer = RecordingWriter::default();
        let outcome = SvDiscoveryPipeline::new(DiscoveryConfig::default())
            .run(inputs(Vec::new()), reference(), "out.tsv", &writer)
            .unwrap();
        assert!(matches!(outcome, RunOutcome::NothingToCall));
        assert!(writer.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn conflicting_inputs_fail_before_any_stage() {
        let writer = RecordingWriter::default();
        let config = DiscoveryConfig::default()
            .with_external_evidence_file("/nonexistent/links.json")
            .with_cnv_calls_file("/nonexistent/cnv.tsv");
        let err = SvDiscoveryPipeline::new(config)
            .run(inputs(vec![deletion_assembly()]), reference(), "out.tsv", &writer)
            .unwrap_err();
        assert!(matches!(
            err,
            DiscoveryError::Config(ConfigError::ConflictingInputs { .. })
        ));
        assert!(writer.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn split_contig_yields_one_deletion() {
        let writer = RecordingWriter::default();
        let outcome = SvDiscoveryPipeline::new(DiscoveryConfig::default())
            .run(inputs(vec![deletion_assembly()]), reference(), "out.tsv", &writer)
            .unwrap();
        let calls = outcome.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].sv_type, SvType::Deletion);
        assert_eq!(calls[0].sv_len, -50);
        assert_eq!(
            *writer.writes.lock().unwrap(),
            vec![(PathBuf::from("out.tsv"), 1)]
        );
    }

    #[test]
    fn experimental_outputs_cover_every_category() {
        let writer = RecordingWriter::default();
        let config = DiscoveryConfig::default().with_experimental_output_dir("exp");
        let outcome = SvDiscoveryPipeline::new(config)
            .run(inputs(vec![deletion_assembly()]), reference(), "out.tsv", &writer)
            .unwrap();
        let RunOutcome::Called {
            experimental_outputs,
            ..
        } = outcome
        else {
            panic!("expected calls");
        };
        assert_eq!(experimental_outputs.len(), RawCategory::ALL.len());
        let writes = writer.writes.lock().unwrap();
        assert_eq!(writes.len(), 1 + RawCategory::ALL.len());
        let chimera = writes
            .iter()
            .find(|(path, _)| path.ends_with("simple_chimera.tsv"))
            .unwrap();
        assert_eq!(chimera.1, 1);
    }
}
