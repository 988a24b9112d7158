use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sv_discovery::annotation::{AnnotationRegistry, FieldScope};
use sv_discovery::config::{AnnotationSelection, DiscoveryConfig};
use sv_discovery::io::{read_fasta, read_run_inputs, TsvCallWriter};
use sv_discovery::{RunOutcome, SvDiscoveryPipeline};

#[derive(Parser, Debug)]
#[command(
    name = "sv-discovery",
    about = "Structural variant discovery from assembled contig alignments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Call structural variants from a run description.
    Discover(DiscoverArgs),
    /// List the available call annotations and the fields they write.
    Annotations,
}

#[derive(clap::Args, Debug)]
struct DiscoverArgs {
    /// Run description (JSON): assemblies, reference dictionary, read metadata, links.
    #[arg(long)]
    inputs: PathBuf,
    /// Reference genome (FASTA).
    #[arg(long)]
    reference: PathBuf,
    /// Output call table.
    #[arg(long)]
    output: PathBuf,
    /// Additional evidence links (JSON array).
    #[arg(long)]
    external_evidence_file: Option<PathBuf>,
    /// External CNV calls (tab-separated).
    #[arg(long)]
    cnv_calls_file: Option<PathBuf>,
    /// Write one call table per raw contig category into this directory.
    #[arg(long = "exp-variants-out-dir")]
    experimental_output_dir: Option<PathBuf>,
    /// Write contig alignments as BAM.
    #[arg(long = "contig-bam")]
    contig_bam: Option<PathBuf>,
    /// Weighted evidence needed for an imprecise call.
    #[arg(long, default_value_t = sv_discovery::config::DEFAULT_IMPRECISE_THRESHOLD)]
    imprecise_threshold: u32,
    /// Gap size that splits a gapped alignment.
    #[arg(long, default_value_t = sv_discovery::config::DEFAULT_SPLIT_SENSITIVITY)]
    split_sensitivity: u32,
    /// Flank mapping quality floor for precise calls.
    #[arg(long, default_value_t = sv_discovery::config::DEFAULT_MIN_MAPQ)]
    min_mapq: u8,
    /// Padding around breakpoints when assigning evidence (default: half the median fragment).
    #[arg(long)]
    evidence_padding: Option<u32>,
    /// Annotation to run (repeatable; default: all).
    #[arg(long = "annotation")]
    annotations: Vec<String>,
    /// Annotation to skip (repeatable).
    #[arg(long = "exclude-annotation")]
    excluded_annotations: Vec<String>,
    /// `binding.FIELD` expression added to every call (repeatable).
    #[arg(long = "expression")]
    expressions: Vec<String>,
    /// Worker threads (default: all cores).
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Discover(args) => run_discover(args)?,
        Commands::Annotations => list_annotations(),
    }

    Ok(())
}

fn run_discover(args: DiscoverArgs) -> Result<()> {
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure the worker pool")?;
    }

    let mut config = DiscoveryConfig::default()
        .with_imprecise_threshold(args.imprecise_threshold)
        .with_split_sensitivity(args.split_sensitivity)
        .with_min_mapq(args.min_mapq)
        .with_annotations(AnnotationSelection {
            include: args.annotations,
            exclude: args.excluded_annotations,
            expressions: args.expressions,
        });
    if let Some(path) = args.external_evidence_file {
        config = config.with_external_evidence_file(path);
    }
    if let Some(path) = args.cnv_calls_file {
        config = config.with_cnv_calls_file(path);
    }
    if let Some(dir) = args.experimental_output_dir {
        config = config.with_experimental_output_dir(dir);
    }
    if let Some(path) = args.contig_bam {
        config = config.with_contig_alignments_bam(path);
    }
    if let Some(padding) = args.evidence_padding {
        config = config.with_evidence_padding(padding);
    }
    config.validate().context("invalid configuration")?;

    let inputs = read_run_inputs(&args.inputs)
        .with_context(|| format!("failed to read run inputs from {}", args.inputs.display()))?;
    let reference = read_fasta(&args.reference)
        .with_context(|| format!("failed to read reference from {}", args.reference.display()))?;

    let outcome = SvDiscoveryPipeline::new(config)
        .run(inputs, Arc::new(reference), &args.output, &TsvCallWriter)
        .context("structural variant discovery failed")?;

    match outcome {
        RunOutcome::NothingToCall => println!("No aligned contigs; nothing to call."),
        RunOutcome::Called {
            calls,
            experimental_outputs,
        } => {
            println!("{} calls written to {}", calls.len(), args.output.display());
            for (category, path) in experimental_outputs {
                println!("  {category}\t{}", path.display());
            }
        }
    }

    Ok(())
}

fn list_annotations() {
    for info in AnnotationRegistry::builtin().list() {
        println!("{}\t{}", info.name, info.description);
        for field in info.fields {
            let scope = match field.scope {
                FieldScope::Info => "INFO",
                FieldScope::Format => "FORMAT",
            };
            println!(
                "  {scope}\t{}\tNumber={}\tType={}\t{}",
                field.key, field.number, field.kind, field.description
            );
        }
    }
}
