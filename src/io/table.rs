use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::calls::{CallProvenance, StructuralCallRecord};
use crate::error::DiscoveryError;
use crate::pipeline::{CallWriter, SvDiscoveryInputData};

const COLUMNS: &str = "#CHROM\tPOS\tID\tREF\tALT\tEND\tPROVENANCE\tINFO\tGT\tCN";

/// Write calls as a tab-separated table with one header line per sample.
pub fn write_calls<W: Write>(
    writer: &mut W,
    sample: &str,
    calls: &[StructuralCallRecord],
) -> std::io::Result<()> {
    writeln!(writer, "##source=sv-discovery")?;
    writeln!(writer, "##sample={sample}")?;
    writeln!(writer, "{COLUMNS}")?;

    for call in calls {
        let info = if call.attributes.is_empty() {
            ".".to_string()
        } else {
            call.attributes
                .iter()
                .map(|(key, value)| {
                    if value.is_empty() {
                        key.clone()
                    } else {
                        format!("{key}={value}")
                    }
                })
                .collect::<Vec<_>>()
                .join(";")
        };
        writeln!(
            writer,
            "{chrom}\t{pos}\t{id}\t{ref_base}\t{alt}\t{end}\t{provenance}\t{info}\t{gt}\t{cn}",
            chrom = call.contig,
            pos = call.start,
            id = call.id,
            ref_base = call.ref_allele as char,
            alt = call.alt_allele(),
            end = call.end,
            provenance = match call.provenance {
                CallProvenance::Precise => "PRECISE",
                CallProvenance::Imprecise => "IMPRECISE",
            },
            gt = call.genotype.zygosity.as_gt(),
            cn = call
                .genotype
                .copy_number
                .map_or_else(|| ".".to_string(), |cn| cn.to_string()),
        )?;
    }

    writer.flush()
}

/// Render calls into a string (useful for tests and snapshots).
pub fn render_calls(sample: &str, calls: &[StructuralCallRecord]) -> String {
    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_calls(&mut buffer, sample, calls);
    String::from_utf8_lossy(&buffer).into_owned()
}

/// [`CallWriter`] producing the tab-separated call table at the run's output path.
#[derive(Debug, Default, Clone, Copy)]
pub struct TsvCallWriter;

impl CallWriter for TsvCallWriter {
    fn write(
        &self,
        data: &SvDiscoveryInputData,
        calls: &[StructuralCallRecord],
    ) -> Result<(), DiscoveryError> {
        let path: &Path = &data.output_path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| DiscoveryError::io(parent, err))?;
        }
        let file = File::create(path).map_err(|err| DiscoveryError::io(path, err))?;
        let mut writer = BufWriter::new(file);
        write_calls(&mut writer, &data.sample_id, calls).map_err(|err| DiscoveryError::io(path, err))
    }
}
