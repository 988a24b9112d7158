use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::alignment::SimpleInterval;
use crate::error::DiscoveryError;
use crate::evidence::{CnvCall, EvidenceTargetLink};
use crate::pipeline::RunInputs;
use crate::reference::InMemoryReference;

fn open(path: &Path) -> Result<BufReader<File>, DiscoveryError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|err| DiscoveryError::io(path, err))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DiscoveryError> {
    serde_json::from_reader(open(path)?).map_err(|source| DiscoveryError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the run description (assemblies, reference dictionary, read metadata, links).
pub fn read_run_inputs(path: &Path) -> Result<RunInputs, DiscoveryError> {
    read_json(path)
}

/// Load a JSON array of evidence links.
pub fn read_evidence_links(path: &Path) -> Result<Vec<EvidenceTargetLink>, DiscoveryError> {
    read_json(path)
}

/// Load a (multi-record) FASTA file into memory.
pub fn read_fasta(path: &Path) -> Result<InMemoryReference, DiscoveryError> {
    parse_fasta(open(path)?, path)
}

/// Parse FASTA records from any buffered reader; `origin` labels errors.
pub fn parse_fasta<R: BufRead>(reader: R, origin: &Path) -> Result<InMemoryReference, DiscoveryError> {
    let mut reference = InMemoryReference::new();
    let mut current: Option<(String, Vec<u8>)> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| DiscoveryError::io(origin, err))?;
        let line = line.trim_end();
        if let Some(header) = line.strip_prefix('>') {
            if let Some((name, bases)) = current.take() {
                reference.insert(name, bases);
            }
            let name = header.split_whitespace().next().unwrap_or_default();
            if name.is_empty() {
                return Err(DiscoveryError::InvalidInput {
                    path: origin.to_path_buf(),
                    line: idx + 1,
                    message: "FASTA header without a sequence name".to_string(),
                });
            }
            current = Some((name.to_string(), Vec::new()));
        } else if !line.is_empty() {
            let Some((_, bases)) = current.as_mut() else {
                return Err(DiscoveryError::InvalidInput {
                    path: origin.to_path_buf(),
                    line: idx + 1,
                    message: "sequence data before the first FASTA header".to_string(),
                });
            };
            bases.extend_from_slice(line.as_bytes());
        }
    }
    if let Some((name, bases)) = current {
        reference.insert(name, bases);
    }
    Ok(reference)
}

/// Load external CNV calls.
pub fn read_cnv_calls(path: &Path) -> Result<Vec<CnvCall>, DiscoveryError> {
    parse_cnv_calls(open(path)?, path)
}

/// Parse tab-separated CNV calls: `id contig start end posteriors`, where posteriors
/// is a comma-separated list over copy numbers `0, 1, 2, ...`. Lines starting with
/// `#` and blank lines are skipped.
pub fn parse_cnv_calls<R: BufRead>(reader: R, origin: &Path) -> Result<Vec<CnvCall>, DiscoveryError> {
    let mut calls = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| DiscoveryError::io(origin, err))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let invalid = |message: String| DiscoveryError::InvalidInput {
            path: origin.to_path_buf(),
            line: idx + 1,
            message,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 5 {
            return Err(invalid(format!("expected 5 columns, found {}", fields.len())));
        }
        let position = |text: &str| {
            text.parse::<u32>()
                .map_err(|_| invalid(format!("invalid position '{text}'")))
        };
        let (start, end) = (position(fields[2])?, position(fields[3])?);
        if start == 0 || start > end {
            return Err(invalid(format!("invalid interval {start}-{end}")));
        }
        let posteriors = fields[4]
            .split(',')
            .map(|value| {
                value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| invalid(format!("invalid posterior '{value}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        calls.push(CnvCall::new(
            fields[0],
            SimpleInterval::new(fields[1], start, end),
            posteriors,
        ));
    }
    Ok(calls)
}
