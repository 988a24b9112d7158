#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;

use common::*;
use sv_discovery::io::TsvCallWriter;
use sv_discovery::{DiscoveryConfig, SvDiscoveryPipeline};

#[test]
fn call_table_matches_golden() {
    let mut inputs = run_inputs(vec![deletion_assembly(1), breakend_assembly(2)]);
    inputs.evidence_links = vec![
        // Near the precise deletion, too weak on its own for an imprecise call.
        deletion_link((1050, 1120), (1130, 1200), 2, 3),
        deletion_link((5001, 5100), (8001, 8100), 3, 1),
        deletion_link((5051, 5150), (8051, 8150), 0, 4),
    ];

    let dir = tempfile::tempdir().expect("temp dir");
    let output = dir.path().join("calls.tsv");
    SvDiscoveryPipeline::new(DiscoveryConfig::default())
        .run(inputs, Arc::new(reference()), &output, &TsvCallWriter)
        .expect("pipeline runs");

    let actual = std::fs::read_to_string(&output).expect("call table written");
    assert_snapshot("calls/deletion_breakend_imprecise.tsv", &actual);
}
