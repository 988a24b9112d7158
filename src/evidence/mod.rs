//! Breakpoint evidence: evidence target links, the paired interval index they are
//! stored in, and the external copy-number overlay.

mod cnv;
mod link;
mod tree;

pub use cnv::{CnvCall, CnvOverlay};
pub use link::{EvidenceTargetLink, PairedStrandedIntervals, StrandedInterval};
pub use tree::PairedStrandedIntervalTree;

/// Index of evidence links keyed by their own sides.
pub type EvidenceIndex = PairedStrandedIntervalTree<EvidenceTargetLink>;

/// Build the evidence index from any number of link sources.
pub fn build_evidence_index(links: impl IntoIterator<Item = EvidenceTargetLink>) -> EvidenceIndex {
    links
        .into_iter()
        .map(|link| (link.pair.clone(), link))
        .collect()
}
