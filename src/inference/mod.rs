//! Variant inference: contig classification, precise and imprecise calling, and
//! reconciliation of calls with breakpoint evidence.

mod classifier;
mod imprecise;
mod junction;
mod precise;
mod reconcile;

pub use classifier::{classify, RawCategory};
pub use imprecise::{detect_imprecise_variants, ImpreciseParams};
pub use junction::{Junction, JunctionSide};
pub use precise::{call_contig, call_precise_variants, PreciseCallParams};
pub use reconcile::{
    assign_evidence_support, overlay_cnv_calls, reconcile_calls, zygosity_from_copy_number,
};
