//! Run orchestration: the shared run context and the pipeline driving every stage.

mod context;
mod orchestrator;

pub use context::{ReadMetadata, RunInputs, SvDiscoveryInputData};
pub use orchestrator::{CallWriter, RunOutcome, SvDiscoveryPipeline};
