//! Module build pipeline.

mod locks;
mod orchestrator;
mod request;
mod status;

pub use locks::ModuleLocks;
pub use orchestrator::BuildOrchestrator;
pub use request::{BuildRequest, DEFAULT_MODULE_NAME, ModelSubmission};
pub use status::{BuildFailure, BuildReport, BuildStage, BuildStatus};
