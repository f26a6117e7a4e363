pub mod guard;
pub mod orchestrator;

pub use guard::{BackendStatus, ModelAvailabilityGuard, ModelStatus, ProvisionPolicy};
pub use orchestrator::AnalysisOrchestrator;
