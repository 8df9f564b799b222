use std::sync::Arc;

use crate::services::PipelineOrchestrator;

/// Shared application state
///
/// Holds no per-request data; every request gets its own pipeline run.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PipelineOrchestrator>,
    pub max_group_size: usize,
}

impl AppState {
    pub fn new(orchestrator: PipelineOrchestrator, max_group_size: usize) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            max_group_size,
        }
    }
}
