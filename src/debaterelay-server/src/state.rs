//! Shared application state.

use std::sync::Arc;

use debaterelay_core::TurnOrchestrator;

/// Cloneable handle passed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TurnOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: TurnOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}
