//! Service wiring shared by all handlers.

use std::sync::Arc;

use ageforge_ai::{PromptCatalog, TransformationGateway};
use ageforge_infra::jobs::{InMemoryJobStore, JobOrchestrator, JobStatusQuery};

pub type SharedStore = Arc<InMemoryJobStore>;

/// Everything a request handler needs, built once at startup.
pub struct AppServices {
    pub orchestrator: JobOrchestrator<SharedStore>,
    pub status: JobStatusQuery<SharedStore>,
    pub prompts: PromptCatalog,
}

impl AppServices {
    pub fn new(store: SharedStore, gateway: Arc<dyn TransformationGateway>) -> Self {
        Self {
            orchestrator: JobOrchestrator::new(store.clone(), gateway),
            status: JobStatusQuery::new(store),
            prompts: PromptCatalog::new(),
        }
    }

    pub fn store(&self) -> &SharedStore {
        self.orchestrator.store()
    }
}
