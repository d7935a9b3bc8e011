//! Ready-wired executors and services over in-memory stores.

use std::sync::Arc;

use lingograph::executor::Executor;
use lingograph::executor::checkpoint::InMemoryCheckpointer;
use lingograph::memory::InMemoryMemoryStore;
use lingograph::ports::Capabilities;
use lingograph::service::ChatService;
use lingograph::workflow::Workflow;

/// One test's worth of shared infrastructure.
pub struct Harness {
    pub workflow: Arc<Workflow>,
    pub capabilities: Arc<Capabilities>,
    pub memory: Arc<InMemoryMemoryStore>,
    pub checkpointer: Arc<InMemoryCheckpointer>,
}

impl Harness {
    pub fn new(workflow: Workflow, capabilities: Arc<Capabilities>) -> Self {
        Self {
            workflow: Arc::new(workflow),
            capabilities,
            memory: Arc::new(InMemoryMemoryStore::new()),
            checkpointer: Arc::new(InMemoryCheckpointer::new()),
        }
    }

    pub fn executor(&self) -> Executor {
        Executor::new(
            Arc::clone(&self.workflow),
            Arc::clone(&self.capabilities),
            self.memory.clone(),
        )
        .with_checkpointer(self.checkpointer.clone())
    }

    pub fn service(&self) -> ChatService {
        ChatService::new(
            Arc::clone(&self.workflow),
            Arc::clone(&self.capabilities),
            self.memory.clone(),
            self.checkpointer.clone(),
        )
    }
}
