//! Orchestrator structure and builder methods

use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::identity::UserId;
use crate::planner::Planner;
use crate::security::SecurityGate;
use dashmap::DashMap;
use pincer_llm::LlmProvider;
use pincer_memory::Memory;
use pincer_tools::ToolRegistry;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use super::config::OrchestratorConfig;

/// Routes each inbound message to a command, a tool or the inference backend
pub struct Orchestrator {
    pub(crate) gate: Arc<SecurityGate>,
    pub(crate) planner: Planner,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) llm: Option<Arc<dyn LlmProvider>>,
    pub(crate) memory: Option<Memory>,
    pub(crate) config: OrchestratorConfig,
    /// Serializes history writes per user
    pub(crate) write_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl Orchestrator {
    /// Create an orchestrator over a gate and a populated registry.
    ///
    /// Compiles the planner from the registry's enabled tools, so a bad
    /// trigger fails here rather than on the first message.
    pub fn new(
        gate: Arc<SecurityGate>,
        registry: Arc<ToolRegistry>,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        let planner = Planner::new(&registry.list_enabled())?;
        let dispatcher = Dispatcher::new(Arc::clone(&gate), registry, config.dispatcher_config());

        info!(tools = ?planner.tool_names(), "Orchestrator ready");

        Ok(Self {
            gate,
            planner,
            dispatcher,
            llm: None,
            memory: None,
            config,
            write_locks: DashMap::new(),
        })
    }

    /// Set the inference backend for free-form conversation
    #[must_use]
    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Enable conversation memory
    #[must_use]
    pub fn with_memory(mut self, memory: Memory) -> Self {
        self.memory = Some(memory);
        self
    }

    /// The security gate
    #[must_use]
    pub fn gate(&self) -> &Arc<SecurityGate> {
        &self.gate
    }

    /// The tool registry
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.dispatcher.registry()
    }

    /// The dispatcher
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The memory facade, if enabled
    #[must_use]
    pub fn memory(&self) -> Option<&Memory> {
        self.memory.as_ref()
    }

    /// The configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Name of the inference backend, if any
    #[must_use]
    pub fn inference_backend(&self) -> Option<&str> {
        self.llm.as_deref().map(|llm| llm.name())
    }

    /// Drop idle rate windows and unused history locks.
    ///
    /// Returns how many entries were removed.
    pub fn cleanup(&self) -> usize {
        let before = self.write_locks.len();
        self.write_locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let locks = before.saturating_sub(self.write_locks.len());
        self.gate.cleanup() + locks
    }

    pub(crate) fn write_lock(&self, user: &UserId) -> Arc<Mutex<()>> {
        Arc::clone(self.write_locks.entry(user.clone()).or_default().value())
    }
}
