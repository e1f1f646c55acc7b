//! Long-lived research agents, created lazily once per mode.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::{CriteriaError, Result};
use crate::pipeline::{bounded, prompts::AGENT_INSTRUCTIONS};
use crate::traits::research::ResearchBackend;
use crate::types::{
    config::AgentConfig,
    validation::{AgentSpec, ResearchMode, ResearchTool},
};

pub const STANDARD_AGENT_NAME: &str = "rfp-bing-agent";
pub const DEEP_RESEARCH_AGENT_NAME: &str = "rfp-deep-research-agent";

/// Holds one agent id per research mode.
///
/// Concurrent first use of a mode creates exactly one agent; a failed
/// creation leaves the mode uninitialized so the next call retries.
pub struct AgentRegistry {
    backend: Arc<dyn ResearchBackend>,
    config: AgentConfig,
    setup_timeout: Duration,
    standard: OnceCell<String>,
    deep_research: OnceCell<String>,
}

impl AgentRegistry {
    pub fn new(backend: Arc<dyn ResearchBackend>, config: AgentConfig, setup_timeout: Duration) -> Self {
        Self {
            backend,
            config,
            setup_timeout,
            standard: OnceCell::new(),
            deep_research: OnceCell::new(),
        }
    }

    pub fn backend(&self) -> &dyn ResearchBackend {
        self.backend.as_ref()
    }

    /// Agent definition for a mode.
    pub fn spec(&self, mode: ResearchMode) -> Result<AgentSpec> {
        let connection_id = self.config.web_grounding_connection_id.clone();
        let (name, tool) = match mode {
            ResearchMode::Standard => (STANDARD_AGENT_NAME, ResearchTool::WebGrounding { connection_id }),
            ResearchMode::DeepResearch => {
                let model = self.config.deep_research_model.clone().ok_or_else(|| {
                    CriteriaError::unavailable("deep research", "no deep research model configured")
                })?;
                (
                    DEEP_RESEARCH_AGENT_NAME,
                    ResearchTool::DeepResearch {
                        model,
                        connection_id,
                    },
                )
            }
        };

        Ok(AgentSpec {
            name: name.to_string(),
            model: self.config.model.clone(),
            instructions: AGENT_INSTRUCTIONS.to_string(),
            tool,
        })
    }

    fn cell(&self, mode: ResearchMode) -> &OnceCell<String> {
        match mode {
            ResearchMode::Standard => &self.standard,
            ResearchMode::DeepResearch => &self.deep_research,
        }
    }

    /// The agent for `mode`, creating it on first use.
    pub async fn agent_id(&self, mode: ResearchMode) -> Result<String> {
        let spec = self.spec(mode)?;
        let id = self
            .cell(mode)
            .get_or_try_init(|| async {
                let id = bounded(
                    "agent creation",
                    self.setup_timeout,
                    self.backend.create_agent(&spec),
                )
                .await?;
                info!(agent_id = %id, mode = %mode, name = %spec.name, "Research agent created");
                Ok::<_, CriteriaError>(id)
            })
            .await?;
        Ok(id.clone())
    }

    /// Ids of agents created so far.
    pub fn created(&self) -> Vec<(ResearchMode, String)> {
        [ResearchMode::Standard, ResearchMode::DeepResearch]
            .into_iter()
            .filter_map(|mode| self.cell(mode).get().map(|id| (mode, id.clone())))
            .collect()
    }

    /// Delete every created agent. Errors are logged, not returned.
    pub async fn cleanup(&mut self) {
        for cell in [&mut self.standard, &mut self.deep_research] {
            let Some(agent_id) = cell.take() else {
                continue;
            };
            match bounded("agent deletion", self.setup_timeout, self.backend.delete_agent(&agent_id)).await {
                Ok(()) => info!(agent_id = %agent_id, "Deleted research agent"),
                Err(e) => warn!(agent_id = %agent_id, error = %e, "Failed to delete research agent"),
            }
        }
    }
}
