//! Research backend over the OpenAI / Azure OpenAI Assistants API.

use std::time::Duration;

use async_trait::async_trait;
use openai_client::{CreateAssistantRequest, OpenAIClient};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::Result;
use crate::traits::research::ResearchBackend;
use crate::types::validation::{AgentSpec, ResearchTool, RunOutcome, ThreadMessage};

/// Assistants-backed research agents.
pub struct AssistantsResearch {
    client: OpenAIClient,
    poll_interval: Duration,
}

impl AssistantsResearch {
    pub fn new(client: OpenAIClient) -> Self {
        Self {
            client,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// How often a running run is polled (default: 1s).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Assistants tool definition for a research tool.
pub fn tool_definition(tool: &ResearchTool) -> Value {
    match tool {
        ResearchTool::WebGrounding { connection_id } => json!({
            "type": "bing_grounding",
            "bing_grounding": {
                "search_configurations": [{ "connection_id": connection_id }]
            }
        }),
        ResearchTool::DeepResearch {
            model,
            connection_id,
        } => json!({
            "type": "deep_research",
            "deep_research": {
                "deep_research_model": model,
                "deep_research_bing_grounding_connections": [{ "connection_id": connection_id }]
            }
        }),
    }
}

#[async_trait]
impl ResearchBackend for AssistantsResearch {
    async fn create_agent(&self, spec: &AgentSpec) -> Result<String> {
        let request = CreateAssistantRequest {
            model: spec.model.clone(),
            name: spec.name.clone(),
            instructions: spec.instructions.clone(),
            tools: vec![tool_definition(&spec.tool)],
        };
        Ok(self.client.create_assistant(&request).await?.id)
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        if !self.client.delete_assistant(agent_id).await? {
            warn!(agent_id, "Assistant deletion was not acknowledged");
        }
        Ok(())
    }

    async fn create_thread(&self) -> Result<String> {
        Ok(self.client.create_thread().await?.id)
    }

    async fn post_user_message(&self, thread_id: &str, text: &str) -> Result<()> {
        self.client.create_message(thread_id, "user", text).await?;
        Ok(())
    }

    async fn run(&self, thread_id: &str, agent_id: &str) -> Result<RunOutcome> {
        let run = self
            .client
            .create_and_poll_run(thread_id, agent_id, self.poll_interval)
            .await?;

        Ok(RunOutcome {
            status: run.status.as_str().to_string(),
            error: run.last_error.map(|e| e.message),
        })
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let messages = self.client.list_messages(thread_id).await?;
        Ok(messages
            .into_iter()
            .map(|m| ThreadMessage::new(m.role, m.content))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_grounding_tool() {
        let tool = tool_definition(&ResearchTool::WebGrounding {
            connection_id: "conn-1".to_string(),
        });
        assert_eq!(tool["type"], "bing_grounding");
        assert_eq!(
            tool["bing_grounding"]["search_configurations"][0]["connection_id"],
            "conn-1"
        );
    }

    #[test]
    fn test_deep_research_tool() {
        let tool = tool_definition(&ResearchTool::DeepResearch {
            model: "o3-deep-research".to_string(),
            connection_id: "conn-1".to_string(),
        });
        assert_eq!(tool["type"], "deep_research");
        assert_eq!(tool["deep_research"]["deep_research_model"], "o3-deep-research");
        assert_eq!(
            tool["deep_research"]["deep_research_bing_grounding_connections"][0]["connection_id"],
            "conn-1"
        );
    }
}
