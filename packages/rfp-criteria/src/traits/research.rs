//! Research backend trait: long-lived agents running over threads.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::validation::{AgentSpec, RunOutcome, ThreadMessage};

/// External research agent backend.
///
/// Models an assistants-style API: agents are created once and reused, each
/// validation opens its own thread, posts one message and runs the agent.
#[async_trait]
pub trait ResearchBackend: Send + Sync {
    /// Create an agent. Returns its id.
    async fn create_agent(&self, spec: &AgentSpec) -> Result<String>;

    async fn delete_agent(&self, agent_id: &str) -> Result<()>;

    /// Open a new conversation thread. Returns its id.
    async fn create_thread(&self) -> Result<String>;

    async fn post_user_message(&self, thread_id: &str, text: &str) -> Result<()>;

    /// Run the agent over the thread until it reaches a terminal status.
    ///
    /// A run that ends in any terminal status is `Ok`; only transport or API
    /// failures are errors.
    async fn run(&self, thread_id: &str, agent_id: &str) -> Result<RunOutcome>;

    /// All messages in the thread, oldest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}
