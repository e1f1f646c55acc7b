//! Assistants API: assistants, threads, messages and runs.
//!
//! All endpoints here require the `OpenAI-Beta: assistants=v2` header.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use tracing::{debug, info};

use crate::types::{
    Assistant, CreateAssistantRequest, CreateMessageRequest, CreateRunRequest, Deleted,
    MessageList, Run, RunStatus, Thread, ThreadMessage,
};
use crate::{OpenAIClient, OpenAIError, Result};

const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Page size used when listing thread messages.
const MESSAGE_PAGE_SIZE: u32 = 100;

impl OpenAIClient {
    fn assistants_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, path)
            .header(BETA_HEADER.0, BETA_HEADER.1)
    }

    /// Create an assistant.
    pub async fn create_assistant(&self, request: &CreateAssistantRequest) -> Result<Assistant> {
        let builder = self
            .assistants_request(Method::POST, "assistants")
            .json(request);
        let assistant: Assistant = self.send_json(builder, "create assistant").await?;

        info!(
            assistant_id = %assistant.id,
            name = %request.name,
            model = %request.model,
            "Created assistant"
        );
        Ok(assistant)
    }

    /// Delete an assistant. Returns whether the API confirmed the deletion.
    pub async fn delete_assistant(&self, assistant_id: &str) -> Result<bool> {
        let builder =
            self.assistants_request(Method::DELETE, &format!("assistants/{assistant_id}"));
        let deleted: Deleted = self.send_json(builder, "delete assistant").await?;
        Ok(deleted.deleted)
    }

    /// Create an empty thread.
    pub async fn create_thread(&self) -> Result<Thread> {
        let builder = self
            .assistants_request(Method::POST, "threads")
            .json(&serde_json::json!({}));
        self.send_json(builder, "create thread").await
    }

    /// Append a message to a thread.
    pub async fn create_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<ThreadMessage> {
        let builder = self
            .assistants_request(Method::POST, &format!("threads/{thread_id}/messages"))
            .json(&CreateMessageRequest { role, content });
        self.send_json(builder, "create message").await
    }

    /// Start a run of `assistant_id` over `thread_id`.
    pub async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let builder = self
            .assistants_request(Method::POST, &format!("threads/{thread_id}/runs"))
            .json(&CreateRunRequest { assistant_id });
        self.send_json(builder, "create run").await
    }

    /// Fetch the current state of a run.
    pub async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let builder =
            self.assistants_request(Method::GET, &format!("threads/{thread_id}/runs/{run_id}"));
        self.send_json(builder, "retrieve run").await
    }

    /// Start a run and poll it until it reaches a terminal status.
    ///
    /// Returns the final run whatever its status; callers decide what a
    /// non-completed run means. A run that stops at `requires_action` is an
    /// error, since no tool outputs are ever submitted from here.
    pub async fn create_and_poll_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        poll_interval: Duration,
    ) -> Result<Run> {
        let mut run = self.create_run(thread_id, assistant_id).await?;
        debug!(run_id = %run.id, thread_id, "Run created");

        while !run.status.is_terminal() {
            if run.status == RunStatus::RequiresAction {
                return Err(OpenAIError::Run(format!(
                    "run {} requires tool outputs",
                    run.id
                )));
            }
            tokio::time::sleep(poll_interval).await;
            run = self.retrieve_run(thread_id, &run.id).await?;
            debug!(run_id = %run.id, status = run.status.as_str(), "Polled run");
        }

        info!(run_id = %run.id, status = run.status.as_str(), "Run finished");
        Ok(run)
    }

    /// List every message of a thread, oldest first.
    pub async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut path = format!(
                "threads/{thread_id}/messages?order=asc&limit={MESSAGE_PAGE_SIZE}"
            );
            if let Some(cursor) = &after {
                path.push_str("&after=");
                path.push_str(cursor);
            }

            let builder = self.assistants_request(Method::GET, &path);
            let page: MessageList = self.send_json(builder, "list messages").await?;

            let last_id = page
                .last_id
                .or_else(|| page.data.last().map(|m| m.id.clone()));
            messages.extend(page.data);

            match (page.has_more, last_id) {
                (true, Some(id)) => after = Some(id),
                _ => break,
            }
        }

        Ok(messages)
    }
}
