//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the criteria library
//! without making real LLM or research calls. Document fixtures use
//! [`MemoryDocuments`](crate::stores::MemoryDocuments).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CriteriaError, Result};
use crate::pipeline::categorize::CategoryLabel;
use crate::pipeline::chunk::is_heading;
use crate::traits::{
    ai::{ChunkExtraction, ClassificationResponse, LabelAssignment, AI},
    research::ResearchBackend,
};
use crate::types::validation::{AgentSpec, RunOutcome, ThreadMessage, ValidationVerdict};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// AI operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    ExtractCriteria,
    ClassifyDocument,
    Categorize,
    SummarizeChunk,
    SynthesizeSummaries,
    ReduceConversation,
}

/// A mock AI implementation for testing.
///
/// Returns deterministic, configurable responses for all AI operations.
/// Without configuration, extraction returns every non-heading line of a
/// chunk, classification answers "Request for Proposal" and categorization
/// puts everything under Technical Requirements.
#[derive(Default)]
pub struct MockAI {
    /// Predefined extractions by 1-based chunk number
    extractions: Arc<RwLock<HashMap<usize, ChunkExtraction>>>,

    classification: Arc<RwLock<Option<ClassificationResponse>>>,

    categorization: Arc<RwLock<Option<Vec<LabelAssignment>>>>,

    /// Fixed answer for every chunk summary
    chunk_summary: Arc<RwLock<Option<String>>>,

    synthesis: Arc<RwLock<Option<String>>>,

    verdict: Arc<RwLock<Option<ValidationVerdict>>>,

    failures: Arc<RwLock<HashSet<MockOperation>>>,

    failing_chunks: Arc<RwLock<HashSet<usize>>>,

    /// Applied before every answer
    delay: Option<Duration>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockAICall>>>,
}

/// Record of a call made to the mock AI.
#[derive(Debug, Clone, PartialEq)]
pub enum MockAICall {
    ExtractCriteria { chunk_number: usize, total_chunks: usize },
    ClassifyDocument { prefix: String },
    Categorize { count: usize },
    SummarizeChunk { chunk_len: usize },
    SynthesizeSummaries { count: usize },
    ReduceConversation { conversation: String },
}

impl MockAI {
    /// Create a new mock AI with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer for one chunk (1-based).
    pub fn with_chunk_extraction(self, chunk_number: usize, extraction: ChunkExtraction) -> Self {
        write(&self.extractions).insert(chunk_number, extraction);
        self
    }

    /// Fail extraction of one chunk (1-based).
    pub fn with_failing_chunk(self, chunk_number: usize) -> Self {
        write(&self.failing_chunks).insert(chunk_number);
        self
    }

    pub fn with_classification(self, response: ClassificationResponse) -> Self {
        *write(&self.classification) = Some(response);
        self
    }

    pub fn with_categorization(self, assignments: Vec<LabelAssignment>) -> Self {
        *write(&self.categorization) = Some(assignments);
        self
    }

    pub fn with_chunk_summary(self, summary: impl Into<String>) -> Self {
        *write(&self.chunk_summary) = Some(summary.into());
        self
    }

    pub fn with_synthesis(self, summary: impl Into<String>) -> Self {
        *write(&self.synthesis) = Some(summary.into());
        self
    }

    pub fn with_verdict(self, verdict: ValidationVerdict) -> Self {
        *write(&self.verdict) = Some(verdict);
        self
    }

    /// Make every call of `operation` fail with an upstream error.
    pub fn with_failure(self, operation: MockOperation) -> Self {
        write(&self.failures).insert(operation);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockAICall> {
        read(&self.calls).clone()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        write(&self.calls).clear();
    }

    async fn record(&self, call: MockAICall, operation: MockOperation) -> Result<()> {
        write(&self.calls).push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if read(&self.failures).contains(&operation) {
            return Err(CriteriaError::upstream(format!("mock {operation:?} failure")));
        }
        Ok(())
    }

    fn default_extraction(chunk: &str) -> ChunkExtraction {
        let lines = chunk
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !is_heading(line));
        ChunkExtraction::new(0.9).with_statements(lines)
    }
}

#[async_trait]
impl AI for MockAI {
    async fn extract_criteria(
        &self,
        chunk: &str,
        chunk_number: usize,
        total_chunks: usize,
    ) -> Result<ChunkExtraction> {
        self.record(
            MockAICall::ExtractCriteria {
                chunk_number,
                total_chunks,
            },
            MockOperation::ExtractCriteria,
        )
        .await?;

        if read(&self.failing_chunks).contains(&chunk_number) {
            return Err(CriteriaError::upstream(format!(
                "mock failure on chunk {chunk_number}"
            )));
        }

        Ok(read(&self.extractions)
            .get(&chunk_number)
            .cloned()
            .unwrap_or_else(|| Self::default_extraction(chunk)))
    }

    async fn classify_document(&self, prefix: &str) -> Result<ClassificationResponse> {
        self.record(
            MockAICall::ClassifyDocument {
                prefix: prefix.to_string(),
            },
            MockOperation::ClassifyDocument,
        )
        .await?;

        Ok(read(&self.classification)
            .clone()
            .unwrap_or_else(|| ClassificationResponse {
                document_type: "Request for Proposal".to_string(),
                confidence: 0.9,
                contains_criteria: true,
                reasoning: "Mock classification".to_string(),
            }))
    }

    async fn categorize(&self, texts: &[String]) -> Result<Vec<LabelAssignment>> {
        self.record(
            MockAICall::Categorize { count: texts.len() },
            MockOperation::Categorize,
        )
        .await?;

        Ok(read(&self.categorization).clone().unwrap_or_else(|| {
            vec![LabelAssignment::new(
                CategoryLabel::TechnicalRequirements.label(),
                (1..=texts.len()).collect(),
            )]
        }))
    }

    async fn summarize_chunk(&self, chunk: &str) -> Result<String> {
        self.record(
            MockAICall::SummarizeChunk {
                chunk_len: chunk.chars().count(),
            },
            MockOperation::SummarizeChunk,
        )
        .await?;

        Ok(read(&self.chunk_summary).clone().unwrap_or_else(|| {
            let first_line = chunk.lines().next().unwrap_or_default();
            format!("Summary of: {first_line}")
        }))
    }

    async fn synthesize_summaries(&self, summaries: &[String]) -> Result<String> {
        self.record(
            MockAICall::SynthesizeSummaries {
                count: summaries.len(),
            },
            MockOperation::SynthesizeSummaries,
        )
        .await?;

        Ok(read(&self.synthesis)
            .clone()
            .unwrap_or_else(|| summaries.join(" ")))
    }

    async fn reduce_conversation(&self, conversation: &str) -> Result<ValidationVerdict> {
        self.record(
            MockAICall::ReduceConversation {
                conversation: conversation.to_string(),
            },
            MockOperation::ReduceConversation,
        )
        .await?;

        Ok(read(&self.verdict)
            .clone()
            .unwrap_or_else(|| ValidationVerdict {
                is_met: true,
                summary: "Mock verdict".to_string(),
                references: Vec::new(),
            }))
    }
}

/// Research operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockResearchOperation {
    CreateAgent,
    DeleteAgent,
    CreateThread,
    PostMessage,
    Run,
    ListMessages,
}

/// A mock research backend for testing.
///
/// Agents and threads get sequential ids (`agent-1`, `thread-1`). Runs
/// complete and the thread holds the posted user message followed by one
/// assistant reply unless scripted otherwise.
#[derive(Default)]
pub struct MockResearch {
    agents_created: AtomicUsize,
    threads_created: AtomicUsize,

    /// Delay inside `create_agent`, to widen race windows in tests
    agent_delay: Option<Duration>,

    outcome: Arc<RwLock<Option<RunOutcome>>>,

    /// Replaces the whole thread when set
    messages: Arc<RwLock<Option<Vec<ThreadMessage>>>>,

    /// Messages posted, by thread
    posted: Arc<RwLock<HashMap<String, Vec<String>>>>,

    failures: Arc<RwLock<HashSet<MockResearchOperation>>>,

    calls: Arc<RwLock<Vec<MockResearchCall>>>,
}

/// Record of a call made to the mock research backend.
#[derive(Debug, Clone, PartialEq)]
pub enum MockResearchCall {
    CreateAgent { name: String },
    DeleteAgent { agent_id: String },
    CreateThread,
    PostMessage { thread_id: String, text: String },
    Run { thread_id: String, agent_id: String },
    ListMessages { thread_id: String },
}

/// Assistant reply used when no messages are scripted.
pub const MOCK_ASSISTANT_REPLY: &str =
    "Yes, the product meets the criterion. Source: https://example.com/docs/security";

impl MockResearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent_delay(mut self, delay: Duration) -> Self {
        self.agent_delay = Some(delay);
        self
    }

    pub fn with_outcome(self, outcome: RunOutcome) -> Self {
        *write(&self.outcome) = Some(outcome);
        self
    }

    pub fn with_messages(self, messages: Vec<ThreadMessage>) -> Self {
        *write(&self.messages) = Some(messages);
        self
    }

    pub fn with_failure(self, operation: MockResearchOperation) -> Self {
        write(&self.failures).insert(operation);
        self
    }

    /// Number of agents created so far.
    pub fn agents_created(&self) -> usize {
        self.agents_created.load(Ordering::SeqCst)
    }

    /// Texts posted to a thread.
    pub fn posted(&self, thread_id: &str) -> Vec<String> {
        read(&self.posted).get(thread_id).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<MockResearchCall> {
        read(&self.calls).clone()
    }

    fn record(&self, call: MockResearchCall, operation: MockResearchOperation) -> Result<()> {
        write(&self.calls).push(call);
        if read(&self.failures).contains(&operation) {
            return Err(CriteriaError::upstream(format!("mock {operation:?} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl ResearchBackend for MockResearch {
    async fn create_agent(&self, spec: &AgentSpec) -> Result<String> {
        self.record(
            MockResearchCall::CreateAgent {
                name: spec.name.clone(),
            },
            MockResearchOperation::CreateAgent,
        )?;
        if let Some(delay) = self.agent_delay {
            tokio::time::sleep(delay).await;
        }
        let n = self.agents_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("agent-{n}"))
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<()> {
        self.record(
            MockResearchCall::DeleteAgent {
                agent_id: agent_id.to_string(),
            },
            MockResearchOperation::DeleteAgent,
        )
    }

    async fn create_thread(&self) -> Result<String> {
        self.record(MockResearchCall::CreateThread, MockResearchOperation::CreateThread)?;
        let n = self.threads_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("thread-{n}"))
    }

    async fn post_user_message(&self, thread_id: &str, text: &str) -> Result<()> {
        self.record(
            MockResearchCall::PostMessage {
                thread_id: thread_id.to_string(),
                text: text.to_string(),
            },
            MockResearchOperation::PostMessage,
        )?;
        write(&self.posted)
            .entry(thread_id.to_string())
            .or_default()
            .push(text.to_string());
        Ok(())
    }

    async fn run(&self, thread_id: &str, agent_id: &str) -> Result<RunOutcome> {
        self.record(
            MockResearchCall::Run {
                thread_id: thread_id.to_string(),
                agent_id: agent_id.to_string(),
            },
            MockResearchOperation::Run,
        )?;
        Ok(read(&self.outcome)
            .clone()
            .unwrap_or_else(RunOutcome::completed))
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        self.record(
            MockResearchCall::ListMessages {
                thread_id: thread_id.to_string(),
            },
            MockResearchOperation::ListMessages,
        )?;

        if let Some(messages) = read(&self.messages).clone() {
            return Ok(messages);
        }

        let mut thread: Vec<ThreadMessage> = self
            .posted(thread_id)
            .into_iter()
            .map(|text| ThreadMessage::text("user", text))
            .collect();
        thread.push(ThreadMessage::text("assistant", MOCK_ASSISTANT_REPLY));
        Ok(thread)
    }
}
