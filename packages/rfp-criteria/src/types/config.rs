//! Configuration types for the pipeline and research agents.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for chunking, extraction and classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Character budget per chunk.
    ///
    /// Default: 40 000 (roughly 10k tokens).
    pub chunk_size: usize,

    /// Maximum extractions kept per document.
    ///
    /// Default: 1000.
    pub max_criteria: usize,

    /// How much of a document the classifier sees, in characters.
    ///
    /// Default: 9 000 (about three pages).
    pub classification_prefix: usize,

    /// Limits on external calls.
    pub timeouts: Timeouts,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 40_000,
            max_criteria: 1000,
            classification_prefix: 9_000,
            timeouts: Timeouts::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_criteria(mut self, max: usize) -> Self {
        self.max_criteria = max;
        self
    }

    pub fn with_classification_prefix(mut self, chars: usize) -> Self {
        self.classification_prefix = chars;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

/// Time limits on external call boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Any single structured-output call.
    pub llm: Duration,

    /// Agent creation and thread/message calls.
    pub agent_setup: Duration,

    /// A research run, including polling.
    pub run: Duration,

    /// Listing a thread's messages.
    pub messages: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            llm: Duration::from_secs(120),
            agent_setup: Duration::from_secs(60),
            run: Duration::from_secs(900),
            messages: Duration::from_secs(60),
        }
    }
}

impl Timeouts {
    pub fn with_llm(mut self, limit: Duration) -> Self {
        self.llm = limit;
        self
    }

    pub fn with_agent_setup(mut self, limit: Duration) -> Self {
        self.agent_setup = limit;
        self
    }

    pub fn with_run(mut self, limit: Duration) -> Self {
        self.run = limit;
        self
    }

    pub fn with_messages(mut self, limit: Duration) -> Self {
        self.messages = limit;
        self
    }
}

/// Research agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model that drives both agents.
    pub model: String,

    /// Web grounding connection both agents search through.
    pub web_grounding_connection_id: String,

    /// Deep research model. Deep research is unavailable without it.
    pub deep_research_model: Option<String>,
}

impl AgentConfig {
    pub fn new(model: impl Into<String>, web_grounding_connection_id: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            web_grounding_connection_id: web_grounding_connection_id.into(),
            deep_research_model: None,
        }
    }

    pub fn with_deep_research_model(mut self, model: impl Into<String>) -> Self {
        self.deep_research_model = Some(model.into());
        self
    }
}
