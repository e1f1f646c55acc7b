//! Types for research-backed criterion validation.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A cited source backing a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReference {
    pub title: String,
    /// Full source URL, never shortened
    pub url: String,
}

impl ValidationReference {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Outcome of researching whether a product meets a criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationVerdict {
    /// Whether the criterion is met by the product/service
    pub is_met: bool,
    /// Concise summary of the findings
    pub summary: String,
    /// Sources, in the order the research cited them
    pub references: Vec<ValidationReference>,
}

/// Which research agent runs a validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchMode {
    /// Web-grounded agent
    #[default]
    Standard,
    /// Multi-step deep research agent
    DeepResearch,
}

impl fmt::Display for ResearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::DeepResearch => write!(f, "deep_research"),
        }
    }
}

/// Research tool an agent is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResearchTool {
    /// Web search grounding through a connection
    WebGrounding { connection_id: String },
    /// Deep research model, grounded through the same connection
    DeepResearch {
        model: String,
        connection_id: String,
    },
}

/// Everything needed to create a research agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub name: String,
    pub model: String,
    pub instructions: String,
    pub tool: ResearchTool,
}

/// One message of a research thread.
///
/// `content` stays raw JSON: text parts, annotated research output and
/// plain strings all arrive in different shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub role: String,
    pub content: serde_json::Value,
}

impl ThreadMessage {
    pub fn new(role: impl Into<String>, content: serde_json::Value) -> Self {
        Self {
            role: role.into(),
            content,
        }
    }

    /// A message with a single typed text part.
    pub fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(
            role,
            serde_json::json!([{
                "type": "text",
                "text": { "value": text.into(), "annotations": [] }
            }]),
        )
    }
}

/// How a research run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Terminal status as reported by the backend (e.g. `completed`)
    pub status: String,
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn completed() -> Self {
        Self {
            status: "completed".to_string(),
            error: None,
        }
    }

    pub fn failed(status: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}
