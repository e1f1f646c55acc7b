//! AI and research implementations for the criteria library.
//!
//! This module provides reference implementations of the `AI` and
//! `ResearchBackend` traits over `openai-client`. Users can use these
//! directly or implement their own.

#[cfg(feature = "openai")]
mod assistants;
#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use assistants::{tool_definition, AssistantsResearch};
#[cfg(feature = "openai")]
pub use openai::OpenAI;
