use anyhow::{Context, Result};
use dotenvy::dotenv;
use openai_client::OpenAIClient;
use rfp_criteria::{AgentConfig, PipelineConfig, Timeouts};
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// CLI configuration loaded from environment variables
#[derive(Debug)]
pub struct Config {
    /// Without a key, extraction uses the pattern fallback
    pub openai_api_key: Option<SecretString>,
    pub openai_base_url: Option<String>,
    /// Set for Azure OpenAI endpoints
    pub openai_api_version: Option<String>,
    pub model: String,
    pub research_model: String,
    pub web_grounding_connection_id: Option<String>,
    pub deep_research_model: Option<String>,
    pub max_criteria: usize,
    pub chunk_size: usize,
    pub llm_timeout: Duration,
    pub agent_run_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = PipelineConfig::default();
        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        Ok(Self {
            openai_api_key: optional("OPENAI_API_KEY").map(|key| SecretString::new(key.into_boxed_str())),
            openai_base_url: optional("OPENAI_BASE_URL"),
            openai_api_version: optional("OPENAI_API_VERSION"),
            research_model: optional("RESEARCH_MODEL").unwrap_or_else(|| model.clone()),
            model,
            web_grounding_connection_id: optional("WEB_GROUNDING_CONNECTION_ID"),
            deep_research_model: optional("DEEP_RESEARCH_MODEL"),
            max_criteria: parsed("MAX_CRITERIA_PER_DOCUMENT", defaults.max_criteria)?,
            chunk_size: parsed("CHUNK_SIZE", defaults.chunk_size)?,
            llm_timeout: Duration::from_secs(parsed(
                "LLM_TIMEOUT_SECS",
                defaults.timeouts.llm.as_secs(),
            )?),
            agent_run_timeout: Duration::from_secs(parsed(
                "AGENT_RUN_TIMEOUT_SECS",
                defaults.timeouts.run.as_secs(),
            )?),
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let timeouts = Timeouts::default()
            .with_llm(self.llm_timeout)
            .with_run(self.agent_run_timeout);

        PipelineConfig::default()
            .with_chunk_size(self.chunk_size)
            .with_max_criteria(self.max_criteria)
            .with_timeouts(timeouts)
    }

    /// Research agents need a web grounding connection.
    pub fn agent_config(&self) -> Option<AgentConfig> {
        let connection_id = self.web_grounding_connection_id.as_ref()?;
        let config = AgentConfig::new(&self.research_model, connection_id);
        Some(match &self.deep_research_model {
            Some(model) => config.with_deep_research_model(model),
            None => config,
        })
    }

    /// A fresh client, or `None` without an API key.
    pub fn openai_client(&self) -> Option<OpenAIClient> {
        let key = self.openai_api_key.as_ref()?;
        let mut client = OpenAIClient::new(key.expose_secret());
        if let Some(url) = &self.openai_base_url {
            client = client.with_base_url(url);
        }
        if let Some(version) = &self.openai_api_version {
            client = client.with_azure_api_version(version);
        }
        Some(client)
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(name) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a valid number")),
        None => Ok(default),
    }
}
