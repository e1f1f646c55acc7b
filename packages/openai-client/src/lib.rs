//! Pure OpenAI REST API client
//!
//! A small client with no domain logic. It covers the two API surfaces the
//! criteria pipeline needs:
//! - structured outputs over chat completions (`json_schema` strict mode)
//! - the Assistants API: assistants, threads, messages and runs
//!
//! Azure OpenAI / Azure AI agent endpoints are supported through
//! [`OpenAIClient::with_azure_api_version`], which switches to `api-key`
//! header auth and appends `api-version` to every request.
//!
//! # Type-Safe Structured Output
//!
//! ```rust,ignore
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Summary {
//!     summary: String,
//! }
//!
//! let client = OpenAIClient::from_env()?;
//! let result: Summary = client
//!     .extract::<Summary>("gpt-4.1", system_prompt, user_prompt)
//!     .await?;
//! ```

pub mod assistants;
pub mod error;
pub mod schema;
pub mod types;

pub use error::{OpenAIError, Result};
pub use schema::StructuredOutput;
pub use types::*;

use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretBox};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// How requests authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Auth {
    /// `Authorization: Bearer <key>` (OpenAI)
    Bearer,
    /// `api-key: <key>` plus an `api-version` query parameter (Azure)
    AzureKey { api_version: String },
}

/// Pure OpenAI API client.
pub struct OpenAIClient {
    http_client: Client,
    api_key: SecretBox<str>,
    base_url: String,
    auth: Auth,
}

impl Clone for OpenAIClient {
    fn clone(&self) -> Self {
        Self {
            http_client: self.http_client.clone(),
            api_key: SecretBox::new(Box::from(self.api_key.expose_secret())),
            base_url: self.base_url.clone(),
            auth: self.auth.clone(),
        }
    }
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish()
    }
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let api_key: String = api_key.into();
        Self {
            http_client: Client::new(),
            api_key: SecretBox::new(Box::from(api_key.as_str())),
            base_url: DEFAULT_BASE_URL.to_string(),
            auth: Auth::Bearer,
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    ///
    /// `OPENAI_BASE_URL` overrides the endpoint when set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        let client = Self::new(api_key);
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => client.with_base_url(url),
            _ => client,
        })
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use Azure-style authentication with the given `api-version`.
    pub fn with_azure_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.auth = Auth::AzureKey {
            api_version: api_version.into(),
        };
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path, including the Azure `api-version` if set.
    pub(crate) fn url(&self, path: &str) -> String {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        match &self.auth {
            Auth::Bearer => url,
            Auth::AzureKey { api_version } => {
                let separator = if url.contains('?') { '&' } else { '?' };
                format!("{url}{separator}api-version={api_version}")
            }
        }
    }

    /// Start an authenticated request.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http_client.request(method, self.url(path));
        match &self.auth {
            Auth::Bearer => builder.bearer_auth(self.api_key.expose_secret()),
            Auth::AzureKey { .. } => builder.header("api-key", self.api_key.expose_secret()),
        }
    }

    /// Send a request and decode a JSON response, mapping non-2xx to `Api`.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        operation: &str,
    ) -> Result<T> {
        let response = builder.send().await.map_err(|e| {
            warn!(operation, error = %e, "OpenAI request failed");
            OpenAIError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(operation, status = %status, error = %error_text, "OpenAI API error");
            return Err(OpenAIError::Api(format!(
                "{operation} failed ({status}): {error_text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(format!("{operation}: {e}")))
    }

    /// Type-safe structured output extraction.
    ///
    /// Generates a strict JSON schema from `T`, sends it as the response
    /// format, and deserializes the reply.
    pub async fn extract<T: StructuredOutput>(
        &self,
        model: &str,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let request = StructuredRequest::new(
            model,
            system_prompt,
            user_prompt,
            <T as StructuredOutput>::schema_name(),
            T::strict_schema(),
        );
        self.extract_with::<T>(request).await
    }

    /// Structured output extraction with a caller-built request.
    pub async fn extract_with<T: StructuredOutput>(&self, request: StructuredRequest) -> Result<T> {
        let json_str = self.structured_output(request).await?;

        serde_json::from_str(strip_code_blocks(&json_str))
            .map_err(|e| OpenAIError::Parse(format!("Failed to deserialize response: {}", e)))
    }

    /// Structured output with JSON schema, returning the raw JSON string.
    pub async fn structured_output(&self, request: StructuredRequest) -> Result<String> {
        let start = std::time::Instant::now();
        let builder = self
            .request(Method::POST, "chat/completions")
            .json(&request);
        let raw: ChatResponseRaw = self.send_json(builder, "structured output").await?;

        let choice = raw
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OpenAIError::Api("No response from OpenAI".into()))?;

        if let Some(refusal) = choice.message.refusal {
            return Err(OpenAIError::Api(format!("Model refused: {}", refusal)));
        }
        if choice.finish_reason.as_deref() == Some("length") {
            return Err(OpenAIError::Parse(
                "Structured output truncated (finish_reason=length)".into(),
            ));
        }

        debug!(
            model = %request.model,
            schema = %request.response_format.json_schema.name,
            duration_ms = start.elapsed().as_millis(),
            "OpenAI structured output"
        );

        choice
            .message
            .content
            .ok_or_else(|| OpenAIError::Parse("Structured output had no content".into()))
    }
}
