use crate::constants::{defaults, models};
use crate::error::TeamError;
use crate::llm::openai::{send_chat, send_stream, ChatRequest};
use crate::llm::traits::*;
use crate::tools::ToolDefinition;
use futures::channel::mpsc;
use std::time::Duration;

/// Client for an Azure OpenAI deployment.
///
/// Azure addresses models by deployment name in the URL path and
/// authenticates with an `api-key` header; the request and response
/// bodies match the OpenAI chat-completions format. Streaming requests only
/// ask for token usage when [`with_stream_usage`](Self::with_stream_usage)
/// is set, since API versions before `2024-09-01-preview` reject
/// `stream_options`.
pub struct AzureOpenAIClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    temperature: Option<f32>,
    timeout: Duration,
    include_usage: bool,
}

impl std::fmt::Debug for AzureOpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAIClient")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("include_usage", &self.include_usage)
            .finish_non_exhaustive()
    }
}

impl AzureOpenAIClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            deployment: models::DEFAULT_AZURE_DEPLOYMENT.to_string(),
            api_version: models::DEFAULT_AZURE_API_VERSION.to_string(),
            temperature: None,
            timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
            include_usage: false,
        }
    }

    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = deployment.into();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stream_usage(mut self, include_usage: bool) -> Self {
        self.include_usage = include_usage;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        )
    }

    fn request(&self, body: &ChatRequest) -> reqwest::RequestBuilder {
        self.client
            .post(self.completions_url())
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .timeout(self.timeout)
            .json(body)
    }
}

#[async_trait::async_trait]
impl LlmClient for AzureOpenAIClient {
    fn model(&self) -> &str {
        &self.deployment
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse, TeamError> {
        let body = ChatRequest::new(None, messages, tools, self.temperature, false);
        tracing::debug!(deployment = %self.deployment, messages = messages.len(), "azure chat request");
        send_chat("Azure OpenAI", self.request(&body)).await
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<mpsc::UnboundedReceiver<StreamEvent>, TeamError> {
        let mut body = ChatRequest::new(None, messages, tools, self.temperature, true);
        if !self.include_usage {
            body = body.without_stream_usage();
        }
        tracing::debug!(deployment = %self.deployment, messages = messages.len(), "azure stream request");
        send_stream("Azure OpenAI", self.request(&body)).await
    }
}
