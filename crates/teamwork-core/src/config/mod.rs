use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{defaults, endpoints, env, models};
use crate::error::TeamError;
use crate::llm::{AzureOpenAIClient, LlmClient, OpenAIClient};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAI,
    Azure,
}

impl std::str::FromStr for Provider {
    type Err = TeamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "azure" | "azure_openai" | "azure-openai" => Ok(Self::Azure),
            other => Err(TeamError::Config(format!(
                "unknown provider '{other}', expected 'openai' or 'azure'"
            ))),
        }
    }
}

/// Model client configuration. Built from defaults, an optional TOML file
/// and the environment, in increasing priority. API keys only ever come
/// from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub provider: Provider,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub openai: OpenAISettings,
    pub azure: AzureSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAISettings {
    pub model: String,
    pub base_url: String,
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AzureSettings {
    pub deployment: String,
    pub api_version: String,
    pub endpoint: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAI,
            temperature: defaults::TEMPERATURE,
            timeout_secs: defaults::TIMEOUT_SECS,
            openai: OpenAISettings::default(),
            azure: AzureSettings::default(),
        }
    }
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            model: models::DEFAULT_OPENAI_MODEL.to_string(),
            base_url: endpoints::OPENAI_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl Default for AzureSettings {
    fn default() -> Self {
        Self {
            deployment: models::DEFAULT_AZURE_DEPLOYMENT.to_string(),
            api_version: models::DEFAULT_AZURE_API_VERSION.to_string(),
            endpoint: None,
            api_key: None,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("teamwork")
            .join("config.toml")
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, TeamError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TeamError> {
        let mut settings = Self::default();
        settings.apply_lookup(lookup)?;
        Ok(settings)
    }

    pub fn load_file(path: &Path) -> Result<Self, TeamError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| TeamError::Config(format!("{}: {e}", path.display())))
    }

    /// `.env`, then the user config file if present, then the environment.
    pub fn load() -> Result<Self, TeamError> {
        dotenvy::dotenv().ok();
        Self::load_with(&Self::config_path(), |key| std::env::var(key).ok())
    }

    /// `config_path` if it exists, overridden by `lookup`. A config file that
    /// does not parse is an error, not a silent fallback to defaults.
    pub fn load_with(
        config_path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, TeamError> {
        let mut settings = if config_path.exists() {
            Self::load_file(config_path)?
        } else {
            Self::default()
        };
        settings.apply_lookup(lookup)?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), TeamError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TeamError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn apply_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), TeamError> {
        // Empty values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get(env::PROVIDER) {
            self.provider = provider.parse().map_err(|_| {
                TeamError::Config(format!(
                    "{}: unknown provider '{provider}', expected 'openai' or 'azure'",
                    env::PROVIDER
                ))
            })?;
        }
        if let Some(model) = get(env::MODEL_NAME) {
            self.openai.model = model;
        }
        if let Some(base_url) = get(env::OPENAI_BASE_URL) {
            self.openai.base_url = base_url;
        }
        if let Some(key) = get(env::OPENAI_API_KEY) {
            self.openai.api_key = Some(key);
        }
        if let Some(deployment) = get(env::AZURE_MODEL_DEPLOYMENT_NAME) {
            self.azure.deployment = deployment;
        }
        if let Some(version) = get(env::AZURE_OPENAI_API_VERSION) {
            self.azure.api_version = version;
        }
        if let Some(endpoint) = get(env::AZURE_OPENAI_ENDPOINT) {
            self.azure.endpoint = Some(endpoint);
        }
        if let Some(key) = get(env::AZURE_OPENAI_API_KEY) {
            self.azure.api_key = Some(key);
        }
        Ok(())
    }

    pub fn use_azure(&self) -> bool {
        self.provider == Provider::Azure
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn openai_client(&self) -> Result<OpenAIClient, TeamError> {
        let api_key = self
            .openai
            .api_key
            .clone()
            .ok_or_else(|| TeamError::missing_env(env::OPENAI_API_KEY, "OpenAI"))?;
        Ok(OpenAIClient::new(api_key)
            .with_model(&self.openai.model)
            .with_base_url(&self.openai.base_url)
            .with_temperature(self.temperature)
            .with_timeout(self.timeout()))
    }

    pub fn azure_openai_client(&self) -> Result<AzureOpenAIClient, TeamError> {
        let endpoint = self
            .azure
            .endpoint
            .clone()
            .ok_or_else(|| TeamError::missing_env(env::AZURE_OPENAI_ENDPOINT, "Azure OpenAI"))?;
        let api_key = self
            .azure
            .api_key
            .clone()
            .ok_or_else(|| TeamError::missing_env(env::AZURE_OPENAI_API_KEY, "Azure OpenAI"))?;
        Ok(AzureOpenAIClient::new(endpoint, api_key)
            .with_deployment(&self.azure.deployment)
            .with_api_version(&self.azure.api_version)
            .with_temperature(self.temperature)
            .with_timeout(self.timeout()))
    }

    pub fn model_client(&self, use_azure: bool) -> Result<Arc<dyn LlmClient>, TeamError> {
        let client: Arc<dyn LlmClient> = if use_azure {
            Arc::new(self.azure_openai_client()?)
        } else {
            Arc::new(self.openai_client()?)
        };
        tracing::debug!(model = client.model(), azure = use_azure, "built model client");
        Ok(client)
    }
}

/// OpenAI client from `.env` and the environment.
pub fn openai_client() -> Result<OpenAIClient, TeamError> {
    Settings::load()?.openai_client()
}

/// Azure OpenAI client from `.env` and the environment.
pub fn azure_openai_client() -> Result<AzureOpenAIClient, TeamError> {
    Settings::load()?.azure_openai_client()
}

/// OpenAI unless `use_azure` is set.
pub fn model_client(use_azure: bool) -> Result<Arc<dyn LlmClient>, TeamError> {
    Settings::load()?.model_client(use_azure)
}
