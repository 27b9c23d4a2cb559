//! Engine configuration loaded from TOML.
//!
//! ## Example Configuration
//!
//! ```toml
//! [backend]
//! model = "gpt-4"
//! base_url = "https://proxy.example.com"
//! endpoint = "chat"
//! api_key_env = "FOLIO_API_KEY"
//! timeout_seconds = 60
//!
//! [settings]
//! max_turns = 10
//! request_timeout_seconds = 60
//! expose_skills_reorder = false
//!
//! [[seed]]
//! role = "system"
//! content = "You are the assistant on a portfolio site."
//! ```
//!
//! `[settings]` and `[[seed]]` are optional. Without `[[seed]]` the session
//! starts from [`prompt::seed_transcript`](crate::prompt::seed_transcript).

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use folio_client::ProxyClient;
use folio_common::chat::{Message, MessageRole, Transcript};
use folio_common::client::{Config, RetryConfig};
use folio_tools::cards::CardStore;
use folio_tools::{Notifier, ToolRegistry, default_tools};

use crate::core::Core;
use crate::error::CoreError;
use crate::prompt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolioConfig {
    pub backend: BackendConfig,

    #[serde(default)]
    pub settings: Settings,

    /// Replaces the default seed transcript when non-empty
    #[serde(default)]
    pub seed: Vec<SeedMessage>,
}

/// Where and how to reach the chat proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_model")]
    pub model: String,

    pub base_url: String,

    /// Path appended to `base_url`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable holding the bearer token, if the proxy wants one
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// HTTP-level timeout
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Transport retries for transient failures (default: 0)
    #[serde(default)]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Transport calls allowed per response (default: 10)
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Caller-side limit on a single transport call (default: 60)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Advertise the skills-and-experience reorder tool (default: false)
    #[serde(default)]
    pub expose_skills_reorder: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            request_timeout_seconds: default_request_timeout(),
            expose_skills_reorder: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedMessage {
    pub role: MessageRole,
    pub content: String,
}

fn default_model() -> String {
    "gpt-4".to_string()
}

const fn default_max_turns() -> u32 {
    10
}

const fn default_request_timeout() -> u64 {
    60
}

impl FolioConfig {
    /// Parses and validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or fails [`validate`](Self::validate).
    pub fn from_toml_str(contents: &str) -> Result<Self, CoreError> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| CoreError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `max_turns` is zero
    /// - the model or base URL is empty
    /// - a seed message is neither `system` nor `assistant`
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.settings.max_turns == 0 {
            return Err(CoreError::Config(
                "settings.max_turns must be at least 1".to_string(),
            ));
        }

        if self.backend.model.trim().is_empty() {
            return Err(CoreError::Config("backend.model is empty".to_string()));
        }

        if self.backend.base_url.trim().is_empty() {
            return Err(CoreError::Config("backend.base_url is empty".to_string()));
        }

        if let Some(seed) = self
            .seed
            .iter()
            .find(|s| !matches!(s.role, MessageRole::System | MessageRole::Assistant))
        {
            return Err(CoreError::Config(format!(
                "Seed messages must be system or assistant, found {:?}",
                seed.role
            )));
        }

        Ok(())
    }

    /// Builds the transport configuration, reading the API key from the
    /// environment when `api_key_env` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_key_env` names a variable that is not set.
    pub fn to_client_config(&self) -> Result<Config, CoreError> {
        let backend = &self.backend;
        let mut config = Config::new(backend.model.clone())
            .with_base_url(backend.base_url.clone())
            .with_retry_config(RetryConfig {
                max_retries: backend.max_retries,
                ..RetryConfig::default()
            });

        if let Some(endpoint) = &backend.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(timeout) = backend.timeout_seconds {
            config = config.with_timeout(timeout);
        }
        if let Some(var) = &backend.api_key_env {
            let key = std::env::var(var).map_err(|_| {
                CoreError::Config(format!("Environment variable {var} is not set"))
            })?;
            config = config.with_api_key(key);
        }

        Ok(config)
    }

    /// The initial transcript: the configured seed, or the default one.
    ///
    /// # Errors
    ///
    /// Returns an error if a seed message is rejected by the transcript.
    pub fn seed_transcript(&self) -> Result<Transcript, CoreError> {
        if self.seed.is_empty() {
            return Ok(prompt::seed_transcript());
        }
        let messages = self
            .seed
            .iter()
            .map(|s| Message::new(s.role, s.content.clone()));
        Ok(Transcript::seeded(messages)?)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.request_timeout_seconds)
    }

    /// The built-in tools, honoring `expose_skills_reorder`.
    #[must_use]
    pub fn default_tools(
        &self,
        store: Arc<dyn CardStore>,
        notifier: Arc<dyn Notifier>,
    ) -> ToolRegistry {
        default_tools(store, notifier, self.settings.expose_skills_reorder)
    }
}

impl Core<ProxyClient> {
    /// Builds an engine talking to the configured proxy.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be configured or the seed
    /// transcript is invalid.
    pub fn from_config(config: &FolioConfig, registry: ToolRegistry) -> Result<Self, CoreError> {
        let client = ProxyClient::new(config.to_client_config()?)?;
        Ok(Self::new(client, registry)
            .with_transcript(config.seed_transcript()?)
            .with_max_turns(config.settings.max_turns)
            .with_request_timeout(config.request_timeout()))
    }
}
