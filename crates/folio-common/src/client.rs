//! Transport configuration and request/response types.
//!
//! These are the provider-neutral shapes exchanged between the conversation
//! engine and an `LLMClient` implementation.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::chat::Message;
use crate::tools::Tool;

/// Why the model stopped generating.
///
/// Only `stop` and `function_call` drive the conversation loop; anything else
/// is kept verbatim in [`FinishReason::Other`] so it can be reported.
///
/// ```
/// use folio_common::client::FinishReason;
///
/// assert_eq!("function_call".parse::<FinishReason>().unwrap(), FinishReason::FunctionCall);
/// assert_eq!(
///     "length".parse::<FinishReason>().unwrap(),
///     FinishReason::Other("length".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FinishReason {
    Stop,
    FunctionCall,
    Other(String),
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => write!(f, "stop"),
            Self::FunctionCall => write!(f, "function_call"),
            Self::Other(reason) => write!(f, "{reason}"),
        }
    }
}

impl FromStr for FinishReason {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "stop" => Self::Stop,
            "function_call" => Self::FunctionCall,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<String> for FinishReason {
    fn from(value: String) -> Self {
        match value.as_str() {
            "stop" => Self::Stop,
            "function_call" => Self::FunctionCall,
            _ => Self::Other(value),
        }
    }
}

impl From<FinishReason> for String {
    fn from(reason: FinishReason) -> Self {
        reason.to_string()
    }
}

/// Retry behaviour of the HTTP transport.
///
/// The conversation engine never retries on its own; a transport only retries
/// when `max_retries` is raised above zero.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Controls whether the model may, must not, or must call a function.
///
/// Serialized the way the legacy function-calling API expects it:
///
/// ```
/// use folio_common::client::FunctionCallMode;
///
/// let none = serde_json::to_value(FunctionCallMode::None).unwrap();
/// assert_eq!(none, serde_json::json!("none"));
///
/// let forced = serde_json::to_value(FunctionCallMode::Named("get_cards_layout".into())).unwrap();
/// assert_eq!(forced, serde_json::json!({"name": "get_cards_layout"}));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "FunctionCallRepr", try_from = "FunctionCallRepr")]
pub enum FunctionCallMode {
    /// The model decides.
    Auto,
    /// The model must answer in text.
    None,
    /// The model must call the named function.
    Named(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FunctionCallRepr {
    Mode(String),
    Named { name: String },
}

impl From<FunctionCallMode> for FunctionCallRepr {
    fn from(mode: FunctionCallMode) -> Self {
        match mode {
            FunctionCallMode::Auto => Self::Mode("auto".to_string()),
            FunctionCallMode::None => Self::Mode("none".to_string()),
            FunctionCallMode::Named(name) => Self::Named { name },
        }
    }
}

impl TryFrom<FunctionCallRepr> for FunctionCallMode {
    type Error = String;

    fn try_from(repr: FunctionCallRepr) -> Result<Self, Self::Error> {
        match repr {
            FunctionCallRepr::Mode(mode) => match mode.as_str() {
                "auto" => Ok(Self::Auto),
                "none" => Ok(Self::None),
                other => Err(format!("Unknown function_call mode '{other}'")),
            },
            FunctionCallRepr::Named { name } => Ok(Self::Named(name)),
        }
    }
}

/// A chat completion request: the full transcript plus the advertised tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Arc<[Message]>,
    pub tools: Option<Vec<Tool>>,
    /// Omitted from the wire when unset, which the backend treats as `auto`.
    #[serde(default)]
    pub function_call: Option<FunctionCallMode>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: impl Into<Arc<[Message]>>) -> Self {
        Self {
            model: model.into(),
            messages: messages.into(),
            tools: None,
            function_call: None,
        }
    }

    /// Attaches tool schemas. An empty list leaves the request without tools.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = if tools.is_empty() { None } else { Some(tools) };
        self
    }

    #[must_use]
    pub fn with_function_call(mut self, mode: FunctionCallMode) -> Self {
        self.function_call = Some(mode);
        self
    }

    #[must_use]
    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// # Errors
    ///
    /// Returns an error if the request has no messages or no model, or forces
    /// a function it does not advertise.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.messages.is_empty() {
            anyhow::bail!("Chat request must have at least one message");
        }
        if self.model.trim().is_empty() {
            anyhow::bail!("Chat request must name a model");
        }
        if let Some(FunctionCallMode::Named(name)) = &self.function_call {
            let advertised = self
                .tools
                .iter()
                .flatten()
                .any(|tool| tool.function.name == *name);
            if !advertised {
                anyhow::bail!("Chat request forces function '{name}' but does not advertise it");
            }
        }
        Ok(())
    }
}

impl From<(&Config, Vec<Message>)> for ChatRequest {
    fn from((config, messages): (&Config, Vec<Message>)) -> Self {
        Self::new(config.model.clone(), messages)
    }
}

/// The model's reply to a [`ChatRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: Message,
    pub finish_reason: FinishReason,
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatResponse {
    pub fn new(message: Message, finish_reason: FinishReason) -> Self {
        Self {
            message,
            finish_reason,
            model: None,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for ChatResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "Error serializing ChatResponse to JSON"),
        }
    }
}

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: String,
    pub base_url: Option<String>,
    /// Path appended to `base_url` for chat requests.
    pub endpoint: Option<String>,
    #[serde(skip)]
    pub api_key: Option<SecretString>,
    pub timeout_seconds: Option<u64>,
    #[serde(skip)]
    pub retry_config: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            base_url: None,
            endpoint: None,
            api_key: None,
            timeout_seconds: None,
            retry_config: RetryConfig::default(),
        }
    }
}

impl Config {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into().into()));
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    #[must_use]
    pub const fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_function_call_mode_serde() {
        let auto = serde_json::to_value(FunctionCallMode::Auto).unwrap();
        assert_eq!(auto, serde_json::json!("auto"));

        let named: FunctionCallMode =
            serde_json::from_value(serde_json::json!({"name": "expand_card"})).unwrap();
        assert_eq!(named, FunctionCallMode::Named("expand_card".to_string()));

        assert!(serde_json::from_value::<FunctionCallMode>(serde_json::json!("always")).is_err());
    }

    #[test]
    fn test_forced_function_must_be_advertised() {
        let request = ChatRequest::new("gpt-4", vec![Message::user("hi")])
            .with_function_call(FunctionCallMode::Named("get_cards_layout".to_string()));
        assert!(request.validate().is_err());

        let request = request.with_tools(vec![Tool::function(
            "get_cards_layout",
            "Returns the layout",
            crate::tools::Parameters::empty(),
        )]);
        assert!(request.validate().is_ok());

        let request = ChatRequest::new("gpt-4", vec![Message::user("hi")])
            .with_function_call(FunctionCallMode::None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_finish_reason_serde() {
        let json = serde_json::to_string(&FinishReason::FunctionCall).unwrap();
        assert_eq!(json, "\"function_call\"");

        let reason: FinishReason = serde_json::from_str("\"content_filter\"").unwrap();
        assert_eq!(reason, FinishReason::Other("content_filter".to_string()));
        assert_eq!(reason.to_string(), "content_filter");
    }

    #[test]
    fn test_chat_request_with_empty_tools() {
        let request = ChatRequest::new("gpt-4", vec![Message::user("hi")]).with_tools(vec![]);
        assert!(request.tools.is_none());
        assert!(!request.has_tools());
    }

    #[test]
    fn test_chat_request_validation() {
        let empty = ChatRequest::new("gpt-4", Vec::<Message>::new());
        assert!(empty.validate().is_err());

        let no_model = ChatRequest::new(" ", vec![Message::user("hi")]);
        assert!(no_model.validate().is_err());

        let ok: ChatRequest = (&Config::default(), vec![Message::user("hi")]).into();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.model, "gpt-4");
    }

    #[test]
    fn test_config_api_key_not_serialized() {
        let config = Config::new("gpt-4").with_api_key("secret-key");
        assert_eq!(
            config.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("secret-key".to_string())
        );

        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("api_key").is_none());
        assert!(!format!("{config:?}").contains("secret-key"));
    }

    #[test]
    fn test_default_retry_is_disabled() {
        assert_eq!(Config::default().retry_config.max_retries, 0);
    }
}
