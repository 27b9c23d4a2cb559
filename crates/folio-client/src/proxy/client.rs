//! HTTP client for the function-calling chat proxy.
//!
//! # Error Handling
//!
//! - **Authentication errors (401)**: invalid or missing API key
//! - **Rate limiting (429)**: reported with the `Retry-After` hint, if any
//! - **Server errors (5xx)**: reported as `ServiceUnavailable`
//! - **Invalid responses**: empty `choices`, missing `finish_reason`, a reply
//!   that is not from the assistant, a function call without a name, or a body
//!   that does not decode
//!
//! Retries are off by default. Raising `RetryConfig::max_retries` installs an
//! exponential backoff middleware for transient failures.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, warn};
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use secrecy::{ExposeSecret, SecretString};

use folio_common::chat::{Message, MessageRole};
use folio_common::client::{ChatRequest, ChatResponse, Config, FinishReason};

use crate::LLMClient;
use crate::error::{ClientError, ErrorResponse};
use crate::proxy::{ProxyRequest, ProxyResponse};

#[derive(Clone)]
pub struct ProxyClient {
    client: ClientWithMiddleware,
    api_key: Option<Arc<SecretString>>,
    url: url::Url,
    config: Arc<Config>,
}

// Custom Debug implementation to avoid exposing API key
impl std::fmt::Debug for ProxyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("url", &self.url.as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProxyClient {
    /// Creates a client from a transport configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::ConfigurationError` if no base URL is configured
    /// or the resulting URL does not parse.
    pub fn new(config: Config) -> Result<Self, ClientError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| ClientError::ConfigurationError("Base URL is required".to_string()))?;

        let raw_url = match config.endpoint.as_deref() {
            Some(endpoint) if !endpoint.is_empty() => format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            ),
            _ => base_url,
        };
        let url = url::Url::parse(&raw_url)
            .map_err(|e| ClientError::ConfigurationError(format!("Invalid URL '{raw_url}': {e}")))?;

        let reqwest_client = match config.timeout_seconds {
            Some(timeout) => reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout))
                .build()?,
            None => reqwest::Client::builder().build()?,
        };

        let mut builder = reqwest_middleware::ClientBuilder::new(reqwest_client);
        if config.retry_config.max_retries > 0 {
            let retry_policy = ExponentialBackoff::builder()
                .retry_bounds(
                    config.retry_config.initial_delay,
                    config.retry_config.max_delay,
                )
                .build_with_max_retries(config.retry_config.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        Ok(Self {
            client: builder.build(),
            api_key: config.api_key.clone().map(Arc::new),
            url,
            config: Arc::new(config),
        })
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).model = model.into();
        self
    }

    #[must_use]
    pub const fn url(&self) -> &url::Url {
        &self.url
    }

    async fn error_for_status(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let error_text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read error response body: {e}");
                return ClientError::NetworkError(e);
            }
        };

        // Extract the error message from structured response or use raw text
        let error_message = match serde_json::from_str::<ErrorResponse>(&error_text) {
            Ok(parsed) => parsed.error.message,
            Err(_) => error_text,
        };

        error!(
            "Chat request failed with status {}: {}",
            status.as_u16(),
            error_message
        );

        match status {
            StatusCode::UNAUTHORIZED => ClientError::AuthenticationError(error_message),
            StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimitError { retry_after },
            s if s.is_server_error() => ClientError::ServiceUnavailable(error_message),
            s => ClientError::RequestError {
                status: s.as_u16(),
                message: error_message,
            },
        }
    }

    fn parse_response(body: &str) -> Result<ChatResponse, ClientError> {
        let parsed: ProxyResponse = serde_json::from_str(body)?;
        let (model, choice) = parsed.into_parts();

        let choice = choice.ok_or_else(|| {
            warn!("Received empty choices array from backend");
            ClientError::InvalidResponse("Backend returned no choices".to_string())
        })?;

        let finish_reason: FinishReason = choice
            .finish_reason
            .ok_or_else(|| {
                ClientError::InvalidResponse("Response is missing finish_reason".to_string())
            })?
            .into();

        let message = Message::from(choice.message);
        Self::validate_reply(&message)?;

        Ok(ChatResponse {
            message,
            finish_reason,
            model,
            created_at: Utc::now(),
        })
    }
}

impl ProxyClient {
    fn validate_reply(message: &Message) -> Result<(), ClientError> {
        if message.role != MessageRole::Assistant {
            warn!("Backend replied with role {:?}", message.role);
            return Err(ClientError::InvalidResponse(format!(
                "Expected an assistant reply, found {:?}",
                message.role
            )));
        }
        if message
            .function_call
            .as_ref()
            .is_some_and(|call| call.name.trim().is_empty())
        {
            return Err(ClientError::InvalidResponse(
                "Function call is missing its name".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LLMClient for ProxyClient {
    fn config(&self) -> &Config {
        &self.config
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
        self.validate_request(request)?;

        let body = serde_json::to_string(&ProxyRequest::from(request))?;
        debug!("Sending chat request to {}", self.url);

        let mut request_builder = self
            .client
            .post(self.url.clone())
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.api_key {
            request_builder = request_builder.header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            );
        }

        let response = request_builder.body(body).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let response_text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::TimeoutError
            } else {
                ClientError::NetworkError(e)
            }
        })?;
        debug!("Raw backend response: {response_text}");

        Self::parse_response(&response_text)
    }
}
