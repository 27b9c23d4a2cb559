//! # folio-client
//!
//! Transport client for function-calling chat backends.
//!
//! The [`LLMClient`] trait is the seam between the conversation engine and the
//! network: it takes a full transcript plus tool schemas and returns the
//! model's next message together with its finish reason. Failures are typed
//! [`ClientError`]s, never panics.
//!
//! [`ProxyClient`] speaks the legacy OpenAI function-calling format to an HTTP
//! proxy that forwards requests to the model provider.
//!
//! ## Example
//!
//! ```no_run
//! use folio_client::{LLMClient, ProxyClient};
//! use folio_common::{ChatRequest, Config, Message};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::new("gpt-4")
//!     .with_base_url("https://proxy.example.com")
//!     .with_endpoint("chat");
//!
//! let client = ProxyClient::new(config)?;
//! let request = ChatRequest::from((client.config(), vec![Message::user("Hello!")]));
//!
//! let response = client.chat(&request).await?;
//! println!("{}: {}", response.finish_reason, response.message.content);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use folio_common::{ChatRequest, ChatResponse, Config};

pub mod error;
pub mod proxy;

pub use error::ClientError;
pub use proxy::ProxyClient;

#[must_use = "LLMClient must be used to make requests"]
#[async_trait]
pub trait LLMClient: Send + Sync {
    fn config(&self) -> &Config;

    /// Sends one chat request and waits for the complete response.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError>;

    fn validate_request(&self, request: &ChatRequest) -> Result<(), ClientError> {
        request
            .validate()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))
    }
}

#[async_trait]
impl<C: LLMClient + ?Sized> LLMClient for Arc<C> {
    fn config(&self) -> &Config {
        (**self).config()
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ClientError> {
        (**self).chat(request).await
    }
}
