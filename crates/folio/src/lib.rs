//! # folio
//!
//! Tool-calling chat orchestration for card-based portfolio sites.
//!
//! A visitor chats with a language model that can look at and rearrange the
//! cards on the page. [`Core`] owns the conversation: it sends the transcript
//! and the tool schemas to the backend, runs whatever function the model asks
//! for against the [`CardStore`](folio_tools::cards::CardStore), feeds the
//! result back, and repeats until the model answers in plain text.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use folio::cards::{Card, InMemoryCardStore, PROJECTS};
//! use folio::{Core, FolioConfig, LogNotifier};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = FolioConfig::load("folio.toml")?;
//! let store = InMemoryCardStore::new()
//!     .with_collection(PROJECTS, [Card::new("Raytracer", "A toy path tracer.")])?;
//! let registry = config.default_tools(Arc::new(store), Arc::new(LogNotifier));
//!
//! let core = Core::from_config(&config, registry)?;
//! core.append_user_message("Which projects use Rust?").await?;
//! let reply = core.generate_response().await?;
//! println!("{}", reply.content);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Bounded tool loop**: every response is limited to a configurable number
//!   of transport calls
//! - **Named argument binding**: function arguments are matched to schema
//!   parameters by name, never by position
//! - **Error containment**: unknown tools and failing handlers are reported to
//!   the model; malformed arguments and transport failures end the exchange
//! - **One exchange at a time**: overlapping calls are rejected, not interleaved

pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod prompt;

pub use folio_client::{ClientError, LLMClient, ProxyClient};
pub use folio_common::{
    ChatRequest, ChatResponse, Config, FinishReason, Function, FunctionCall, FunctionCallMode,
    Message, MessageRole, Parameters, Property, RetryConfig, TextRole, Tool, Transcript,
};
pub use folio_tools::{
    AlertMessageTool, ChannelNotifier, LogNotifier, Notifier, ToolArguments, ToolError,
    ToolExecutor, ToolImplementation, ToolRegistry, cards, default_tools,
};

pub use crate::core::Core;
pub use config::FolioConfig;
pub use error::CoreError;
pub use events::{CoreEvent, EventCallback};
