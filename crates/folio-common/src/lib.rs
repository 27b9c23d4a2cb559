//! # folio-common
//!
//! Common types shared by the Folio crates:
//! - Messages, roles and the append-only transcript
//! - Tool schemas and function calls
//! - Transport configuration and request/response shapes
//!
//! ## Example
//!
//! ```
//! use folio_common::{ChatRequest, Config, Message, Parameters, Property, Tool};
//!
//! let tool = Tool::function(
//!     "get_card_content",
//!     "Returns the content of a specific card.",
//!     Parameters::from_properties([(
//!         "card_title",
//!         Property::string("The title of the card. Case sensitive."),
//!         true,
//!     )]),
//! );
//!
//! let config = Config::new("gpt-4");
//! let request = ChatRequest::from((&config, vec![Message::user("Hi!")])).with_tools(vec![tool]);
//! assert!(request.has_tools());
//! ```

/// Messages, roles and transcripts.
pub mod chat;
/// Transport configuration and request/response types.
pub mod client;
/// Tool schemas and function calls.
pub mod tools;

pub use chat::{Message, MessageRole, TextRole, Transcript};
pub use client::{
    ChatRequest, ChatResponse, Config, FinishReason, FunctionCallMode, RetryConfig,
};
pub use tools::{Function, FunctionCall, Parameters, Property, Tool};
