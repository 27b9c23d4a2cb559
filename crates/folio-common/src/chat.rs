//! Messages and transcripts for function-calling conversations.
//!
//! A [`Transcript`] is the ordered, append-only list of [`Message`]s exchanged
//! with the model during one session. Four roles are recognised:
//!
//! - **System**: instructions and persona for the model
//! - **User**: text typed by the visitor
//! - **Assistant**: model output, either natural language or a [`FunctionCall`]
//! - **Function**: the string result of executing a function the model asked for
//!
//! # Function Calling
//!
//! ```
//! use folio_common::chat::{Message, MessageRole, Transcript};
//! use folio_common::tools::FunctionCall;
//!
//! let mut transcript = Transcript::new();
//! transcript.push(Message::user("Show me a random project")).unwrap();
//!
//! // The model asks for a function to be run
//! let request = Message::assistant("")
//!     .with_function_call(FunctionCall::new("get_cards_layout", "{}"))
//!     .unwrap();
//! transcript.push(request).unwrap();
//! assert!(transcript.pending_function_call().is_some());
//!
//! // The engine replies with the function result
//! let reply = Message::function("get_cards_layout", r#"{"projects":[]}"#).unwrap();
//! transcript.push(reply).unwrap();
//! assert!(transcript.pending_function_call().is_none());
//! assert_eq!(transcript.len(), 3);
//! assert_eq!(transcript.messages()[2].role, MessageRole::Function);
//! ```
//!
//! # Invariants
//!
//! - Function calls can only be attached to assistant messages
//! - Function messages always carry a non-empty `name`
//! - Transcripts are append-only; there is no removal API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::tools::FunctionCall;

/// The role of a message sender.
///
/// Serialized as the lowercase strings used by the legacy function-calling
/// chat API:
///
/// ```
/// use folio_common::chat::MessageRole;
///
/// let json = serde_json::to_string(&MessageRole::Function).unwrap();
/// assert_eq!(json, "\"function\"");
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions or persona for the model.
    System,
    /// Input from the visitor.
    User,
    /// Output from the model.
    Assistant,
    /// Result of a function the model requested.
    Function,
}

/// The roles of messages that carry only text.
///
/// None of them needs a function name, so a transcript built from them with
/// [`Transcript::from_text`] is valid by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    System,
    User,
    Assistant,
}

impl From<TextRole> for MessageRole {
    fn from(role: TextRole) -> Self {
        match role {
            TextRole::System => Self::System,
            TextRole::User => Self::User,
            TextRole::Assistant => Self::Assistant,
        }
    }
}

/// A single message in a transcript.
///
/// Use the role constructors for the common cases:
///
/// ```
/// use folio_common::chat::{Message, MessageRole};
///
/// let system = Message::system("You are a helpful assistant");
/// let user = Message::user("What does the site owner work on?");
/// let result = Message::function("get_card_content", "Some content").unwrap();
///
/// assert_eq!(result.role, MessageRole::Function);
/// assert_eq!(result.name.as_deref(), Some("get_card_content"));
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, TypedBuilder)]
pub struct Message {
    /// Unique identifier for this message.
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    /// The role of the sender.
    pub role: MessageRole,

    /// Text content.
    ///
    /// Empty for assistant messages that only carry a function call.
    #[builder(default)]
    pub content: String,

    /// Function name. Required for [`MessageRole::Function`] messages.
    #[builder(default)]
    pub name: Option<String>,

    /// The function the model asked to run, if any.
    #[builder(default)]
    pub function_call: Option<FunctionCall>,

    /// Creation time.
    #[builder(default = Utc::now())]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message with the given role and content.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            name: None,
            function_call: None,
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Creates a function-role message carrying a function result.
    ///
    /// # Errors
    ///
    /// Returns an error if `function_name` is empty.
    pub fn function(
        function_name: impl Into<String>,
        content: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let function_name = function_name.into();
        if function_name.is_empty() {
            anyhow::bail!("Function name cannot be empty for function messages");
        }
        let mut msg = Self::new(MessageRole::Function, content);
        msg.name = Some(function_name);
        Ok(msg)
    }

    /// Attaches a function call to an assistant message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is not an assistant message.
    pub fn with_function_call(mut self, function_call: FunctionCall) -> anyhow::Result<Self> {
        if self.role != MessageRole::Assistant {
            anyhow::bail!(
                "Function calls can only be added to assistant messages, found {:?}",
                self.role
            );
        }
        self.function_call = Some(function_call);
        Ok(self)
    }

    #[must_use]
    pub const fn is_function_call(&self) -> bool {
        self.function_call.is_some()
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.function_call.is_some() && self.role != MessageRole::Assistant {
            anyhow::bail!(
                "Function calls can only appear on assistant messages, found {:?}",
                self.role
            );
        }
        if self.role == MessageRole::Function
            && self.name.as_deref().is_none_or(str::is_empty)
        {
            anyhow::bail!("Function messages must carry the function name");
        }
        Ok(())
    }
}

/// The ordered message history of one session.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Transcript {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Creates a transcript pre-populated with `messages`.
    ///
    /// # Errors
    ///
    /// Returns an error if any message violates the transcript invariants.
    pub fn seeded(messages: impl IntoIterator<Item = Message>) -> anyhow::Result<Self> {
        let mut transcript = Self::new();
        for message in messages {
            transcript.push(message)?;
        }
        Ok(transcript)
    }

    /// Creates a transcript of plain text messages.
    ///
    /// ```
    /// use folio_common::chat::{TextRole, Transcript};
    ///
    /// let transcript = Transcript::from_text([
    ///     (TextRole::System, "Be brief."),
    ///     (TextRole::Assistant, "Hi!"),
    /// ]);
    /// assert_eq!(transcript.len(), 2);
    /// ```
    pub fn from_text<S: Into<String>>(messages: impl IntoIterator<Item = (TextRole, S)>) -> Self {
        let mut transcript = Self::new();
        transcript.messages = messages
            .into_iter()
            .map(|(role, content)| Message::new(role.into(), content))
            .collect();
        transcript
    }

    /// Appends a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message carries a function call on a
    /// non-assistant role, or is a function message without a name.
    pub fn push(&mut self, message: Message) -> anyhow::Result<()> {
        message.validate()?;
        self.messages.push(message);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the function call of the last message if it has not been
    /// answered by a function-role message yet.
    pub fn pending_function_call(&self) -> Option<&FunctionCall> {
        self.messages.last().and_then(|m| m.function_call.as_ref())
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod proptests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn transcript_preserves_append_order(contents in prop::collection::vec(".*", 0..20)) {
            let mut transcript = Transcript::new();
            for content in &contents {
                transcript.push(Message::user(content.as_str())).unwrap();
            }

            let stored: Vec<&str> = transcript
                .messages()
                .iter()
                .map(|m| m.content.as_str())
                .collect();
            let expected: Vec<&str> = contents.iter().map(String::as_str).collect();
            prop_assert_eq!(stored, expected);
        }

        #[test]
        fn message_serialization_roundtrip(content in ".*", role_idx in 0usize..3) {
            let role = match role_idx {
                0 => MessageRole::User,
                1 => MessageRole::Assistant,
                _ => MessageRole::System,
            };

            let msg = Message::new(role, content);
            let serialized = serde_json::to_string(&msg).unwrap();
            let deserialized: Message = serde_json::from_str(&serialized).unwrap();

            prop_assert_eq!(msg, deserialized);
        }
    }
}
