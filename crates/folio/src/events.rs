//! Event types for Core orchestration
//!
//! Events are fire-and-forget notifications about what the engine is doing,
//! for UIs that render the transcript as it grows or log tool activity.
//! The engine awaits each callback before continuing, so a callback can do
//! async I/O but should not block for long.

use futures::future::BoxFuture;

use folio_common::chat::Message;

#[derive(Debug, Clone)]
pub enum CoreEvent {
    /// A message was appended to the transcript.
    MessageAppended(Message),

    /// A function call was dispatched.
    ToolResult {
        /// Name the model asked for
        name: String,
        /// Text returned to the model
        result: String,
        /// Whether the handler ran and succeeded
        success: bool,
    },
}

/// Async callback for receiving Core events
pub type EventCallback = Box<dyn Fn(CoreEvent) -> BoxFuture<'static, ()> + Send + Sync>;
