use thiserror::Error;

use folio_client::ClientError;
use folio_tools::ToolError;

/// Errors that end a call to the conversation engine.
///
/// Recoverable tool failures (unknown tool names, failing handlers) never show
/// up here; they are reported to the model as function results instead.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Transport error: {0}")]
    Transport(#[from] ClientError),

    #[error("Could not bind function call arguments: {0}")]
    ArgumentParse(#[source] ToolError),

    #[error("Model finished with function_call but sent no function call")]
    MissingFunctionCall,

    #[error("Unhandled finish reason: {0}")]
    UnhandledFinishReason(String),

    #[error("Maximum turns exceeded: {turns} (configured max: {max})")]
    MaxTurnsExceeded { turns: u32, max: u32 },

    #[error("A response is already being generated")]
    AwaitingResponse,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Whether the exchange failed before or during a transport call.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
