use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use folio_client::{ClientError, LLMClient};
use folio_common::chat::{Message, MessageRole, Transcript};
use folio_common::client::{ChatRequest, ChatResponse, FinishReason};
use folio_common::tools::FunctionCall;
use folio_tools::{ToolExecutor, ToolRegistry};

use crate::error::CoreError;
use crate::events::{CoreEvent, EventCallback};
use crate::prompt;

const DEFAULT_MAX_TURNS: u32 = 10;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Clears the awaiting-response flag when an exchange ends, however it ends.
struct AwaitingGuard<'a>(&'a AtomicBool);

impl Drop for AwaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The conversation engine.
///
/// Owns the transcript of one session and drives each exchange with the
/// model: send the transcript and tool schemas, append the reply, run the
/// requested function, append its result, and repeat until the model stops
/// or the turn budget runs out.
///
/// One exchange runs at a time. While [`generate_response`](Self::generate_response)
/// is in flight, a second call and [`append_user_message`](Self::append_user_message)
/// fail with [`CoreError::AwaitingResponse`]; [`messages`](Self::messages) can
/// still be read. Appends outside an exchange are serialized by the transcript
/// lock and never reject each other.
pub struct Core<C: LLMClient> {
    client: C,
    tool_executor: ToolExecutor,
    transcript: Mutex<Transcript>,
    awaiting: AtomicBool,
    max_turns: u32,
    request_timeout: Option<Duration>,
    event_callback: Option<EventCallback>,
}

impl<C: LLMClient> Core<C> {
    /// Creates an engine with the default seed transcript.
    pub fn new(client: C, registry: ToolRegistry) -> Self {
        Self {
            client,
            tool_executor: ToolExecutor::with_registry(registry),
            transcript: Mutex::new(prompt::seed_transcript()),
            awaiting: AtomicBool::new(false),
            max_turns: DEFAULT_MAX_TURNS,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            event_callback: None,
        }
    }

    /// Starts from `transcript` instead of the default seed.
    #[must_use]
    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = Mutex::new(transcript);
        self
    }

    /// Sets the number of transport calls allowed per response. Zero is
    /// treated as one.
    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn without_request_timeout(mut self) -> Self {
        self.request_timeout = None;
        self
    }

    #[must_use]
    pub fn with_event_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(CoreEvent) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.event_callback = Some(Box::new(callback));
        self
    }

    pub const fn client(&self) -> &C {
        &self.client
    }

    pub const fn tool_executor(&self) -> &ToolExecutor {
        &self.tool_executor
    }

    pub const fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting.load(Ordering::Acquire)
    }

    /// Snapshot of the transcript.
    pub async fn messages(&self) -> Vec<Message> {
        self.transcript.lock().await.messages().to_vec()
    }

    /// Appends a visitor message. The text is stored as given.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AwaitingResponse`] while a response is being generated.
    pub async fn append_user_message(&self, text: impl Into<String>) -> Result<(), CoreError> {
        if self.is_awaiting_response() {
            return Err(CoreError::AwaitingResponse);
        }
        self.append(Message::user(text)).await
    }

    /// Drives one exchange until the model produces a final answer.
    ///
    /// Returns the final assistant message, which is also the last message of
    /// the transcript.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AwaitingResponse`] if another exchange is in flight
    /// - [`CoreError::Transport`] if a transport call fails, times out or
    ///   returns a reply that is not a valid assistant message; the transcript
    ///   keeps everything appended before that call
    /// - [`CoreError::ArgumentParse`] if function-call arguments cannot be bound
    /// - [`CoreError::MissingFunctionCall`] if the model finished with
    ///   `function_call` but sent no call
    /// - [`CoreError::UnhandledFinishReason`] for any finish reason other than
    ///   `stop` or `function_call`
    /// - [`CoreError::MaxTurnsExceeded`] once the turn budget is spent
    pub async fn generate_response(&self) -> Result<Message, CoreError> {
        if self.awaiting.swap(true, Ordering::AcqRel) {
            return Err(CoreError::AwaitingResponse);
        }
        let _guard = AwaitingGuard(&self.awaiting);

        let tools = self.tool_executor.get_all_tools();
        let start_time = Instant::now();
        let mut turn_count = 0;

        loop {
            if turn_count >= self.max_turns {
                warn!("Turn budget of {} spent without a final answer", self.max_turns);
                return Err(CoreError::MaxTurnsExceeded {
                    turns: turn_count,
                    max: self.max_turns,
                });
            }
            turn_count += 1;

            let request = ChatRequest::from((self.client.config(), self.messages().await))
                .with_tools(tools.clone());

            info!("Executing chat turn ({turn_count}/{})", self.max_turns);
            debug!(
                "Chat request:\n {}",
                serde_json::to_string_pretty(&request).unwrap_or_default()
            );

            let response = self.send(&request).await?;
            debug!("Assistant Response:\n {response}");

            let ChatResponse {
                message,
                finish_reason,
                ..
            } = response;
            let function_call = message.function_call.clone();
            self.append_reply(message.clone()).await?;

            match finish_reason {
                FinishReason::Stop => {
                    debug!(
                        "Chat completed in {turn_count} turns ({:.2?})",
                        start_time.elapsed()
                    );
                    return Ok(message);
                }
                FinishReason::FunctionCall => {
                    let call = function_call
                        .filter(|call| !call.name.is_empty())
                        .ok_or(CoreError::MissingFunctionCall)?;
                    self.dispatch(&call).await?;
                }
                FinishReason::Other(reason) => {
                    error!("Unhandled finish reason '{reason}', stopping");
                    return Err(CoreError::UnhandledFinishReason(reason));
                }
            }
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, CoreError> {
        let call = self.client.chat(request);
        let response = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| ClientError::TimeoutError)?,
            None => call.await,
        };

        response.map_err(|e| {
            error!("Transport call failed: {e}");
            CoreError::Transport(e)
        })
    }

    /// Runs one function call and appends its result.
    async fn dispatch(&self, call: &FunctionCall) -> Result<(), CoreError> {
        debug!("Tool Name: {}", call.name);
        debug!("Tool Arguments: {}", call.arguments);

        let (result, success) = match self.tool_executor.execute_tool(call).await {
            Ok(result) => {
                debug!("Tool {} executed successfully", call.name);
                (result, true)
            }
            Err(e) if e.is_recoverable() => {
                warn!("Tool {} failed: {e}", call.name);
                (e.to_function_result(), false)
            }
            Err(e) => return Err(CoreError::ArgumentParse(e)),
        };

        self.emit(CoreEvent::ToolResult {
            name: call.name.clone(),
            result: result.clone(),
            success,
        })
        .await;
        self.append(Message::function(call.name.clone(), result)?)
            .await
    }

    /// Appends a model reply. A reply that is not a valid assistant message is
    /// a malformed response and leaves the transcript unchanged.
    async fn append_reply(&self, message: Message) -> Result<(), CoreError> {
        let rejected = if message.role == MessageRole::Assistant {
            match self.transcript.lock().await.push(message.clone()) {
                Ok(()) => None,
                Err(e) => Some(e.to_string()),
            }
        } else {
            Some(format!("Expected an assistant reply, found {:?}", message.role))
        };

        if let Some(reason) = rejected {
            error!("Rejected model reply: {reason}");
            return Err(CoreError::Transport(ClientError::InvalidResponse(reason)));
        }
        self.emit(CoreEvent::MessageAppended(message)).await;
        Ok(())
    }

    async fn append(&self, message: Message) -> Result<(), CoreError> {
        self.transcript.lock().await.push(message.clone())?;
        self.emit(CoreEvent::MessageAppended(message)).await;
        Ok(())
    }

    async fn emit(&self, event: CoreEvent) {
        if let Some(callback) = &self.event_callback {
            callback(event).await;
        }
    }
}
