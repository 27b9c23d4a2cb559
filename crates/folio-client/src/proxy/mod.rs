//! Wire types for the function-calling chat proxy.
//!
//! Requests use the legacy OpenAI function-calling shape:
//!
//! ```json
//! { "model": "gpt-4", "messages": [...], "functions": [...], "function_call": "auto" }
//! ```
//!
//! Responses are accepted either as a single forwarded choice
//! (`{ "message": ..., "finish_reason": ... }`) or as a raw completion with a
//! `choices` array, in which case the first choice is used.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use folio_common::chat::{Message, MessageRole};
use folio_common::client::{ChatRequest, FunctionCallMode};
use folio_common::tools::{Function, FunctionCall};

pub mod client;
pub use client::ProxyClient;

/// A message as it travels over the wire.
#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    pub role: MessageRole,
    /// `null` for assistant messages that only carry a function call.
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let content = if message.content.is_empty() && message.function_call.is_some() {
            None
        } else {
            Some(message.content.clone())
        };

        Self {
            role: message.role,
            content,
            name: message.name.clone(),
            function_call: message.function_call.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<Function>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallMode>,
}

impl From<&ChatRequest> for ProxyRequest {
    fn from(request: &ChatRequest) -> Self {
        Self {
            model: request.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            functions: request
                .tools
                .as_ref()
                .filter(|tools| !tools.is_empty())
                .map(|tools| tools.iter().map(|t| t.function.clone()).collect()),
            function_call: request.function_call.clone(),
        }
    }
}

/// A function call as returned by the backend.
///
/// Arguments normally arrive as a JSON-encoded string; a JSON object is
/// re-encoded so the engine always sees a string.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingFunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl From<IncomingFunctionCall> for FunctionCall {
    fn from(call: IncomingFunctionCall) -> Self {
        let arguments = match call.arguments {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Self::new(call.name, arguments)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    #[serde(default = "default_role")]
    pub role: MessageRole,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub function_call: Option<IncomingFunctionCall>,
}

const fn default_role() -> MessageRole {
    MessageRole::Assistant
}

impl From<IncomingMessage> for Message {
    fn from(message: IncomingMessage) -> Self {
        Self::builder()
            .role(message.role)
            .content(message.content.unwrap_or_default())
            .name(message.name)
            .function_call(message.function_call.map(FunctionCall::from))
            .build()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyChoice {
    pub message: IncomingMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<ProxyChoice>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProxyResponse {
    Completion(CompletionResponse),
    Choice(ProxyChoice),
}

impl ProxyResponse {
    /// Returns the model name (if reported) and the first choice.
    pub fn into_parts(self) -> (Option<String>, Option<ProxyChoice>) {
        match self {
            Self::Completion(completion) => {
                (completion.model, completion.choices.into_iter().next())
            }
            Self::Choice(choice) => (None, Some(choice)),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use folio_common::tools::{Parameters, Property, Tool};
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let call_msg = Message::assistant("")
            .with_function_call(FunctionCall::new("get_card_content", r#"{"card_title":"A"}"#))
            .unwrap();
        let messages = vec![
            Message::system("persona"),
            Message::user("Tell me about A"),
            call_msg,
            Message::function("get_card_content", "A is great").unwrap(),
        ];
        let tool = Tool::function(
            "get_card_content",
            "Returns the content of a card.",
            Parameters::from_properties([("card_title", Property::string("Title"), true)]),
        );
        let request = ChatRequest::new("gpt-4", messages).with_tools(vec![tool]);

        let json = serde_json::to_value(ProxyRequest::from(&request)).unwrap();

        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0], json!({"role": "system", "content": "persona"}));
        assert_eq!(json["messages"][2]["content"], Value::Null);
        assert_eq!(
            json["messages"][2]["function_call"],
            json!({"name": "get_card_content", "arguments": "{\"card_title\":\"A\"}"})
        );
        assert_eq!(
            json["messages"][3],
            json!({"role": "function", "content": "A is great", "name": "get_card_content"})
        );
        assert_eq!(json["functions"][0]["name"], "get_card_content");
        assert_eq!(json["functions"][0]["parameters"]["required"], json!(["card_title"]));
    }

    #[test]
    fn test_request_without_tools_omits_functions() {
        let request = ChatRequest::new("gpt-4", vec![Message::user("hi")]);
        let json = serde_json::to_value(ProxyRequest::from(&request)).unwrap();
        assert!(json.get("functions").is_none());
        assert!(json.get("function_call").is_none());
    }

    #[test]
    fn test_forced_function_call_is_sent() {
        let tool = Tool::function("get_cards_layout", "Returns the layout", Parameters::empty());
        let request = ChatRequest::new("gpt-4", vec![Message::user("hi")])
            .with_tools(vec![tool])
            .with_function_call(FunctionCallMode::Named("get_cards_layout".to_string()));

        let json = serde_json::to_value(ProxyRequest::from(&request)).unwrap();
        assert_eq!(json["function_call"], json!({"name": "get_cards_layout"}));
    }

    #[test]
    fn test_single_choice_response() {
        let body = json!({
            "message": {
                "role": "assistant",
                "content": null,
                "function_call": {"name": "expand_card", "arguments": "{\"card_title\":\"A\"}"}
            },
            "finish_reason": "function_call"
        });

        let response: ProxyResponse = serde_json::from_value(body).unwrap();
        let (model, choice) = response.into_parts();
        assert!(model.is_none());

        let choice = choice.unwrap();
        assert_eq!(choice.finish_reason.as_deref(), Some("function_call"));
        let message = Message::from(choice.message);
        assert_eq!(message.role, MessageRole::Assistant);
        assert!(message.content.is_empty());
        assert_eq!(
            message.function_call,
            Some(FunctionCall::new("expand_card", r#"{"card_title":"A"}"#))
        );
    }

    #[test]
    fn test_completion_response_uses_first_choice() {
        let body = json!({
            "id": "chatcmpl-1",
            "model": "gpt-4-0613",
            "choices": [
                {"message": {"role": "assistant", "content": "first"}, "finish_reason": "stop"},
                {"message": {"role": "assistant", "content": "second"}, "finish_reason": "stop"}
            ]
        });

        let response: ProxyResponse = serde_json::from_value(body).unwrap();
        let (model, choice) = response.into_parts();
        assert_eq!(model.as_deref(), Some("gpt-4-0613"));
        assert_eq!(Message::from(choice.unwrap().message).content, "first");
    }

    #[test]
    fn test_object_arguments_are_reencoded() {
        let call: IncomingFunctionCall = serde_json::from_value(json!({
            "name": "set_project_cards_order",
            "arguments": {"project_order": ["B", "A"]}
        }))
        .unwrap();

        let call = FunctionCall::from(call);
        let parsed: Value = serde_json::from_str(&call.arguments).unwrap();
        assert_eq!(parsed, json!({"project_order": ["B", "A"]}));
    }
}
