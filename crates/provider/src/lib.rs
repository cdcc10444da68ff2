//! LLM provider interface
//!
//! Chat-completion wire types and the `Provider` trait the orchestrator
//! drives. Tool-call arguments are kept as the raw text the model emitted;
//! parsing them is the dispatcher's job, so a malformed payload becomes a
//! recoverable tool failure instead of a provider error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub mod openrouter;

pub use openrouter::OpenRouterProvider;

/// Provider transport and protocol errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid response payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("api error: {0}")]
    Api(String),

    #[error("no api key configured")]
    NoApiKey,

    #[error("malformed completion response")]
    InvalidResponse,

    #[error("rate limited")]
    RateLimited,
}

impl ProviderError {
    /// Whether the orchestrator may retry the call.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Request(_) | ProviderError::Timeout(_) | ProviderError::RateLimited
        )
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// A tool invocation requested by the model.
///
/// `arguments` is the raw argument text exactly as emitted; it has not
/// been validated as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One model response: content, tool calls, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub finish_reason: String,
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
            usage: Usage::default(),
        }
    }

    pub fn calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
            finish_reason: "tool_calls".to_string(),
            usage: Usage::default(),
        }
    }
}

/// Token accounting reported by the endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One entry of the conversation sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Assistant message that carries pending tool calls.
    pub fn assistant_with_calls(content: Option<&str>, calls: Vec<ToolCallDef>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.map(|c| c.to_string()),
            tool_calls: Some(calls),
            tool_call_id: None,
            name: None,
        }
    }

    /// Tool-result message answering one prior tool call.
    pub fn tool(
        call_id: impl Into<String>,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(result.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
            name: Some(name.into()),
        }
    }
}

/// Tool call as echoed back inside an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallDef {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl ToolCallDef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

impl From<&ToolCall> for ToolCallDef {
    fn from(call: &ToolCall) -> Self {
        ToolCallDef::new(&call.id, &call.name, call.arguments.clone())
    }
}

/// Function name plus the raw argument text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Tool advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDef,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// JSON-schema description of a callable function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Parameters for one completion request.
#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<Tool>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub tool_choice: ToolChoice,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            tools: Vec::new(),
            max_tokens: 4096,
            temperature: 0.7,
            tool_choice: ToolChoice::Auto,
        }
    }
}

/// Tool selection mode
#[derive(Debug, Clone)]
pub enum ToolChoice {
    Auto,
    Required(String),
    None,
}

/// A chat-completion endpoint.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse>;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}

/// Build an object schema from `(name, description, required)` string fields.
pub fn object_schema(properties: Vec<(String, String, bool)>) -> Value {
    let mut props = serde_json::Map::new();
    let mut required = Vec::new();

    for (name, description, is_required) in properties {
        props.insert(
            name.clone(),
            serde_json::json!({
                "type": "string",
                "description": description
            }),
        );
        if is_required {
            required.push(name);
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": props,
        "required": required
    })
}

/// Build an object schema with a single required enum-constrained field.
pub fn enum_schema(field: &str, description: &str, values: &[String]) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            field: {
                "type": "string",
                "enum": values,
                "description": description
            }
        },
        "required": [field],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_retryability() {
        assert!(ProviderError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(!ProviderError::NoApiKey.is_retryable());
        assert!(!ProviderError::Api("bad request".to_string()).is_retryable());
        assert!(!ProviderError::InvalidResponse.is_retryable());
    }

    #[test]
    fn test_chat_response_builders() {
        let text = ChatResponse::text("Nice work!");
        assert_eq!(text.content.as_deref(), Some("Nice work!"));
        assert!(!text.has_tool_calls());
        assert_eq!(text.finish_reason, "stop");

        let calls = ChatResponse::calls(vec![ToolCall::new("call_1", "get_user_stats", "{}")]);
        assert!(calls.content.is_none());
        assert!(calls.has_tool_calls());
        assert_eq!(calls.finish_reason, "tool_calls");
    }

    #[test]
    fn test_tool_call_keeps_raw_arguments() {
        let call = ToolCall::new("call_1", "complete_habit", "not json at all");
        assert_eq!(call.arguments, "not json at all");
    }

    #[test]
    fn test_message_roles() {
        let msg = Message::system("You are Wei.");
        assert_eq!(msg.role, "system");

        let msg = Message::user("I just meditated");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content.as_deref(), Some("I just meditated"));

        let msg = Message::tool("call_1", "get_user_stats", r#"{"points":40}"#);
        assert_eq!(msg.role, "tool");
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(msg.name.as_deref(), Some("get_user_stats"));
    }

    #[test]
    fn test_assistant_with_calls() {
        let defs = vec![ToolCallDef::new("call_1", "get_user_habits", "{}")];
        let msg = Message::assistant_with_calls(None, defs);
        assert_eq!(msg.role, "assistant");
        assert!(msg.content.is_none());
        assert_eq!(msg.tool_calls.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_tool_call_def_from_tool_call() {
        let call = ToolCall::new("call_7", "redeem_reward", r#"{"reward_id":"r1"}"#);
        let def = ToolCallDef::from(&call);
        assert_eq!(def.id, "call_7");
        assert_eq!(def.call_type, "function");
        assert_eq!(def.function.name, "redeem_reward");
        assert_eq!(def.function.arguments, r#"{"reward_id":"r1"}"#);
    }

    #[test]
    fn test_message_serialization_skips_empty_fields() {
        let msg = Message::user("hello");
        let text = serde_json::to_string(&msg).unwrap();
        assert!(text.contains("\"role\":\"user\""));
        assert!(!text.contains("tool_call_id"));
        assert!(!text.contains("tool_calls"));
    }

    #[test]
    fn test_object_schema() {
        let schema = object_schema(vec![
            (
                "habit_id".to_string(),
                "The habit to complete".to_string(),
                true,
            ),
            ("note".to_string(), "Optional note".to_string(), false),
        ]);

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["habit_id"]["type"], "string");
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "habit_id");
    }

    #[test]
    fn test_enum_schema() {
        let schema = enum_schema(
            "destination",
            "Agent to hand off to",
            &["pointsCalculator".to_string(), "habitTracker".to_string()],
        );

        assert_eq!(schema["type"], "object");
        assert_eq!(
            schema["properties"]["destination"]["enum"],
            json!(["pointsCalculator", "habitTracker"])
        );
        assert_eq!(schema["required"], json!(["destination"]));
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn test_chat_params_default() {
        let params = ChatParams::default();
        assert_eq!(params.max_tokens, 4096);
        assert_eq!(params.temperature, 0.7);
        assert!(matches!(params.tool_choice, ToolChoice::Auto));
    }
}
