//! Shared test support: scripted provider, toy tools, graph builders

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use wei_agent::{AgentDef, AgentGraph, ToolContext, ToolError, ToolTrait, TurnConfig};
use wei_provider::{ChatParams, ChatResponse, Provider, ProviderError, Result, ToolCall};

/// One scripted provider step.
#[derive(Clone)]
pub enum MockStep {
    Reply(ChatResponse),
    FailTimeout,
}

/// Provider that replays a script and records every request it saw.
pub struct MockProvider {
    steps: Mutex<Vec<MockStep>>,
    repeat_last: bool,
    calls: Mutex<Vec<ChatParams>>,
}

impl MockProvider {
    pub fn scripted(steps: Vec<MockStep>) -> Self {
        Self {
            steps: Mutex::new(steps),
            repeat_last: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replays the same step forever. Used to model an agent loop that
    /// never produces final content.
    pub fn repeating(step: MockStep) -> Self {
        Self {
            steps: Mutex::new(vec![step]),
            repeat_last: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn recorded_calls(&self) -> Vec<ChatParams> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        self.calls.lock().unwrap().push(params);

        let step = {
            let mut steps = self.steps.lock().unwrap();
            if self.repeat_last {
                steps.first().cloned()
            } else if steps.is_empty() {
                None
            } else {
                Some(steps.remove(0))
            }
        };

        match step {
            Some(MockStep::Reply(response)) => Ok(response),
            Some(MockStep::FailTimeout) => {
                Err(ProviderError::Timeout(Duration::from_millis(5)))
            }
            None => Ok(ChatResponse::text("script exhausted")),
        }
    }

    fn default_model(&self) -> String {
        "mock/model".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

pub fn reply(text: &str) -> MockStep {
    MockStep::Reply(ChatResponse::text(text))
}

pub fn calls(tool_calls: Vec<ToolCall>) -> MockStep {
    MockStep::Reply(ChatResponse::calls(tool_calls))
}

pub fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall::new(id, name, arguments)
}

pub fn transfer_call(id: &str, destination: &str) -> ToolCall {
    ToolCall::new(
        id,
        wei_agent::TRANSFER_TOOL_NAME,
        json!({ "destination": destination }).to_string(),
    )
}

/// Tool that echoes its arguments back as the payload.
pub struct EchoTool {
    name: String,
}

impl EchoTool {
    pub fn named(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
        })
    }
}

#[async_trait]
impl ToolTrait for EchoTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Echoes its arguments."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> std::result::Result<String, ToolError> {
        Ok(json!({ "echo": args, "call_id": ctx.call_id }).to_string())
    }
}

/// Tool that always fails at execution time.
pub struct FailingTool;

#[async_trait]
impl ToolTrait for FailingTool {
    fn name(&self) -> &str {
        "always_fails"
    }

    fn description(&self) -> &str {
        "Fails on purpose."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, _ctx: &ToolContext, _args: Value) -> std::result::Result<String, ToolError> {
        Err(ToolError::Execution("deliberate failure".to_string()))
    }
}

/// Tool requiring one string field, for argument-validation tests.
pub struct StrictTool;

#[async_trait]
impl ToolTrait for StrictTool {
    fn name(&self) -> &str {
        "strict_tool"
    }

    fn description(&self) -> &str {
        "Requires a target field."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "target": { "type": "string", "description": "Required field." }
            },
            "required": ["target"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> std::result::Result<String, ToolError> {
        Ok(json!({ "target": args["target"] }).to_string())
    }
}

/// Two agents, `alpha` ⇄ `beta`, with an echo tool each.
pub fn pair_graph() -> AgentGraph {
    let alpha = AgentDef::new("alpha", "First test agent.", "You are alpha.")
        .with_tool(EchoTool::named("alpha_echo"))
        .with_handoffs(["beta"]);
    let beta = AgentDef::new("beta", "Second test agent.", "You are beta.")
        .with_tool(EchoTool::named("beta_echo"))
        .with_handoffs(["alpha"]);
    AgentGraph::build(vec![alpha, beta]).expect("pair graph builds")
}

/// Turn config with sub-millisecond backoff so retry tests stay fast.
pub fn fast_config() -> TurnConfig {
    TurnConfig {
        model: "mock/model".to_string(),
        max_rounds: 8,
        retry_attempts: 2,
        retry_backoff: Duration::from_millis(1),
        ..Default::default()
    }
}
