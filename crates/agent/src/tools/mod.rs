//! Tool trait and the per-agent registry

pub mod data;

pub use data::{
    CalculateBonusPointsTool, CompleteHabitTool, GetHabitCompletionsTool,
    GetRewardRedemptionsTool, GetUserHabitsTool, GetUserProfileTool, GetUserRewardsTool,
    GetUserStatsTool, RedeemRewardTool,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use wei_provider::Tool;

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Store(#[from] wei_store::StoreError),

    #[error("{0}")]
    Execution(String),
}

/// Per-invocation context handed to every tool.
///
/// `call_id` doubles as the idempotency key for side-effecting tools;
/// `now` keeps time-dependent tools off the wall clock in tests.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub call_id: String,
    pub now: DateTime<Utc>,
}

impl ToolContext {
    pub fn new(call_id: impl Into<String>) -> Self {
        Self::at(call_id, Utc::now())
    }

    pub fn at(call_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            call_id: call_id.into(),
            now,
        }
    }
}

/// A callable capability advertised to the model.
#[async_trait]
pub trait ToolTrait: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON-schema object describing the parameters.
    fn parameters(&self) -> Value;
    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError>;
}

pub fn to_provider_tool(tool: &dyn ToolTrait) -> Tool {
    Tool::new(tool.name(), tool.description(), tool.parameters())
}

/// Check parsed arguments against a tool's schema.
///
/// Arguments must be an object carrying every `required` field. Anything
/// finer-grained (types, enums) is left to the tool itself.
pub fn validate_args(schema: &Value, args: &Value) -> Result<(), ToolError> {
    let Some(obj) = args.as_object() else {
        return Err(ToolError::InvalidArguments(
            "arguments must be a JSON object".to_string(),
        ));
    };

    if let Some(required) = schema["required"].as_array() {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !obj.contains_key(field) {
                return Err(ToolError::InvalidArguments(format!(
                    "missing required field: {field}"
                )));
            }
        }
    }

    Ok(())
}

/// Registry of tools keyed by `(agent name, tool name)`.
///
/// Resolution never crosses agents: a tool registered for one agent is
/// invisible to every other, which keeps one persona from borrowing
/// another's capabilities.
pub struct ToolRegistry {
    tools: HashMap<String, HashMap<String, Arc<dyn ToolTrait>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, agent: &str, tool: Arc<dyn ToolTrait>) {
        self.tools
            .entry(agent.to_string())
            .or_default()
            .insert(tool.name().to_string(), tool);
    }

    /// Resolve a tool for the given agent, or `None` when the agent does
    /// not expose it (even if another agent does).
    pub fn resolve(&self, agent: &str, name: &str) -> Option<Arc<dyn ToolTrait>> {
        self.tools.get(agent).and_then(|t| t.get(name)).cloned()
    }

    pub fn has(&self, agent: &str, name: &str) -> bool {
        self.resolve(agent, name).is_some()
    }

    pub fn names(&self, agent: &str) -> Vec<String> {
        self.tools
            .get(agent)
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
