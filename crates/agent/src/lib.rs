//! Agent orchestration runtime for Wei
//!
//! A validated handoff graph of named agents, a per-agent tool registry,
//! and the bounded turn loop that bridges the chat model to local tools.

pub mod configs;
pub mod context;
pub mod graph;
pub mod orchestrator;
pub mod state;
pub mod tools;

pub use context::ContextBuilder;
pub use graph::{Agent, AgentDef, AgentGraph, GraphError, TRANSFER_TOOL_NAME};
pub use orchestrator::{Orchestrator, TurnConfig, TurnError, TurnOutcome};
pub use state::ConversationState;
pub use tools::{ToolContext, ToolError, ToolRegistry, ToolTrait};
