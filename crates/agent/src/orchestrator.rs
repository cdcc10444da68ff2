//! The turn loop
//!
//! One `run_turn` call drives a full user turn: model call, tool
//! dispatch, handoff interception, repeat. The loop is a bounded state
//! machine (AwaitingModel, HandlingTools, then Done or Aborted) rather
//! than open-ended recursion, so a cyclic handoff graph can cost at most
//! `max_rounds` model calls per turn.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use wei_provider::{ChatParams, ChatResponse, Provider, ProviderError, ToolCall, ToolCallDef};

use crate::context::ContextBuilder;
use crate::graph::{Agent, AgentGraph, TRANSFER_TOOL_NAME};
use crate::state::ConversationState;
use crate::tools::{validate_args, ToolContext, ToolRegistry};

/// Tunables for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Model/tool rounds allowed per user turn.
    pub max_rounds: u32,
    /// Retries after a retryable transport failure.
    pub retry_attempts: u32,
    /// Base backoff between retries; grows linearly per attempt.
    pub retry_backoff: Duration,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_tokens: 4096,
            temperature: 0.7,
            max_rounds: 8,
            retry_attempts: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Result of a completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub final_message: String,
    pub state: ConversationState,
    /// The active agent after the turn; may differ from the one the
    /// turn started with.
    pub active_agent: String,
}

/// Reasons a turn aborts instead of completing.
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("model transport failed: {0}")]
    Transport(#[from] ProviderError),

    #[error("turn budget of {0} rounds exhausted")]
    BudgetExceeded(u32),

    #[error("turn cancelled")]
    Cancelled,
}

impl TurnError {
    /// What the user should see. Never a stack trace.
    pub fn user_message(&self) -> &'static str {
        "Sorry, I couldn't finish that request. Please try again."
    }
}

/// Drives turns over a validated agent graph.
pub struct Orchestrator<P: Provider> {
    graph: AgentGraph,
    registry: ToolRegistry,
    provider: Arc<P>,
    config: TurnConfig,
    cancel: CancellationToken,
    fixed_now: Option<DateTime<Utc>>,
}

impl<P: Provider> Orchestrator<P> {
    pub fn new(graph: AgentGraph, provider: P, config: TurnConfig) -> Self {
        let registry = graph.registry();
        Self {
            graph,
            registry,
            provider: Arc::new(provider),
            config,
            cancel: CancellationToken::new(),
            fixed_now: None,
        }
    }

    /// Attach a cancellation token; the loop stops at the next round
    /// boundary once it fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Pin the clock tools observe. Test hook.
    pub fn with_fixed_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn graph(&self) -> &AgentGraph {
        &self.graph
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    /// Run one user turn to completion or abort.
    ///
    /// Every tool call appended to the state gets its result appended in
    /// the same round, so the state handed back is always replayable.
    pub async fn run_turn(
        &self,
        active_agent: &str,
        mut state: ConversationState,
        user_message: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let mut agent = self
            .graph
            .get(active_agent)
            .ok_or_else(|| TurnError::UnknownAgent(active_agent.to_string()))?;

        state.push_user(user_message);

        for round in 1..=self.config.max_rounds {
            // Safe checkpoint: no unresolved calls in flight here.
            if self.cancel.is_cancelled() {
                info!("turn cancelled before round {round}");
                return Err(TurnError::Cancelled);
            }

            debug_assert!(state.pending_tool_calls().is_empty());
            debug!("round {round} as agent {}", agent.name());

            let response = self.call_model(agent, &state).await?;

            if !response.has_tool_calls() {
                let final_message = response
                    .content
                    .unwrap_or_else(|| "Done.".to_string());
                state.push_assistant(final_message.clone());
                return Ok(TurnOutcome {
                    final_message,
                    state,
                    active_agent: agent.name().to_string(),
                });
            }

            agent = self.handle_tools(agent, &mut state, &response).await;
        }

        warn!(
            "turn exhausted its budget of {} rounds",
            self.config.max_rounds
        );
        Err(TurnError::BudgetExceeded(self.config.max_rounds))
    }

    async fn call_model(
        &self,
        agent: &Agent,
        state: &ConversationState,
    ) -> Result<ChatResponse, TurnError> {
        let params = ChatParams {
            model: self.config.model.clone(),
            messages: ContextBuilder::build_messages(agent, state),
            tools: agent.advertised_tools(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            match self.provider.chat(params.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.retry_attempts => {
                    attempt += 1;
                    let backoff = self.config.retry_backoff * attempt;
                    warn!("model call failed ({e}), retry {attempt} in {backoff:?}");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(TurnError::Transport(e)),
            }
        }
    }

    /// Resolve every tool call of one response, in the order the model
    /// emitted them, and append all results. Returns the agent the next
    /// round runs as.
    async fn handle_tools<'a>(
        &'a self,
        agent: &'a Agent,
        state: &mut ConversationState,
        response: &ChatResponse,
    ) -> &'a Agent {
        let call_defs: Vec<ToolCallDef> = response.tool_calls.iter().map(Into::into).collect();
        state.push_assistant_calls(response.content.as_deref(), call_defs);

        let mut next_agent: Option<String> = None;
        for call in &response.tool_calls {
            let payload = if call.name == TRANSFER_TOOL_NAME {
                self.handle_transfer(agent, call, &mut next_agent)
            } else {
                self.dispatch(agent, call).await
            };
            state.push_tool_result(&call.id, &call.name, payload);
        }

        // The switch takes effect only after the whole round's results
        // are appended; dispatch above stayed scoped to the emitter.
        match next_agent.and_then(|name| self.graph.get(&name)) {
            Some(next) => {
                info!("active agent: {} -> {}", agent.name(), next.name());
                next
            }
            None => agent,
        }
    }

    /// The transfer tool is a pure signal: record the requested
    /// destination and acknowledge, or reject without switching.
    fn handle_transfer(
        &self,
        agent: &Agent,
        call: &ToolCall,
        next_agent: &mut Option<String>,
    ) -> String {
        let destination = serde_json::from_str::<Value>(&call.arguments)
            .ok()
            .and_then(|args| args["destination"].as_str().map(str::to_string));

        let Some(destination) = destination else {
            return error_payload(format!(
                "transfer arguments must name a destination, got: {}",
                call.arguments
            ));
        };

        if !agent.can_handoff_to(&destination) {
            warn!(
                "agent {} requested invalid handoff to {destination}",
                agent.name()
            );
            return error_payload(format!(
                "'{destination}' is not a handoff target of agent '{}'",
                agent.name()
            ));
        }

        *next_agent = Some(destination.clone());
        json!({
            "transferred": true,
            "destination": destination,
        })
        .to_string()
    }

    /// Dispatch a regular tool call, scoped to the calling agent. Every
    /// failure mode becomes an error payload the model can react to.
    async fn dispatch(&self, agent: &Agent, call: &ToolCall) -> String {
        let Some(tool) = self.registry.resolve(agent.name(), &call.name) else {
            warn!(
                "agent {} requested unknown tool {}",
                agent.name(),
                call.name
            );
            return error_payload(format!(
                "tool '{}' is not available to agent '{}'",
                call.name,
                agent.name()
            ));
        };

        let args = match serde_json::from_str::<Value>(&call.arguments) {
            Ok(args) => args,
            Err(e) => {
                return error_payload(format!(
                    "invalid arguments for tool '{}': {e} (raw: {})",
                    call.name, call.arguments
                ));
            }
        };

        if let Err(e) = validate_args(&tool.parameters(), &args) {
            return error_payload(format!("invalid arguments for tool '{}': {e}", call.name));
        }

        let ctx = ToolContext::at(&call.id, self.now());
        match tool.execute(&ctx, args).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!("tool {} failed: {e}", call.name);
                error_payload(e.to_string())
            }
        }
    }
}

fn error_payload(message: String) -> String {
    json!({ "error": message }).to_string()
}
