//! Conversation state owned by a single turn
//!
//! The orchestrator takes the state by value and hands it back in the
//! outcome; whoever drives the turn loop owns persistence in between.

use serde::{Deserialize, Serialize};
use wei_provider::{Message, ToolCallDef};

/// Ordered message history for one conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    pub fn push_assistant_calls(&mut self, content: Option<&str>, calls: Vec<ToolCallDef>) {
        self.messages.push(Message::assistant_with_calls(content, calls));
    }

    pub fn push_tool_result(
        &mut self,
        call_id: impl Into<String>,
        name: impl Into<String>,
        payload: impl Into<String>,
    ) {
        self.messages.push(Message::tool(call_id, name, payload));
    }

    /// Ids of tool calls that have no matching result yet.
    ///
    /// The turn loop must drain this to empty before every model call.
    pub fn pending_tool_calls(&self) -> Vec<String> {
        let mut pending = Vec::new();
        for message in &self.messages {
            if let Some(calls) = &message.tool_calls {
                pending.extend(calls.iter().map(|c| c.id.clone()));
            }
            if let Some(answered) = &message.tool_call_id {
                pending.retain(|id| id != answered);
            }
        }
        pending
    }

    /// Drop oldest messages until at most `max_messages` remain, cutting
    /// only at user-message boundaries so a tool call is never separated
    /// from its result.
    ///
    /// Returns the number of messages removed.
    pub fn trim_to_recent_turns(&mut self, max_messages: usize) -> usize {
        if self.messages.len() <= max_messages {
            return 0;
        }

        let len = self.messages.len();
        let mut cut = None;
        for (i, message) in self.messages.iter().enumerate() {
            if message.role == "user" && len - i <= max_messages {
                cut = Some(i);
                break;
            }
        }

        // No boundary fits the budget: keep just the last turn.
        let cut = cut
            .or_else(|| self.messages.iter().rposition(|m| m.role == "user"))
            .unwrap_or(0);

        self.messages.drain(0..cut);
        cut
    }
}
