//! Prompt assembly for the active agent

use wei_provider::Message;

use crate::graph::Agent;
use crate::state::ConversationState;

/// Builds the message list sent to the model each round.
pub struct ContextBuilder;

impl ContextBuilder {
    /// System prompt for one agent: identity header plus its
    /// instruction block, verbatim.
    pub fn system_prompt(agent: &Agent) -> String {
        format!(
            "# {}\n\n{}\n\n{}",
            agent.name(),
            agent.public_description(),
            agent.instructions()
        )
    }

    /// Full message list: the active agent's system prompt leads,
    /// followed by the conversation so far.
    pub fn build_messages(agent: &Agent, state: &ConversationState) -> Vec<Message> {
        let mut messages = Vec::with_capacity(state.len() + 1);
        messages.push(Message::system(Self::system_prompt(agent)));
        messages.extend(state.messages().iter().cloned());
        messages
    }
}
