//! Bundled agent sets
//!
//! Each set is a self-contained handoff graph. Instruction blocks are
//! opaque persona text; the runtime never parses them.

mod greeter;
mod wellbeing;

use std::sync::Arc;

pub use greeter::greeter_agents;
pub use wellbeing::wellbeing_agents;

use wei_scoring::ScoringCaps;
use wei_store::HabitStore;

use crate::graph::AgentDef;

/// The set the CLI starts in when none is named.
pub const DEFAULT_SET: &str = "wellbeing";

pub fn set_names() -> &'static [&'static str] {
    &["wellbeing", "greeter"]
}

/// Agent definitions for a named set, or `None` for an unknown name.
pub fn agent_set(
    name: &str,
    store: Arc<dyn HabitStore>,
    caps: ScoringCaps,
) -> Option<Vec<AgentDef>> {
    match name {
        "wellbeing" => Some(wellbeing_agents(store, caps)),
        "greeter" => Some(greeter_agents(store, caps)),
        _ => None,
    }
}

/// The agent a fresh session of the given set starts with.
pub fn entry_agent(set: &str) -> Option<&'static str> {
    match set {
        "wellbeing" => Some("habitCoach"),
        "greeter" => Some("greeter"),
        _ => None,
    }
}
