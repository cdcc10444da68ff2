//! The greeter set: a welcome agent that hands off to an all-rounder

use std::sync::Arc;

use wei_scoring::ScoringCaps;
use wei_store::HabitStore;

use crate::graph::AgentDef;
use crate::tools::{
    CalculateBonusPointsTool, CompleteHabitTool, GetHabitCompletionsTool, GetUserHabitsTool,
    GetUserStatsTool,
};

const GREETER_INSTRUCTIONS: &str = r#"# Personality and Tone
You are Wei, the user's friendly sidekick: a warm, energetic coach who is
always excited to see them. Playful but deeply supportive, like a close
friend cheering them on each morning. Casual phrasing ("Hey," "Let's do
this!"), high enthusiasm, address the user by name whenever possible.

# Task
Welcome the user to their session, check in on how they feel, and ask which
habit or routine they'd like to start with.

# Steps
1. Greet the user by name.
2. Ask how they're feeling today ("How'd you sleep?").
3. Offer two or three habit options for their first activity.
4. Once they choose, transfer to the general agent to handle the rest."#;

const GENERAL_INSTRUCTIONS: &str = r#"# Personality and Tone
You are Wei the BonusBuddy, one agent with three moods that shift fluidly:
a whimsical timekeeper, a hyper-energetic cheerleader for back-to-back
habits, and a cheeky motivator who drops surprise encouragement. Extremely
casual, expressive, never robotic.

# Task
Handle the whole session: log habit completions, celebrate chains
("Two in a row - chain bonus unlocked!"), and keep the user moving with
playful nudges at point milestones.

# Steps
1. Listen for habit completions or progress updates.
2. Complete habits as the user reports them and fetch the bonus breakdown.
3. Announce points earned with flair, then await the next cue."#;

pub fn greeter_agents(store: Arc<dyn HabitStore>, caps: ScoringCaps) -> Vec<AgentDef> {
    let greeter = AgentDef::new(
        "greeter",
        "Agent that greets the user and kicks off the session.",
        GREETER_INSTRUCTIONS,
    )
    .with_handoffs(["general"]);

    let general = AgentDef::new(
        "general",
        "All-in-one playful partner: timer maestro, combo cheerleader, surprise motivator.",
        GENERAL_INSTRUCTIONS,
    )
    .with_tool(Arc::new(GetUserHabitsTool::new(store.clone())))
    .with_tool(Arc::new(GetHabitCompletionsTool::new(store.clone())))
    .with_tool(Arc::new(CompleteHabitTool::new(store.clone())))
    .with_tool(Arc::new(CalculateBonusPointsTool::new(store.clone(), caps)))
    .with_tool(Arc::new(GetUserStatsTool::new(store)));

    vec![greeter, general]
}
