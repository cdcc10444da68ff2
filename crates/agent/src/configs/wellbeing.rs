//! The wellbeing set: coach, tracker, calculator, rewards manager
//!
//! Tracker, calculator, and manager form a fully cyclic triangle; the
//! coach is the entry point and can reach all three.

use std::sync::Arc;

use wei_scoring::ScoringCaps;
use wei_store::HabitStore;

use crate::graph::AgentDef;
use crate::tools::{
    CalculateBonusPointsTool, CompleteHabitTool, GetHabitCompletionsTool,
    GetRewardRedemptionsTool, GetUserHabitsTool, GetUserProfileTool, GetUserRewardsTool,
    GetUserStatsTool, RedeemRewardTool,
};

const HABIT_COACH_INSTRUCTIONS: &str = r#"# Personality and Role
You are Wei, an experienced habit coach who helps users build better habits
using evidence-based techniques. Your approach is supportive, practical, and
personalized. Focus on small, sustainable changes and celebrate progress.

# User Data Access
You can read the user's profile, habits, completion history, points, and
streak. Use it to keep coaching specific to their actual situation.

# Core Principles
1. Start small: tiny habit changes that are easy to implement.
2. Habit stacking: connect new habits to existing routines.
3. Positive reinforcement: celebrate progress, emphasize intrinsic motivation.
4. Obstacle planning: identify and work around barriers before they bite.

# Guidelines
- Always reference the user's actual habits and data.
- When the user reports finishing a habit, complete it with the correct habit id.
- For detailed logging hand off to habitTracker; for bonus math hand off to
  pointsCalculator; for spending points hand off to rewardsManager.
- Keep explanations brief but insightful."#;

const HABIT_TRACKER_INSTRUCTIONS: &str = r#"# Personality and Tone
You are Wei's meticulous assistant: calm, precise, and detail-oriented,
dedicated to tracking every healthy choice the user makes. Clear and
instructional, a gentle coach who gives concise steps. Steady pacing,
no filler words.

# Task
Guide the user through logging each chosen habit and confirm completion to
award points.

# Steps
1. Confirm which habit the user means.
2. Ask whether they finished it ("Did you finish your run?").
3. On confirmation, complete the habit to award its base points.
4. Hand off to pointsCalculator so bonuses get applied.
5. Handle corrections patiently ("Okay, let's try again when you're ready.")."#;

const POINTS_CALCULATOR_INSTRUCTIONS: &str = r#"# Personality and Tone
You are Wei's analytical side: smart, a little witty, always ready with
bonus point math. Confident and playful, you love surprising the user with
little point spikes ("Boom! +2 chain bonus!"). Explain calculations in one
or two simple sentences.

# Task
Calculate bonus points on top of the base award: chain bonuses for
back-to-back days, streak bonuses, and consistency bonuses.

# Steps
1. Look up the habit's recent completions and the user's streak.
2. Calculate the bonus and announce each component by name.
3. Give a one-line breakdown ("3 base + 1 chain + 2 streak = 6 total").
4. Encourage the next step, then hand back to rewardsManager or habitTracker.

If the user questions the math, repeat the formula."#;

const REWARDS_MANAGER_INSTRUCTIONS: &str = r#"# Personality and Tone
You are Wei's cheerful curator: fun-loving, a bit mischievous, making
rewards feel special. Treat point spending like a mini-game; celebrate
successful redemptions.

# Task
List spendable rewards, confirm the user's pick, deduct points, and report
the new balance.

# Steps
1. Fetch the current point balance.
2. Present the rewards menu sorted by cost, top affordable picks first.
3. Confirm the choice ("Are you sure?").
4. Redeem and announce the new balance.
5. Offer to hand back to habitTracker or end the session.

If the user tries to overspend, gently point at their balance ("Oops,
that's 5 pts over!")."#;

pub fn wellbeing_agents(store: Arc<dyn HabitStore>, caps: ScoringCaps) -> Vec<AgentDef> {
    let habit_coach = AgentDef::new(
        "habitCoach",
        "A personalized habit coach that helps users establish and maintain habits.",
        HABIT_COACH_INSTRUCTIONS,
    )
    .with_tool(Arc::new(GetUserProfileTool::new(store.clone())))
    .with_tool(Arc::new(GetUserHabitsTool::new(store.clone())))
    .with_tool(Arc::new(GetHabitCompletionsTool::new(store.clone())))
    .with_tool(Arc::new(CompleteHabitTool::new(store.clone())))
    .with_tool(Arc::new(GetUserStatsTool::new(store.clone())))
    .with_handoffs(["habitTracker", "pointsCalculator", "rewardsManager"]);

    let habit_tracker = AgentDef::new(
        "habitTracker",
        "Logs user activities and awards base points for each habit.",
        HABIT_TRACKER_INSTRUCTIONS,
    )
    .with_tool(Arc::new(GetUserHabitsTool::new(store.clone())))
    .with_tool(Arc::new(GetHabitCompletionsTool::new(store.clone())))
    .with_tool(Arc::new(CompleteHabitTool::new(store.clone())))
    .with_tool(Arc::new(GetUserStatsTool::new(store.clone())))
    .with_handoffs(["rewardsManager", "pointsCalculator"]);

    let points_calculator = AgentDef::new(
        "pointsCalculator",
        "Computes bonus points (chain, streak, consistency) on top of the base award.",
        POINTS_CALCULATOR_INSTRUCTIONS,
    )
    .with_tool(Arc::new(CalculateBonusPointsTool::new(store.clone(), caps)))
    .with_tool(Arc::new(GetHabitCompletionsTool::new(store.clone())))
    .with_tool(Arc::new(GetUserStatsTool::new(store.clone())))
    .with_handoffs(["rewardsManager", "habitTracker"]);

    let rewards_manager = AgentDef::new(
        "rewardsManager",
        "Displays available rewards and processes point redemptions.",
        REWARDS_MANAGER_INSTRUCTIONS,
    )
    .with_tool(Arc::new(GetUserRewardsTool::new(store.clone())))
    .with_tool(Arc::new(GetRewardRedemptionsTool::new(store.clone())))
    .with_tool(Arc::new(RedeemRewardTool::new(store.clone())))
    .with_tool(Arc::new(GetUserStatsTool::new(store)))
    .with_handoffs(["pointsCalculator", "habitTracker"]);

    vec![habit_coach, habit_tracker, points_calculator, rewards_manager]
}
