//! Built-in tools over the habit store
//!
//! One tool per data-access operation, schemas mirroring the wire
//! contract the agents were written against. Side-effecting tools pass
//! the tool-call id down as the store's idempotency key.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;
use wei_provider::object_schema;
use wei_scoring::{calculate_bonus, BonusInput, CompletionRecord, ScoringCaps};
use wei_store::HabitStore;

use super::{ToolContext, ToolError, ToolTrait};

fn opt_string(args: &Value, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "{key} must be a string, got {other}"
        ))),
    }
}

fn req_string(args: &Value, key: &str) -> Result<String, ToolError> {
    opt_string(args, key)?
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required field: {key}")))
}

fn opt_days(args: &Value, key: &str) -> Result<Option<i64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            ToolError::InvalidArguments(format!("{key} must be a number, got {value}"))
        }),
    }
}

fn req_points(args: &Value, key: &str) -> Result<u32, ToolError> {
    args.get(key)
        .and_then(|v| v.as_u64())
        .map(|v| v as u32)
        .ok_or_else(|| {
            ToolError::InvalidArguments(format!("{key} must be a non-negative number"))
        })
}

fn render(value: Value) -> Result<String, ToolError> {
    serde_json::to_string(&value).map_err(|e| ToolError::Execution(e.to_string()))
}

/// Read the user's profile, optionally a subset of fields.
pub struct GetUserProfileTool {
    store: Arc<dyn HabitStore>,
}

impl GetUserProfileTool {
    pub fn new(store: Arc<dyn HabitStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolTrait for GetUserProfileTool {
    fn name(&self) -> &str {
        "get_user_profile"
    }

    fn description(&self) -> &str {
        "Get the user's profile information."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fields": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional list of specific profile fields to retrieve."
                }
            },
            "required": []
        })
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let fields = match args.get("fields") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            Some(other) => {
                return Err(ToolError::InvalidArguments(format!(
                    "fields must be an array, got {other}"
                )))
            }
        };

        let profile = self.store.get_user_profile(fields).await?;
        render(profile)
    }
}

/// List the user's habits.
pub struct GetUserHabitsTool {
    store: Arc<dyn HabitStore>,
}

impl GetUserHabitsTool {
    pub fn new(store: Arc<dyn HabitStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolTrait for GetUserHabitsTool {
    fn name(&self) -> &str {
        "get_user_habits"
    }

    fn description(&self) -> &str {
        "Get the list of habits the user has created, optionally filtered by category."
    }

    fn parameters(&self) -> Value {
        object_schema(vec![(
            "category".to_string(),
            "Only return habits in this category.".to_string(),
            false,
        )])
    }

    async fn execute(&self, _ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let category = opt_string(&args, "category")?;
        let habits = self.store.get_user_habits(category).await?;
        render(json!({ "habits": habits }))
    }
}

/// List habit completions over a trailing window.
pub struct GetHabitCompletionsTool {
    store: Arc<dyn HabitStore>,
}

impl GetHabitCompletionsTool {
    pub fn new(store: Arc<dyn HabitStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolTrait for GetHabitCompletionsTool {
    fn name(&self) -> &str {
        "get_habit_completions"
    }

    fn description(&self) -> &str {
        "Get habit completions for the past days, optionally for one habit."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "habit_id": {
                    "type": "string",
                    "description": "Only return completions of this habit."
                },
                "days_ago": {
                    "type": "number",
                    "description": "Window size in days (default 30)."
                }
            },
            "required": []
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let habit_id = opt_string(&args, "habit_id")?;
        let days_ago = opt_days(&args, "days_ago")?;
        let completions = self
            .store
            .get_habit_completions(habit_id, days_ago, ctx.now)
            .await?;
        render(json!({ "completions": completions }))
    }
}

/// Mark a habit complete and award its base points.
pub struct CompleteHabitTool {
    store: Arc<dyn HabitStore>,
}

impl CompleteHabitTool {
    pub fn new(store: Arc<dyn HabitStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolTrait for CompleteHabitTool {
    fn name(&self) -> &str {
        "complete_habit"
    }

    fn description(&self) -> &str {
        "Mark a habit as complete, award points, and return the updated balance."
    }

    fn parameters(&self) -> Value {
        object_schema(vec![(
            "habit_id".to_string(),
            "The ID of the habit to mark as complete.".to_string(),
            true,
        )])
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let habit_id = req_string(&args, "habit_id")?;
        debug!("completing habit {habit_id} (call {})", ctx.call_id);
        let receipt = self
            .store
            .complete_habit(&habit_id, &ctx.call_id, ctx.now)
            .await?;
        render(json!(receipt))
    }
}

/// Points balance and streak.
pub struct GetUserStatsTool {
    store: Arc<dyn HabitStore>,
}

impl GetUserStatsTool {
    pub fn new(store: Arc<dyn HabitStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolTrait for GetUserStatsTool {
    fn name(&self) -> &str {
        "get_user_stats"
    }

    fn description(&self) -> &str {
        "Get the user's current points balance and streak."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, _ctx: &ToolContext, _args: Value) -> Result<String, ToolError> {
        let stats = self.store.get_user_stats().await?;
        render(json!({ "points": stats.points, "streak_days": stats.streak_days }))
    }
}

/// List available rewards.
pub struct GetUserRewardsTool {
    store: Arc<dyn HabitStore>,
}

impl GetUserRewardsTool {
    pub fn new(store: Arc<dyn HabitStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolTrait for GetUserRewardsTool {
    fn name(&self) -> &str {
        "get_user_rewards"
    }

    fn description(&self) -> &str {
        "Get the list of rewards available to the user."
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn execute(&self, _ctx: &ToolContext, _args: Value) -> Result<String, ToolError> {
        let rewards = self.store.get_user_rewards().await?;
        render(json!({ "rewards": rewards }))
    }
}

/// List past reward redemptions.
pub struct GetRewardRedemptionsTool {
    store: Arc<dyn HabitStore>,
}

impl GetRewardRedemptionsTool {
    pub fn new(store: Arc<dyn HabitStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolTrait for GetRewardRedemptionsTool {
    fn name(&self) -> &str {
        "get_reward_redemptions"
    }

    fn description(&self) -> &str {
        "Get the user's past reward redemptions."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "days_ago": {
                    "type": "number",
                    "description": "Window size in days (default 30)."
                }
            },
            "required": []
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let days_ago = opt_days(&args, "days_ago")?;
        let redemptions = self
            .store
            .get_reward_redemptions(days_ago, ctx.now)
            .await?;
        render(json!({ "redemptions": redemptions }))
    }
}

/// Redeem a reward against the points balance.
pub struct RedeemRewardTool {
    store: Arc<dyn HabitStore>,
}

impl RedeemRewardTool {
    pub fn new(store: Arc<dyn HabitStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ToolTrait for RedeemRewardTool {
    fn name(&self) -> &str {
        "redeem_reward"
    }

    fn description(&self) -> &str {
        "Redeem a reward for the user, deducting points from their balance."
    }

    fn parameters(&self) -> Value {
        object_schema(vec![(
            "reward_id".to_string(),
            "The ID of the reward to redeem.".to_string(),
            true,
        )])
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let reward_id = req_string(&args, "reward_id")?;
        debug!("redeeming reward {reward_id} (call {})", ctx.call_id);
        let outcome = self.store.redeem_reward(&reward_id, &ctx.call_id).await?;
        render(json!(outcome))
    }
}

/// Compute bonus points for a habit from its completion history.
pub struct CalculateBonusPointsTool {
    store: Arc<dyn HabitStore>,
    caps: ScoringCaps,
}

impl CalculateBonusPointsTool {
    pub fn new(store: Arc<dyn HabitStore>, caps: ScoringCaps) -> Self {
        Self { store, caps }
    }
}

#[async_trait]
impl ToolTrait for CalculateBonusPointsTool {
    fn name(&self) -> &str {
        "calculate_bonus_points"
    }

    fn description(&self) -> &str {
        "Calculate bonus points for a habit based on chain, streak, and consistency."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "habit_id": {
                    "type": "string",
                    "description": "The habit to calculate bonuses for."
                },
                "base_points": {
                    "type": "number",
                    "description": "The base points awarded for this habit."
                }
            },
            "required": ["habit_id", "base_points"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let habit_id = req_string(&args, "habit_id")?;
        let base_points = req_points(&args, "base_points")?;

        let all = self
            .store
            .get_habit_completions(None, Some(30), ctx.now)
            .await?;
        let stats = self.store.get_user_stats().await?;

        let all_records: Vec<CompletionRecord> = all
            .iter()
            .map(|c| CompletionRecord::new(c.habit_id.clone(), c.completed_at))
            .collect();
        let habit_records: Vec<CompletionRecord> = all_records
            .iter()
            .filter(|r| r.habit_id == habit_id)
            .cloned()
            .collect();

        let breakdown = calculate_bonus(
            &self.caps,
            &BonusInput {
                base_points,
                habit_history: &habit_records,
                all_completions: &all_records,
                streak_days: stats.streak_days,
                now: ctx.now,
            },
        );

        render(json!({
            "base_points": breakdown.base_points,
            "chain_bonus": breakdown.chain_bonus,
            "streak_bonus": breakdown.streak_bonus,
            "consistency_bonus": breakdown.consistency_bonus,
            "total_bonus": breakdown.total_bonus,
            "total_points": breakdown.total_points,
            "explanation": breakdown.explanation(),
        }))
    }
}
