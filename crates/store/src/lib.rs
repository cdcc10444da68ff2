//! User data access for habits, points, and rewards
//!
//! `HabitStore` is the narrow surface the agent tools bind to. The actual
//! persistence backend is a deployment concern; this crate ships an
//! in-memory reference implementation used by the CLI and the tests.
//! Side-effecting operations take the caller's call identifier as an
//! idempotency key, so replaying a tool call never duplicates the effect.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// Store access errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unknown habit: {0}")]
    UnknownHabit(String),

    #[error("unknown reward: {0}")]
    UnknownReward(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// User profile record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub timezone: String,
    pub joined_at: DateTime<Utc>,
    pub focus_areas: Vec<String>,
}

/// A habit the user is building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub category: String,
    pub base_points: u32,
}

/// One logged completion of a habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub id: String,
    pub habit_id: String,
    pub completed_at: DateTime<Utc>,
    pub points_awarded: u32,
}

/// A reward points can be spent on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub name: String,
    pub cost: u32,
}

/// A past reward redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redemption {
    pub id: String,
    pub reward_id: String,
    pub cost: u32,
    pub redeemed_at: DateTime<Utc>,
}

/// Points balance and streak.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Stats {
    pub points: u32,
    pub streak_days: u32,
}

/// Receipt for a completed habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReceipt {
    pub completion_id: String,
    pub habit_id: String,
    pub points_awarded: u32,
    pub new_points_total: u32,
}

/// Outcome of a redemption attempt.
///
/// Insufficient balance is a normal outcome, not an error: the agent
/// reads it back to the user conversationally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_points_total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RedeemOutcome {
    pub fn redeemed(new_points_total: u32) -> Self {
        Self {
            success: true,
            new_points_total: Some(new_points_total),
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            new_points_total: None,
            reason: Some(reason.into()),
        }
    }
}

/// Filter completions/redemptions to a trailing window of days.
pub(crate) fn within_days(ts: DateTime<Utc>, days_ago: i64, now: DateTime<Utc>) -> bool {
    ts <= now && ts >= now - Duration::days(days_ago)
}

/// The data surface the built-in agent tools bind to.
#[async_trait]
pub trait HabitStore: Send + Sync {
    /// Profile record, optionally filtered to the named fields.
    async fn get_user_profile(&self, fields: Option<Vec<String>>) -> Result<Value>;

    /// Habits, optionally filtered by category.
    async fn get_user_habits(&self, category: Option<String>) -> Result<Vec<Habit>>;

    /// Completions, optionally for a single habit, within a trailing window.
    async fn get_habit_completions(
        &self,
        habit_id: Option<String>,
        days_ago: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Completion>>;

    /// Log a completion and award its base points.
    ///
    /// `completion_key` makes the operation idempotent: replaying the same
    /// key returns the original receipt without logging twice.
    async fn complete_habit(
        &self,
        habit_id: &str,
        completion_key: &str,
        now: DateTime<Utc>,
    ) -> Result<CompletionReceipt>;

    async fn get_user_stats(&self) -> Result<Stats>;

    async fn get_user_rewards(&self) -> Result<Vec<Reward>>;

    /// Past redemptions within a trailing window.
    async fn get_reward_redemptions(
        &self,
        days_ago: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Redemption>>;

    /// Redeem a reward, atomically verifying the balance first.
    ///
    /// Idempotent per `redemption_key`, like [`complete_habit`].
    ///
    /// [`complete_habit`]: HabitStore::complete_habit
    async fn redeem_reward(&self, reward_id: &str, redemption_key: &str) -> Result<RedeemOutcome>;
}
