//! In-memory reference store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    within_days, Completion, CompletionReceipt, Habit, HabitStore, Profile, RedeemOutcome,
    Redemption, Result, Reward, Stats, StoreError,
};

/// Remembered outcome of a keyed mutation.
#[derive(Clone)]
enum Applied {
    Completion(CompletionReceipt),
    Redemption(RedeemOutcome),
}

struct Inner {
    profile: Profile,
    habits: Vec<Habit>,
    completions: Vec<Completion>,
    rewards: Vec<Reward>,
    redemptions: Vec<Redemption>,
    points: u32,
    streak_days: u32,
    applied: HashMap<String, Applied>,
}

/// Mutex-guarded in-memory store.
///
/// The single lock makes every read-then-write (balance check before a
/// redemption, duplicate-key check before a completion) atomic.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(profile: Profile) -> Self {
        Self {
            inner: Mutex::new(Inner {
                profile,
                habits: Vec::new(),
                completions: Vec::new(),
                rewards: Vec::new(),
                redemptions: Vec::new(),
                points: 0,
                streak_days: 0,
                applied: HashMap::new(),
            }),
        }
    }

    /// Store seeded with the demo fixtures the CLI runs against.
    pub fn with_demo_data(now: DateTime<Utc>) -> Self {
        let mut store = Self::new(Profile {
            name: "Alex".to_string(),
            timezone: "UTC".to_string(),
            joined_at: now - Duration::days(90),
            focus_areas: vec!["mindfulness".to_string(), "fitness".to_string()],
        });

        {
            let inner = store.inner.get_mut();
            inner.habits = vec![
                Habit {
                    id: "h-meditation".to_string(),
                    name: "10-minute meditation".to_string(),
                    category: "mindfulness".to_string(),
                    base_points: 3,
                },
                Habit {
                    id: "h-run".to_string(),
                    name: "morning run".to_string(),
                    category: "fitness".to_string(),
                    base_points: 5,
                },
                Habit {
                    id: "h-reading".to_string(),
                    name: "read 20 pages".to_string(),
                    category: "learning".to_string(),
                    base_points: 2,
                },
            ];
            inner.rewards = vec![
                Reward {
                    id: "r-coffee".to_string(),
                    name: "fancy coffee break".to_string(),
                    cost: 20,
                },
                Reward {
                    id: "r-movie".to_string(),
                    name: "movie night".to_string(),
                    cost: 50,
                },
                Reward {
                    id: "r-daytrip".to_string(),
                    name: "weekend day trip".to_string(),
                    cost: 120,
                },
            ];
            inner.completions = vec![
                Completion {
                    id: Uuid::new_v4().to_string(),
                    habit_id: "h-meditation".to_string(),
                    completed_at: now - Duration::days(1),
                    points_awarded: 3,
                },
                Completion {
                    id: Uuid::new_v4().to_string(),
                    habit_id: "h-run".to_string(),
                    completed_at: now - Duration::days(2),
                    points_awarded: 5,
                },
            ];
            inner.points = 40;
            inner.streak_days = 6;
        }

        store
    }

    // Builder-style seeding used by tests and the CLI.

    pub async fn add_habit(&self, habit: Habit) {
        self.inner.lock().await.habits.push(habit);
    }

    pub async fn add_completion(&self, completion: Completion) {
        self.inner.lock().await.completions.push(completion);
    }

    pub async fn add_reward(&self, reward: Reward) {
        self.inner.lock().await.rewards.push(reward);
    }

    pub async fn set_points(&self, points: u32) {
        self.inner.lock().await.points = points;
    }

    pub async fn set_streak_days(&self, streak_days: u32) {
        self.inner.lock().await.streak_days = streak_days;
    }

    pub async fn completion_count(&self) -> usize {
        self.inner.lock().await.completions.len()
    }

    pub async fn redemption_count(&self) -> usize {
        self.inner.lock().await.redemptions.len()
    }
}

#[async_trait]
impl HabitStore for MemoryStore {
    async fn get_user_profile(&self, fields: Option<Vec<String>>) -> Result<Value> {
        let inner = self.inner.lock().await;
        let full = serde_json::to_value(&inner.profile).unwrap_or(Value::Null);

        let Some(fields) = fields.filter(|f| !f.is_empty()) else {
            return Ok(full);
        };

        let mut filtered = serde_json::Map::new();
        if let Value::Object(map) = full {
            for field in fields {
                if let Some(value) = map.get(&field) {
                    filtered.insert(field, value.clone());
                }
            }
        }
        Ok(Value::Object(filtered))
    }

    async fn get_user_habits(&self, category: Option<String>) -> Result<Vec<Habit>> {
        let inner = self.inner.lock().await;
        let habits = inner
            .habits
            .iter()
            .filter(|h| category.as_deref().map_or(true, |c| h.category == c))
            .cloned()
            .collect();
        Ok(habits)
    }

    async fn get_habit_completions(
        &self,
        habit_id: Option<String>,
        days_ago: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Completion>> {
        let inner = self.inner.lock().await;
        let window = days_ago.unwrap_or(30);
        let completions = inner
            .completions
            .iter()
            .filter(|c| habit_id.as_deref().map_or(true, |id| c.habit_id == id))
            .filter(|c| within_days(c.completed_at, window, now))
            .cloned()
            .collect();
        Ok(completions)
    }

    async fn complete_habit(
        &self,
        habit_id: &str,
        completion_key: &str,
        now: DateTime<Utc>,
    ) -> Result<CompletionReceipt> {
        let mut inner = self.inner.lock().await;

        if let Some(Applied::Completion(receipt)) = inner.applied.get(completion_key) {
            debug!("replayed completion key {completion_key}, returning original receipt");
            return Ok(receipt.clone());
        }

        let habit = inner
            .habits
            .iter()
            .find(|h| h.id == habit_id)
            .ok_or_else(|| StoreError::UnknownHabit(habit_id.to_string()))?;
        let points_awarded = habit.base_points;

        let completion = Completion {
            id: Uuid::new_v4().to_string(),
            habit_id: habit_id.to_string(),
            completed_at: now,
            points_awarded,
        };
        let receipt = CompletionReceipt {
            completion_id: completion.id.clone(),
            habit_id: habit_id.to_string(),
            points_awarded,
            new_points_total: inner.points + points_awarded,
        };

        inner.completions.push(completion);
        inner.points += points_awarded;
        inner.applied.insert(
            completion_key.to_string(),
            Applied::Completion(receipt.clone()),
        );

        info!("habit {habit_id} completed, +{points_awarded} points");
        Ok(receipt)
    }

    async fn get_user_stats(&self) -> Result<Stats> {
        let inner = self.inner.lock().await;
        Ok(Stats {
            points: inner.points,
            streak_days: inner.streak_days,
        })
    }

    async fn get_user_rewards(&self) -> Result<Vec<Reward>> {
        Ok(self.inner.lock().await.rewards.clone())
    }

    async fn get_reward_redemptions(
        &self,
        days_ago: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Redemption>> {
        let inner = self.inner.lock().await;
        let window = days_ago.unwrap_or(30);
        let redemptions = inner
            .redemptions
            .iter()
            .filter(|r| within_days(r.redeemed_at, window, now))
            .cloned()
            .collect();
        Ok(redemptions)
    }

    async fn redeem_reward(&self, reward_id: &str, redemption_key: &str) -> Result<RedeemOutcome> {
        let mut inner = self.inner.lock().await;

        if let Some(Applied::Redemption(outcome)) = inner.applied.get(redemption_key) {
            debug!("replayed redemption key {redemption_key}, returning original outcome");
            return Ok(outcome.clone());
        }

        let reward = inner
            .rewards
            .iter()
            .find(|r| r.id == reward_id)
            .ok_or_else(|| StoreError::UnknownReward(reward_id.to_string()))?;
        let cost = reward.cost;

        let outcome = if inner.points < cost {
            RedeemOutcome::rejected(format!(
                "insufficient balance: reward costs {cost}, you have {}",
                inner.points
            ))
        } else {
            inner.points -= cost;
            inner.redemptions.push(Redemption {
                id: Uuid::new_v4().to_string(),
                reward_id: reward_id.to_string(),
                cost,
                redeemed_at: Utc::now(),
            });
            info!("reward {reward_id} redeemed for {cost} points");
            RedeemOutcome::redeemed(inner.points)
        };

        inner.applied.insert(
            redemption_key.to_string(),
            Applied::Redemption(outcome.clone()),
        );
        Ok(outcome)
    }
}
