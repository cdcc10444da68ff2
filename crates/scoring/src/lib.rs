//! Bonus point scoring for habit completions
//!
//! Pure computation: the same input always produces the same breakdown.
//! "Now" is supplied by the caller, never read from the wall clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Upper bounds for each bonus component.
///
/// Caps keep duplicate or backfilled completion records from inflating
/// totals without bound. Defaults follow the strict variant of the
/// formula; they can be overridden from configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringCaps {
    pub chain: u32,
    pub streak: u32,
    pub consistency: u32,
}

impl Default for ScoringCaps {
    fn default() -> Self {
        Self {
            chain: 3,
            streak: 5,
            consistency: 2,
        }
    }
}

/// A single habit completion, as far as scoring cares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub habit_id: String,
    pub completed_at: DateTime<Utc>,
}

impl CompletionRecord {
    pub fn new(habit_id: impl Into<String>, completed_at: DateTime<Utc>) -> Self {
        Self {
            habit_id: habit_id.into(),
            completed_at,
        }
    }
}

/// Everything the engine needs to score one completion.
#[derive(Debug, Clone)]
pub struct BonusInput<'a> {
    /// Base points awarded for the habit being scored.
    pub base_points: u32,
    /// Completion history for the habit being scored, any order.
    pub habit_history: &'a [CompletionRecord],
    /// Completion history across all habits, used for the consistency bonus.
    pub all_completions: &'a [CompletionRecord],
    /// The user's overall streak in days.
    pub streak_days: u32,
    /// The caller's notion of "now".
    pub now: DateTime<Utc>,
}

/// Itemized result of a bonus calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusBreakdown {
    pub base_points: u32,
    pub chain_bonus: u32,
    pub streak_bonus: u32,
    pub consistency_bonus: u32,
    pub total_bonus: u32,
    pub total_points: u32,
}

impl BonusBreakdown {
    /// One-line summary in the form the agents read back to the user.
    pub fn explanation(&self) -> String {
        format!(
            "{} base + {} chain + {} streak + {} consistency = {} total",
            self.base_points,
            self.chain_bonus,
            self.streak_bonus,
            self.consistency_bonus,
            self.total_points
        )
    }
}

/// Compute the bonus breakdown for one habit completion.
///
/// Chain bonus: awarded only when the habit was also completed the day
/// before its most recent completion, then scales with history length.
/// Streak bonus: saturating function of the overall streak. Consistency
/// bonus: counts completions across all habits in the trailing seven days.
pub fn calculate_bonus(caps: &ScoringCaps, input: &BonusInput<'_>) -> BonusBreakdown {
    let chain_bonus = chain_bonus(caps, input.habit_history);
    let streak_bonus = caps.streak.min(input.streak_days / 3);
    let consistency_bonus = consistency_bonus(caps, input.all_completions, input.now);

    let total_bonus = chain_bonus + streak_bonus + consistency_bonus;
    BonusBreakdown {
        base_points: input.base_points,
        chain_bonus,
        streak_bonus,
        consistency_bonus,
        total_bonus,
        total_points: input.base_points + total_bonus,
    }
}

fn chain_bonus(caps: &ScoringCaps, history: &[CompletionRecord]) -> u32 {
    let Some(latest) = history.iter().map(|c| c.completed_at).max() else {
        return 0;
    };

    let day_before = latest.date_naive() - Duration::days(1);
    let completed_day_before = history
        .iter()
        .any(|c| c.completed_at.date_naive() == day_before);
    if !completed_day_before {
        return 0;
    }

    caps.chain.min(history.len() as u32 / 2)
}

fn consistency_bonus(caps: &ScoringCaps, all: &[CompletionRecord], now: DateTime<Utc>) -> u32 {
    let today = now.date_naive();
    let recent = all
        .iter()
        .filter(|c| {
            let days = (today - c.completed_at.date_naive()).num_days();
            (0..7).contains(&days)
        })
        .count() as u32;

    caps.consistency.min(recent / 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
    }

    fn history(days: &[(i32, u32, u32)]) -> Vec<CompletionRecord> {
        days.iter()
            .map(|&(y, m, d)| CompletionRecord::new("meditation", at(y, m, d)))
            .collect()
    }

    #[test]
    fn test_no_history_no_chain() {
        let caps = ScoringCaps::default();
        let habit = history(&[]);
        let breakdown = calculate_bonus(
            &caps,
            &BonusInput {
                base_points: 3,
                habit_history: &habit,
                all_completions: &habit,
                streak_days: 0,
                now: at(2025, 3, 10),
            },
        );

        assert_eq!(breakdown.chain_bonus, 0);
        assert_eq!(breakdown.total_points, 3);
    }

    #[test]
    fn test_chain_requires_yesterday_adjacency() {
        let caps = ScoringCaps::default();
        // Latest on the 10th, but nothing on the 9th: volume alone earns no chain.
        let habit = history(&[(2025, 3, 10), (2025, 3, 7), (2025, 3, 5), (2025, 3, 3)]);
        let breakdown = calculate_bonus(
            &caps,
            &BonusInput {
                base_points: 3,
                habit_history: &habit,
                all_completions: &habit,
                streak_days: 0,
                now: at(2025, 3, 10),
            },
        );

        assert_eq!(breakdown.chain_bonus, 0);
    }

    #[test]
    fn test_spec_worked_example() {
        // B=3, completions yesterday and today, S=6:
        // chain = min(3, 2/2) = 1, streak = min(5, 6/3) = 2.
        let caps = ScoringCaps::default();
        let habit = history(&[(2025, 3, 10), (2025, 3, 9)]);
        let breakdown = calculate_bonus(
            &caps,
            &BonusInput {
                base_points: 3,
                habit_history: &habit,
                all_completions: &habit,
                streak_days: 6,
                now: at(2025, 3, 10),
            },
        );

        assert_eq!(breakdown.chain_bonus, 1);
        assert_eq!(breakdown.streak_bonus, 2);
        // Two completions in the trailing week: 2/3 = 0.
        assert_eq!(breakdown.consistency_bonus, 0);
        assert_eq!(breakdown.total_points, 3 + 1 + 2);
    }

    #[test]
    fn test_chain_cap_saturates() {
        let caps = ScoringCaps::default();
        // Ten completions ending with an adjacent pair: 10/2 = 5, capped at 3.
        let habit = history(&[
            (2025, 3, 10),
            (2025, 3, 9),
            (2025, 3, 8),
            (2025, 3, 7),
            (2025, 3, 6),
            (2025, 3, 5),
            (2025, 3, 4),
            (2025, 3, 3),
            (2025, 3, 2),
            (2025, 3, 1),
        ]);
        let breakdown = calculate_bonus(
            &caps,
            &BonusInput {
                base_points: 5,
                habit_history: &habit,
                all_completions: &habit,
                streak_days: 0,
                now: at(2025, 3, 10),
            },
        );

        assert_eq!(breakdown.chain_bonus, 3);
    }

    #[test]
    fn test_streak_cap_saturates() {
        let caps = ScoringCaps::default();
        let habit = history(&[]);
        let breakdown = calculate_bonus(
            &caps,
            &BonusInput {
                base_points: 1,
                habit_history: &habit,
                all_completions: &habit,
                streak_days: 365,
                now: at(2025, 3, 10),
            },
        );

        assert_eq!(breakdown.streak_bonus, 5);
    }

    #[test]
    fn test_consistency_counts_all_habits_in_trailing_week() {
        let caps = ScoringCaps::default();
        let habit = history(&[(2025, 3, 10)]);
        let mut all = habit.clone();
        for day in 4..10 {
            all.push(CompletionRecord::new("running", at(2025, 3, day)));
        }
        // Outside the window; must not count.
        all.push(CompletionRecord::new("reading", at(2025, 2, 20)));

        let breakdown = calculate_bonus(
            &caps,
            &BonusInput {
                base_points: 3,
                habit_history: &habit,
                all_completions: &all,
                streak_days: 0,
                now: at(2025, 3, 10),
            },
        );

        // Seven completions in the window: min(2, 7/3) = 2.
        assert_eq!(breakdown.consistency_bonus, 2);
    }

    #[test]
    fn test_future_completions_do_not_count_toward_consistency() {
        let caps = ScoringCaps::default();
        let habit = history(&[]);
        let all: Vec<CompletionRecord> = (11..20)
            .map(|day| CompletionRecord::new("running", at(2025, 3, day)))
            .collect();

        let breakdown = calculate_bonus(
            &caps,
            &BonusInput {
                base_points: 2,
                habit_history: &habit,
                all_completions: &all,
                streak_days: 0,
                now: at(2025, 3, 10),
            },
        );

        assert_eq!(breakdown.consistency_bonus, 0);
    }

    #[test]
    fn test_total_never_below_base_and_components_capped() {
        let caps = ScoringCaps::default();
        let habit = history(&[
            (2025, 3, 10),
            (2025, 3, 10),
            (2025, 3, 9),
            (2025, 3, 9),
            (2025, 3, 8),
            (2025, 3, 8),
            (2025, 3, 7),
            (2025, 3, 7),
        ]);
        let breakdown = calculate_bonus(
            &caps,
            &BonusInput {
                base_points: 4,
                habit_history: &habit,
                all_completions: &habit,
                streak_days: 99,
                now: at(2025, 3, 10),
            },
        );

        assert!(breakdown.total_points >= breakdown.base_points);
        assert!(breakdown.chain_bonus <= caps.chain);
        assert!(breakdown.streak_bonus <= caps.streak);
        assert!(breakdown.consistency_bonus <= caps.consistency);
    }

    #[test]
    fn test_custom_caps() {
        let caps = ScoringCaps {
            chain: 1,
            streak: 2,
            consistency: 1,
        };
        let habit = history(&[
            (2025, 3, 10),
            (2025, 3, 9),
            (2025, 3, 8),
            (2025, 3, 7),
            (2025, 3, 6),
            (2025, 3, 5),
        ]);
        let breakdown = calculate_bonus(
            &caps,
            &BonusInput {
                base_points: 3,
                habit_history: &habit,
                all_completions: &habit,
                streak_days: 30,
                now: at(2025, 3, 10),
            },
        );

        assert_eq!(breakdown.chain_bonus, 1);
        assert_eq!(breakdown.streak_bonus, 2);
        assert_eq!(breakdown.consistency_bonus, 1);
    }

    #[test]
    fn test_same_input_same_output() {
        let caps = ScoringCaps::default();
        let habit = history(&[(2025, 3, 10), (2025, 3, 9), (2025, 3, 8)]);
        let input = BonusInput {
            base_points: 3,
            habit_history: &habit,
            all_completions: &habit,
            streak_days: 6,
            now: at(2025, 3, 10),
        };

        let first = calculate_bonus(&caps, &input);
        for _ in 0..10 {
            assert_eq!(calculate_bonus(&caps, &input), first);
        }
    }

    #[test]
    fn test_explanation_format() {
        let breakdown = BonusBreakdown {
            base_points: 3,
            chain_bonus: 1,
            streak_bonus: 2,
            consistency_bonus: 0,
            total_bonus: 3,
            total_points: 6,
        };
        assert_eq!(
            breakdown.explanation(),
            "3 base + 1 chain + 2 streak + 0 consistency = 6 total"
        );
    }
}
