//! Achievement catalogue and evaluation engine.
//!
//! The catalogue is static configuration; per-user earned state is the only
//! thing persisted. Earned is write-once: evaluation never un-marks an
//! achievement, so every rule must be monotone over append-only history
//! (more events can only turn a rule true, never false). That obligation
//! sits with the rule author and is pinned by tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AcademyError;
use crate::ledger::{XpEvent, XpReason};
use crate::progress::{ProgressRecord, TutorialCompletion};
use crate::storage::{self, StorageAdapter, ACHIEVEMENTS_KEY};
use crate::{leveling, streaks};

/// Declarative unlock condition. Every variant is an "at least" form, so
/// growth of the underlying history keeps satisfied rules satisfied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AchievementRule {
    TotalXpAtLeast(u64),
    LevelAtLeast(u32),
    EventsAtLeast {
        reason: Option<XpReason>,
        count: usize,
    },
    StepsCompletedAtLeast(usize),
    PathCompleted {
        path_type: &'static str,
        total_steps: usize,
    },
    TutorialsCompletedAtLeast(usize),
    StreakAtLeast(u32),
}

/// Catalogue entry.
#[derive(Debug, Clone)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub rule: AchievementRule,
}

impl AchievementDef {
    const fn new(
        id: &'static str,
        title: &'static str,
        description: &'static str,
        rule: AchievementRule,
    ) -> Self {
        Self {
            id,
            title,
            description,
            rule,
        }
    }
}

/// All achievements. Static, loaded at startup, never mutated.
pub fn catalogue() -> Vec<AchievementDef> {
    use AchievementRule::*;
    vec![
        // Firsts
        AchievementDef::new(
            "first_lesson",
            "First Steps",
            "Complete your first lesson",
            EventsAtLeast { reason: Some(XpReason::LessonCompleted), count: 1 },
        ),
        AchievementDef::new(
            "first_quiz",
            "Quiz Taker",
            "Finish your first quiz",
            EventsAtLeast { reason: Some(XpReason::QuizCompleted), count: 1 },
        ),
        AchievementDef::new(
            "first_tutorial",
            "Hands On",
            "Complete your first tutorial",
            TutorialsCompletedAtLeast(1),
        ),
        // Volume
        AchievementDef::new(
            "five_lessons",
            "Dedicated Learner",
            "Complete 5 lessons",
            EventsAtLeast { reason: Some(XpReason::LessonCompleted), count: 5 },
        ),
        AchievementDef::new(
            "ten_steps",
            "Path Walker",
            "Complete 10 path steps",
            StepsCompletedAtLeast(10),
        ),
        AchievementDef::new(
            "five_tutorials",
            "Workshop Regular",
            "Complete 5 tutorials",
            TutorialsCompletedAtLeast(5),
        ),
        // Paths
        AchievementDef::new(
            "beginner_graduate",
            "Beginner Graduate",
            "Finish every step of the beginner path",
            PathCompleted { path_type: "beginner", total_steps: 5 },
        ),
        // XP and levels
        AchievementDef::new(
            "century",
            "Century Club",
            "Earn 100 total XP",
            TotalXpAtLeast(100),
        ),
        AchievementDef::new(
            "xp_1000",
            "XP Collector",
            "Earn 1,000 total XP",
            TotalXpAtLeast(1000),
        ),
        AchievementDef::new(
            "level_3",
            "Context Explorer",
            "Reach level 3",
            LevelAtLeast(3),
        ),
        AchievementDef::new(
            "level_5",
            "Server Wrangler",
            "Reach level 5",
            LevelAtLeast(5),
        ),
        // Streaks
        AchievementDef::new(
            "streak_3",
            "On a Roll",
            "Learn 3 days in a row",
            StreakAtLeast(3),
        ),
        AchievementDef::new(
            "streak_7",
            "Week Warrior",
            "Learn 7 days in a row",
            StreakAtLeast(7),
        ),
    ]
}

/// Read-only view of one user's recorded history, the input to rule
/// evaluation. Derived figures are computed once at snapshot time.
#[derive(Debug, Clone)]
pub struct UserSnapshot {
    pub events: Vec<XpEvent>,
    pub progress: Vec<ProgressRecord>,
    pub tutorials: Vec<TutorialCompletion>,
    pub total_xp: u64,
    pub level: u32,
    pub best_streak: u32,
}

impl UserSnapshot {
    pub fn build(
        events: Vec<XpEvent>,
        progress: Vec<ProgressRecord>,
        tutorials: Vec<TutorialCompletion>,
        now: DateTime<Utc>,
    ) -> Self {
        let total_xp: u64 = events.iter().map(|e| e.amount as u64).sum();
        let level = leveling::level_for_xp(total_xp);
        let timestamps: Vec<DateTime<Utc>> = events.iter().map(|e| e.timestamp).collect();
        let best_streak = streaks::calculate(&timestamps, now).best_streak;
        Self {
            events,
            progress,
            tutorials,
            total_xp,
            level,
            best_streak,
        }
    }
}

/// Whether the rule holds for the snapshot.
fn rule_satisfied(rule: &AchievementRule, snapshot: &UserSnapshot) -> bool {
    match *rule {
        AchievementRule::TotalXpAtLeast(xp) => snapshot.total_xp >= xp,
        AchievementRule::LevelAtLeast(level) => snapshot.level >= level,
        AchievementRule::EventsAtLeast { reason, count } => {
            snapshot
                .events
                .iter()
                .filter(|e| reason.map_or(true, |r| e.reason == r))
                .count()
                >= count
        }
        AchievementRule::StepsCompletedAtLeast(count) => {
            snapshot.progress.iter().filter(|r| r.completed).count() >= count
        }
        AchievementRule::PathCompleted {
            path_type,
            total_steps,
        } => {
            snapshot
                .progress
                .iter()
                .filter(|r| r.path_type == path_type && r.completed)
                .count()
                >= total_steps
        }
        AchievementRule::TutorialsCompletedAtLeast(count) => snapshot.tutorials.len() >= count,
        AchievementRule::StreakAtLeast(days) => snapshot.best_streak >= days,
    }
}

/// Persisted earned marker. Only earned achievements are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EarnedAchievement {
    achievement_id: String,
    earned_at: DateTime<Utc>,
}

/// Per-user status of one catalogue achievement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementStatus {
    pub achievement_id: String,
    pub earned: bool,
    pub earned_at: Option<DateTime<Utc>>,
}

/// Result of one evaluation pass.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Status for every catalogue achievement, earned or not.
    pub statuses: Vec<AchievementStatus>,
    /// The subset that flipped to earned in this pass, for notifications.
    pub newly_earned: Vec<AchievementStatus>,
}

/// Evaluates the catalogue against user snapshots and persists earned
/// markers.
pub struct AchievementEngine {
    store: Arc<dyn StorageAdapter>,
}

impl AchievementEngine {
    pub fn new(store: Arc<dyn StorageAdapter>) -> Self {
        Self { store }
    }

    /// Evaluate all not-yet-earned achievements against the snapshot.
    /// Idempotent and safe after every event; earned markers are never
    /// removed even if the rule would no longer hold in isolation.
    pub fn evaluate(
        &self,
        user_id: &str,
        snapshot: &UserSnapshot,
    ) -> Result<Evaluation, AcademyError> {
        let key = storage::user_key(user_id, ACHIEVEMENTS_KEY);
        let mut earned: Vec<EarnedAchievement> =
            storage::load_records(self.store.as_ref(), &key)?;

        let mut newly_earned = Vec::new();
        for def in catalogue() {
            let already = earned.iter().any(|e| e.achievement_id == def.id);
            if !already && rule_satisfied(&def.rule, snapshot) {
                let marker = EarnedAchievement {
                    achievement_id: def.id.to_string(),
                    earned_at: Utc::now(),
                };
                tracing::info!(user = user_id, achievement = def.id, "achievement earned");
                newly_earned.push(AchievementStatus {
                    achievement_id: marker.achievement_id.clone(),
                    earned: true,
                    earned_at: Some(marker.earned_at),
                });
                earned.push(marker);
            }
        }

        if !newly_earned.is_empty() {
            storage::save_records(self.store.as_ref(), &key, &earned)?;
        }

        let statuses = catalogue()
            .iter()
            .map(|def| {
                match earned.iter().find(|e| e.achievement_id == def.id) {
                    Some(marker) => AchievementStatus {
                        achievement_id: def.id.to_string(),
                        earned: true,
                        earned_at: Some(marker.earned_at),
                    },
                    None => AchievementStatus {
                        achievement_id: def.id.to_string(),
                        earned: false,
                        earned_at: None,
                    },
                }
            })
            .collect();

        Ok(Evaluation {
            statuses,
            newly_earned,
        })
    }

    /// Current statuses without re-evaluating any rule.
    pub fn statuses(&self, user_id: &str) -> Result<Vec<AchievementStatus>, AcademyError> {
        let key = storage::user_key(user_id, ACHIEVEMENTS_KEY);
        let earned: Vec<EarnedAchievement> = storage::load_records(self.store.as_ref(), &key)?;
        Ok(catalogue()
            .iter()
            .map(|def| {
                match earned.iter().find(|e| e.achievement_id == def.id) {
                    Some(marker) => AchievementStatus {
                        achievement_id: def.id.to_string(),
                        earned: true,
                        earned_at: Some(marker.earned_at),
                    },
                    None => AchievementStatus {
                        achievement_id: def.id.to_string(),
                        earned: false,
                        earned_at: None,
                    },
                }
            })
            .collect())
    }
}
