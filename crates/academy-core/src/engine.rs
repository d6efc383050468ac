//! Engine facade: services wired over one storage adapter, plus the
//! award-XP cascade.
//!
//! Every XP grant runs the same sequence: record the event, derive the
//! level before and after, emit at most one level-up signal on a crossing,
//! then re-evaluate achievements against the post-grant snapshot. The
//! cascade is not transactional; a failure after the grant loses at worst
//! a notification, never recorded state. Completion flows commit the grant
//! before the completion record, so a mid-flow failure leaves the
//! completion unconsumed and a retry can repeat a grant but never lose it.

use std::sync::Arc;

use chrono::Utc;

use crate::achievements::{AchievementEngine, AchievementStatus, UserSnapshot};
use crate::error::AcademyError;
use crate::export::DataExport;
use crate::identity::IdentityProvider;
use crate::ledger::{XpEvent, XpLedger, XpReason};
use crate::leveling;
use crate::progress::{activity_feed, ActivityItem, ProgressTracker};
use crate::storage::{self, StorageAdapter, RECORD_KINDS};
use crate::streaks::{self, StreakStats};

/// XP awarded for finishing a lesson module.
pub const LESSON_XP: i64 = 30;
/// Maximum XP a quiz can award; the score is capped here.
pub const QUIZ_MAX_XP: i64 = 50;
/// XP awarded for completing one path step.
pub const STEP_XP: i64 = 10;

/// Emitted when a grant pushes the user across a level threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelUp {
    pub user_id: String,
    pub level: u32,
}

type LevelUpHandler = Box<dyn Fn(&LevelUp)>;

/// Everything a caller learns from one XP grant.
#[derive(Debug, Clone)]
pub struct XpOutcome {
    pub event: XpEvent,
    pub total_xp: u64,
    pub level: u32,
    /// New level if this grant crossed a threshold.
    pub leveled_up_to: Option<u32>,
    pub newly_earned: Vec<AchievementStatus>,
}

/// The progress engine the presentation layer talks to.
pub struct Academy {
    store: Arc<dyn StorageAdapter>,
    identity: Arc<dyn IdentityProvider>,
    ledger: XpLedger,
    tracker: ProgressTracker,
    achievements: AchievementEngine,
    level_up_handlers: Vec<LevelUpHandler>,
}

impl Academy {
    pub fn new(store: Arc<dyn StorageAdapter>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            ledger: XpLedger::new(store.clone()),
            tracker: ProgressTracker::new(store.clone()),
            achievements: AchievementEngine::new(store.clone()),
            store,
            identity,
            level_up_handlers: Vec::new(),
        }
    }

    /// Register a level-up listener. Each crossing is delivered exactly
    /// once, so the modal shows once per level gained.
    pub fn on_level_up(&mut self, handler: impl Fn(&LevelUp) + 'static) {
        self.level_up_handlers.push(Box::new(handler));
    }

    fn require_user(&self) -> Result<String, AcademyError> {
        self.identity
            .current_user()
            .map(|account| account.id)
            .ok_or(AcademyError::NotSignedIn)
    }

    fn snapshot(&self, user_id: &str) -> Result<UserSnapshot, AcademyError> {
        Ok(UserSnapshot::build(
            self.ledger.history(user_id)?,
            self.tracker.records(user_id)?,
            self.tracker.tutorials(user_id)?,
            Utc::now(),
        ))
    }

    /// Grant XP to the signed-in user and run the full cascade.
    pub fn award_xp(
        &self,
        amount: i64,
        reason: XpReason,
        description: &str,
    ) -> Result<XpOutcome, AcademyError> {
        let user_id = self.require_user()?;

        let total_before = self.ledger.total_xp(&user_id)?;
        let event = self.ledger.grant(&user_id, amount, reason, description)?;
        let total_after = total_before + event.amount as u64;

        let level_before = leveling::level_for_xp(total_before);
        let level_after = leveling::level_for_xp(total_after);
        let leveled_up_to = (level_after > level_before).then_some(level_after);

        if let Some(level) = leveled_up_to {
            let signal = LevelUp {
                user_id: user_id.clone(),
                level,
            };
            tracing::info!(user = %user_id, level, "level up");
            for handler in &self.level_up_handlers {
                handler(&signal);
            }
        }

        let snapshot = self.snapshot(&user_id)?;
        let evaluation = self.achievements.evaluate(&user_id, &snapshot)?;

        Ok(XpOutcome {
            event,
            total_xp: total_after,
            level: level_after,
            leveled_up_to,
            newly_earned: evaluation.newly_earned,
        })
    }

    fn tutorial_done(&self, user_id: &str, tutorial_id: &str) -> Result<bool, AcademyError> {
        Ok(self
            .tracker
            .tutorials(user_id)?
            .iter()
            .any(|t| t.tutorial_id == tutorial_id))
    }

    /// Re-run achievement evaluation and fold new unlocks into the outcome.
    /// Called after a completion record lands so badges keyed on the record
    /// are earned within the same call.
    fn refresh_achievements(
        &self,
        user_id: &str,
        outcome: &mut XpOutcome,
    ) -> Result<(), AcademyError> {
        let snapshot = self.snapshot(user_id)?;
        let evaluation = self.achievements.evaluate(user_id, &snapshot)?;
        outcome.newly_earned.extend(evaluation.newly_earned);
        Ok(())
    }

    // In the completion flows below the XP grant commits before the
    // completion record. The repeat guard keys off the record, so a failure
    // between the two can at worst repeat a grant on retry, never lose one.

    /// Finishing a course module: fixed lesson award. A repeated completion
    /// is a no-op returning `None`; the ledger only ever grows with real
    /// first completions.
    pub fn complete_lesson(&self, lesson_id: &str) -> Result<Option<XpOutcome>, AcademyError> {
        let user_id = self.require_user()?;
        if self.tutorial_done(&user_id, lesson_id)? {
            return Ok(None);
        }
        let mut outcome = self.award_xp(LESSON_XP, XpReason::LessonCompleted, lesson_id)?;
        self.tracker.mark_tutorial_completed(&user_id, lesson_id)?;
        self.refresh_achievements(&user_id, &mut outcome)?;
        Ok(Some(outcome))
    }

    /// Submitting a quiz: XP equals the score, capped at the quiz maximum.
    /// A zero score still records the completion, with no XP grant; a
    /// repeated submission grants nothing.
    pub fn complete_quiz(&self, quiz_id: &str, score: u32) -> Result<Option<XpOutcome>, AcademyError> {
        let user_id = self.require_user()?;
        if self.tutorial_done(&user_id, quiz_id)? {
            return Ok(None);
        }

        let award = (score as i64).min(QUIZ_MAX_XP);
        if award == 0 {
            // No grant to protect; record the completion and re-evaluate,
            // since the completion itself can unlock badges.
            self.tracker.mark_tutorial_completed(&user_id, quiz_id)?;
            let snapshot = self.snapshot(&user_id)?;
            self.achievements.evaluate(&user_id, &snapshot)?;
            return Ok(None);
        }
        let mut outcome = self.award_xp(award, XpReason::QuizCompleted, quiz_id)?;
        self.tracker.mark_tutorial_completed(&user_id, quiz_id)?;
        self.refresh_achievements(&user_id, &mut outcome)?;
        Ok(Some(outcome))
    }

    /// Toggling a path step on: awards step XP only when the step was not
    /// already complete, then records the progress.
    pub fn complete_step(
        &self,
        path_type: &str,
        step_index: u32,
    ) -> Result<Option<XpOutcome>, AcademyError> {
        let user_id = self.require_user()?;
        let already_done = self
            .tracker
            .records(&user_id)?
            .iter()
            .any(|r| r.path_type == path_type && r.step_index == step_index && r.completed);
        if already_done {
            return Ok(None);
        }

        let mut outcome = self.award_xp(
            STEP_XP,
            XpReason::StepCompleted,
            &format!("{} step {}", path_type, step_index),
        )?;
        self.tracker
            .mark_step_completed(&user_id, path_type, step_index)?;
        self.refresh_achievements(&user_id, &mut outcome)?;
        Ok(Some(outcome))
    }

    /// Toggling a path step off.
    pub fn uncomplete_step(&self, path_type: &str, step_index: u32) -> Result<(), AcademyError> {
        let user_id = self.require_user()?;
        self.tracker
            .mark_step_incomplete(&user_id, path_type, step_index)
    }

    // Read-only queries. These take an explicit user id; only writes
    // require the signed-in account.

    pub fn total_xp(&self, user_id: &str) -> Result<u64, AcademyError> {
        self.ledger.total_xp(user_id)
    }

    pub fn level(&self, user_id: &str) -> Result<u32, AcademyError> {
        Ok(leveling::level_for_xp(self.ledger.total_xp(user_id)?))
    }

    pub fn xp_to_next_level(&self, user_id: &str) -> Result<u64, AcademyError> {
        Ok(leveling::xp_to_next_level(self.ledger.total_xp(user_id)?))
    }

    pub fn streak(&self, user_id: &str) -> Result<StreakStats, AcademyError> {
        let timestamps: Vec<_> = self
            .ledger
            .history(user_id)?
            .iter()
            .map(|e| e.timestamp)
            .collect();
        Ok(streaks::calculate(&timestamps, Utc::now()))
    }

    pub fn completion_percentage(
        &self,
        user_id: &str,
        path_type: &str,
        total_steps: usize,
    ) -> Result<f32, AcademyError> {
        self.tracker
            .completion_percentage(user_id, path_type, total_steps)
    }

    pub fn achievement_statuses(
        &self,
        user_id: &str,
    ) -> Result<Vec<AchievementStatus>, AcademyError> {
        self.achievements.statuses(user_id)
    }

    pub fn recent_activity(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ActivityItem>, AcademyError> {
        let records = self.tracker.records(user_id)?;
        let tutorials = self.tracker.tutorials(user_id)?;
        let achievements = self.achievements.statuses(user_id)?;
        Ok(activity_feed(&records, &tutorials, &achievements, limit))
    }

    /// Fixed-shape bundle of every record kind for the user.
    pub fn export_user(&self, user_id: &str) -> Result<DataExport, AcademyError> {
        Ok(DataExport {
            user_id: user_id.to_string(),
            exported_at: Utc::now(),
            xp_events: self.ledger.history(user_id)?,
            progress: self.tracker.records(user_id)?,
            tutorials: self.tracker.tutorials(user_id)?,
            achievements: self.achievements.statuses(user_id)?,
        })
    }

    /// Purge every record for the user. The single account-data primitive;
    /// nothing else ever deletes.
    pub fn clear_user(&self, user_id: &str) -> Result<(), AcademyError> {
        for kind in RECORD_KINDS {
            self.store.remove(&storage::user_key(user_id, kind))?;
        }
        tracing::info!(user = user_id, "account records cleared");
        Ok(())
    }
}
