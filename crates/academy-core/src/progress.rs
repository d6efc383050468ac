//! Step and tutorial completion tracking.
//!
//! One `ProgressRecord` per (user, path, step); one `TutorialCompletion`
//! per (user, tutorial). Completion is idempotent and the first completion
//! wins the timestamp.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::achievements::AchievementStatus;
use crate::error::AcademyError;
use crate::storage::{self, StorageAdapter, PROGRESS_KEY, TUTORIALS_KEY};

/// Completion state of one step within a learning path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: String,
    pub path_type: String,
    pub step_index: u32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Completion of a standalone tutorial (course module or quiz).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorialCompletion {
    pub user_id: String,
    pub tutorial_id: String,
    pub completed_at: DateTime<Utc>,
}

/// One entry in the recent-activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityItem {
    StepCompleted {
        path_type: String,
        step_index: u32,
        at: DateTime<Utc>,
    },
    TutorialCompleted {
        tutorial_id: String,
        at: DateTime<Utc>,
    },
    AchievementEarned {
        achievement_id: String,
        at: DateTime<Utc>,
    },
}

impl ActivityItem {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::StepCompleted { at, .. } => *at,
            Self::TutorialCompleted { at, .. } => *at,
            Self::AchievementEarned { at, .. } => *at,
        }
    }
}

/// Merge completions, tutorials, and earned achievements into one feed,
/// newest first, capped at `limit`. The sort is stable so same-instant
/// entries keep their insertion order.
pub fn activity_feed(
    records: &[ProgressRecord],
    tutorials: &[TutorialCompletion],
    achievements: &[AchievementStatus],
    limit: usize,
) -> Vec<ActivityItem> {
    let mut feed: Vec<ActivityItem> = Vec::new();

    for record in records {
        if let (true, Some(at)) = (record.completed, record.completed_at) {
            feed.push(ActivityItem::StepCompleted {
                path_type: record.path_type.clone(),
                step_index: record.step_index,
                at,
            });
        }
    }
    for tutorial in tutorials {
        feed.push(ActivityItem::TutorialCompleted {
            tutorial_id: tutorial.tutorial_id.clone(),
            at: tutorial.completed_at,
        });
    }
    for status in achievements {
        if let (true, Some(at)) = (status.earned, status.earned_at) {
            feed.push(ActivityItem::AchievementEarned {
                achievement_id: status.achievement_id.clone(),
                at,
            });
        }
    }

    feed.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    feed.truncate(limit);
    feed
}

/// Records and queries step/tutorial completion for users.
pub struct ProgressTracker {
    store: Arc<dyn StorageAdapter>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn StorageAdapter>) -> Self {
        Self { store }
    }

    /// Mark a step completed. Idempotent: re-completing an already-completed
    /// step keeps the original timestamp and does not error.
    pub fn mark_step_completed(
        &self,
        user_id: &str,
        path_type: &str,
        step_index: u32,
    ) -> Result<ProgressRecord, AcademyError> {
        let key = storage::user_key(user_id, PROGRESS_KEY);
        let mut records: Vec<ProgressRecord> = storage::load_records(self.store.as_ref(), &key)?;

        let record = match records
            .iter_mut()
            .find(|r| r.path_type == path_type && r.step_index == step_index)
        {
            Some(existing) => {
                if !existing.completed {
                    existing.completed = true;
                    existing.completed_at = Some(Utc::now());
                }
                existing.clone()
            }
            None => {
                let record = ProgressRecord {
                    user_id: user_id.to_string(),
                    path_type: path_type.to_string(),
                    step_index,
                    completed: true,
                    completed_at: Some(Utc::now()),
                };
                records.push(record.clone());
                record
            }
        };

        storage::save_records(self.store.as_ref(), &key, &records)?;
        tracing::debug!(user = user_id, path = path_type, step = step_index, "step completed");
        Ok(record)
    }

    /// Explicit un-complete; the presentation layer allows toggling.
    pub fn mark_step_incomplete(
        &self,
        user_id: &str,
        path_type: &str,
        step_index: u32,
    ) -> Result<(), AcademyError> {
        let key = storage::user_key(user_id, PROGRESS_KEY);
        let mut records: Vec<ProgressRecord> = storage::load_records(self.store.as_ref(), &key)?;

        if let Some(existing) = records
            .iter_mut()
            .find(|r| r.path_type == path_type && r.step_index == step_index)
        {
            existing.completed = false;
            existing.completed_at = None;
            storage::save_records(self.store.as_ref(), &key, &records)?;
        }
        Ok(())
    }

    /// Record a tutorial completion. First completion wins; repeats are
    /// no-ops returning the original record.
    pub fn mark_tutorial_completed(
        &self,
        user_id: &str,
        tutorial_id: &str,
    ) -> Result<TutorialCompletion, AcademyError> {
        let key = storage::user_key(user_id, TUTORIALS_KEY);
        let mut tutorials: Vec<TutorialCompletion> =
            storage::load_records(self.store.as_ref(), &key)?;

        if let Some(existing) = tutorials.iter().find(|t| t.tutorial_id == tutorial_id) {
            return Ok(existing.clone());
        }

        let completion = TutorialCompletion {
            user_id: user_id.to_string(),
            tutorial_id: tutorial_id.to_string(),
            completed_at: Utc::now(),
        };
        tutorials.push(completion.clone());
        storage::save_records(self.store.as_ref(), &key, &tutorials)?;
        tracing::debug!(user = user_id, tutorial = tutorial_id, "tutorial completed");
        Ok(completion)
    }

    /// All progress records for a user.
    pub fn records(&self, user_id: &str) -> Result<Vec<ProgressRecord>, AcademyError> {
        let key = storage::user_key(user_id, PROGRESS_KEY);
        storage::load_records(self.store.as_ref(), &key)
    }

    /// All tutorial completions for a user.
    pub fn tutorials(&self, user_id: &str) -> Result<Vec<TutorialCompletion>, AcademyError> {
        let key = storage::user_key(user_id, TUTORIALS_KEY);
        storage::load_records(self.store.as_ref(), &key)
    }

    /// Count of completed steps within one path.
    pub fn completed_steps(&self, user_id: &str, path_type: &str) -> Result<usize, AcademyError> {
        Ok(self
            .records(user_id)?
            .iter()
            .filter(|r| r.path_type == path_type && r.completed)
            .count())
    }

    /// Percentage of `total_steps` completed in a path, 0..=100. The step
    /// count lives with the path content, so the caller supplies it; a zero
    /// total yields 0 rather than a division by zero.
    pub fn completion_percentage(
        &self,
        user_id: &str,
        path_type: &str,
        total_steps: usize,
    ) -> Result<f32, AcademyError> {
        if total_steps == 0 {
            return Ok(0.0);
        }
        let completed = self.completed_steps(user_id, path_type)?;
        Ok(100.0 * completed as f32 / total_steps as f32)
    }
}
