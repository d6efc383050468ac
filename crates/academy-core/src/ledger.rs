//! Append-only XP ledger.
//!
//! Every XP grant is recorded as an immutable event; the running total is
//! always the sum of recorded amounts, never cached separately.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AcademyError;
use crate::storage::{self, StorageAdapter, XP_EVENTS_KEY};

/// Why XP was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpReason {
    LessonCompleted,
    QuizCompleted,
    StepCompleted,
    Other,
}

impl std::fmt::Display for XpReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LessonCompleted => write!(f, "lesson completed"),
            Self::QuizCompleted => write!(f, "quiz completed"),
            Self::StepCompleted => write!(f, "step completed"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Single XP grant. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpEvent {
    pub id: Uuid,
    pub user_id: String,
    pub amount: u32,
    pub reason: XpReason,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Records grants and answers total/history queries for a user.
pub struct XpLedger {
    store: Arc<dyn StorageAdapter>,
}

impl XpLedger {
    pub fn new(store: Arc<dyn StorageAdapter>) -> Self {
        Self { store }
    }

    /// Append a grant. Fails with `InvalidAmount` when `amount <= 0` or
    /// when it exceeds the `u32` range an event can record; unknown users
    /// are implicitly created.
    pub fn grant(
        &self,
        user_id: &str,
        amount: i64,
        reason: XpReason,
        description: &str,
    ) -> Result<XpEvent, AcademyError> {
        if amount <= 0 {
            return Err(AcademyError::InvalidAmount(amount));
        }
        let amount = u32::try_from(amount).map_err(|_| AcademyError::InvalidAmount(amount))?;

        let event = XpEvent {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            amount,
            reason,
            description: description.to_string(),
            timestamp: Utc::now(),
        };

        let key = storage::user_key(user_id, XP_EVENTS_KEY);
        let mut events: Vec<XpEvent> = storage::load_records(self.store.as_ref(), &key)?;
        events.push(event.clone());
        storage::save_records(self.store.as_ref(), &key, &events)?;

        tracing::debug!(user = user_id, amount, %reason, "xp granted");
        Ok(event)
    }

    /// Sum of all recorded amounts; 0 for a user with no events.
    pub fn total_xp(&self, user_id: &str) -> Result<u64, AcademyError> {
        Ok(self
            .history(user_id)?
            .iter()
            .map(|e| e.amount as u64)
            .sum())
    }

    /// Full grant history, oldest first.
    pub fn history(&self, user_id: &str) -> Result<Vec<XpEvent>, AcademyError> {
        let key = storage::user_key(user_id, XP_EVENTS_KEY);
        storage::load_records(self.store.as_ref(), &key)
    }
}
