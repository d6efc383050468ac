//! "Download my data" bundle.
//!
//! Single fixed JSON shape holding every record kind for one user. No
//! format negotiation; replaying the events through a fresh ledger must
//! reproduce the same totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::achievements::AchievementStatus;
use crate::ledger::XpEvent;
use crate::progress::{ProgressRecord, TutorialCompletion};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataExport {
    pub user_id: String,
    pub exported_at: DateTime<Utc>,
    pub xp_events: Vec<XpEvent>,
    pub progress: Vec<ProgressRecord>,
    pub tutorials: Vec<TutorialCompletion>,
    pub achievements: Vec<AchievementStatus>,
}
