//! Progress and gamification engine for MCP Academy.
//!
//! XP ledger, leveling policy, progress tracker, and achievement engine
//! over a key-value storage adapter. Level and all other derived state are
//! recomputed from recorded history, never stored as independent truth.

pub mod achievements;
pub mod engine;
pub mod error;
pub mod export;
pub mod identity;
pub mod ledger;
pub mod leveling;
pub mod progress;
pub mod storage;
pub mod streaks;

pub use achievements::{AchievementDef, AchievementRule, AchievementStatus, UserSnapshot};
pub use engine::{Academy, LevelUp, XpOutcome, LESSON_XP, QUIZ_MAX_XP, STEP_XP};
pub use error::AcademyError;
pub use export::DataExport;
pub use identity::{IdentityProvider, StaticIdentity, UserAccount};
pub use ledger::{XpEvent, XpLedger, XpReason};
pub use progress::{ActivityItem, ProgressRecord, ProgressTracker, TutorialCompletion};
pub use storage::{JsonFileStore, MemoryStore, StorageAdapter};
