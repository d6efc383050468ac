//! Error types for the academy engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcademyError {
    #[error("Invalid XP amount {0}")]
    InvalidAmount(i64),

    #[error("No signed-in user; sign in before recording progress")]
    NotSignedIn,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed record at key '{key}': {detail}")]
    MalformedRecord { key: String, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AcademyError {
    /// True for failures the presentation layer should show to the user
    /// (storage trouble, signed-out state) rather than treat as a caller bug.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, AcademyError::InvalidAmount(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_amount_is_a_caller_bug() {
        assert!(!AcademyError::InvalidAmount(-1).is_user_facing());
        assert!(!AcademyError::InvalidAmount(u32::MAX as i64 + 1).is_user_facing());
    }

    #[test]
    fn test_runtime_failures_are_user_facing() {
        assert!(AcademyError::NotSignedIn.is_user_facing());
        assert!(AcademyError::Storage("quota exceeded".to_string()).is_user_facing());
        assert!(AcademyError::MalformedRecord {
            key: "alice/xp_events".to_string(),
            detail: "expected a sequence".to_string(),
        }
        .is_user_facing());
    }
}
