//! Identity provider surface.
//!
//! Authentication is mocked in this deployment: the provider hands the
//! engine a stable user id and account timestamp, or nothing when signed
//! out. The engine treats the account as an opaque context value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signed-in learner account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserAccount {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Supplies the current user, if any. All mutating engine operations
/// require a non-`None` answer.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<UserAccount>;
}

/// Fixed identity provider: signed in as one account, or signed out.
pub struct StaticIdentity {
    account: Option<UserAccount>,
}

impl StaticIdentity {
    pub fn signed_in(user_id: &str) -> Self {
        Self {
            account: Some(UserAccount {
                id: user_id.to_string(),
                created_at: Utc::now(),
            }),
        }
    }

    pub fn signed_out() -> Self {
        Self { account: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserAccount> {
        self.account.clone()
    }
}
