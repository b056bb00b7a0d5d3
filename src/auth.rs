//! Session identity contract.
//!
//! Authentication lives in the hosted platform; the core only reads the
//! current session's user when populating `created_by` and the
//! notification recipient. Anything beyond that (tokens, refresh,
//! sign-out) stays behind the collaborator.

use serde::{Deserialize, Serialize};

/// The signed-in member as the identity collaborator exposes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

pub trait IdentityProvider: Send + Sync {
    /// The current session's user, or `None` when signed out.
    fn current_user(&self) -> Option<SessionUser>;
}

/// Fixed identity, for wiring and tests.
pub struct StaticIdentity {
    user: Option<SessionUser>,
}

impl StaticIdentity {
    pub fn signed_in(user: SessionUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<SessionUser> {
        self.user.clone()
    }
}
