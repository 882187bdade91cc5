//! Published session state and the cache/server reconciliation rule

use serde::Serialize;

use super::identity::Identity;
use super::result::Result;

/// Status tag of a [`SessionState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Loading => "loading",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Unauthenticated => "unauthenticated",
        }
    }
}

/// The observable session status
///
/// `Loading` only exists as the initial value of a fresh load and always
/// resolves to one of the other two.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Loading,
    Authenticated(Identity),
    Unauthenticated,
}

impl SessionState {
    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::Loading => SessionStatus::Loading,
            SessionState::Authenticated(_) => SessionStatus::Authenticated,
            SessionState::Unauthenticated => SessionStatus::Unauthenticated,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Answer of the remote session-check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    Authenticated(Identity),
    NotAuthenticated,
}

/// What to do with an optimistically published identity once the server
/// has answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Leave the published state alone
    Keep,
    /// Server knows a different identity; overwrite cache and republish
    Replace(Identity),
    /// Server says the session is gone
    Invalidate,
}

/// Merge the cached identity with the server's answer
///
/// A failed request (no definitive answer) never invalidates a cached
/// session.
pub fn reconcile(cached: &Identity, outcome: &Result<SessionCheck>) -> Reconciliation {
    match outcome {
        Ok(SessionCheck::Authenticated(server)) if server == cached => Reconciliation::Keep,
        Ok(SessionCheck::Authenticated(server)) => Reconciliation::Replace(server.clone()),
        Ok(SessionCheck::NotAuthenticated) => Reconciliation::Invalidate,
        Err(_) => Reconciliation::Keep,
    }
}
