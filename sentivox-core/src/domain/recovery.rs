//! Recovery link parsing and token verification state

use serde::Serialize;
use url::{form_urlencoded, Url};

/// How long a recovery link stays valid, as communicated to the user
pub const RECOVERY_LINK_LIFETIME: &str = "1 hour";

/// Token and email carried by an addressable recovery link
///
/// The token is opaque; the client only hands it back to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryLink {
    pub token: String,
    pub email: String,
}

impl RecoveryLink {
    pub fn new(token: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            email: email.into(),
        }
    }

    /// Parse a full link such as `https://host/reset-password?token=..&email=..`
    /// or a bare query string (`token=..&email=..`, leading `?` optional).
    ///
    /// Returns `None` when either parameter is missing or empty.
    pub fn parse(location: &str) -> Option<Self> {
        let location = location.trim();
        match Url::parse(location) {
            Ok(url) => Self::from_pairs(url.query_pairs()),
            Err(_) => {
                let query = location
                    .split_once('?')
                    .map(|(_, q)| q)
                    .unwrap_or(location);
                Self::from_pairs(form_urlencoded::parse(query.as_bytes()))
            }
        }
    }

    fn from_pairs<'a>(
        pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
    ) -> Option<Self> {
        let mut token = None;
        let mut email = None;
        for (key, value) in pairs {
            match key.as_ref() {
                "token" => token = Some(value.into_owned()),
                "email" => email = Some(value.into_owned()),
                _ => {}
            }
        }

        let token = token.filter(|t| !t.trim().is_empty())?;
        let email = email.filter(|e| !e.trim().is_empty())?;
        Some(Self { token, email })
    }
}

/// Result of checking a recovery token with the service
///
/// `Invalid` is terminal: it covers unknown and expired tokens alike and
/// offers no retry of the same token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenVerification {
    Pending,
    Valid,
    Invalid,
}

impl TokenVerification {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TokenVerification::Invalid)
    }
}
