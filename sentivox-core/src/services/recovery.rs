//! Credential recovery
//!
//! Two surfaces share this module:
//! - [`RecoveryFlow`] asks the service to email a recovery link.
//! - [`PasswordReset`] is opened from that link, verifies the token once and
//!   submits the new password.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::domain::recovery::RECOVERY_LINK_LIFETIME;
use crate::domain::result::{Error, Result};
use crate::domain::{
    EmailDomainPolicy, PasswordForm, RecoveryLink, Route, TokenVerification,
};
use crate::ports::{AuthService, EventSink, Navigator};
use crate::services::logging::LogEvent;

/// Delay between an accepted reset and the move to the login surface
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

// =============================================================================
// Request a link
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryPhase {
    /// Collecting the email address
    Request,
    /// The service accepted the request for `email`
    Dispatched { email: String },
}

pub struct RecoveryFlow {
    auth: Arc<dyn AuthService>,
    navigator: Arc<dyn Navigator>,
    events: Arc<dyn EventSink>,
    policy: EmailDomainPolicy,
    phase: RecoveryPhase,
}

impl RecoveryFlow {
    pub fn new(
        auth: Arc<dyn AuthService>,
        navigator: Arc<dyn Navigator>,
        events: Arc<dyn EventSink>,
        policy: EmailDomainPolicy,
    ) -> Self {
        Self {
            auth,
            navigator,
            events,
            policy,
            phase: RecoveryPhase::Request,
        }
    }

    pub fn phase(&self) -> &RecoveryPhase {
        &self.phase
    }

    /// Ask the service to send a recovery link
    ///
    /// The response is identical whether or not an account exists for the
    /// address. On error the phase does not change.
    pub async fn request(&mut self, email: &str) -> Result<()> {
        self.policy.validate(email)?;
        let email = email.trim();

        match self.auth.request_recovery(email).await {
            Ok(()) => {
                self.events.record(LogEvent::new("recovery_requested"));
                self.phase = RecoveryPhase::Dispatched {
                    email: email.to_string(),
                };
                Ok(())
            }
            Err(e) => {
                self.events
                    .record(LogEvent::new("recovery_request_failed").with_error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Return to the request form to send another link
    pub fn send_again(&mut self) {
        self.phase = RecoveryPhase::Request;
    }

    pub fn back_to_login(&self) {
        self.navigator.navigate(Route::Login);
    }

    /// Text shown once a link has been dispatched
    pub fn dispatch_notice(&self) -> Option<String> {
        match &self.phase {
            RecoveryPhase::Request => None,
            RecoveryPhase::Dispatched { email } => Some(format!(
                "If an account exists for {}, a password reset link has been sent. \
                 The link will expire in {}.",
                email, RECOVERY_LINK_LIFETIME
            )),
        }
    }
}

// =============================================================================
// Reset with a link
// =============================================================================

/// An accepted reset; the login redirect is already scheduled
#[derive(Debug)]
pub struct ResetAccepted {
    redirect: JoinHandle<()>,
    delay: Duration,
}

impl ResetAccepted {
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait until the user has been sent to the login surface
    pub async fn redirected(self) {
        let _ = self.redirect.await;
    }
}

pub struct PasswordReset {
    auth: Arc<dyn AuthService>,
    navigator: Arc<dyn Navigator>,
    events: Arc<dyn EventSink>,
    link: Option<RecoveryLink>,
    verification: TokenVerification,
    redirect_delay: Duration,
    accepted: bool,
}

impl PasswordReset {
    /// Open the reset surface for `link`
    ///
    /// Without a link the token is `Invalid` from the start and nothing is
    /// sent to the service.
    pub fn from_link(
        auth: Arc<dyn AuthService>,
        navigator: Arc<dyn Navigator>,
        events: Arc<dyn EventSink>,
        link: Option<RecoveryLink>,
    ) -> Self {
        let verification = if link.is_some() {
            TokenVerification::Pending
        } else {
            TokenVerification::Invalid
        };
        Self {
            auth,
            navigator,
            events,
            link,
            verification,
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            accepted: false,
        }
    }

    /// Open the reset surface from the address the user arrived at
    pub fn from_location(
        auth: Arc<dyn AuthService>,
        navigator: Arc<dyn Navigator>,
        events: Arc<dyn EventSink>,
        location: &str,
    ) -> Self {
        Self::from_link(auth, navigator, events, RecoveryLink::parse(location))
    }

    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    pub fn verification(&self) -> TokenVerification {
        self.verification
    }

    pub fn link(&self) -> Option<&RecoveryLink> {
        self.link.as_ref()
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Check the token with the service
    ///
    /// Only the first call reaches the network. Unknown, expired and
    /// unverifiable tokens all end up `Invalid`.
    pub async fn verify(&mut self) -> TokenVerification {
        if self.verification != TokenVerification::Pending {
            return self.verification;
        }
        let Some(link) = &self.link else {
            self.verification = TokenVerification::Invalid;
            return self.verification;
        };

        self.verification = match self.auth.verify_recovery_token(&link.token, &link.email).await
        {
            Ok(true) => {
                self.events.record(LogEvent::new("recovery_token_valid"));
                TokenVerification::Valid
            }
            Ok(false) => {
                self.events.record(LogEvent::new("recovery_token_invalid"));
                TokenVerification::Invalid
            }
            Err(e) => {
                self.events
                    .record(LogEvent::warning("recovery_verify_failed", e.to_string()));
                TokenVerification::Invalid
            }
        };
        self.verification
    }

    /// Leave an unusable link for a fresh request
    pub fn request_new_link(&self) {
        self.navigator.navigate(Route::ForgotPassword);
    }

    /// Whether the submit action is enabled for `form`
    pub fn can_submit(&self, form: &PasswordForm) -> bool {
        self.verification == TokenVerification::Valid && !self.accepted && form.check().is_ok()
    }

    /// Submit the new password
    ///
    /// Both the token state and the form are checked before anything is sent.
    /// A refusal keeps the token `Valid` so the user can try again.
    pub async fn submit(&mut self, form: &PasswordForm) -> Result<ResetAccepted> {
        if self.verification != TokenVerification::Valid || self.accepted {
            return Err(Error::InvalidToken);
        }
        form.check()?;
        let Some(link) = &self.link else {
            return Err(Error::InvalidToken);
        };

        match self
            .auth
            .submit_recovery(&link.email, &link.token, &form.password)
            .await
        {
            Ok(()) => {
                self.accepted = true;
                self.events.record(LogEvent::new("password_reset"));

                let navigator = Arc::clone(&self.navigator);
                let delay = self.redirect_delay;
                let redirect = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.navigate(Route::Login);
                });
                Ok(ResetAccepted { redirect, delay })
            }
            Err(e) => {
                self.events
                    .record(LogEvent::warning("password_reset_rejected", e.to_string()));
                Err(e)
            }
        }
    }
}
