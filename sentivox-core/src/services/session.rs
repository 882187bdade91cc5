//! Session controller - owns the published session state
//!
//! The controller is the single writer of both the identity cache and the
//! published [`SessionState`]. Consumers subscribe to a `watch` channel and
//! never mutate either directly.
//!
//! A load starts in `Loading`. With a cached identity the controller publishes
//! it immediately and reconciles against the server in the background; without
//! one it waits for the server before leaving `Loading`.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::result::{Error, Result};
use crate::domain::{
    reconcile, EmailDomainPolicy, Identity, Reconciliation, Route, SessionCheck, SessionState,
};
use crate::ports::{AuthService, EventSink, Navigator};
use crate::services::identity_cache::IdentityCache;
use crate::services::logging::LogEvent;

/// Outcome of [`SessionController::bootstrap`]
#[derive(Debug)]
pub enum Bootstrap {
    /// The state left `Loading` before `bootstrap` returned
    Resolved,
    /// A cached identity was published; the server check is still running
    Reconciling(JoinHandle<()>),
}

impl Bootstrap {
    pub fn is_reconciling(&self) -> bool {
        matches!(self, Bootstrap::Reconciling(_))
    }

    /// Wait for any background reconciliation to finish
    pub async fn settled(self) {
        if let Bootstrap::Reconciling(handle) = self {
            let _ = handle.await;
        }
    }
}

pub struct SessionController {
    auth: Arc<dyn AuthService>,
    cache: IdentityCache,
    navigator: Arc<dyn Navigator>,
    events: Arc<dyn EventSink>,
    policy: EmailDomainPolicy,
    state: watch::Sender<SessionState>,
    /// Bumped by every user-initiated transition. Held while a transition or
    /// a reconciliation is applied, so the staleness check and the write it
    /// guards cannot interleave with another worker.
    epoch: Mutex<u64>,
}

impl SessionController {
    pub fn new(
        auth: Arc<dyn AuthService>,
        cache: IdentityCache,
        navigator: Arc<dyn Navigator>,
        events: Arc<dyn EventSink>,
        policy: EmailDomainPolicy,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            auth,
            cache: cache.with_events(Arc::clone(&events)),
            navigator,
            events,
            policy,
            state,
            epoch: Mutex::new(0),
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn email_policy(&self) -> &EmailDomainPolicy {
        &self.policy
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Resolve the session for a fresh load
    ///
    /// Must be called once per load, before anything renders protected
    /// content.
    pub async fn bootstrap(self: &Arc<Self>) -> Bootstrap {
        let epoch = *self.lock_epoch();

        if let Some(cached) = self.cache.read() {
            self.publish(SessionState::Authenticated(cached.clone()));
            self.record(LogEvent::new("session_restored"));

            let controller = Arc::clone(self);
            let handle = tokio::spawn(async move {
                let outcome = controller.auth.session_check().await;
                controller.reconcile_cached(epoch, &cached, outcome);
            });
            return Bootstrap::Reconciling(handle);
        }

        let outcome = self.auth.session_check().await;
        self.resolve_fresh(epoch, outcome);
        Bootstrap::Resolved
    }

    /// Authenticate with the service
    ///
    /// The email is checked against the domain policy before anything is
    /// sent. On failure the published state is left untouched.
    pub async fn login(&self, email: &str, password: Option<&str>) -> Result<Identity> {
        self.policy.validate(email)?;
        let email = email.trim();
        let password = password.filter(|p| !p.is_empty());

        match self.auth.login(email, password).await {
            Ok(identity) => {
                self.transition(SessionState::Authenticated(identity.clone()));
                let mut event = LogEvent::new("login_succeeded");
                if identity.is_default_password {
                    event = event.with_error_details("default password in use");
                }
                self.record(event);
                Ok(identity)
            }
            Err(e) => {
                let event = match &e {
                    Error::Network(_) => LogEvent::new("login_rejected").with_error(e.to_string()),
                    _ => LogEvent::warning("login_rejected", e.to_string()),
                };
                self.record(event);
                Err(e)
            }
        }
    }

    /// End the session locally and tell the service in the background
    ///
    /// The local transition and the navigation to the login surface happen
    /// before this returns. The handle resolves once the remote notification
    /// has been attempted; its failure is only recorded.
    pub fn logout(&self) -> JoinHandle<()> {
        self.transition(SessionState::Unauthenticated);
        self.record(LogEvent::new("logout"));

        let auth = Arc::clone(&self.auth);
        let events = Arc::clone(&self.events);
        let handle = tokio::spawn(async move {
            if let Err(e) = auth.logout().await {
                events.record(LogEvent::warning("logout_notify_failed", e.to_string()));
            }
        });

        self.navigator.navigate(Route::Login);
        handle
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Publish `next` unless it equals the current value
    fn publish(&self, next: SessionState) -> bool {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        })
    }

    /// User-initiated transition; supersedes any in-flight reconciliation
    fn transition(&self, next: SessionState) {
        let mut epoch = self.lock_epoch();
        *epoch += 1;
        let stored = match next.identity() {
            Some(identity) => self.cache.write(identity),
            None => self.cache.clear(),
        };
        if let Err(e) = stored {
            self.record(LogEvent::warning("identity_cache_failed", e.to_string()));
        }
        self.publish(next);
    }

    fn lock_epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply the background check that follows an optimistic publish
    fn reconcile_cached(&self, epoch: u64, cached: &Identity, outcome: Result<SessionCheck>) {
        let current = self.lock_epoch();
        if *current != epoch {
            return;
        }

        match reconcile(cached, &outcome) {
            Reconciliation::Keep => {
                if let Err(e) = &outcome {
                    self.record(LogEvent::warning("session_check_failed", e.to_string()));
                }
            }
            Reconciliation::Replace(identity) => {
                if let Err(e) = self.cache.write(&identity) {
                    self.record(LogEvent::warning("identity_cache_failed", e.to_string()));
                }
                self.publish(SessionState::Authenticated(identity));
                self.record(LogEvent::new("session_updated"));
            }
            Reconciliation::Invalidate => {
                if let Err(e) = self.cache.clear() {
                    self.record(LogEvent::warning("identity_cache_failed", e.to_string()));
                }
                self.publish(SessionState::Unauthenticated);
                self.record(LogEvent::new("session_invalidated").with_route(Route::Login.path()));
                self.navigator.navigate(Route::Login);
            }
        }
    }

    /// Leave `Loading` once the server has answered a cache miss
    fn resolve_fresh(&self, epoch: u64, outcome: Result<SessionCheck>) {
        let current = self.lock_epoch();
        if *current != epoch {
            return;
        }

        let next = match outcome {
            Ok(SessionCheck::Authenticated(identity)) => SessionState::Authenticated(identity),
            Ok(SessionCheck::NotAuthenticated) => SessionState::Unauthenticated,
            Err(e) => {
                self.record(LogEvent::new("session_check_failed").with_error(e.to_string()));
                SessionState::Unauthenticated
            }
        };

        let stored = match next.identity() {
            Some(identity) => self.cache.write(identity),
            None => self.cache.clear(),
        };
        if let Err(e) = stored {
            self.record(LogEvent::warning("identity_cache_failed", e.to_string()));
        }

        self.record(LogEvent::new("session_resolved"));
        self.publish(next);
    }

    fn record(&self, event: LogEvent) {
        self.events.record(event);
    }
}
