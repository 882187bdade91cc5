//! Shared fixtures for the integration tests
//!
//! `ScriptedAuth` answers every service call from a script the test controls.
//! Session checks can be held back with `hold_session_checks` so a test can
//! observe the optimistic state before the server answers.
//!
//! `CountingStore` and `CountingNavigator` record every call they receive, so
//! a test can tell one request from two identical ones.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use sentivox_core::adapters::{MemorySink, MemoryStore};
use sentivox_core::config::Config;
use sentivox_core::domain::result::Result;
use sentivox_core::domain::SessionCheck;
use sentivox_core::ports::{AuthService, KeyValueStore, Navigator};
use sentivox_core::services::{IdentityCache, RouteGuard, SessionController};
use sentivox_core::{Error, Identity, Role, Route, SentivoxContext};

#[derive(Debug, Clone)]
pub enum Reply {
    User(Identity),
    NotAuthenticated,
    Offline,
}

pub struct ScriptedAuth {
    session: Mutex<Reply>,
    login: Mutex<Reply>,
    token_valid: Mutex<Option<bool>>,
    reset_refusal: Mutex<Option<String>>,
    gate: Option<Semaphore>,
    pub session_checks: AtomicUsize,
    pub verifications: AtomicUsize,
    pub submissions: AtomicUsize,
    pub recovery_requests: AtomicUsize,
}

impl ScriptedAuth {
    pub fn new(session: Reply) -> Self {
        Self {
            session: Mutex::new(session),
            login: Mutex::new(Reply::NotAuthenticated),
            token_valid: Mutex::new(Some(true)),
            reset_refusal: Mutex::new(None),
            gate: None,
            session_checks: AtomicUsize::new(0),
            verifications: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
            recovery_requests: AtomicUsize::new(0),
        }
    }

    /// Session checks wait for `release_session_check`
    pub fn hold_session_checks(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release_session_check(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn answer_login(&self, reply: Reply) {
        *self.login.lock().unwrap() = reply;
    }

    /// `None` makes verification fail in transport
    pub fn answer_verification(&self, valid: Option<bool>) {
        *self.token_valid.lock().unwrap() = valid;
    }

    pub fn refuse_reset(&self, reason: &str) {
        *self.reset_refusal.lock().unwrap() = Some(reason.to_string());
    }

    fn answer(reply: Reply) -> Result<SessionCheck> {
        match reply {
            Reply::User(identity) => Ok(SessionCheck::Authenticated(identity)),
            Reply::NotAuthenticated => Ok(SessionCheck::NotAuthenticated),
            Reply::Offline => Err(Error::network("Unable to connect to the Sentivox server")),
        }
    }
}

#[async_trait]
impl AuthService for ScriptedAuth {
    async fn session_check(&self) -> Result<SessionCheck> {
        self.session_checks.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        let reply = self.session.lock().unwrap().clone();
        Self::answer(reply)
    }

    async fn login(&self, _email: &str, _password: Option<&str>) -> Result<Identity> {
        let reply = self.login.lock().unwrap().clone();
        match Self::answer(reply)? {
            SessionCheck::Authenticated(identity) => Ok(identity),
            SessionCheck::NotAuthenticated => {
                Err(Error::authentication("Invalid email or password"))
            }
        }
    }

    async fn logout(&self) -> Result<()> {
        Ok(())
    }

    async fn request_recovery(&self, _email: &str) -> Result<()> {
        self.recovery_requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn verify_recovery_token(&self, _token: &str, _email: &str) -> Result<bool> {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        let answer = *self.token_valid.lock().unwrap();
        answer.ok_or_else(|| Error::network("Unable to connect to the Sentivox server"))
    }

    async fn submit_recovery(&self, _email: &str, _token: &str, _pw: &str) -> Result<()> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        match self.reset_refusal.lock().unwrap().clone() {
            Some(reason) => Err(Error::rejected(reason)),
            None => Ok(()),
        }
    }
}

/// [`MemoryStore`] that counts removals per key
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    removals: Mutex<HashMap<String, usize>>,
}

impl CountingStore {
    pub fn removals(&self, key: &str) -> usize {
        self.removals.lock().unwrap().get(key).copied().unwrap_or(0)
    }
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        *self
            .removals
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default() += 1;
        self.inner.remove(key)
    }
}

/// [`Navigator`] that keeps every request, repeats included
#[derive(Default)]
pub struct CountingNavigator {
    calls: Mutex<Vec<Route>>,
}

impl CountingNavigator {
    pub fn calls(&self) -> Vec<Route> {
        self.calls.lock().unwrap().clone()
    }
}

impl Navigator for CountingNavigator {
    fn navigate(&self, route: Route) {
        self.calls.lock().unwrap().push(route);
    }
}

/// A controller and guard reporting to a [`CountingNavigator`]
pub struct Observed {
    pub session: Arc<SessionController>,
    pub guard: RouteGuard,
    pub navigator: Arc<CountingNavigator>,
}

pub struct Fixture {
    pub auth: Arc<ScriptedAuth>,
    pub store: Arc<CountingStore>,
    pub sink: Arc<MemorySink>,
    pub context: SentivoxContext,
}

impl Fixture {
    pub fn new(auth: ScriptedAuth) -> Self {
        let auth = Arc::new(auth);
        let store = Arc::new(CountingStore::default());
        let sink = Arc::new(MemorySink::new());
        let context = SentivoxContext::from_parts(
            Config::default(),
            store.clone(),
            auth.clone(),
            sink.clone(),
        );
        Self {
            auth,
            store,
            sink,
            context,
        }
    }

    /// Seed the identity cache as a previous load would have left it
    pub fn with_cached(self, identity: &Identity) -> Self {
        self.cache().write(identity).unwrap();
        self
    }

    pub fn cache(&self) -> IdentityCache {
        IdentityCache::new(self.store.clone())
    }

    pub fn event_names(&self) -> Vec<String> {
        self.sink.names()
    }

    /// A separate controller over the same service, store and log
    pub fn observed(&self) -> Observed {
        let navigator = Arc::new(CountingNavigator::default());
        let session = Arc::new(SessionController::new(
            self.auth.clone(),
            IdentityCache::new(self.store.clone()),
            navigator.clone(),
            self.sink.clone(),
            Config::default().email_policy(),
        ));
        let guard = RouteGuard::new(session.subscribe(), navigator.clone());
        Observed {
            session,
            guard,
            navigator,
        }
    }
}

/// The recruiter used throughout the scenarios
pub fn recruiter() -> Identity {
    Identity::new("u1", "a@esol.com").with_role(Role::Recruiter)
}
