//! Sentivox Core - session lifecycle and credential recovery
//!
//! This crate implements the client side of the Sentivox dashboard's
//! authentication following hexagonal architecture:
//!
//! - **domain**: Identity, session state, recovery links, form rules
//! - **ports**: Trait definitions for external dependencies (AuthService, KeyValueStore)
//! - **services**: Session controller, route guard, recovery flows, event log
//! - **adapters**: Concrete implementations (HTTP client, file store, etc.)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::{FileStore, HistoryNavigator, HttpAuthService, MemorySink};
use config::Config;
use ports::{AuthService, EventSink, KeyValueStore};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{
    EmailDomainPolicy, Identity, PasswordForm, RecoveryLink, Role, Route, SessionState,
    TokenVerification,
};

/// Main context for Sentivox operations
///
/// Wires the persistent store, the event log, the HTTP client and the session
/// controller for one front-end process.
pub struct SentivoxContext {
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub auth: Arc<dyn AuthService>,
    pub events: Arc<dyn EventSink>,
    pub navigator: Arc<HistoryNavigator>,
    pub session: Arc<SessionController>,
    /// Present when the event log database could be opened
    pub logger: Option<Arc<LoggingService>>,
}

impl SentivoxContext {
    /// Create a context backed by the app directory
    pub fn new(app_dir: &Path, entry_point: EntryPoint) -> Result<Self> {
        let config = Config::load(app_dir)?;
        let store: Arc<dyn KeyValueStore> = Arc::new(
            FileStore::new(app_dir)
                .with_context(|| format!("Failed to open store in {}", app_dir.display()))?,
        );

        // Events are best-effort; a locked or unwritable log only loses history
        let logger = LoggingService::new(app_dir, entry_point, env!("CARGO_PKG_VERSION"))
            .ok()
            .map(Arc::new);
        let events: Arc<dyn EventSink> = match &logger {
            Some(logger) => logger.clone(),
            None => Arc::new(MemorySink::new()),
        };

        let auth = HttpAuthService::new(&config.api_url(), config.timeout())?
            .with_cookie_persistence(Arc::clone(&store));

        let mut context = Self::from_parts(config, store, Arc::new(auth), events);
        context.logger = logger;
        Ok(context)
    }

    /// Assemble a context from already built adapters
    pub fn from_parts(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        auth: Arc<dyn AuthService>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let navigator = Arc::new(HistoryNavigator::new());
        let session = Arc::new(SessionController::new(
            Arc::clone(&auth),
            IdentityCache::new(Arc::clone(&store)),
            navigator.clone(),
            Arc::clone(&events),
            config.email_policy(),
        ));

        Self {
            config,
            store,
            auth,
            events,
            navigator,
            session,
            logger: None,
        }
    }

    /// A route guard observing this context's session
    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(self.session.subscribe(), self.navigator.clone())
    }

    pub fn recovery_flow(&self) -> RecoveryFlow {
        RecoveryFlow::new(
            Arc::clone(&self.auth),
            self.navigator.clone(),
            Arc::clone(&self.events),
            self.config.email_policy(),
        )
    }

    /// The reset surface for a recovery link or the address it was opened from
    pub fn password_reset(&self, location: &str) -> PasswordReset {
        PasswordReset::from_location(
            Arc::clone(&self.auth),
            self.navigator.clone(),
            Arc::clone(&self.events),
            location,
        )
        .with_redirect_delay(self.config.reset_redirect_delay())
    }
}
