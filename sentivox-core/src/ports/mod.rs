//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The services
//! depend only on these traits, not on concrete implementations.

mod auth_service;

use crate::domain::result::Result;
use crate::domain::Route;
use crate::services::logging::LogEvent;

pub use auth_service::AuthService;

/// Persistent, synchronous, process-local string storage
///
/// Survives restarts. Never performs network I/O.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value`, replacing anything previously stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Moves the user to another surface
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Destination for structured events
///
/// Recording must never fail from the caller's point of view.
pub trait EventSink: Send + Sync {
    fn record(&self, event: LogEvent);
}
