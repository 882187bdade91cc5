//! Identity cache - last known identity, surviving restarts

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::Identity;
use crate::ports::{EventSink, KeyValueStore};
use crate::services::logging::LogEvent;

/// Store key for the cached identity
pub const IDENTITY_KEY: &str = "sentivox_user";

/// Persistent, synchronous cache of the last authenticated identity
///
/// Holds a single serialized record. A record that cannot be read back is
/// purged and reported as absent, so a corrupted cache heals itself on the
/// next read. Storage failures met while reading go to the event sink, if
/// one is attached.
#[derive(Clone)]
pub struct IdentityCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
    events: Option<Arc<dyn EventSink>>,
}

impl IdentityCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, IDENTITY_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            events: None,
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// The cached identity, if one is stored and well formed
    pub fn read(&self) -> Option<Identity> {
        let raw = match self.store.get(&self.key) {
            Ok(raw) => raw?,
            Err(e) => {
                self.report("identity_cache_unreadable", e.to_string());
                return None;
            }
        };

        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) if identity.is_well_formed() => Some(identity),
            _ => {
                if let Err(e) = self.store.remove(&self.key) {
                    self.report("identity_cache_purge_failed", e.to_string());
                }
                None
            }
        }
    }

    /// Replace any stored identity
    pub fn write(&self, identity: &Identity) -> Result<()> {
        let raw = serde_json::to_string(identity)?;
        self.store.set(&self.key, &raw)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.key)
    }

    fn report(&self, event: &str, message: String) {
        if let Some(events) = &self.events {
            events.record(LogEvent::warning(event, message));
        }
    }
}
