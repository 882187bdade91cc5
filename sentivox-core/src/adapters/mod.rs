//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest HTTP client for the AuthService port
//! - JSON file store (locked, atomically replaced) for KeyValueStore
//! - In-memory store and event sink for tests and fallbacks
//! - Navigation history for front-ends without a router

pub mod file_store;
pub mod http_auth;
pub mod memory;
pub mod navigation;

#[cfg(test)]
pub mod auth_mock;

pub use file_store::FileStore;
pub use http_auth::HttpAuthService;
pub use memory::{MemorySink, MemoryStore};
pub use navigation::HistoryNavigator;
