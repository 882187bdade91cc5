//! Service layer - session lifecycle and recovery orchestration
//!
//! Services coordinate domain logic and port interactions. The session
//! controller is the only writer of the identity cache and of the published
//! session state; everything else observes.

pub mod identity_cache;
pub mod logging;
pub mod recovery;
mod route_guard;
pub mod session;

pub use identity_cache::{IdentityCache, IDENTITY_KEY};
pub use logging::{EntryPoint, LogEntry, LogEvent, LogLevel, LoggingService};
pub use recovery::{PasswordReset, RecoveryFlow, RecoveryPhase, ResetAccepted};
pub use route_guard::{GuardView, RouteGuard};
pub use session::{Bootstrap, SessionController};
