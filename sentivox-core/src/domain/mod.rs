//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O or external dependencies.

pub mod email;
mod identity;
pub mod password;
pub mod recovery;
pub mod result;
mod route;
pub mod session;

pub use email::{EmailDomainPolicy, EmailError};
pub use identity::{Identity, Role};
pub use password::{PasswordError, PasswordForm, PasswordRequirements, MIN_PASSWORD_LENGTH};
pub use recovery::{RecoveryLink, TokenVerification};
pub use route::Route;
pub use session::{reconcile, Reconciliation, SessionCheck, SessionState, SessionStatus};
