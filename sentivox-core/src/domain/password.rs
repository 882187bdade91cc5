//! New-password form rules for the reset flow

use serde::Serialize;
use thiserror::Error;

/// Minimum length of a new password, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Please enter and confirm your new password")]
    Missing,

    #[error("Password must be at least {min} characters long")]
    TooShort { min: usize },

    #[error("Passwords don't match")]
    Mismatch,
}

/// The two password fields of the reset page
#[derive(Debug, Clone, Default)]
pub struct PasswordForm {
    pub password: String,
    pub confirm: String,
}

/// Per-rule checklist shown next to the fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordRequirements {
    pub long_enough: bool,
    pub matches: bool,
}

impl PasswordForm {
    pub fn new(password: impl Into<String>, confirm: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            confirm: confirm.into(),
        }
    }

    /// Validate the form; rules are checked in display order
    pub fn check(&self) -> Result<(), PasswordError> {
        if self.password.is_empty() || self.confirm.is_empty() {
            return Err(PasswordError::Missing);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PasswordError::TooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        if self.password != self.confirm {
            return Err(PasswordError::Mismatch);
        }
        Ok(())
    }

    pub fn requirements(&self) -> PasswordRequirements {
        PasswordRequirements {
            long_enough: self.password.chars().count() >= MIN_PASSWORD_LENGTH,
            matches: !self.password.is_empty() && self.password == self.confirm,
        }
    }
}
