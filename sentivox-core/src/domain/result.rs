//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::email::EmailError;
use super::password::PasswordError;

/// Message shown for any failure that has no definitive server answer
pub const GENERIC_RETRY_MESSAGE: &str = "An error occurred. Please try again.";

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidEmail(#[from] EmailError),

    #[error("{0}")]
    InvalidPassword(#[from] PasswordError),

    /// Bad credentials on login
    #[error("Login failed: {0}")]
    Authentication(String),

    /// The service refused a recovery request or password reset
    #[error("Request refused: {0}")]
    Rejected(String),

    /// Recovery link is missing, unknown or expired
    #[error("This password reset link is invalid or has expired. Please request a new one.")]
    InvalidToken,

    /// Timeout, connection failure or an undecodable response
    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rejection error carrying the server's reason
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Whether the user can simply try the same action again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Text to show the user
    ///
    /// Transport failures collapse into one generic retry message; server
    /// reasons and validation messages are shown as-is.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => GENERIC_RETRY_MESSAGE.to_string(),
            Self::Authentication(reason) | Self::Rejected(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for JSON output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }

    /// Attach a context value
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => {
                let retryable = e.is_retryable();
                Self::fail(e.user_message())
                    .with_context("retryable", serde_json::Value::Bool(retryable))
            }
        }
    }
}
