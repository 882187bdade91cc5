//! Sentivox authentication API client
//!
//! Talks to the dashboard's `/api/auth/*` endpoints. The server tracks the
//! session with a cookie; the cookie jar can be persisted in a
//! [`KeyValueStore`] so separate CLI invocations share one session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::result::{Error, Result};
use crate::domain::{Identity, SessionCheck};
use crate::ports::{AuthService, KeyValueStore};

/// Default API URL for a locally running dashboard
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Environment variable to override the API base URL
pub const SENTIVOX_API_URL_ENV: &str = "SENTIVOX_API_URL";

/// Store key holding the serialized session cookies
pub const SESSION_COOKIE_KEY: &str = "sentivox_session_cookie";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const LOGIN_FAILED: &str = "Invalid credentials. Please try again.";
const RECOVERY_FAILED: &str = "Failed to send reset email. Please try again.";
const RESET_FAILED: &str = "Failed to reset password. Please try again.";

// =============================================================================
// API Models
// =============================================================================

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    #[serde(default)]
    user: Option<Identity>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    valid: bool,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct RecoveryRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct ResetRequest<'a> {
    email: &'a str,
    token: &'a str,
    password: &'a str,
}

// =============================================================================
// HTTP Client
// =============================================================================

/// Get the API base URL, checking the environment variable first
pub fn get_base_url() -> String {
    std::env::var(SENTIVOX_API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// HTTP implementation of [`AuthService`]
pub struct HttpAuthService {
    client: Client,
    base_url: String,
    cookie_url: Url,
    jar: Arc<Jar>,
    cookie_store: Option<Arc<dyn KeyValueStore>>,
    timeout: Duration,
}

impl HttpAuthService {
    /// Create a client for the given base URL
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            anyhow::bail!("API base URL cannot be empty");
        }
        let cookie_url =
            Url::parse(base_url).with_context(|| format!("Invalid API base URL: {}", base_url))?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            cookie_url,
            jar,
            cookie_store: None,
            timeout,
        })
    }

    /// Restore session cookies from `store` and keep them there after every response
    pub fn with_cookie_persistence(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        if let Ok(Some(saved)) = store.get(SESSION_COOKIE_KEY) {
            for cookie in saved.split(';').map(str::trim).filter(|c| !c.is_empty()) {
                self.jar.add_cookie_str(cookie, &self.cookie_url);
            }
        }
        self.cookie_store = Some(store);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Save the jar's cookies for the API host; failures only lose persistence
    fn persist_cookies(&self) {
        let Some(store) = &self.cookie_store else {
            return;
        };
        let header = self
            .jar
            .cookies(&self.cookie_url)
            .and_then(|value| value.to_str().ok().map(str::to_string));
        let _ = match header {
            Some(cookies) if !cookies.is_empty() => store.set(SESSION_COOKIE_KEY, &cookies),
            _ => store.remove(SESSION_COOKIE_KEY),
        };
    }

    fn forget_cookies(&self) {
        if let Some(store) = &self.cookie_store {
            let _ = store.remove(SESSION_COOKIE_KEY);
        }
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::network(format!(
                "Connection timed out after {} seconds",
                self.timeout.as_secs()
            ))
        } else if error.is_connect() {
            Error::network("Unable to connect to the Sentivox server")
        } else {
            Error::network(format!("Request failed: {}", error))
        }
    }

    /// Pull the server's `message` out of an error body
    async fn read_message(response: Response) -> Option<String> {
        response
            .json::<MessageBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .filter(|m| !m.trim().is_empty())
    }

    /// Map a non-success status: client errors are refusals, anything else has
    /// no definitive answer
    async fn refusal(
        response: Response,
        fallback: &str,
        refuse: fn(String) -> Error,
    ) -> Error {
        let status = response.status();
        if status.is_client_error() {
            let message = Self::read_message(response)
                .await
                .unwrap_or_else(|| fallback.to_string());
            refuse(message)
        } else {
            Error::network(format!("Server error: HTTP {}", status.as_u16()))
        }
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn session_check(&self) -> Result<SessionCheck> {
        let response = self
            .client
            .get(self.endpoint("/api/auth/me"))
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;
        self.persist_cookies();

        match response.status() {
            status if status.is_success() => {
                let body: UserEnvelope = response.json().await.map_err(|e| {
                    Error::network(format!("Failed to parse session response: {}", e))
                })?;
                Ok(match body.user {
                    Some(identity) => SessionCheck::Authenticated(identity),
                    None => SessionCheck::NotAuthenticated,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(SessionCheck::NotAuthenticated),
            status => Err(Error::network(format!(
                "Session check failed: HTTP {}",
                status.as_u16()
            ))),
        }
    }

    async fn login(&self, email: &str, password: Option<&str>) -> Result<Identity> {
        let body = LoginRequest {
            email,
            password: password.filter(|p| !p.is_empty()),
        };
        let response = self
            .client
            .post(self.endpoint("/api/auth/login"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;
        self.persist_cookies();

        if !response.status().is_success() {
            return Err(Self::refusal(response, LOGIN_FAILED, Error::Authentication).await);
        }

        let body: UserEnvelope = response
            .json()
            .await
            .map_err(|e| Error::network(format!("Failed to parse login response: {}", e)))?;
        body.user
            .ok_or_else(|| Error::authentication(LOGIN_FAILED))
    }

    async fn logout(&self) -> Result<()> {
        let result = self
            .client
            .post(self.endpoint("/api/auth/logout"))
            .send()
            .await;
        // The local session is over whatever the server says
        self.forget_cookies();

        let response = result.map_err(|e| self.map_request_error(e))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::network(format!(
                "Logout failed: HTTP {}",
                response.status().as_u16()
            )))
        }
    }

    async fn request_recovery(&self, email: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("/api/auth/forgot-password"))
            .json(&RecoveryRequest { email })
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::refusal(response, RECOVERY_FAILED, Error::Rejected).await)
        }
    }

    async fn verify_recovery_token(&self, token: &str, email: &str) -> Result<bool> {
        let response = self
            .client
            .get(self.endpoint("/api/auth/verify-reset-token"))
            .query(&[("token", token), ("email", email)])
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| Error::network(format!("Failed to parse verification response: {}", e)))?;
        Ok(body.valid)
    }

    async fn submit_recovery(&self, email: &str, token: &str, new_password: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("/api/auth/reset-password"))
            .json(&ResetRequest {
                email,
                token,
                password: new_password,
            })
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::refusal(response, RESET_FAILED, Error::Rejected).await)
        }
    }
}
