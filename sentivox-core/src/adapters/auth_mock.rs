//! Mock Sentivox authentication server for testing
//!
//! A small HTTP server on a random local port that simulates the dashboard's
//! `/api/auth/*` endpoints, so the HTTP adapter can be tested end to end:
//! - GET  /api/auth/me returns { user } for a signed-in cookie, 401 otherwise
//! - POST /api/auth/login sets the session cookie on valid credentials
//! - POST /api/auth/logout expires the cookie
//! - POST /api/auth/forgot-password always answers with the same success
//! - GET  /api/auth/verify-reset-token returns { valid }
//! - POST /api/auth/reset-password accepts the configured token once per request

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use serde_json::{json, Value as JsonValue};
use url::form_urlencoded;

use crate::domain::{Identity, Role};

const SESSION_COOKIE: &str = "sid=mock-session";

/// Mock authentication server
pub struct MockAuthServer {
    port: u16,
    running: Arc<AtomicBool>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Configuration for the mock server
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// The only account the server knows
    pub user: Identity,
    pub password: String,
    /// Token accepted by verify/reset
    pub valid_token: String,
    /// Answer every request with this status instead of routing it
    pub fail_status: Option<u16>,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            user: Identity::new("u1", "a@esol.com")
                .with_name("Ada Recruiter")
                .with_role(Role::Recruiter),
            password: "correct horse".to_string(),
            valid_token: "valid-token".to_string(),
            fail_status: None,
            delay_ms: 0,
        }
    }
}

/// A parsed HTTP request
struct MockRequest {
    method: String,
    path: String,
    query: String,
    headers: String,
    body: JsonValue,
}

impl MockRequest {
    fn has_session(&self) -> bool {
        self.headers
            .lines()
            .filter(|l| l.to_lowercase().starts_with("cookie:"))
            .any(|l| l.contains(SESSION_COOKIE))
    }

    fn query_param(&self, name: &str) -> Option<String> {
        form_urlencoded::parse(self.query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    fn body_str(&self, name: &str) -> Option<&str> {
        self.body.get(name).and_then(JsonValue::as_str)
    }
}

impl MockAuthServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        // Non-blocking accept so the server can shut down
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        thread::spawn(move || {
                            handle_connection(stream, &cfg);
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            thread_handle: Some(thread_handle),
        })
    }

    /// Get the base URL for this mock server
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockAuthServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_request(stream: &mut TcpStream) -> Option<MockRequest> {
    stream.set_nonblocking(false).ok()?;

    let mut data = Vec::new();
    let mut buffer = [0; 4096];
    let header_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }

    let body = serde_json::from_slice(&data[header_end..]).unwrap_or(JsonValue::Null);

    let first_line = headers.lines().next().unwrap_or("");
    let mut parts = first_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?;
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    Some(MockRequest {
        method,
        path: path.to_string(),
        query: query.to_string(),
        headers,
        body,
    })
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig) {
    let Some(request) = read_request(&mut stream) else {
        return;
    };

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    if let Some(status) = config.fail_status {
        send_response(&mut stream, status, None, &json!({"message": "Simulated failure"}));
        return;
    }

    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/api/auth/me") => {
            if request.has_session() {
                send_response(&mut stream, 200, None, &json!({ "user": config.user }));
            } else {
                send_response(&mut stream, 401, None, &json!({"message": "Not authenticated"}));
            }
        }
        ("POST", "/api/auth/login") => {
            let email_ok = request.body_str("email") == Some(config.user.email.as_str());
            let password_ok = match request.body_str("password") {
                Some(password) => password == config.password,
                // Absent password is the default-credential flow
                None => config.user.is_default_password,
            };
            if email_ok && password_ok {
                send_response(
                    &mut stream,
                    200,
                    Some(&format!("{}; Path=/; HttpOnly", SESSION_COOKIE)),
                    &json!({ "user": config.user }),
                );
            } else {
                send_response(
                    &mut stream,
                    401,
                    None,
                    &json!({"message": "Invalid email or password"}),
                );
            }
        }
        ("POST", "/api/auth/logout") => {
            send_response(
                &mut stream,
                200,
                Some("sid=; Path=/; Max-Age=0"),
                &json!({"message": "Logged out"}),
            );
        }
        ("POST", "/api/auth/forgot-password") => {
            // Same answer whether or not the account exists
            send_response(
                &mut stream,
                200,
                None,
                &json!({"message": "If an account exists with this email, a password reset link has been sent."}),
            );
        }
        ("GET", "/api/auth/verify-reset-token") => {
            let valid = request.query_param("token").as_deref() == Some(config.valid_token.as_str())
                && request.query_param("email").as_deref() == Some(config.user.email.as_str());
            if valid {
                send_response(&mut stream, 200, None, &json!({"valid": true}));
            } else {
                send_response(
                    &mut stream,
                    400,
                    None,
                    &json!({"valid": false, "message": "Invalid or expired reset token"}),
                );
            }
        }
        ("POST", "/api/auth/reset-password") => {
            let token_ok = request.body_str("token") == Some(config.valid_token.as_str());
            let password_ok = request
                .body_str("password")
                .map(|p| p.chars().count() >= 8)
                .unwrap_or(false);
            if !token_ok {
                send_response(
                    &mut stream,
                    400,
                    None,
                    &json!({"message": "Invalid or expired reset token"}),
                );
            } else if !password_ok {
                send_response(
                    &mut stream,
                    400,
                    None,
                    &json!({"message": "Password must be at least 8 characters long"}),
                );
            } else {
                send_response(&mut stream, 200, None, &json!({"message": "Password reset"}));
            }
        }
        _ => {
            send_response(&mut stream, 404, None, &json!({"message": "Endpoint not found"}));
        }
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

fn send_response(stream: &mut TcpStream, status: u16, set_cookie: Option<&str>, body: &JsonValue) {
    let body = body.to_string();
    let cookie_header = set_cookie
        .map(|c| format!("Set-Cookie: {}\r\n", c))
        .unwrap_or_default();
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text(status),
        cookie_header,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http_auth::{HttpAuthService, SESSION_COOKIE_KEY};
    use crate::adapters::memory::MemoryStore;
    use crate::domain::result::Error;
    use crate::domain::SessionCheck;
    use crate::ports::{AuthService, KeyValueStore};
    use std::time::Duration;

    fn client(server: &MockAuthServer) -> HttpAuthService {
        HttpAuthService::new(&server.base_url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_session_check_without_cookie_is_not_authenticated() {
        let server = MockAuthServer::start(MockConfig::default()).unwrap();
        let check = client(&server).session_check().await.unwrap();
        assert_eq!(check, SessionCheck::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_login_then_session_check() {
        let config = MockConfig::default();
        let server = MockAuthServer::start(config.clone()).unwrap();
        let auth = client(&server);

        let identity = auth
            .login("a@esol.com", Some("correct horse"))
            .await
            .unwrap();
        assert_eq!(identity, config.user);

        let check = auth.session_check().await.unwrap();
        assert_eq!(check, SessionCheck::Authenticated(config.user));
    }

    #[tokio::test]
    async fn test_bad_password_is_authentication_error_with_server_message() {
        let server = MockAuthServer::start(MockConfig::default()).unwrap();
        let err = client(&server)
            .login("a@esol.com", Some("wrong"))
            .await
            .unwrap_err();
        match err {
            Error::Authentication(message) => assert_eq!(message, "Invalid email or password"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_default_credential_login_sends_no_password() {
        let mut config = MockConfig::default();
        config.user = config.user.with_default_password(true);
        let server = MockAuthServer::start(config).unwrap();

        let identity = client(&server).login("a@esol.com", Some("")).await.unwrap();
        assert!(identity.is_default_password);
    }

    #[tokio::test]
    async fn test_cookie_is_persisted_across_clients() {
        let server = MockAuthServer::start(MockConfig::default()).unwrap();
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

        let first = client(&server).with_cookie_persistence(Arc::clone(&store));
        first.login("a@esol.com", Some("correct horse")).await.unwrap();
        assert!(store.get(SESSION_COOKIE_KEY).unwrap().is_some());

        let second = client(&server).with_cookie_persistence(Arc::clone(&store));
        assert!(matches!(
            second.session_check().await.unwrap(),
            SessionCheck::Authenticated(_)
        ));

        second.logout().await.unwrap();
        assert_eq!(store.get(SESSION_COOKIE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let server = MockAuthServer::start(MockConfig {
            fail_status: Some(503),
            ..Default::default()
        })
        .unwrap();
        let err = client(&server).session_check().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let server = MockAuthServer::start(MockConfig::default()).unwrap();
        let url = server.base_url();
        drop(server);

        let auth = HttpAuthService::new(&url, Duration::from_secs(2)).unwrap();
        let err = auth.session_check().await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_recovery_request_is_uniform() {
        let server = MockAuthServer::start(MockConfig::default()).unwrap();
        let auth = client(&server);
        auth.request_recovery("a@esol.com").await.unwrap();
        auth.request_recovery("nobody@esol.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_token() {
        let server = MockAuthServer::start(MockConfig::default()).unwrap();
        let auth = client(&server);
        assert!(auth
            .verify_recovery_token("valid-token", "a@esol.com")
            .await
            .unwrap());
        assert!(!auth
            .verify_recovery_token("expired-token", "a@esol.com")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_submit_recovery() {
        let server = MockAuthServer::start(MockConfig::default()).unwrap();
        let auth = client(&server);

        auth.submit_recovery("a@esol.com", "valid-token", "new password")
            .await
            .unwrap();

        let err = auth
            .submit_recovery("a@esol.com", "other-token", "new password")
            .await
            .unwrap_err();
        match err {
            Error::Rejected(reason) => assert_eq!(reason, "Invalid or expired reset token"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        let server = MockAuthServer::start(MockConfig::default()).unwrap();
        let response = reqwest::get(format!("{}/api/other", server.base_url()))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);
    }
}
