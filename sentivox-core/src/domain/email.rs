//! Email domain allow-list shared by login and recovery

use thiserror::Error;

/// Suffixes accepted when nothing else is configured
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &["@esolglobal.com", "@esol.com", "@otomashen.com"];

/// Why an email address was refused before reaching the network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("Please enter your email address")]
    Missing,

    #[error("Please use an authorized email domain: {}", .allowed.join(", "))]
    DisallowedDomain { allowed: Vec<String> },
}

/// Static allow-list of permitted email suffixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDomainPolicy {
    allowed: Vec<String>,
}

impl Default for EmailDomainPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_DOMAINS.iter().copied())
    }
}

impl EmailDomainPolicy {
    /// Build a policy from suffixes such as `@esol.com` or `esol.com`
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .map(|d| if d.starts_with('@') { d } else { format!("@{}", d) })
            .collect();
        Self { allowed }
    }

    /// Allowed suffixes, normalized to lowercase with a leading `@`
    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// Check an address against the allow-list
    pub fn validate(&self, email: &str) -> Result<(), EmailError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(EmailError::Missing);
        }

        let lower = email.to_lowercase();
        if self.allowed.iter().any(|domain| lower.ends_with(domain.as_str())) {
            Ok(())
        } else {
            Err(EmailError::DisallowedDomain {
                allowed: self.allowed.clone(),
            })
        }
    }

    pub fn is_allowed(&self, email: &str) -> bool {
        self.validate(email).is_ok()
    }
}
