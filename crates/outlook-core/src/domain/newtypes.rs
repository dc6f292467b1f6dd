//! Validated newtypes shared across the workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A validated, lowercase-normalized email address.
///
/// Used as the primary key for [`crate::domain::UserRecord`],
/// [`crate::domain::TokenRecord`], and the in-memory `Session` map. Validation
/// is intentionally conservative (single `@`, bounded local/domain parts)
/// rather than fully RFC 5322 compliant, matching what Graph itself accepts
/// for a mailbox identifier.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Validates and normalizes an email address.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let lowered = value.to_lowercase();

        let mut parts = lowered.splitn(2, '@');
        let local = parts.next().unwrap_or("");
        let domain = match parts.next() {
            Some(d) => d,
            None => return Err(DomainError::InvalidEmail(value)),
        };

        if local.is_empty() || local.len() > 64 {
            return Err(DomainError::InvalidEmail(value));
        }
        if !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".+-_".contains(c))
        {
            return Err(DomainError::InvalidEmail(value));
        }

        if domain.is_empty() || domain.len() > 255 || !domain.contains('.') {
            return Err(DomainError::InvalidEmail(value));
        }
        for label in domain.split('.') {
            if label.is_empty()
                || label.starts_with('-')
                || label.ends_with('-')
                || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                return Err(DomainError::InvalidEmail(value));
            }
        }

        Ok(Self(lowered))
    }

    /// Returns the normalized email as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for Email {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl std::hash::Hash for Email {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl FromStr for Email {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_address() {
        let email = Email::new("User@Example.COM").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn rejects_missing_at() {
        assert!(Email::new("not-an-email").is_err());
    }

    #[test]
    fn rejects_empty_local_part() {
        assert!(Email::new("@example.com").is_err());
    }

    #[test]
    fn rejects_domain_without_dot() {
        assert!(Email::new("user@localhost").is_err());
    }

    #[test]
    fn rejects_label_with_leading_hyphen() {
        assert!(Email::new("user@-example.com").is_err());
    }

    #[test]
    fn equality_is_case_insensitive_via_normalization() {
        let a = Email::new("a@Example.com").unwrap();
        let b = Email::new("A@example.COM").unwrap();
        assert_eq!(a, b);
    }
}
