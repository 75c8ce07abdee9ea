//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum EmailError {
    /// The input string is empty or longer than the RFC 5321 limit.
    #[error("email must be between 1 and {} characters", Email::MAX_LENGTH)]
    InvalidLength,
    /// The input is not of the form `local@domain`.
    #[error("email must be of the form local@domain")]
    InvalidStructure,
}

/// A structurally valid email address.
///
/// Validation is deliberately shallow: the address must be non-empty,
/// at most 254 characters, and have non-empty text on both sides of a
/// single `@`. Whether the mailbox exists is the service's problem.
///
/// Deserialization goes through [`Email::parse`], so a stored or wire
/// value that fails the structural check is a deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] if the input is empty, too long, or not of
    /// the form `local@domain`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() || s.len() > Self::MAX_LENGTH {
            return Err(EmailError::InvalidLength);
        }

        match s.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(s.to_owned()))
            }
            _ => Err(EmailError::InvalidStructure),
        }
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(Email::parse("donor@example.com").is_ok());
        assert!(Email::parse("first.last+tag@clinic.org").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Email::parse(""), Err(EmailError::InvalidLength)));
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}@example.com", "a".repeat(300));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::InvalidLength)
        ));
    }

    #[test]
    fn test_parse_missing_parts() {
        assert!(Email::parse("no-at-symbol").is_err());
        assert!(Email::parse("@example.com").is_err());
        assert!(Email::parse("donor@").is_err());
    }

    #[test]
    fn test_display_matches_input() {
        let email = Email::parse("donor@example.com").expect("valid email");
        assert_eq!(email.to_string(), "donor@example.com");
    }

    #[test]
    fn test_deserialize_validates_structure() {
        let email: Email = serde_json::from_str(r#""donor@example.com""#).expect("valid email");
        assert_eq!(email.as_str(), "donor@example.com");

        let err = serde_json::from_str::<Email>(r#""not-an-email""#);
        assert!(err.is_err());
    }
}
