//! Bearer credential type.
//!
//! The credential is an opaque token issued by the Vitalink service at
//! login. The client never inspects its contents; expiry is discovered
//! only when the service rejects it with a 401.

use core::fmt;

use serde::{Deserialize, Serialize};

/// An opaque bearer token proving identity to the Vitalink service.
///
/// At most one credential is current per browser profile; absence of a
/// credential is the valid anonymous state. The `Debug` implementation
/// redacts the token value so it never leaks into logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Create a credential from the raw token string.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// The raw token, as sent in the `Authorization: Bearer` header and
    /// in the credential cookie.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the credential and returns the raw token.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_round_trip() {
        let credential = Credential::from("eyJhbGciOiJIUzI1NiJ9.abc.def");
        assert_eq!(credential.as_str(), "eyJhbGciOiJIUzI1NiJ9.abc.def");
        assert_eq!(credential.into_inner(), "eyJhbGciOiJIUzI1NiJ9.abc.def");
    }

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::from("super-secret-token");
        let output = format!("{credential:?}");
        assert!(!output.contains("super-secret-token"));
        assert!(output.contains("REDACTED"));
    }

    #[test]
    fn test_serde_transparent() {
        let credential = Credential::from("tok123");
        let json = serde_json::to_string(&credential).expect("serialize");
        assert_eq!(json, "\"tok123\"");
        let back: Credential = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, credential);
    }
}
