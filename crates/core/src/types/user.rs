//! Cached user summary.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// Denormalized identity fields cached alongside the credential.
///
/// Matches the shape of the service's auth response. The summary exists
/// purely so the UI can greet the user without a round trip; it is never
/// consulted for authorization decisions. It is written atomically with
/// the credential and cleared with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User's service-side ID.
    pub user_id: UserId,
    /// Given name, for display.
    pub first_name: String,
    /// Family name, for display.
    pub last_name: String,
    /// Email address, for display.
    pub email: Email,
}

impl UserSummary {
    /// Full display name, `"First Last"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_service_auth_response_shape() {
        let json = r#"{
            "userId": 12,
            "firstName": "Asha",
            "lastName": "Rao",
            "email": "asha@example.com"
        }"#;

        let summary: UserSummary = serde_json::from_str(json).expect("valid shape");
        assert_eq!(summary.user_id, UserId::new(12));
        assert_eq!(summary.full_name(), "Asha Rao");
        assert_eq!(summary.email.as_str(), "asha@example.com");
    }

    #[test]
    fn test_structurally_invalid_email_rejects_whole_summary() {
        let json = r#"{
            "userId": 12,
            "firstName": "Asha",
            "lastName": "Rao",
            "email": "not-an-email"
        }"#;

        assert!(serde_json::from_str::<UserSummary>(json).is_err());
    }

    #[test]
    fn test_round_trip_preserves_camel_case() {
        let summary = UserSummary {
            user_id: UserId::new(1),
            first_name: "Noor".to_owned(),
            last_name: "Haddad".to_owned(),
            email: Email::parse("noor@example.com").expect("valid email"),
        };

        let json = serde_json::to_string(&summary).expect("serialize");
        assert!(json.contains("\"firstName\""));
        assert!(json.contains("\"userId\""));
        let back: UserSummary = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, summary);
    }
}
