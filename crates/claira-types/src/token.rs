//! Token envelopes and expiry bookkeeping.

use serde::{Deserialize, Serialize};

/// Safety margin subtracted from the expiry when deciding whether a cached
/// access token can still be presented (5 minutes).
pub const EXPIRY_SKEW_MS: i64 = 5 * 60 * 1000;

/// Assumed access token lifetime (1 hour). The API does not return an
/// explicit lifetime with the grant.
pub const ASSUMED_LIFETIME_MS: i64 = 60 * 60 * 1000;

/// Envelope returned by the login and refresh endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// The issued token pair
    pub data: TokenGrant,
}

/// Token pair issued by the auth service.
///
/// The refresh endpoint may omit `refresh_token`, in which case the
/// previously stored one remains valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenGrant {
    /// Short-lived bearer credential for API calls
    pub access_token: String,
    /// Longer-lived credential used to obtain a new access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_envelope_parses() {
        let envelope: TokenResponse = serde_json::from_str(
            r#"{"data":{"access_token":"acc-1","refresh_token":"ref-1"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.data.access_token, "acc-1");
        assert_eq!(envelope.data.refresh_token.as_deref(), Some("ref-1"));
    }

    #[test]
    fn test_refresh_envelope_without_refresh_token() {
        let envelope: TokenResponse =
            serde_json::from_str(r#"{"data":{"access_token":"acc-2"}}"#).unwrap();
        assert_eq!(envelope.data.access_token, "acc-2");
        assert!(envelope.data.refresh_token.is_none());
    }
}
