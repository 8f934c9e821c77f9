//! The credential record owned by the hosting context.

use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::token::{ASSUMED_LIFETIME_MS, EXPIRY_SKEW_MS};

/// Claira Platform credential.
///
/// Created by user configuration before any call; the token fields are
/// mutated on every login/refresh and written back when the owning store
/// supports mutation. Never deleted by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Account email address
    pub email: String,
    /// Account password
    pub password: String,
    /// Named environment; defaults to the production platform
    #[serde(default)]
    pub environment: Environment,
    /// Optional override for the auth service base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_base_url: Option<String>,
    /// Optional override for the document-analysis service base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_analysis_base_url: Option<String>,
    /// Cached access token from the last login/refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Cached refresh token from the last login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Access token expiry as epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expiry_ms: Option<i64>,
}

impl Credentials {
    /// Credential for `email`/`password` against the default environment.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into(), ..Self::default() }
    }

    /// Whether the cached access token is still usable at `now_ms`.
    ///
    /// A token is usable only while `now < expiry - 5 minutes`; the skew
    /// guards against the token expiring between the check and the moment
    /// the request reaches the server.
    pub fn token_usable_at(&self, now_ms: i64) -> bool {
        match (&self.access_token, self.token_expiry_ms) {
            (Some(token), Some(expiry_ms)) if !token.is_empty() => {
                now_ms < expiry_ms.saturating_sub(EXPIRY_SKEW_MS)
            }
            _ => false,
        }
    }

    /// Whether the cached access token is usable right now.
    pub fn token_usable(&self) -> bool {
        self.token_usable_at(chrono::Utc::now().timestamp_millis())
    }

    /// Record a freshly issued access token (and optionally a refresh token).
    ///
    /// The API does not report a token lifetime, so expiry is assumed to be
    /// exactly one hour from issuance.
    pub fn apply_grant(&mut self, access_token: String, refresh_token: Option<String>) {
        self.access_token = Some(access_token);
        if let Some(refresh) = refresh_token {
            self.refresh_token = Some(refresh);
        }
        self.token_expiry_ms =
            Some(chrono::Utc::now().timestamp_millis().saturating_add(ASSUMED_LIFETIME_MS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_token(expiry_offset_ms: i64) -> (Credentials, i64) {
        let now_ms = 1_700_000_000_000;
        let credentials = Credentials {
            email: "user@example.com".to_string(),
            password: "secret".to_string(),
            access_token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
            token_expiry_ms: Some(now_ms + expiry_offset_ms),
            ..Credentials::default()
        };
        (credentials, now_ms)
    }

    #[test]
    fn test_token_usable_outside_skew() {
        let (credentials, now_ms) = with_token(10 * 60 * 1000);
        assert!(credentials.token_usable_at(now_ms));
    }

    #[test]
    fn test_token_unusable_inside_skew() {
        let (credentials, now_ms) = with_token(4 * 60 * 1000);
        assert!(!credentials.token_usable_at(now_ms));
    }

    #[test]
    fn test_token_unusable_without_expiry() {
        let (mut credentials, now_ms) = with_token(10 * 60 * 1000);
        credentials.token_expiry_ms = None;
        assert!(!credentials.token_usable_at(now_ms));
    }

    #[test]
    fn test_apply_grant_keeps_refresh_token_when_absent() {
        let (mut credentials, _) = with_token(0);
        credentials.apply_grant("new-access".to_string(), None);

        assert_eq!(credentials.access_token.as_deref(), Some("new-access"));
        assert_eq!(credentials.refresh_token.as_deref(), Some("refresh"));
        assert!(credentials.token_usable());
    }
}
