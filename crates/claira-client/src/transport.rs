//! Authenticated transport: token lifecycle and request execution.
//!
//! One [`ClairaClient`] owns a reqwest client and a [`CredentialStore`].
//! Every request resolves base URLs from the current credential snapshot,
//! obtains a usable access token (cached, refreshed, or freshly issued), and
//! carries it as a bearer header. A 401 triggers exactly one independent
//! re-authentication and retry; everything else propagates as-is.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Method, StatusCode};
use serde_json::{json, Value};

use claira_types::environment::{self, ResolvedUrls};
use claira_types::{Credentials, TokenGrant, TokenResponse};

use crate::error::{ClientError, Result};
use crate::store::CredentialStore;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Body-level keys the upstream uses for error messages, in the order they
/// are worth trying.
const ERROR_MESSAGE_KEYS: &[&str] = &["message", "error", "detail", "description", "msg", "file"];

/// Authenticated Claira Platform client.
pub struct ClairaClient {
    http: reqwest::Client,
    store: Arc<dyn CredentialStore>,
}

impl ClairaClient {
    pub fn new(store: Arc<dyn CredentialStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, store })
    }

    /// The credential store this client reads from and writes back to.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// The underlying HTTP client, for handlers that build non-JSON bodies.
    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Base URLs for the current credential snapshot.
    pub async fn resolved_urls(&self) -> ResolvedUrls {
        environment::resolve(&self.store.get().await)
    }

    // ---- token lifecycle -------------------------------------------------

    /// Return a usable access token, authenticating if necessary.
    ///
    /// A cached token inside its validity window (expiry minus the 5-minute
    /// skew) is returned without any network call. Otherwise a refresh is
    /// attempted, and on any refresh failure a full login; only the login
    /// failure is fatal.
    pub async fn ensure_authenticated(&self) -> Result<String> {
        let credentials = self.store.get().await;
        if credentials.token_usable() {
            if let Some(token) = credentials.access_token.clone() {
                return Ok(token);
            }
        }
        self.authenticate(credentials).await
    }

    /// Authenticate ignoring any cached token.
    ///
    /// Used after a 401: the token just presented was rejected regardless of
    /// what the expiry bookkeeping says, so this is a second independent
    /// authentication attempt, never a cache read.
    async fn reauthenticate(&self) -> Result<String> {
        let credentials = self.store.get().await;
        self.authenticate(credentials).await
    }

    async fn authenticate(&self, credentials: Credentials) -> Result<String> {
        let urls = environment::resolve(&credentials);

        if let Some(refresh_token) =
            credentials.refresh_token.clone().filter(|token| !token.is_empty())
        {
            match self.refresh(&urls.auth_url, &refresh_token).await {
                Ok(grant) => return self.adopt_grant(credentials, grant).await,
                // A failed refresh is not an error, it means "must re-login".
                Err(err) => {
                    tracing::debug!("token refresh failed, falling back to login: {err}");
                }
            }
        }

        let grant = self.login(&urls.auth_url, &credentials).await?;
        self.adopt_grant(credentials, grant).await
    }

    /// Record a grant on the credential and offer it back to the store.
    async fn adopt_grant(&self, mut credentials: Credentials, grant: TokenGrant) -> Result<String> {
        let access_token = grant.access_token.clone();
        credentials.apply_grant(grant.access_token, grant.refresh_token);
        if !self.store.try_set(credentials).await {
            tracing::debug!("credential store declined the write; tokens are transient");
        }
        Ok(access_token)
    }

    async fn refresh(&self, auth_url: &str, refresh_token: &str) -> Result<TokenGrant> {
        let response = self
            .http
            .get(format!("{auth_url}/refresh/"))
            .header(header::AUTHORIZATION, format!("Bearer {refresh_token}"))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Authentication {
                message: format!("refresh rejected ({}): {body}", status.as_u16()),
            });
        }

        let envelope: TokenResponse = response
            .json()
            .await
            .map_err(|err| ClientError::InvalidResponse(format!("token envelope: {err}")))?;
        Ok(envelope.data)
    }

    async fn login(&self, auth_url: &str, credentials: &Credentials) -> Result<TokenGrant> {
        tracing::debug!(email = %credentials.email, "logging in");
        let response = self
            .http
            .post(format!("{auth_url}/login/"))
            .header(header::ACCEPT, "application/json")
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await
            .map_err(|err| ClientError::Authentication { message: err.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Authentication {
                message: format!("login rejected ({}): {body}", status.as_u16()),
            });
        }

        let envelope: TokenResponse = response
            .json()
            .await
            .map_err(|err| ClientError::InvalidResponse(format!("token envelope: {err}")))?;
        Ok(envelope.data)
    }

    // ---- request execution -----------------------------------------------

    /// Request against the document-analysis service.
    pub async fn api_request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value> {
        let urls = self.resolved_urls().await;
        let url = format!("{}{endpoint}", urls.doc_analysis_url);
        self.send_json(method, url, query, body).await
    }

    /// Request against the authentication service.
    pub async fn auth_request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value> {
        let urls = self.resolved_urls().await;
        let url = format!("{}{endpoint}", urls.auth_url);
        self.send_json(method, url, query, body).await
    }

    async fn send_json(
        &self,
        method: Method,
        url: String,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Value> {
        self.send_with_reauth(|token| {
            let mut request = self
                .http
                .request(method.clone(), &url)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::ACCEPT, "application/json")
                .header(header::CONTENT_TYPE, "application/json");
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(ref body) = body {
                request = request.json(body);
            }
            request
        })
        .await
    }

    /// Send a request with bearer auth, retrying exactly once on 401.
    ///
    /// `build` constructs the request for a given access token, so the retry
    /// rebuilds the whole request (multipart bodies cannot be replayed from
    /// the first attempt). Any failure on the retry, another 401 included,
    /// propagates.
    pub(crate) async fn send_with_reauth<F>(&self, build: F) -> Result<Value>
    where
        F: Fn(&str) -> reqwest::RequestBuilder,
    {
        let token = self.ensure_authenticated().await?;
        let response = build(&token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("401 from upstream, re-authenticating and retrying once");
            let token = self.reauthenticate().await?;
            let response = build(&token).send().await?;
            return parse_response(response).await;
        }

        parse_response(response).await
    }
}

/// Turn an HTTP response into a JSON payload or a [`ClientError::Api`].
async fn parse_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        if text.trim().is_empty() {
            // DELETE and friends can legitimately return an empty body.
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&text)?);
    }

    let body: Option<Value> = serde_json::from_str(&text).ok();
    let message = body
        .as_ref()
        .and_then(extract_error_message)
        .or_else(|| (!text.is_empty()).then(|| text.clone()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    tracing::warn!(status = status.as_u16(), %message, "upstream request failed");
    Err(ClientError::Api { status: status.as_u16(), message, body })
}

/// Pull a human-readable message out of an upstream error body.
///
/// The upstream reports errors under several keys depending on the endpoint;
/// field-specific errors (like `file`) may be a list.
fn extract_error_message(body: &Value) -> Option<String> {
    let object = body.as_object()?;
    for key in ERROR_MESSAGE_KEYS {
        match object.get(*key) {
            Some(Value::String(message)) if !message.is_empty() => return Some(message.clone()),
            Some(Value::Array(entries)) => {
                if let Some(Value::String(message)) = entries.first() {
                    return Some(message.clone());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_key_priority() {
        let body = json!({"detail": "nope", "message": "broken"});
        assert_eq!(extract_error_message(&body).as_deref(), Some("broken"));
    }

    #[test]
    fn test_error_message_from_field_list() {
        let body = json!({"file": ["File type not supported"]});
        assert_eq!(extract_error_message(&body).as_deref(), Some("File type not supported"));
    }

    #[test]
    fn test_error_message_absent() {
        assert!(extract_error_message(&json!({"code": 500})).is_none());
        assert!(extract_error_message(&json!("plain")).is_none());
    }
}
