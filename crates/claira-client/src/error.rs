//! Error types for the Claira client.

use thiserror::Error;

/// Errors that can occur when using the Claira client.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ClientError {
    /// HTTP transport failed (connection, TLS, timeout).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Login (or refresh-then-login) failed. Fatal for the current item.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// What the auth service reported
        message: String,
    },

    /// Upstream returned a non-2xx response (a second 401 on retry included).
    #[error("Request failed ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body, or the raw body
        message: String,
        /// Parsed response body when it was JSON
        body: Option<serde_json::Value>,
    },

    /// A user-supplied field failed validation before any network call.
    #[error("Invalid value for {field}: {message}")]
    MalformedInput {
        /// Host-facing parameter name
        field: String,
        /// What was wrong, including an example of valid input
        message: String,
    },

    /// A successfully fetched listing did not contain the requested entity.
    #[error("{kind} with ID {id} not found")]
    MissingResource {
        /// Entity kind, e.g. "Report Agent"
        kind: String,
        /// The ID that was looked up
        id: String,
    },

    /// The named binary slot carries no payload.
    #[error("No binary data found with property name \"{requested}\". Available binary properties: {available}")]
    MissingBinary {
        /// Slot name that was requested
        requested: String,
        /// Comma-separated available slot names, or "none"
        available: String,
    },

    /// Polling for an answer exceeded the operator-supplied timeout.
    #[error("Timed out after {seconds}s waiting for a response")]
    Timeout {
        /// The timeout that elapsed
        seconds: u64,
    },

    /// Upstream returned a body the client could not interpret
    /// (e.g. a token envelope without an access token).
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for Claira client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
