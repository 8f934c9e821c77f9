//! Named environments and base URL resolution.
//!
//! The platform runs two services per environment: the authentication
//! service (login, refresh, user records) and the document-analysis service
//! (everything else). The mapping is a compile-time table; per-credential
//! overrides win over the table.

use serde::{Deserialize, Serialize};

use crate::credential::Credentials;

/// Named Claira Platform environment.
///
/// Unknown names deserialize to [`Environment::Platform`], which is also the
/// default when the credential omits the field.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Stable testing environment
    Stable,
    /// Development environment
    Dev,
    /// Local development environment
    Local,
    /// Production platform environment
    #[default]
    #[serde(other)]
    Platform,
}

impl Environment {
    /// Environment name as it appears in credential records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Platform => "platform",
            Environment::Stable => "stable",
            Environment::Dev => "dev",
            Environment::Local => "local",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base URLs for one environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentUrls {
    /// Authentication service base URL
    pub auth: &'static str,
    /// Document-analysis service base URL (versioned)
    pub doc_analysis: &'static str,
}

impl Environment {
    /// Table-defined base URLs for this environment.
    pub fn urls(&self) -> EnvironmentUrls {
        match self {
            Environment::Platform => EnvironmentUrls {
                auth: "https://auth.platform.claira.io",
                doc_analysis: "https://da.platform.claira.io/v2",
            },
            Environment::Stable => EnvironmentUrls {
                auth: "https://claira-auth.stable.aws.claira.io",
                doc_analysis: "https://claira-doc-analysis.stable.aws.claira.io/v2",
            },
            Environment::Dev => EnvironmentUrls {
                auth: "https://claira-auth.dev.aws.claira.io",
                doc_analysis: "https://claira-doc-analysis.dev.aws.claira.io/v2",
            },
            Environment::Local => EnvironmentUrls {
                auth: "http://localhost:4999",
                doc_analysis: "http://localhost:4998/v2",
            },
        }
    }
}

/// Concrete base URLs resolved for one credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrls {
    /// Authentication service base URL
    pub auth_url: String,
    /// Document-analysis service base URL
    pub doc_analysis_url: String,
}

/// Resolve base URLs for a credential.
///
/// A non-empty override URL on the credential wins outright for that service,
/// regardless of the named environment. Pure and infallible: an absent or
/// unrecognized environment falls back to the platform defaults.
pub fn resolve(credentials: &Credentials) -> ResolvedUrls {
    let table = credentials.environment.urls();

    let auth_url = credentials
        .auth_base_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .unwrap_or(table.auth)
        .to_string();

    let doc_analysis_url = credentials
        .doc_analysis_base_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .unwrap_or(table.doc_analysis)
        .to_string();

    ResolvedUrls { auth_url, doc_analysis_url }
}
