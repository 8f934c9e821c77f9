//! Document model types and entity aliases.

use serde::{Deserialize, Serialize};

/// Entities (deals, documents, folders, financial data, templates, users,
/// clients) are opaque to the transport core: it only needs to locate the
/// array of them inside a response envelope, never their internal schema.
pub type Entity = serde_json::Value;

/// Document model type. Selects the service module an endpoint lives under
/// (`/{model_type}/docs/`, `/{model_type}/folders/`, ...).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Credit analysis module (deals, dashboards, financial data)
    #[default]
    CreditAnalysis,
    Libor,
    Loan,
    Clo,
    Ftm,
    Cre,
    LendingManager,
    Mockup,
}

impl ModelType {
    /// Path segment for this model type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::CreditAnalysis => "credit_analysis",
            ModelType::Libor => "libor",
            ModelType::Loan => "loan",
            ModelType::Clo => "clo",
            ModelType::Ftm => "ftm",
            ModelType::Cre => "cre",
            ModelType::LendingManager => "lending_manager",
            ModelType::Mockup => "mockup",
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
