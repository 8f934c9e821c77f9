//! Tagged operation model.
//!
//! Every operation the client can perform is one variant of [`Operation`],
//! carrying its typed parameters. The dispatcher matches exhaustively over
//! these variants, so handler coverage is checked at compile time instead of
//! through a string-pair conditional chain.
//!
//! The serde form is flat: `{"resource": "deals", "operation": "getAll",
//! "returnAll": true, ...}`, matching the host's parameter names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::ModelType;

fn default_limit() -> u32 {
    50
}

fn default_true() -> bool {
    true
}

fn default_module_version() -> String {
    "latest".to_string()
}

fn default_binary_property() -> String {
    "data".to_string()
}

/// One declarative operation against the Claira Platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "resource", rename_all = "camelCase")]
pub enum Operation {
    Auth(AuthOperation),
    Deals(DealOperation),
    Documents(DocumentOperation),
    Folders(FolderOperation),
    FinancialData(FinancialDataOperation),
    DashboardTemplates(DashboardTemplateOperation),
    SuperAdmin(SuperAdminOperation),
}

/// Listing controls shared by every paginated operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Fetch every page instead of a single limited page
    #[serde(default)]
    pub return_all: bool,
    /// Page size when `return_all` is off
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Raw filter expressions passed through as query parameters
    /// (e.g. `asset_name.ilike`, `created_at.gt`)
    #[serde(default)]
    pub filters: Map<String, Value>,
}

/// Authentication service operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum AuthOperation {
    /// Fetch the authenticated user's profile
    GetUser,
}

/// Deal (credit analysis) operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum DealOperation {
    GetAll(ListParams),
    #[serde(rename_all = "camelCase")]
    Get { deal_id: String },
    Create(DealCreateParams),
    #[serde(rename_all = "camelCase")]
    GetStatus { deal_id: String },
    SetStatus(DealSetStatusParams),
    #[serde(rename_all = "camelCase")]
    GetStatusOptions {
        #[serde(default = "default_module_version")]
        module_version: String,
    },
    GetActivities(ActivityListParams),
    CreateActivity(ActivityCreateParams),
    AskQuestion(AskQuestionParams),
    #[serde(rename_all = "camelCase")]
    GetReports {
        deal_id: String,
        #[serde(default)]
        include_sections: bool,
    },
    #[serde(rename_all = "camelCase")]
    GetReportSections { report_id: String },
}

/// Parameters for creating a deal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DealCreateParams {
    pub asset_id: String,
    pub asset_name: String,
    /// Name of the financial template to initialize the deal with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_template_name: Option<String>,
    /// Free-form deal data; a JSON object, or a string that must parse as one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_data: Option<Value>,
}

/// Parameters for updating a deal's status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DealSetStatusParams {
    pub deal_id: String,
    pub status: String,
    /// Module version the deal report rules are read from
    #[serde(default = "default_module_version")]
    pub module_version: String,
}

/// Scope of an activity listing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityScope {
    /// Activities across all deals
    All,
    /// Activities for one deal
    #[default]
    Deal,
}

/// Parameters for listing deal activities.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityListParams {
    #[serde(default)]
    pub scope: ActivityScope,
    /// Required when `scope` is [`ActivityScope::Deal`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<String>,
    #[serde(flatten)]
    pub list: ListParams,
}

/// Parameters for recording a deal activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCreateParams {
    pub deal_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Context selection for a deal question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionContext {
    #[serde(default = "default_true")]
    pub use_documents: bool,
    #[serde(default = "default_true")]
    pub use_spreadsheets: bool,
    #[serde(default)]
    pub use_sections: bool,
    #[serde(default)]
    pub use_web_search: bool,
    /// Comma-separated document IDs to restrict the context to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_ids: Option<String>,
    /// Comma-separated dashboard IDs to restrict the context to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_ids: Option<String>,
    /// Context start date, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Context end date, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl Default for QuestionContext {
    fn default() -> Self {
        Self {
            use_documents: true,
            use_spreadsheets: true,
            use_sections: false,
            use_web_search: false,
            document_ids: None,
            dashboard_ids: None,
            start_date: None,
            end_date: None,
        }
    }
}

/// Polling cadence for answer retrieval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollingOptions {
    /// Seconds between answer checks
    pub polling_interval: u64,
    /// Maximum seconds to wait for an answer
    pub timeout: u64,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self { polling_interval: 2, timeout: 300 }
    }
}

/// Parameters for asking a question about a deal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AskQuestionParams {
    pub deal_id: String,
    pub question: String,
    #[serde(default)]
    pub context_options: QuestionContext,
    #[serde(default)]
    pub polling_options: PollingOptions,
}

/// Document operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum DocumentOperation {
    #[serde(rename_all = "camelCase")]
    GetAll {
        #[serde(default)]
        model_type: ModelType,
        #[serde(flatten)]
        list: ListParams,
    },
    #[serde(rename_all = "camelCase")]
    Get {
        #[serde(default)]
        model_type: ModelType,
        doc_id: String,
    },
    Upload(DocumentUploadParams),
    #[serde(rename_all = "camelCase")]
    Delete {
        #[serde(default)]
        model_type: ModelType,
        doc_id: String,
    },
}

/// Parameters for uploading a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUploadParams {
    #[serde(default)]
    pub model_type: ModelType,
    /// When set, the document is attached to this deal instead of the bare
    /// model-type collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<String>,
    /// Named binary slot carrying the file payload
    #[serde(default = "default_binary_property")]
    pub binary_property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    /// JSON array text, e.g. `["uuid1", "uuid2"]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_type_ids: Option<String>,
    /// JSON object text attached as document metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

/// Folder operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum FolderOperation {
    #[serde(rename_all = "camelCase")]
    GetAll {
        #[serde(default)]
        model_type: ModelType,
        #[serde(flatten)]
        list: ListParams,
    },
    #[serde(rename_all = "camelCase")]
    GetTree {
        #[serde(default)]
        model_type: ModelType,
    },
    #[serde(rename_all = "camelCase")]
    Create {
        #[serde(default)]
        model_type: ModelType,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_id: Option<String>,
    },
}

/// Financial data operations (always under the credit analysis module).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum FinancialDataOperation {
    #[serde(rename_all = "camelCase")]
    GetTables { doc_id: String },
    #[serde(rename_all = "camelCase")]
    GetItems { doc_id: String },
}

/// Report agent (dashboard template) operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum DashboardTemplateOperation {
    GetAll,
    CreateFromTemplate(CreateFromTemplateParams),
}

/// Parameters for creating a report (dashboard) from a report agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateFromTemplateParams {
    pub template_id: String,
    pub deal_id: String,
    /// Title for the created report; falls back to the template title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(default)]
    pub is_default: bool,
}

/// Super-admin operations (user and client administration).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum SuperAdminOperation {
    GetUsers(ListParams),
    GetClients(ListParams),
}
