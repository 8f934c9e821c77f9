//! Multipart document upload.
//!
//! The wire format is the contract: a multipart/form-data body with one part
//! per field and the binary part carrying filename and content type. reqwest
//! generates the boundary. JSON-typed fields are validated (and
//! re-serialized canonically) before any network traffic happens.

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use claira_types::operation::DocumentUploadParams;

use crate::binary::FileUpload;
use crate::error::{ClientError, Result};

/// A validated upload, ready to be rendered into a multipart form for each
/// send attempt (the 401 retry rebuilds the form from this).
#[derive(Debug, Clone)]
pub(crate) struct PreparedUpload {
    pub endpoint: String,
    file: FileUpload,
    folder_id: Option<String>,
    financial_type_ids: Option<String>,
    metadata: Option<String>,
}

/// Validate upload parameters against the file payload.
///
/// `financial_type_ids` must be JSON array text and `metadata` JSON object
/// text; both fail here, before any HTTP call, with an example of valid
/// input in the message.
pub(crate) fn prepare_upload(
    params: &DocumentUploadParams,
    file: &FileUpload,
) -> Result<PreparedUpload> {
    let endpoint = match params.deal_id.as_deref().filter(|id| !id.is_empty()) {
        Some(deal_id) => format!("/credit_analysis/deals/{deal_id}/docs/"),
        None => format!("/{}/docs/", params.model_type),
    };

    let financial_type_ids = params
        .financial_type_ids
        .as_deref()
        .filter(|text| !text.is_empty())
        .map(|text| {
            let parsed: Value = serde_json::from_str(text).map_err(|_| malformed_ids())?;
            if !parsed.is_array() {
                return Err(malformed_ids());
            }
            serde_json::to_string(&parsed).map_err(ClientError::from)
        })
        .transpose()?;

    let metadata = params
        .metadata
        .as_deref()
        .filter(|text| !text.is_empty())
        .map(|text| {
            let parsed: Value = serde_json::from_str(text).map_err(|_| malformed_metadata())?;
            if !parsed.is_object() {
                return Err(malformed_metadata());
            }
            serde_json::to_string(&parsed).map_err(ClientError::from)
        })
        .transpose()?;

    Ok(PreparedUpload {
        endpoint,
        file: file.clone(),
        folder_id: params.folder_id.clone().filter(|id| !id.is_empty()),
        financial_type_ids,
        metadata,
    })
}

impl PreparedUpload {
    /// Render the multipart form for one send attempt.
    pub(crate) fn to_form(&self) -> Form {
        let file_name = if self.file.file_name.is_empty() {
            "file".to_string()
        } else {
            self.file.file_name.clone()
        };
        let mime_type = if self.file.mime_type.is_empty() {
            "application/octet-stream"
        } else {
            self.file.mime_type.as_str()
        };

        // An unparseable caller-supplied type degrades to reqwest's default
        // (application/octet-stream) rather than failing the upload.
        let file_part = match Part::bytes(self.file.data.clone())
            .file_name(file_name.clone())
            .mime_str(mime_type)
        {
            Ok(part) => part,
            Err(_) => Part::bytes(self.file.data.clone()).file_name(file_name),
        };

        let mut form = Form::new().part("file", file_part);
        if let Some(ref folder_id) = self.folder_id {
            form = form.text("folder_id", folder_id.clone());
        }
        if let Some(ref ids) = self.financial_type_ids {
            form = form.text("financial_type_ids", ids.clone());
        }
        if let Some(ref metadata) = self.metadata {
            form = form.text("metadata", metadata.clone());
        }
        form
    }
}

fn malformed_ids() -> ClientError {
    ClientError::MalformedInput {
        field: "financialTypeIds".to_string(),
        message: "must be a valid JSON array. Example: [\"uuid1\", \"uuid2\"]".to_string(),
    }
}

fn malformed_metadata() -> ClientError {
    ClientError::MalformedInput {
        field: "metadata".to_string(),
        message: "must be a valid JSON object. Example: {\"source\": \"workflow\"}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claira_types::ModelType;

    fn params() -> DocumentUploadParams {
        DocumentUploadParams {
            model_type: ModelType::CreditAnalysis,
            deal_id: None,
            binary_property: "data".to_string(),
            folder_id: None,
            financial_type_ids: None,
            metadata: None,
        }
    }

    fn file() -> FileUpload {
        FileUpload::new(b"%PDF-1.4".to_vec(), "report.pdf", "application/pdf")
    }

    #[test]
    fn test_endpoint_prefers_deal_scope() {
        let mut p = params();
        p.deal_id = Some("d-42".to_string());
        let prepared = prepare_upload(&p, &file()).unwrap();
        assert_eq!(prepared.endpoint, "/credit_analysis/deals/d-42/docs/");
    }

    #[test]
    fn test_endpoint_falls_back_to_model_type() {
        let mut p = params();
        p.model_type = ModelType::Loan;
        let prepared = prepare_upload(&p, &file()).unwrap();
        assert_eq!(prepared.endpoint, "/loan/docs/");
    }

    #[test]
    fn test_financial_type_ids_reserialized_canonically() {
        let mut p = params();
        p.financial_type_ids = Some(" [\"a\", \"b\"] ".to_string());
        let prepared = prepare_upload(&p, &file()).unwrap();
        assert_eq!(prepared.financial_type_ids.as_deref(), Some("[\"a\",\"b\"]"));
    }

    #[test]
    fn test_invalid_financial_type_ids_rejected() {
        let mut p = params();
        p.financial_type_ids = Some("not-json".to_string());
        let err = prepare_upload(&p, &file()).unwrap_err();
        assert!(matches!(err, ClientError::MalformedInput { ref field, .. } if field == "financialTypeIds"));
        assert!(err.to_string().contains("[\"uuid1\", \"uuid2\"]"));
    }

    #[test]
    fn test_non_array_financial_type_ids_rejected() {
        let mut p = params();
        p.financial_type_ids = Some("{\"a\": 1}".to_string());
        assert!(prepare_upload(&p, &file()).is_err());
    }

    #[test]
    fn test_invalid_metadata_rejected() {
        let mut p = params();
        p.metadata = Some("[1, 2]".to_string());
        let err = prepare_upload(&p, &file()).unwrap_err();
        assert!(matches!(err, ClientError::MalformedInput { ref field, .. } if field == "metadata"));
    }
}
