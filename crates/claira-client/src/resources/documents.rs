//! Document operations.

use reqwest::{header, Method};
use serde_json::Value;

use claira_types::operation::{DocumentOperation, DocumentUploadParams};
use claira_types::ModelType;

use crate::binary::BinaryStore;
use crate::error::Result;
use crate::transport::ClairaClient;
use crate::upload::prepare_upload;

use super::{collect_payload, run_listing};

const DOCUMENT_KEYS: &[&str] = &["docs", "documents"];

pub(crate) async fn execute(
    client: &ClairaClient,
    op: &DocumentOperation,
    binary: &BinaryStore,
) -> Result<Vec<Value>> {
    match op {
        DocumentOperation::GetAll { model_type, list } => {
            let endpoint = format!("/{model_type}/docs/");
            run_listing(client, &endpoint, list, DOCUMENT_KEYS, false).await
        }
        DocumentOperation::Get { model_type, doc_id } => {
            let payload =
                client.api_request(Method::GET, &doc_endpoint(*model_type, doc_id), &[], None).await?;
            Ok(collect_payload(payload))
        }
        DocumentOperation::Upload(params) => upload(client, params, binary).await,
        DocumentOperation::Delete { model_type, doc_id } => {
            let payload = client
                .api_request(Method::DELETE, &doc_endpoint(*model_type, doc_id), &[], None)
                .await?;
            Ok(collect_payload(payload))
        }
    }
}

fn doc_endpoint(model_type: ModelType, doc_id: &str) -> String {
    format!("/{model_type}/docs/{doc_id}/")
}

async fn upload(
    client: &ClairaClient,
    params: &DocumentUploadParams,
    binary: &BinaryStore,
) -> Result<Vec<Value>> {
    let slot = if params.binary_property.trim().is_empty() {
        "data"
    } else {
        params.binary_property.as_str()
    };
    let file = binary.get(slot)?;
    // Validation happens before any network traffic.
    let prepared = prepare_upload(params, file)?;

    let urls = client.resolved_urls().await;
    let url = format!("{}{}", urls.doc_analysis_url, prepared.endpoint);

    tracing::debug!(
        file_name = %file.file_name,
        mime_type = %file.mime_type,
        endpoint = %prepared.endpoint,
        "uploading document"
    );

    let payload = client
        .send_with_reauth(|token| {
            client
                .http_client()
                .post(&url)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::ACCEPT, "application/json")
                // Content-Type is set by the multipart body, boundary included.
                .multipart(prepared.to_form())
        })
        .await?;

    Ok(collect_payload(payload))
}
