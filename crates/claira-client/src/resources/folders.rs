//! Folder operations.

use reqwest::Method;
use serde_json::{json, Value};

use claira_types::operation::FolderOperation;

use crate::error::Result;
use crate::transport::ClairaClient;

use super::{collect_payload, run_listing};

const FOLDER_KEYS: &[&str] = &["folders"];

pub(crate) async fn execute(client: &ClairaClient, op: &FolderOperation) -> Result<Vec<Value>> {
    match op {
        FolderOperation::GetAll { model_type, list } => {
            let endpoint = format!("/{model_type}/folders/");
            run_listing(client, &endpoint, list, FOLDER_KEYS, false).await
        }
        FolderOperation::GetTree { model_type } => {
            let payload = client
                .api_request(Method::GET, &format!("/{model_type}/folders/tree/"), &[], None)
                .await?;
            Ok(collect_payload(payload))
        }
        FolderOperation::Create { model_type, name, parent_id } => {
            let mut body = json!({ "name": name });
            if let Some(parent) = parent_id.as_deref().filter(|id| !id.is_empty()) {
                body["parent_id"] = json!(parent);
            }
            let payload = client
                .api_request(Method::POST, &format!("/{model_type}/folders/"), &[], Some(body))
                .await?;
            Ok(collect_payload(payload))
        }
    }
}
