//! Authentication service operations.

use reqwest::Method;
use serde_json::Value;

use claira_types::operation::AuthOperation;

use crate::error::Result;
use crate::transport::ClairaClient;

use super::collect_payload;

pub(crate) async fn execute(client: &ClairaClient, op: &AuthOperation) -> Result<Vec<Value>> {
    match op {
        AuthOperation::GetUser => {
            let payload = client.auth_request(Method::GET, "/users/me/", &[], None).await?;
            Ok(collect_payload(payload))
        }
    }
}
