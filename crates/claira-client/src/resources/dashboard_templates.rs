//! Report agent (dashboard template) operations.

use reqwest::Method;
use serde_json::{json, Value};

use claira_types::operation::{CreateFromTemplateParams, DashboardTemplateOperation};

use crate::error::{ClientError, Result};
use crate::transport::ClairaClient;

use super::collect_payload;

const TEMPLATE_KEYS: &[&str] = &["templates", "dashboard_templates"];
const TEMPLATES_ENDPOINT: &str = "/credit_analysis/dashboard-templates/";

pub(crate) async fn execute(
    client: &ClairaClient,
    op: &DashboardTemplateOperation,
) -> Result<Vec<Value>> {
    match op {
        DashboardTemplateOperation::GetAll => Ok(fetch_templates(client).await?),
        DashboardTemplateOperation::CreateFromTemplate(params) => {
            create_from_template(client, params).await
        }
    }
}

async fn fetch_templates(client: &ClairaClient) -> Result<Vec<Value>> {
    let payload = client.api_request(Method::GET, TEMPLATES_ENDPOINT, &[], None).await?;
    Ok(crate::normalize::extract_entities(&payload, TEMPLATE_KEYS).unwrap_or_default())
}

/// Create a report (dashboard) for a deal from a report agent.
///
/// The creation endpoint takes no template reference, so the template is
/// located in the listing first; a missing ID fails without creating
/// anything.
async fn create_from_template(
    client: &ClairaClient,
    params: &CreateFromTemplateParams,
) -> Result<Vec<Value>> {
    let templates = fetch_templates(client).await?;
    let template = templates
        .iter()
        .find(|template| {
            template.get("id").and_then(Value::as_str) == Some(params.template_id.as_str())
        })
        .ok_or_else(|| ClientError::MissingResource {
            kind: "Report Agent".to_string(),
            id: params.template_id.clone(),
        })?;

    let title = params
        .title
        .as_deref()
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .or_else(|| template.get("title").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| "Report".to_string());

    let body = json!({
        "deal_id": params.deal_id,
        "title": title,
        "public": params.public,
        "is_default": params.is_default,
    });

    let payload =
        client.api_request(Method::POST, "/credit_analysis/dashboards/", &[], Some(body)).await?;
    Ok(collect_payload(payload))
}
