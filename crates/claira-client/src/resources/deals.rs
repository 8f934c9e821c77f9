//! Deal (credit analysis) operations.

use std::time::Duration;

use reqwest::Method;
use serde_json::{json, Value};
use tokio::time::Instant;

use claira_types::operation::{
    ActivityListParams, ActivityScope, AskQuestionParams, DealCreateParams, DealOperation,
    DealSetStatusParams,
};

use crate::error::{ClientError, Result};
use crate::transport::ClairaClient;

use super::{collect_payload, run_listing};

const DEAL_KEYS: &[&str] = &["deals"];
const ACTIVITY_KEYS: &[&str] = &["activities"];
const REPORT_KEYS: &[&str] = &["dashboards", "reports"];
const SECTION_KEYS: &[&str] = &["sections"];

pub(crate) async fn execute(client: &ClairaClient, op: &DealOperation) -> Result<Vec<Value>> {
    match op {
        DealOperation::GetAll(list) => {
            run_listing(client, "/credit_analysis/deals/", list, DEAL_KEYS, false).await
        }
        DealOperation::Get { deal_id } => {
            let payload = client
                .api_request(Method::GET, &format!("/credit_analysis/deals/{deal_id}/"), &[], None)
                .await?;
            Ok(collect_payload(payload))
        }
        DealOperation::Create(params) => create(client, params).await,
        DealOperation::GetStatus { deal_id } => {
            let payload = client
                .api_request(
                    Method::GET,
                    &format!("/credit_analysis/deals/{deal_id}/status/"),
                    &[],
                    None,
                )
                .await?;
            Ok(collect_payload(payload))
        }
        DealOperation::SetStatus(params) => set_status(client, params).await,
        DealOperation::GetStatusOptions { module_version } => {
            let query = vec![("module_version".to_string(), module_version.clone())];
            let payload = client
                .api_request(Method::GET, "/credit_analysis/deals/status_options/", &query, None)
                .await?;
            Ok(collect_payload(payload))
        }
        DealOperation::GetActivities(params) => get_activities(client, params).await,
        DealOperation::CreateActivity(params) => {
            let body = json!({
                "title": params.title,
                "description": params.description.clone().unwrap_or_default(),
            });
            let payload = client
                .api_request(
                    Method::POST,
                    &format!("/credit_analysis/deals/{}/activities/", params.deal_id),
                    &[],
                    Some(body),
                )
                .await?;
            Ok(collect_payload(payload))
        }
        DealOperation::AskQuestion(params) => ask_question(client, params).await,
        DealOperation::GetReports { deal_id, include_sections } => {
            get_reports(client, deal_id, *include_sections).await
        }
        DealOperation::GetReportSections { report_id } => {
            let payload = client
                .api_request(
                    Method::GET,
                    &format!("/credit_analysis/dashboards/{report_id}/sections/"),
                    &[],
                    None,
                )
                .await?;
            Ok(crate::normalize::extract_entities(&payload, SECTION_KEYS).unwrap_or_default())
        }
    }
}

async fn create(client: &ClairaClient, params: &DealCreateParams) -> Result<Vec<Value>> {
    let mut body = json!({
        "asset_id": params.asset_id,
        "asset_name": params.asset_name,
    });

    if let Some(name) = params.financial_template_name.as_deref().filter(|n| !n.is_empty()) {
        body["financial_template"] = json!({ "name": name });
    }
    if let Some(data) = &params.deal_data {
        // The host may hand the deal data over as JSON text.
        let data = match data {
            Value::String(text) => {
                serde_json::from_str(text).map_err(|_| ClientError::MalformedInput {
                    field: "dealData".to_string(),
                    message: "must be a valid JSON object. Example: {\"sector\": \"Energy\"}"
                        .to_string(),
                })?
            }
            other => other.clone(),
        };
        body["data"] = data;
    }

    let payload =
        client.api_request(Method::POST, "/credit_analysis/deals/", &[], Some(body)).await?;
    Ok(collect_payload(payload))
}

async fn set_status(client: &ClairaClient, params: &DealSetStatusParams) -> Result<Vec<Value>> {
    let body = json!({
        "status": params.status,
        "module_version": params.module_version,
    });
    let payload = client
        .api_request(
            Method::PATCH,
            &format!("/credit_analysis/deals/{}/status/", params.deal_id),
            &[],
            Some(body),
        )
        .await?;
    Ok(collect_payload(payload))
}

async fn get_activities(client: &ClairaClient, params: &ActivityListParams) -> Result<Vec<Value>> {
    let endpoint = match params.scope {
        ActivityScope::All => "/credit_analysis/activities/".to_string(),
        ActivityScope::Deal => {
            let deal_id = params.deal_id.as_deref().filter(|id| !id.is_empty()).ok_or_else(
                || ClientError::MalformedInput {
                    field: "dealId".to_string(),
                    message: "is required when scope is \"deal\"".to_string(),
                },
            )?;
            format!("/credit_analysis/deals/{deal_id}/activities/")
        }
    };
    run_listing(client, &endpoint, &params.list, ACTIVITY_KEYS, false).await
}

async fn get_reports(
    client: &ClairaClient,
    deal_id: &str,
    include_sections: bool,
) -> Result<Vec<Value>> {
    let payload = client
        .api_request(
            Method::GET,
            &format!("/credit_analysis/deals/{deal_id}/dashboards/"),
            &[],
            None,
        )
        .await?;
    let mut reports = crate::normalize::extract_entities(&payload, REPORT_KEYS).unwrap_or_default();

    if include_sections {
        for report in &mut reports {
            let Some(report_id) = report.get("id").and_then(Value::as_str).map(str::to_string)
            else {
                continue;
            };
            let sections = client
                .api_request(
                    Method::GET,
                    &format!("/credit_analysis/dashboards/{report_id}/sections/"),
                    &[],
                    None,
                )
                .await?;
            let sections =
                crate::normalize::extract_entities(&sections, SECTION_KEYS).unwrap_or_default();
            if let Some(object) = report.as_object_mut() {
                object.insert("sections".to_string(), Value::Array(sections));
            }
        }
    }

    Ok(reports)
}

async fn ask_question(client: &ClairaClient, params: &AskQuestionParams) -> Result<Vec<Value>> {
    let context = &params.context_options;
    let mut body = json!({
        "question": params.question,
        "use_documents": context.use_documents,
        "use_spreadsheets": context.use_spreadsheets,
        "use_sections": context.use_sections,
        "use_web_search": context.use_web_search,
    });
    for (key, value) in [
        ("document_ids", &context.document_ids),
        ("dashboard_ids", &context.dashboard_ids),
        ("start_date", &context.start_date),
        ("end_date", &context.end_date),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            body[key] = json!(value);
        }
    }

    let submitted = client
        .api_request(
            Method::POST,
            &format!("/credit_analysis/deals/{}/questions/", params.deal_id),
            &[],
            Some(body),
        )
        .await?;

    let question_id = submitted_question_id(&submitted).ok_or_else(|| {
        ClientError::InvalidResponse("question submission returned no id".to_string())
    })?;

    poll_for_answer(
        client,
        &params.deal_id,
        &question_id,
        params.polling_options.polling_interval.max(1),
        params.polling_options.timeout,
    )
    .await
}

/// Question id from the submission response, at the top level or under
/// `data`. Ids are strings on current endpoints, numbers on older ones.
fn submitted_question_id(submitted: &Value) -> Option<String> {
    let id = submitted.pointer("/data/id").or_else(|| submitted.get("id"))?;
    match id {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Poll the question until it carries an answer, at the operator-supplied
/// cadence, bounded by the operator-supplied timeout.
async fn poll_for_answer(
    client: &ClairaClient,
    deal_id: &str,
    question_id: &str,
    interval_secs: u64,
    timeout_secs: u64,
) -> Result<Vec<Value>> {
    let endpoint = format!("/credit_analysis/deals/{deal_id}/questions/{question_id}/");
    let deadline = Instant::now() + Duration::from_secs(timeout_secs);

    loop {
        let payload = client.api_request(Method::GET, &endpoint, &[], None).await?;
        let record = match payload.get("data") {
            Some(data) if data.is_object() => data.clone(),
            _ => payload,
        };

        if is_answered(&record) {
            return Ok(collect_payload(record));
        }

        if Instant::now() + Duration::from_secs(interval_secs) > deadline {
            return Err(ClientError::Timeout { seconds: timeout_secs });
        }
        tokio::time::sleep(Duration::from_secs(interval_secs)).await;
    }
}

fn is_answered(record: &Value) -> bool {
    if record.get("answer").and_then(Value::as_str).is_some_and(|answer| !answer.is_empty()) {
        return true;
    }
    matches!(
        record.get("status").and_then(Value::as_str),
        Some("completed") | Some("done") | Some("answered")
    )
}
