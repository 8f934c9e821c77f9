//! Per-resource operation handlers and the dispatcher.
//!
//! Each handler builds one endpoint + payload and drives the authenticated
//! transport (directly or through the paginator). The dispatcher is an
//! exhaustive match over [`Operation`], so adding a variant without a
//! handler fails to compile.

mod auth;
mod dashboard_templates;
mod deals;
mod documents;
mod financial_data;
mod folders;
mod super_admin;

use serde_json::{json, Map, Value};

use claira_types::operation::ListParams;
use claira_types::Operation;

use crate::binary::BinaryStore;
use crate::error::Result;
use crate::transport::ClairaClient;

impl ClairaClient {
    /// Execute one operation, returning zero or more result items.
    ///
    /// Array payloads are flattened into individual items; empty payloads
    /// produce no items.
    pub async fn execute(&self, operation: &Operation, binary: &BinaryStore) -> Result<Vec<Value>> {
        match operation {
            Operation::Auth(op) => auth::execute(self, op).await,
            Operation::Deals(op) => deals::execute(self, op).await,
            Operation::Documents(op) => documents::execute(self, op, binary).await,
            Operation::Folders(op) => folders::execute(self, op).await,
            Operation::FinancialData(op) => financial_data::execute(self, op).await,
            Operation::DashboardTemplates(op) => dashboard_templates::execute(self, op).await,
            Operation::SuperAdmin(op) => super_admin::execute(self, op).await,
        }
    }

    /// Execute a batch of items sequentially.
    ///
    /// With `continue_on_fail`, a failed item is captured as
    /// `{"error": message}` and the remaining items still run; otherwise the
    /// first failure aborts the batch.
    pub async fn execute_many(
        &self,
        operations: &[Operation],
        binary: &BinaryStore,
        continue_on_fail: bool,
    ) -> Result<Vec<Value>> {
        let mut results = Vec::new();
        for operation in operations {
            match self.execute(operation, binary).await {
                Ok(items) => results.extend(items),
                Err(err) if continue_on_fail => {
                    tracing::warn!("item failed, continuing: {err}");
                    results.push(json!({ "error": err.to_string() }));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(results)
    }
}

/// Flatten a raw payload into result items: arrays element-wise, non-empty
/// objects and scalars as a single item, null/empty objects as nothing.
pub(crate) fn collect_payload(payload: Value) -> Vec<Value> {
    match payload {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(ref map) if map.is_empty() => Vec::new(),
        other => vec![other],
    }
}

/// Render filter expressions as query parameters, dropping empty values.
pub(crate) fn filters_to_query(filters: &Map<String, Value>) -> Vec<(String, String)> {
    filters
        .iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::Null => return None,
                Value::String(text) if text.is_empty() => return None,
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), rendered))
        })
        .collect()
}

/// Run a listing endpoint honoring the shared `return_all`/`limit` controls.
///
/// `return_all` walks every page with page size 100; otherwise a single page
/// of `limit` items is requested.
pub(crate) async fn run_listing(
    client: &ClairaClient,
    endpoint: &str,
    list: &ListParams,
    preferred_keys: &[&str],
    auth_service: bool,
) -> Result<Vec<Value>> {
    let base_query = filters_to_query(&list.filters);

    let request = |query: Vec<(String, String)>| async move {
        if auth_service {
            client.auth_request(reqwest::Method::GET, endpoint, &query, None).await
        } else {
            client.api_request(reqwest::Method::GET, endpoint, &query, None).await
        }
    };

    if list.return_all {
        return crate::paginate::fetch_all_pages(
            |page, page_size| {
                let mut query = base_query.clone();
                query.push(("page".to_string(), page.to_string()));
                query.push(("page_size".to_string(), page_size.to_string()));
                request(query)
            },
            100,
            preferred_keys,
        )
        .await;
    }

    let mut query = base_query;
    if list.limit > 0 {
        query.push(("page_size".to_string(), list.limit.to_string()));
        query.push(("page".to_string(), "1".to_string()));
    }
    let payload = request(query).await?;
    Ok(crate::normalize::extract_entities(&payload, preferred_keys).unwrap_or_default())
}
