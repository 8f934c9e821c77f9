//! Financial data operations (credit analysis module only).

use reqwest::Method;
use serde_json::Value;

use claira_types::operation::FinancialDataOperation;

use crate::error::Result;
use crate::transport::ClairaClient;

use super::collect_payload;

pub(crate) async fn execute(
    client: &ClairaClient,
    op: &FinancialDataOperation,
) -> Result<Vec<Value>> {
    let endpoint = match op {
        FinancialDataOperation::GetTables { doc_id } => {
            format!("/credit_analysis/docs/{doc_id}/fin_data_tables/")
        }
        FinancialDataOperation::GetItems { doc_id } => {
            format!("/credit_analysis/docs/{doc_id}/fin_data_items/")
        }
    };
    let payload = client.api_request(Method::GET, &endpoint, &[], None).await?;
    Ok(collect_payload(payload))
}
