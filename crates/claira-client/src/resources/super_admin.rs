//! Super-admin operations against the auth service.
//!
//! User and client records live on the auth service, next to `/users/me/`.

use serde_json::Value;

use claira_types::operation::SuperAdminOperation;

use crate::error::Result;
use crate::transport::ClairaClient;

use super::run_listing;

const USER_KEYS: &[&str] = &["users"];
const CLIENT_KEYS: &[&str] = &["clients"];

pub(crate) async fn execute(
    client: &ClairaClient,
    op: &SuperAdminOperation,
) -> Result<Vec<Value>> {
    match op {
        SuperAdminOperation::GetUsers(list) => {
            run_listing(client, "/users/", list, USER_KEYS, true).await
        }
        SuperAdminOperation::GetClients(list) => {
            run_listing(client, "/clients/", list, CLIENT_KEYS, true).await
        }
    }
}
