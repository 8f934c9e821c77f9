//! End-to-end transport behavior against a mock upstream: token lifecycle,
//! 401 retry, pagination, and multipart upload.

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{bearer_token, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use claira_client::{BinaryStore, ClairaClient, ClientError, FileUpload, MemoryStore};
use claira_types::operation::{
    AuthOperation, DealOperation, DocumentOperation, DocumentUploadParams, ListParams,
};
use claira_types::{Credentials, ModelType, Operation};

fn credentials_for(server: &MockServer) -> Credentials {
    let mut credentials = Credentials::new("analyst@example.com", "secret");
    credentials.auth_base_url = Some(server.uri());
    credentials.doc_analysis_base_url = Some(server.uri());
    credentials
}

fn with_cached_token(mut credentials: Credentials, expiry_offset_ms: i64) -> Credentials {
    credentials.access_token = Some("cached".to_string());
    credentials.refresh_token = Some("refresh-1".to_string());
    credentials.token_expiry_ms =
        Some(chrono::Utc::now().timestamp_millis() + expiry_offset_ms);
    credentials
}

fn client_with(credentials: Credentials) -> (ClairaClient, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(credentials));
    let client = ClairaClient::new(store.clone()).unwrap();
    (client, store)
}

fn grant_body(access: &str) -> Value {
    json!({ "data": { "access_token": access, "refresh_token": "refresh-2" } })
}

#[tokio::test]
async fn cached_token_is_used_without_auth_traffic() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("never")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("never")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me/"))
        .and(bearer_token("cached"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "u-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with(with_cached_token(credentials_for(&server), 10 * 60 * 1000));
    let items = client
        .execute(&Operation::Auth(AuthOperation::GetUser), &BinaryStore::new())
        .await
        .unwrap();

    assert_eq!(items, vec![json!({ "id": "u-1" })]);
}

#[tokio::test]
async fn token_inside_skew_window_triggers_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/refresh/"))
        .and(bearer_token("refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("fresh")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("never")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me/"))
        .and(bearer_token("fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "u-1" })))
        .expect(1)
        .mount(&server)
        .await;

    // 4 minutes left is inside the 5-minute skew.
    let (client, store) = client_with(with_cached_token(credentials_for(&server), 4 * 60 * 1000));
    client
        .execute(&Operation::Auth(AuthOperation::GetUser), &BinaryStore::new())
        .await
        .unwrap();

    // The fresh grant was written back with a renewed expiry.
    use claira_client::CredentialStore;
    let stored = store.get().await;
    assert_eq!(stored.access_token.as_deref(), Some("fresh"));
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-2"));
    assert!(stored.token_usable());
}

#[tokio::test]
async fn failed_refresh_falls_back_to_login() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "expired" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login/"))
        .and(body_string_contains("analyst@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("fresh")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me/"))
        .and(bearer_token("fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "u-1" })))
        .expect(1)
        .mount(&server)
        .await;

    // Expired token, live refresh token.
    let (client, _) = client_with(with_cached_token(credentials_for(&server), -1000));
    client
        .execute(&Operation::Auth(AuthOperation::GetUser), &BinaryStore::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn rejected_login_is_an_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "bad credentials" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with(credentials_for(&server));
    let err = client
        .execute(&Operation::Auth(AuthOperation::GetUser), &BinaryStore::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Authentication { .. }), "got {err:?}");
    assert!(err.to_string().contains("bad credentials"));
}

#[tokio::test]
async fn unauthorized_response_triggers_one_reauth_and_retry() {
    let server = MockServer::start().await;

    // First presentation of the cached token is rejected.
    Mock::given(method("GET"))
        .and(path("/credit_analysis/deals/d-1/"))
        .and(bearer_token("cached"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("fresh")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/credit_analysis/deals/d-1/"))
        .and(bearer_token("fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "d-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with(with_cached_token(credentials_for(&server), 10 * 60 * 1000));
    let items = client
        .execute(
            &Operation::Deals(DealOperation::Get { deal_id: "d-1".to_string() }),
            &BinaryStore::new(),
        )
        .await
        .unwrap();

    assert_eq!(items, vec![json!({ "id": "d-1" })]);
}

#[tokio::test]
async fn second_unauthorized_response_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/credit_analysis/deals/d-1/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "nope" })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(grant_body("fresh")))
        .mount(&server)
        .await;

    let (client, _) = client_with(with_cached_token(credentials_for(&server), 10 * 60 * 1000));
    let err = client
        .execute(
            &Operation::Deals(DealOperation::Get { deal_id: "d-1".to_string() }),
            &BinaryStore::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 401, .. }), "got {err:?}");
}

#[tokio::test]
async fn return_all_walks_pages_until_a_short_page() {
    let server = MockServer::start().await;

    let full_page: Vec<Value> = (0..100).map(|i| json!({ "id": format!("d-{i}") })).collect();
    let short_page: Vec<Value> =
        (100..140).map(|i| json!({ "id": format!("d-{i}") })).collect();

    Mock::given(method("GET"))
        .and(path("/credit_analysis/deals/"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deals": full_page })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/credit_analysis/deals/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deals": short_page })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_with(with_cached_token(credentials_for(&server), 10 * 60 * 1000));
    let items = client
        .execute(
            &Operation::Deals(DealOperation::GetAll(ListParams {
                return_all: true,
                ..ListParams::default()
            })),
            &BinaryStore::new(),
        )
        .await
        .unwrap();

    assert_eq!(items.len(), 140);
    assert_eq!(items[0]["id"], "d-0");
    assert_eq!(items[139]["id"], "d-139");
}

#[tokio::test]
async fn limited_listing_requests_a_single_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/credit_analysis/deals/"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "25"))
        .and(query_param("asset_name.ilike", "acme"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "deals": [{ "id": "d-1" }] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut filters = serde_json::Map::new();
    filters.insert("asset_name.ilike".to_string(), json!("acme"));

    let (client, _) = client_with(with_cached_token(credentials_for(&server), 10 * 60 * 1000));
    let items = client
        .execute(
            &Operation::Deals(DealOperation::GetAll(ListParams {
                return_all: false,
                limit: 25,
                filters,
            })),
            &BinaryStore::new(),
        )
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn upload_sends_multipart_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/credit_analysis/deals/d-7/docs/"))
        .and(body_string_contains("%PDF-1.4"))
        .and(body_string_contains("filename=\"report.pdf\""))
        .and(body_string_contains("name=\"financial_type_ids\""))
        .and(body_string_contains("[\"a\",\"b\"]"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "doc-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut binary = BinaryStore::new();
    binary.insert("data", FileUpload::new(b"%PDF-1.4".to_vec(), "report.pdf", "application/pdf"));

    let params = DocumentUploadParams {
        model_type: ModelType::CreditAnalysis,
        deal_id: Some("d-7".to_string()),
        binary_property: "data".to_string(),
        folder_id: None,
        financial_type_ids: Some("[\"a\", \"b\"]".to_string()),
        metadata: None,
    };

    let (client, _) = client_with(with_cached_token(credentials_for(&server), 10 * 60 * 1000));
    let items = client
        .execute(&Operation::Documents(DocumentOperation::Upload(params)), &binary)
        .await
        .unwrap();

    assert_eq!(items, vec![json!({ "id": "doc-1" })]);
}

#[tokio::test]
async fn malformed_upload_input_fails_before_any_request() {
    let server = MockServer::start().await;

    let mut binary = BinaryStore::new();
    binary.insert("data", FileUpload::new(vec![1], "a.pdf", "application/pdf"));

    let params = DocumentUploadParams {
        model_type: ModelType::CreditAnalysis,
        deal_id: None,
        binary_property: "data".to_string(),
        folder_id: None,
        financial_type_ids: Some("not json".to_string()),
        metadata: None,
    };

    let (client, _) = client_with(with_cached_token(credentials_for(&server), 10 * 60 * 1000));
    let err = client
        .execute(&Operation::Documents(DocumentOperation::Upload(params)), &binary)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::MalformedInput { .. }), "got {err:?}");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn continue_on_fail_captures_errors_per_item() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/credit_analysis/deals/missing/"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "deal not found" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/credit_analysis/deals/d-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "d-1" })))
        .mount(&server)
        .await;

    let operations = vec![
        Operation::Deals(DealOperation::Get { deal_id: "missing".to_string() }),
        Operation::Deals(DealOperation::Get { deal_id: "d-1".to_string() }),
    ];

    let (client, _) = client_with(with_cached_token(credentials_for(&server), 10 * 60 * 1000));
    let items = client.execute_many(&operations, &BinaryStore::new(), true).await.unwrap();

    assert_eq!(items.len(), 2);
    assert!(items[0]["error"].as_str().unwrap().contains("deal not found"));
    assert_eq!(items[1]["id"], "d-1");
}
