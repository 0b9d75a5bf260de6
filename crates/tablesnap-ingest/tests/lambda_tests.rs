//! Lambda handler tests

use serde_json::{json, Value as JsonValue};
use tablesnap_ingest::lambda::{handle_ingest_all, handle_ingest_table};
use tablesnap_ingest::testing::{item, FakeScanClient};

mod common;

use common::{harness, n};

fn body(response: &tablesnap_ingest::lambda::LambdaResponse) -> JsonValue {
    serde_json::from_str(&response.body).unwrap()
}

#[tokio::test]
async fn test_missing_table_name_is_rejected() {
    let h = harness([("locales", "T1"), ("pedidos", "T2")], FakeScanClient::new());

    let response = handle_ingest_table(&h.orchestrator, &json!({"pathParameters": {}})).await;

    assert_eq!(response.status_code, 400);
    assert_eq!(
        body(&response)["error"],
        "Invalid table name. Valid tables: locales, pedidos"
    );
    assert_eq!(h.client.total_calls(), 0);
}

#[tokio::test]
async fn test_unknown_table_is_rejected() {
    let h = harness([("locales", "T1")], FakeScanClient::new());

    let response = handle_ingest_table(
        &h.orchestrator,
        &json!({"pathParameters": {"tableName": "facturas"}}),
    )
    .await;

    assert_eq!(response.status_code, 400);
    assert!(body(&response)["error"]
        .as_str()
        .unwrap()
        .contains("Available tables: locales"));
}

#[tokio::test]
async fn test_successful_table() {
    let h = harness(
        [("locales", "T1")],
        FakeScanClient::new().with_pages("T1", vec![vec![item([("id", n("1"))]), item([("id", n("2"))])]]),
    );

    let response = handle_ingest_table(
        &h.orchestrator,
        &json!({"pathParameters": {"tableName": "locales"}}),
    )
    .await;

    assert_eq!(response.status_code, 200);
    let body = body(&response);
    assert_eq!(body["table"], "locales");
    assert_eq!(body["records"], 2);
    assert!(body["s3_location"]
        .as_str()
        .unwrap()
        .starts_with("s3://chinawok-datalake/dynamodb/locales/"));
}

#[tokio::test]
async fn test_empty_table_is_ok() {
    let h = harness([("locales", "T1")], FakeScanClient::new().with_pages("T1", vec![vec![]]));

    let response = handle_ingest_table(
        &h.orchestrator,
        &json!({"pathParameters": {"tableName": "locales"}}),
    )
    .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(body(&response)["records"], 0);
    assert!(h.store.puts().is_empty());
}

#[tokio::test]
async fn test_scan_failure_is_server_error() {
    let h = harness([("locales", "T1")], FakeScanClient::new().failing("T1", "InternalServerError"));

    let response = handle_ingest_table(
        &h.orchestrator,
        &json!({"pathParameters": {"tableName": "locales"}}),
    )
    .await;

    assert_eq!(response.status_code, 500);
    let body = body(&response);
    assert_eq!(body["error"], "Error during ingestion");
    assert!(body["details"].as_str().unwrap().contains("InternalServerError"));
}

#[tokio::test]
async fn test_all_tables_status_codes() {
    let clean = harness(
        [("locales", "T1"), ("pedidos", "T2")],
        FakeScanClient::new()
            .with_pages("T1", vec![vec![item([("id", n("1"))])]])
            .with_pages("T2", vec![vec![]]),
    );
    let response = handle_ingest_all(&clean.orchestrator).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(body(&response)["total_tables"], 2);

    let partial = harness(
        [("locales", "T1"), ("pedidos", "T2")],
        FakeScanClient::new()
            .with_pages("T1", vec![vec![item([("id", n("1"))])]])
            .failing("T2", "AccessDeniedException"),
    );
    let response = handle_ingest_all(&partial.orchestrator).await;
    assert_eq!(response.status_code, 207);
    let body = body(&response);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["errors"][0]["table"], "pedidos");
}
