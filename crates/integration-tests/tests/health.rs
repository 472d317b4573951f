//! Health checks and static hosting.
//!
//! Requires a running server with a reachable database.

use gestao_vendas_integration_tests::{base_url, client};
use reqwest::StatusCode;

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_liveness() {
    let resp = client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to call /health");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_readiness() {
    let resp = client()
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to call /health/ready");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_security_headers_and_request_id() {
    let resp = client()
        .get(format!("{}/health", base_url()))
        .header("x-request-id", "integration-check-1")
        .send()
        .await
        .expect("Failed to call /health");

    let headers = resp.headers();
    assert_eq!(headers["x-request-id"], "integration-check-1");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert!(headers.get("content-security-policy").is_none());
}
