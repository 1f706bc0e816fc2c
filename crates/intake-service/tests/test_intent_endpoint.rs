//! End-to-end HTTP scenarios (§8) driven straight through the axum router
//! via `tower::ServiceExt::oneshot`, no real socket involved.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use intake_service::http::router;
use intake_service::state::AppState;
use intake_store::config::IntakeConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn sample_intent(intent_id: &str) -> Value {
    json!({
        "intent_id": intent_id,
        "target_chain": "eth-mainnet",
        "from": "0xABCDEF",
        "gas_limit": 200_000,
        "bytes": 256,
        "candidate": {
            "amount_in": "1000000000000000000",
            "gas_estimate": "21000",
            "max_fee_per_gas": "1000000000",
            "max_priority_fee_per_gas": "100000000",
            "flash_loan_used": false,
            "flash_premium_bps": 0
        },
        "quote": { "expected_out": "1100000000000000000" }
    })
}

#[tokio::test]
async fn test_happy_path_intent_is_accepted() {
    let config = IntakeConfig::from_toml_str("chainId = \"eth-mainnet\"").unwrap();
    let app = router(AppState::for_tests(config));

    let request = Request::builder()
        .method("POST")
        .uri("/intent")
        .header("content-type", "application/json")
        .body(Body::from(sample_intent("intent-happy").to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["intent_id"], "intent-happy");
    assert_eq!(body["state"], "QUEUED");
}

#[tokio::test]
async fn test_chain_mismatch_is_rejected_with_400() {
    let config = IntakeConfig::from_toml_str("chainId = \"polygon\"").unwrap();
    let app = router(AppState::for_tests(config));

    let request = Request::builder()
        .method("POST")
        .uri("/intent")
        .header("content-type", "application/json")
        .body(Body::from(sample_intent("intent-chain").to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["reason"]["code"], "VALIDATION_CHAIN_MISMATCH");
}

#[tokio::test]
async fn test_profit_gate_reject_surfaces_policy_fee_too_low() {
    let raw = r#"
        chainId = "eth-mainnet"
        [profitGate]
        minProfitWei = "1000000000000000000"
        minRoiBps = 1
    "#;
    let config = IntakeConfig::from_toml_str(raw).unwrap();
    let app = router(AppState::for_tests(config));

    let request = Request::builder()
        .method("POST")
        .uri("/intent")
        .header("content-type", "application/json")
        .body(Body::from(sample_intent("intent-unprofitable").to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["reason"]["code"], "POLICY_FEE_TOO_LOW");
}

#[tokio::test]
async fn test_missing_intent_id_is_a_bad_request() {
    let config = IntakeConfig::default();
    let app = router(AppState::for_tests(config));

    let request = Request::builder()
        .method("POST")
        .uri("/intent")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "target_chain": "eth-mainnet" }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_intent_status_lookup_is_404() {
    let config = IntakeConfig::default();
    let app = router(AppState::for_tests(config));

    let request = Request::builder()
        .method("GET")
        .uri("/status/does-not-exist")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint_reports_ok() {
    let config = IntakeConfig::default();
    let app = router(AppState::for_tests(config));

    let request = Request::builder().method("GET").uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
}
