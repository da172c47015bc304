//! Router tests that never reach the database.
//!
//! The state carries a disconnected pool, so every case here must be decided
//! by routing, authentication, permission checks or input validation.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use affdesk_api::{AppState, create_router};
use affdesk_shared::{JwtConfig, JwtService};

fn state() -> AppState {
    AppState::new(
        DatabaseConnection::Disconnected,
        JwtService::new(JwtConfig::default()),
    )
}

fn access_token(state: &AppState, role: &str) -> String {
    state
        .jwt_service
        .generate_access_token(Uuid::new_v4(), role, Some(Uuid::new_v4()))
        .expect("should generate token")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn json(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let state = state();
    let (status, body) = send(create_router(state), get("/api/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert!(body["data"]["version"].is_string());
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let state = state();
    let (status, body) = send(create_router(state), get("/api/flows", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let state = state();
    let (status, _) = send(
        create_router(state),
        get("/api/auth/me", Some("not-a-jwt")),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let state = state();
    let refresh = state
        .jwt_service
        .generate_refresh_token(Uuid::new_v4(), "admin", None)
        .unwrap();

    let (status, _) = send(create_router(state), get("/api/users", Some(&refresh))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let state = state();
    let access = access_token(&state, "admin");
    let body = format!(r#"{{"refresh_token": "{access}"}}"#);

    let (status, _) = send(
        create_router(state),
        json("POST", "/api/auth/refresh", None, &body),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_role_in_token_is_unauthorized() {
    let state = state();
    let token = access_token(&state, "superuser");

    let (status, _) = send(create_router(state), get("/api/brands", Some(&token))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_validates_email() {
    let state = state();
    let (status, body) = send(
        create_router(state),
        json(
            "POST",
            "/api/auth/login",
            None,
            r#"{"email": "nope", "password": "secret123"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "email");
}

#[tokio::test]
async fn test_buyer_cannot_create_brand() {
    let state = state();
    let token = access_token(&state, "buyer");

    let (status, body) = send(
        create_router(state),
        json("POST", "/api/brands", Some(&token), r#"{"name": "Acme"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_blank_brand_name_is_rejected() {
    let state = state();
    let token = access_token(&state, "admin");

    let (status, body) = send(
        create_router(state),
        json("POST", "/api/brands", Some(&token), r#"{"name": "   "}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "name");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let state = state();
    let token = access_token(&state, "admin");

    let (status, body) = send(
        create_router(state),
        json("POST", "/api/geos", Some(&token), r#"{"code": "#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_invalid_path_id_is_bad_request() {
    let state = state();
    let token = access_token(&state, "admin");

    let (status, _) = send(
        create_router(state),
        get("/api/flows/not-a-uuid", Some(&token)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_company_stats_need_finance_or_admin() {
    let state = state();
    let token = access_token(&state, "teamlead");

    let (status, _) = send(
        create_router(state),
        get("/api/flow-stats/company/2025/3", Some(&token)),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_month_is_bad_request() {
    let state = state();
    let token = access_token(&state, "finance");

    let (status, body) = send(
        create_router(state),
        get("/api/flow-stats/company/2025/13", Some(&token)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "month");
}

#[tokio::test]
async fn test_year_out_of_range_is_bad_request() {
    let state = state();
    let token = access_token(&state, "admin");
    let uri = format!("/api/flow-stats/{}/monthly/1999", Uuid::new_v4());

    let (status, body) = send(create_router(state), get(&uri, Some(&token))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "year");
}

#[tokio::test]
async fn test_negative_counters_are_rejected() {
    let state = state();
    let token = access_token(&state, "buyer");
    let uri = format!("/api/flow-stats/{}/days/2025-03-01", Uuid::new_v4());

    let (status, body) = send(
        create_router(state),
        json("PUT", &uri, Some(&token), r#"{"spend": "-5", "deposits": 2}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "spend");
}

#[tokio::test]
async fn test_bizdev_cannot_write_stats() {
    let state = state();
    let token = access_token(&state, "bizdev");
    let uri = format!("/api/flow-stats/{}/days/2025-03-01", Uuid::new_v4());

    let (status, _) = send(
        create_router(state),
        json("PUT", &uri, Some(&token), r#"{"spend": "5"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_buyer_cannot_read_expenses() {
    let state = state();
    let token = access_token(&state, "buyer");

    let (status, _) = send(create_router(state), get("/api/expenses", Some(&token))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_finance_cannot_record_investments() {
    let state = state();
    let token = access_token(&state, "finance");

    let (status, _) = send(
        create_router(state),
        json(
            "POST",
            "/api/investment-operations",
            Some(&token),
            r#"{"investor": "Fund A", "operation_type": "deposit", "amount": "1000",
                "currency": "USD", "operation_date": "2025-01-15"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_salary_reject_needs_reason() {
    let state = state();
    let token = access_token(&state, "finance");
    let uri = format!("/api/salaries/{}/reject", Uuid::new_v4());

    let (status, body) = send(
        create_router(state),
        json("POST", &uri, Some(&token), r#"{"reason": "  "}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "reason");
}

#[tokio::test]
async fn test_only_admin_deletes_bizdev_requests() {
    let state = state();
    let token = access_token(&state, "bizdev");
    let uri = format!("/api/bizdev-requests/{}", Uuid::new_v4());

    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(create_router(state), request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_communication_context() {
    let state = state();
    let token = access_token(&state, "admin");
    let uri = format!("/api/communications/team/{}", Uuid::new_v4());

    let (status, body) = send(create_router(state), get(&uri, Some(&token))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "context_type");
}

#[tokio::test]
async fn test_expense_amount_beyond_money_column_is_rejected() {
    let state = state();
    let token = access_token(&state, "finance");

    let (status, body) = send(
        create_router(state),
        json(
            "POST",
            "/api/expenses",
            Some(&token),
            r#"{"category": "tools", "amount": "100000000000000000",
                "currency": "USD", "expense_date": "2025-01-15"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "amount");
}

#[tokio::test]
async fn test_stats_beyond_limits_are_rejected() {
    let state = state();
    let token = access_token(&state, "buyer");
    let uri = format!("/api/flow-stats/{}/days/2025-03-01", Uuid::new_v4());

    let (status, body) = send(
        create_router(state),
        json(
            "PUT",
            &uri,
            Some(&token),
            r#"{"revenue": "10000000000000000", "deposits": 9223372036854775807}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .expect("field errors")
        .iter()
        .filter_map(|error| error["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["deposits", "revenue"]);
}
