//! Router-level smoke tests: auth extraction, status-code mapping, and the
//! response envelope.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{restaurant, TestApp, TEST_JWT_SECRET};
use restosehat_api::{app_router, auth};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

fn router(app: &TestApp) -> Router {
    app_router(app.state.clone())
}

fn bearer(actor: &auth::Actor) -> String {
    let token = auth::issue_token(TEST_JWT_SECRET, actor, 3600).expect("token");
    format!("Bearer {}", token)
}

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new().await;
    let response = router(&app)
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = TestApp::new().await;
    let response = router(&app)
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/v1/orders")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_and_send_order_over_http() {
    let app = TestApp::new().await;
    let branch_a = app.seed_branch("pusat").await;
    let branch_b = app.seed_branch("cabang").await;
    app.seed_item("BERAS-01", "Beras premium").await;

    let staff = restaurant(10, branch_a.id);
    let payload = json!({
        "to_id": branch_b.id,
        "to_type": "branch",
        "items": [{ "item_id": "BERAS-01", "qty": 3 }]
    });

    let response = router(&app)
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/orders")
                .header(header::AUTHORIZATION, bearer(&staff))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    let order_id = body["data"]["id"].as_i64().expect("order id");

    let response = router(&app)
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/v1/orders/{}/send", order_id))
                .header(header::AUTHORIZATION, bearer(&staff))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    // A second send maps the state conflict to 409.
    let response = router(&app)
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/v1/orders/{}/send", order_id))
                .header(header::AUTHORIZATION, bearer(&staff))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // A foreign branch gets 403.
    let response = router(&app)
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/v1/orders/{}/finish", order_id))
                .header(header::AUTHORIZATION, bearer(&restaurant(20, branch_b.id)))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Unknown ids map to 404.
    let response = router(&app)
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/v1/orders/99999")
                .header(header::AUTHORIZATION, bearer(&staff))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
