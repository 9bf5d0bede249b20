use axum::{
    body::Body,
    http::{header, Request, Response},
};
use busroute::cache::{GeocodeCache, MemoryCacheService};
use busroute::config::{AuthConfig, FarePolicy};
use busroute::services::{AdminAuth, JourneyPlanner};
use busroute::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

#[allow(dead_code)]
pub const ADMIN_PASSWORD: &str = "let-me-in";
#[allow(dead_code)]
pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Fresh in-memory SQLite state with geocoding disabled
#[allow(dead_code)]
pub async fn setup_test_state() -> Arc<AppState> {
    let repo = busroute::db::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    let auth = AdminAuth::new(&AuthConfig {
        admin_password_hash: bcrypt::hash(ADMIN_PASSWORD, 4).expect("bcrypt hash"),
        jwt_secret: JWT_SECRET.to_string(),
        token_ttl_seconds: 600,
    });

    let cache: Arc<dyn GeocodeCache> = Arc::new(MemoryCacheService::new(3600, 100));

    Arc::new(AppState {
        repo,
        planner: JourneyPlanner::new(FarePolicy::default()),
        geocoder: None,
        auth,
        cache: Some(cache),
    })
}

#[allow(dead_code)]
pub async fn setup_test_app() -> axum::Router {
    busroute::routes::create_router(setup_test_state().await)
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&body).unwrap()
}

/// Log in through the API and return the bearer token.
#[allow(dead_code)]
pub async fn admin_token(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/admin/login",
            &serde_json::json!({ "password": ADMIN_PASSWORD }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    body_json(response).await["token"]
        .as_str()
        .expect("token in login response")
        .to_string()
}

/// Check if we should skip real API tests
#[allow(dead_code)]
pub fn should_skip_real_api_tests() -> bool {
    std::env::var("SKIP_REAL_API_TESTS").is_ok()
}
