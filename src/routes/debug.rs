use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /debug/health - Check database and cache
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut status = json!({
        "status": "ok",
        "checks": {}
    });

    match state.repo.ping().await {
        Ok(()) => {
            status["checks"]["database"] = json!({
                "status": "ok",
                "backend": state.repo.backend_name(),
            });
        }
        Err(e) => {
            status["checks"]["database"] = json!({"error": e.to_string()});
            status["status"] = json!("error");
        }
    }

    match state.cache {
        Some(ref cache) => {
            let health = if cache.health_check().await {
                "ok"
            } else {
                "unavailable"
            };
            let stats = cache.get_stats().await;
            status["checks"]["cache"] = json!({
                "status": health,
                "backend": cache.backend_name(),
                "stats": stats,
            });
        }
        None => {
            status["checks"]["cache"] = json!("disabled");
        }
    }

    let geocoding = if state.geocoder.is_some() {
        "enabled"
    } else {
        "disabled"
    };
    status["checks"]["geocoding"] = json!(geocoding);

    Json(status)
}
