use crate::error::{AppError, Result};
use crate::services::{AdminClaims, AdminToken};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{FromRequestParts, State},
    http::{header, request::Parts},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

/// POST /admin/login
///
/// Expects `{"password": "..."}`. A body without a string password is a
/// failed login (401), never a validation error.
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AdminToken>> {
    let token = state.auth.login(&login_password(&body)).await?;
    Ok(Json(token))
}

fn login_password(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|request| request.get("password")?.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Proof that the request carried a valid admin bearer token. Add it as a
/// handler argument to restrict the handler to admins.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: AdminClaims,
}

impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| AppError::Unauthorized("Admin token required".to_string()))?;

        let claims = state.auth.verify(token)?;
        Ok(AdminSession { claims })
    }
}

fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
